// ==========================================
// 会员组织管理系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型
// 红线: 不含数据访问逻辑,不含导入流程逻辑
// ==========================================

pub mod import;
pub mod organization;
pub mod snapshot;
pub mod types;

// 重导出核心类型
pub use import::{ExcoRecord, ImportBatch, ImportError, ImportResult, ImportedAssignment};
pub use organization::{
    Department, Level, LevelDepartment, Member, MemberLevelDepartment, National, NewAssignment,
    State, Unit,
};
pub use snapshot::{MemberScope, ReferenceSnapshot};
pub use types::{ErrorSeverity, ImportErrorType, ImportRunState, LevelType};
