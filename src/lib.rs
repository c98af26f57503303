// ==========================================
// 会员组织管理系统 - 核心库
// ==========================================
// 组织层级: National → State → Unit → Member
// 技术栈: Rust + SQLite
// 核心能力: EXCO 职务 CSV 批量导入（部分成功语义）
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 导入层 - CSV 对账导入
pub mod importer;

// 配置层 - 导入策略配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA/建表）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 业务接口
pub mod api;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{ErrorSeverity, ImportErrorType, ImportRunState, LevelType};

// 领域实体
pub use domain::{
    Department, ImportBatch, ImportError, ImportResult, ImportedAssignment, Level,
    LevelDepartment, Member, MemberLevelDepartment, ReferenceSnapshot,
};

// 导入器
pub use importer::{ExcoImporter, ExcoImporterImpl, ImportCancelToken, ImportOptions};

// API
pub use api::{ApiError, ImportApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "会员组织管理系统";
