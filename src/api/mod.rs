// ==========================================
// 会员组织管理系统 - API 层
// ==========================================
// 职责: 提供业务 API 接口，供 CLI / 外部调用方使用
// ==========================================

pub mod error;
pub mod import_api;

// 重导出核心类型
pub use error::{ApiError, ApiResult};
pub use import_api::{ImportApi, ImportApiResponse, DEFAULT_ERROR_PREVIEW_LIMIT};
