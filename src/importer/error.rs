// ==========================================
// 会员组织管理系统 - 导入模块错误类型
// ==========================================
// 只描述“运行级”致命错误（环境/完整性问题）
// 行级业务错误与文件级拒收记录在 ImportResult.errors 中，不走此类型
// 工具: thiserror 派生宏
// ==========================================

use crate::repository::error::RepositoryError;
use thiserror::Error;

/// 导入模块错误类型
#[derive(Error, Debug)]
pub enum ImporterError {
    // ===== 文件相关错误 =====
    #[error("文件不存在: {0}")]
    FileNotFound(String),

    #[error("文件读取失败: {0}")]
    FileReadError(String),

    #[error("上传文件暂存失败: {0}")]
    UploadStagingError(String),

    // ===== 数据库错误 =====
    #[error("数据访问失败: {0}")]
    Repository(#[from] RepositoryError),

    // ===== 运行控制 =====
    #[error("导入已取消（已处理 {processed_rows} 行，未写入任何数据）")]
    Cancelled { processed_rows: usize },

    // ===== 通用错误 =====
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// 实现 From<std::io::Error>
impl From<std::io::Error> for ImporterError {
    fn from(err: std::io::Error) -> Self {
        ImporterError::FileReadError(err.to_string())
    }
}

// 实现 From<serde_json::Error>
impl From<serde_json::Error> for ImporterError {
    fn from(err: serde_json::Error) -> Self {
        ImporterError::InternalError(format!("错误报告序列化失败: {}", err))
    }
}

/// Result 类型别名
pub type ImporterResult<T> = Result<T, ImporterError>;
