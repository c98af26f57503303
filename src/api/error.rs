// ==========================================
// 会员组织管理系统 - API层错误类型
// ==========================================
// 职责: 定义API层错误类型，转换Repository/导入错误为用户友好的错误消息
// 分类: BadRequest 类（调用方可修正）与服务端错误
// ==========================================

use crate::domain::import::ImportError;
use crate::importer::error::ImporterError;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 请求错误（BadRequest 类）
    // ==========================================
    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error("资源未找到: {0}")]
    NotFound(String),

    /// 文件级结构校验失败，未处理任何数据行
    #[error("文件被拒收: {reason}")]
    ImportRejected {
        reason: String,
        errors: Vec<ImportError>,
    },

    #[error("业务规则违反: {0}")]
    BusinessRuleViolation(String),

    // ==========================================
    // 数据访问错误
    // ==========================================
    #[error("数据库错误: {0}")]
    DatabaseError(String),

    #[error("数据库连接失败: {0}")]
    DatabaseConnectionError(String),

    #[error("数据库事务失败: {0}")]
    DatabaseTransactionError(String),

    // ==========================================
    // 导入错误
    // ==========================================
    #[error("文件导入失败: {0}")]
    ImportError(String),

    #[error("导入已取消: {0}")]
    Cancelled(String),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ApiError {
    /// 是否为调用方可修正的请求错误
    pub fn is_bad_request(&self) -> bool {
        matches!(
            self,
            ApiError::InvalidInput(_)
                | ApiError::NotFound(_)
                | ApiError::ImportRejected { .. }
                | ApiError::BusinessRuleViolation(_)
        )
    }
}

// ==========================================
// 从 RepositoryError 转换
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})不存在", entity, id))
            }
            RepositoryError::DatabaseConnectionError(msg) => ApiError::DatabaseConnectionError(msg),
            RepositoryError::DatabaseTransactionError(msg) => {
                ApiError::DatabaseTransactionError(msg)
            }
            RepositoryError::LockError(msg) => {
                ApiError::DatabaseConnectionError(format!("数据库锁获取失败: {}", msg))
            }
            RepositoryError::DatabaseQueryError(msg) => ApiError::DatabaseError(msg),
            RepositoryError::UniqueConstraintViolation(msg) => {
                ApiError::BusinessRuleViolation(format!("唯一约束违反: {}", msg))
            }
            RepositoryError::ForeignKeyViolation(msg) => {
                ApiError::BusinessRuleViolation(format!("外键约束违反: {}", msg))
            }
            RepositoryError::FieldValueError { field, message } => {
                ApiError::InvalidInput(format!("字段{}错误: {}", field, message))
            }
            RepositoryError::InternalError(msg) => ApiError::InternalError(msg),
            RepositoryError::Other(err) => ApiError::Other(err),
        }
    }
}

// ==========================================
// 从 ImporterError 转换
// ==========================================
impl From<ImporterError> for ApiError {
    fn from(err: ImporterError) -> Self {
        match err {
            ImporterError::FileNotFound(path) => {
                ApiError::InvalidInput(format!("文件不存在: {}", path))
            }
            ImporterError::FileReadError(msg) | ImporterError::UploadStagingError(msg) => {
                ApiError::ImportError(msg)
            }
            ImporterError::Repository(err) => ApiError::from(err),
            err @ ImporterError::Cancelled { .. } => ApiError::Cancelled(err.to_string()),
            ImporterError::InternalError(msg) => ApiError::InternalError(msg),
            ImporterError::Other(err) => ApiError::Other(err),
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_error_mapping() {
        let err: ApiError = RepositoryError::NotFound {
            entity: "Member".to_string(),
            id: "42".to_string(),
        }
        .into();
        assert!(matches!(err, ApiError::NotFound(_)));
        assert!(err.is_bad_request());

        let err: ApiError = RepositoryError::LockError("poisoned".to_string()).into();
        assert!(matches!(err, ApiError::DatabaseConnectionError(_)));
        assert!(!err.is_bad_request());
    }

    #[test]
    fn test_importer_error_mapping() {
        let err: ApiError = ImporterError::FileNotFound("/tmp/none.csv".to_string()).into();
        assert!(matches!(err, ApiError::InvalidInput(_)));

        let err: ApiError = ImporterError::Cancelled { processed_rows: 3 }.into();
        assert!(matches!(err, ApiError::Cancelled(_)));

        let err: ApiError =
            ImporterError::Repository(RepositoryError::DatabaseQueryError("x".to_string())).into();
        assert!(matches!(err, ApiError::DatabaseError(_)));
    }
}
