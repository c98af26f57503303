// ==========================================
// EXCO 职务导入API
// ==========================================
// 职责: 封装职务导入相关功能（本地文件 / 上传流 / 批次查询）
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::config::{ConfigManager, ImportConfigReader};
use crate::db::{ensure_schema, open_sqlite_connection};
use crate::domain::import::{ImportBatch, ImportError, ImportResult, ImportedAssignment};
use crate::domain::organization::MemberLevelDepartment;
use crate::domain::types::ImportRunState;
use crate::importer::{
    ExcoImporter, ExcoImporterImpl, ImportCancelToken, ImportOptions, ImporterError,
    StagedUpload,
};
use crate::repository::{MembershipRepository, MembershipRepositoryImpl};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;
use std::sync::{Arc, Mutex};

/// 响应中保留的错误明细条数（完整列表见批次错误报告）
pub const DEFAULT_ERROR_PREVIEW_LIMIT: usize = 200;

/// 导入API响应
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportApiResponse {
    /// 批次ID
    pub batch_id: String,
    /// 运行终态（PERSISTED / VALIDATED_ONLY）
    pub state: ImportRunState,
    pub total_records: usize,
    pub successful_imports: usize,
    pub failed_imports: usize,
    /// 仅会员行（部门为空）
    pub skipped_records: usize,
    pub warning_count: usize,
    /// 按错误类型汇总
    pub errors_by_type: BTreeMap<String, usize>,
    /// 错误明细（最多 DEFAULT_ERROR_PREVIEW_LIMIT 条）
    pub errors: Vec<ImportError>,
    /// 错误明细是否被截断
    pub errors_truncated: bool,
    pub imported_assignments: Vec<ImportedAssignment>,
    /// 导入耗时（毫秒）
    pub processing_time_ms: u64,
}

impl ImportApiResponse {
    pub fn from_result(result: ImportResult, error_limit: usize) -> Self {
        let mut errors_by_type = BTreeMap::new();
        for err in &result.errors {
            *errors_by_type.entry(err.error_type.to_string()).or_insert(0) += 1;
        }
        let warning_count = result.warning_count();
        let errors_truncated = result.errors.len() > error_limit;
        let errors = result.errors.into_iter().take(error_limit).collect();

        Self {
            batch_id: result.batch_id,
            state: result.state,
            total_records: result.total_records,
            successful_imports: result.successful_imports,
            failed_imports: result.failed_imports,
            skipped_records: result.skipped_records,
            warning_count,
            errors_by_type,
            errors,
            errors_truncated,
            imported_assignments: result.imported_assignments,
            processing_time_ms: result.processing_time_ms,
        }
    }
}

/// 导入API
pub struct ImportApi {
    db_path: String,
}

impl ImportApi {
    /// 创建新的ImportApi实例
    pub fn new(db_path: String) -> Self {
        Self { db_path }
    }

    /// 导入本地 CSV 文件
    ///
    /// # 返回
    /// - Ok(ImportApiResponse): 导入结果（可能部分成功）
    /// - Err(ApiError::ImportRejected): 文件级结构校验失败
    /// - Err(ApiError): 其它错误
    pub async fn import_exco_file(
        &self,
        file_path: &str,
        options: &ImportOptions,
    ) -> ApiResult<ImportApiResponse> {
        self.import_exco_file_with_cancel(file_path, options, &ImportCancelToken::new())
            .await
    }

    /// 导入本地 CSV 文件（支持取消）
    pub async fn import_exco_file_with_cancel(
        &self,
        file_path: &str,
        options: &ImportOptions,
        cancel: &ImportCancelToken,
    ) -> ApiResult<ImportApiResponse> {
        if file_path.trim().is_empty() {
            return Err(ApiError::InvalidInput("文件路径不能为空".to_string()));
        }

        let importer = self.create_importer()?;
        let result = importer
            .import_from_csv_with_cancel(Path::new(file_path), options, cancel)
            .await?;

        into_response(result)
    }

    /// 导入上传流
    ///
    /// 内容先暂存为临时文件，函数返回时（含出错路径）删除
    pub async fn import_exco_upload<Rd>(
        &self,
        reader: Rd,
        original_name: Option<&str>,
        options: &ImportOptions,
    ) -> ApiResult<ImportApiResponse>
    where
        Rd: Read + Send + 'static,
    {
        let conn = self.open_connection()?;
        let config = ConfigManager::from_connection(conn.clone());
        let max_bytes = config.get_max_file_size_bytes().await?;

        // 上传流是阻塞读取，暂存放到 blocking 线程池
        let staged = tokio::task::spawn_blocking(move || {
            StagedUpload::from_reader(reader, Some(max_bytes))
        })
        .await
        .map_err(|e| ImporterError::UploadStagingError(e.to_string()))??;

        let mut options = options.clone();
        if options.source_name.is_none() {
            options.source_name = original_name.map(str::to_string);
        }

        let importer = ExcoImporterImpl::new(MembershipRepositoryImpl::from_connection(conn), config);
        let result = importer.import_from_csv(staged.path(), &options).await?;

        into_response(result)
    }

    /// 最近的导入批次
    pub async fn list_import_batches(&self, limit: i64) -> ApiResult<Vec<ImportBatch>> {
        if limit <= 0 {
            return Err(ApiError::InvalidInput(format!("limit 必须大于 0: {}", limit)));
        }
        let repo = MembershipRepositoryImpl::from_connection(self.open_connection()?);
        Ok(repo.list_import_batches(limit).await?)
    }

    /// 会员的职务任命
    pub async fn list_member_assignments(
        &self,
        member_id: i64,
    ) -> ApiResult<Vec<MemberLevelDepartment>> {
        let repo = MembershipRepositoryImpl::from_connection(self.open_connection()?);
        Ok(repo.list_member_assignments(member_id).await?)
    }

    fn open_connection(&self) -> ApiResult<Arc<Mutex<rusqlite::Connection>>> {
        let conn = open_sqlite_connection(&self.db_path)
            .map_err(|e| ApiError::DatabaseConnectionError(e.to_string()))?;
        ensure_schema(&conn).map_err(|e| ApiError::DatabaseError(e.to_string()))?;
        Ok(Arc::new(Mutex::new(conn)))
    }

    fn create_importer(&self) -> ApiResult<ExcoImporterImpl<MembershipRepositoryImpl, ConfigManager>> {
        let conn = self.open_connection()?;
        let repo = MembershipRepositoryImpl::from_connection(conn.clone());
        let config = ConfigManager::from_connection(conn);
        Ok(ExcoImporterImpl::new(repo, config))
    }
}

fn into_response(result: ImportResult) -> ApiResult<ImportApiResponse> {
    if result.state == ImportRunState::Rejected {
        let reason = result
            .errors
            .iter()
            .find(|e| e.is_error())
            .map(|e| format!("{}: {}", e.error_type, e.detailed_message))
            .unwrap_or_else(|| "文件结构校验失败".to_string());
        return Err(ApiError::ImportRejected {
            reason,
            errors: result.errors,
        });
    }

    Ok(ImportApiResponse::from_result(
        result,
        DEFAULT_ERROR_PREVIEW_LIMIT,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::{ErrorSeverity, ImportErrorType};

    fn result_with_errors(count: usize) -> ImportResult {
        let mut errors: Vec<ImportError> = (0..count)
            .map(|_| {
                ImportError::file_level(
                    ImportErrorType::MemberNotFound,
                    ErrorSeverity::Error,
                    "x",
                )
            })
            .collect();
        errors.push(ImportError::file_level(
            ImportErrorType::UnicodeEncodingError,
            ErrorSeverity::Warning,
            "y",
        ));
        ImportResult {
            batch_id: "b".to_string(),
            state: ImportRunState::ValidatedOnly,
            total_records: count,
            successful_imports: 0,
            failed_imports: count,
            skipped_records: 0,
            errors,
            processing_time_ms: 1,
            imported_assignments: vec![],
        }
    }

    #[test]
    fn test_response_truncates_errors_but_keeps_counts() {
        let response = ImportApiResponse::from_result(result_with_errors(5), 3);

        assert_eq!(response.errors.len(), 3);
        assert!(response.errors_truncated);
        assert_eq!(response.errors_by_type.get("MemberNotFound"), Some(&5));
        assert_eq!(response.errors_by_type.get("UnicodeEncodingError"), Some(&1));
        assert_eq!(response.warning_count, 1);
        assert_eq!(response.failed_imports, 5);
    }

    #[test]
    fn test_rejected_result_becomes_bad_request() {
        let rejected = ImportResult::rejected(
            "b".to_string(),
            vec![ImportError::file_level(
                ImportErrorType::EmptyFile,
                ErrorSeverity::Error,
                "empty",
            )],
            0,
        );
        let err = into_response(rejected).unwrap_err();
        assert!(err.is_bad_request());
        match err {
            ApiError::ImportRejected { reason, errors } => {
                assert!(reason.starts_with("EmptyFile"));
                assert_eq!(errors.len(), 1);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
