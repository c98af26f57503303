// ==========================================
// 会员组织管理系统 - 导入相关实体
// ==========================================
// ExcoRecord → (解析/对账/校验) → ImportError | ImportedAssignment → ImportResult
// ==========================================

use crate::domain::types::{ErrorSeverity, ImportErrorType, ImportRunState, LevelType};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ==========================================
// ExcoRecord - 导入中间结构体
// ==========================================
// 用途: CSV 行解析产物（列名已归一化为大写）
// 生命周期: 仅在导入流程内
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExcoRecord {
    pub name: String,
    pub unit: String,
    pub department: String,
    pub level: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub mkan_id: Option<String>,

    // 元信息
    pub row_number: usize, // 文件行号（表头为第 1 行，首个数据行为第 2 行）
}

impl ExcoRecord {
    /// 原始字段快照（写入错误报告）
    pub fn record_data(&self) -> BTreeMap<String, String> {
        let mut data = BTreeMap::new();
        data.insert("NAME".to_string(), self.name.clone());
        data.insert("UNIT".to_string(), self.unit.clone());
        data.insert("DEPARTMENT".to_string(), self.department.clone());
        data.insert("LEVEL".to_string(), self.level.clone());
        if let Some(v) = &self.email {
            data.insert("EMAIL".to_string(), v.clone());
        }
        if let Some(v) = &self.phone {
            data.insert("PHONE".to_string(), v.clone());
        }
        if let Some(v) = &self.mkan_id {
            data.insert("MKANID".to_string(), v.clone());
        }
        data
    }
}

// ==========================================
// ImportError - 导入错误记录
// ==========================================
// row_number = 0 表示文件级（不对应具体数据行）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportError {
    pub error_type: ImportErrorType,
    pub record_data: BTreeMap<String, String>,
    pub detailed_message: String,
    pub row_number: usize,
    pub field_name: Option<String>,
    pub original_value: Option<String>,
    pub severity: ErrorSeverity,
}

impl ImportError {
    /// 行级错误（Error 级别）
    pub fn row(
        error_type: ImportErrorType,
        record: &ExcoRecord,
        field_name: &str,
        original_value: &str,
        detailed_message: impl Into<String>,
    ) -> Self {
        Self {
            error_type,
            record_data: record.record_data(),
            detailed_message: detailed_message.into(),
            row_number: record.row_number,
            field_name: Some(field_name.to_string()),
            original_value: Some(original_value.to_string()),
            severity: ErrorSeverity::Error,
        }
    }

    /// 文件级错误
    pub fn file_level(
        error_type: ImportErrorType,
        severity: ErrorSeverity,
        detailed_message: impl Into<String>,
    ) -> Self {
        Self {
            error_type,
            record_data: BTreeMap::new(),
            detailed_message: detailed_message.into(),
            row_number: 0,
            field_name: None,
            original_value: None,
            severity,
        }
    }

    /// 降级为警告
    pub fn as_warning(mut self) -> Self {
        self.severity = ErrorSeverity::Warning;
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == ErrorSeverity::Error
    }
}

// ==========================================
// ImportedAssignment - 导入成功的职务任命
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportedAssignment {
    pub row_number: usize,
    pub member_id: i64,
    pub member_name: String,
    pub department_id: i64,
    pub department_name: String,
    pub level_id: i64,
    pub level_type: LevelType,
    pub level_department_id: i64,
}

// ==========================================
// ImportBatch - 导入批次
// ==========================================
// 对齐 import_batch 表；与职务任命在同一事务中写入
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportBatch {
    pub batch_id: String,              // 批次 ID（UUID）
    pub file_name: Option<String>,     // 源文件名
    pub total_rows: i32,               // 总行数
    pub success_rows: i32,             // 成功行数
    pub failed_rows: i32,              // 失败行数
    pub skipped_rows: i32,             // 跳过行数（仅会员行）
    pub imported_at: DateTime<Utc>,    // 导入时间
    pub imported_by: Option<String>,   // 导入人
    pub elapsed_ms: i64,               // 导入耗时（毫秒）
    pub error_report_json: Option<String>, // 错误报告 JSON
}

// ==========================================
// ImportResult - 导入结果
// ==========================================
// 部分成功是常态：行级错误不影响其它行
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportResult {
    pub batch_id: String,
    pub state: ImportRunState,
    pub total_records: usize,
    pub successful_imports: usize,
    pub failed_imports: usize,
    pub skipped_records: usize,
    pub errors: Vec<ImportError>,
    pub processing_time_ms: u64,
    pub imported_assignments: Vec<ImportedAssignment>,
}

impl ImportResult {
    /// 文件级拒收结果（未处理任何数据行）
    pub fn rejected(batch_id: String, errors: Vec<ImportError>, processing_time_ms: u64) -> Self {
        Self {
            batch_id,
            state: ImportRunState::Rejected,
            total_records: 0,
            successful_imports: 0,
            failed_imports: 0,
            skipped_records: 0,
            errors,
            processing_time_ms,
            imported_assignments: Vec::new(),
        }
    }

    /// 按错误类型筛选
    pub fn errors_of(&self, error_type: ImportErrorType) -> Vec<&ImportError> {
        self.errors
            .iter()
            .filter(|e| e.error_type == error_type)
            .collect()
    }

    /// 警告数量
    pub fn warning_count(&self) -> usize {
        self.errors.iter().filter(|e| !e.is_error()).count()
    }
}
