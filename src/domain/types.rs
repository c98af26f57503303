// ==========================================
// 会员组织管理系统 - 领域类型定义
// ==========================================
// 职责: 层级类型、导入错误分类、错误级别、导入运行状态机
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 层级类型 (Level Type)
// ==========================================
// 序列化格式与数据库一致: National / State / Unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LevelType {
    National, // 全国
    State,    // 州
    Unit,     // 基层单位
}

impl LevelType {
    /// 从字符串解析（忽略大小写与首尾空白）
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "NATIONAL" => Some(LevelType::National),
            "STATE" => Some(LevelType::State),
            "UNIT" => Some(LevelType::Unit),
            _ => None,
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            LevelType::National => "National",
            LevelType::State => "State",
            LevelType::Unit => "Unit",
        }
    }
}

impl fmt::Display for LevelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

// ==========================================
// 导入错误类型 (Import Error Type)
// ==========================================
// 文件级（结构性）错误会中止整个运行；行级业务错误只记录不中止
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ImportErrorType {
    // ===== 文件级 =====
    EmptyFile,
    FileSizeExceeded,
    HeaderValidationFailed,
    UnicodeEncodingError,
    InvalidCsvStructure,
    MalformedData,

    // ===== 行级 =====
    InvalidNameFormat,
    MemberNotFound,
    DepartmentNotFound,
    LevelNotFound,
    InvalidLevelAssignment,
    RestrictedDepartmentAssignment,
    DuplicateAssignment,
}

impl ImportErrorType {
    /// 是否为文件级错误
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            ImportErrorType::EmptyFile
                | ImportErrorType::FileSizeExceeded
                | ImportErrorType::HeaderValidationFailed
                | ImportErrorType::UnicodeEncodingError
                | ImportErrorType::InvalidCsvStructure
                | ImportErrorType::MalformedData
        )
    }
}

impl fmt::Display for ImportErrorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

// ==========================================
// 错误级别 (Severity)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ErrorSeverity {
    Warning, // 警告（不阻断）
    Error,   // 错误（该行失败 / 文件拒收）
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorSeverity::Warning => write!(f, "WARNING"),
            ErrorSeverity::Error => write!(f, "ERROR"),
        }
    }
}

// ==========================================
// 导入运行状态 (Import Run State)
// ==========================================
// Received → StructurallyValidated → RowsProcessed → Persisted | ValidatedOnly
// Received → Rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ImportRunState {
    Received,
    StructurallyValidated,
    RowsProcessed,
    Persisted,
    ValidatedOnly,
    Rejected,
}

impl ImportRunState {
    /// 是否为终态
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ImportRunState::Persisted | ImportRunState::ValidatedOnly | ImportRunState::Rejected
        )
    }

    /// 状态迁移是否合法
    pub fn can_transition_to(&self, next: ImportRunState) -> bool {
        use ImportRunState::{
            Persisted, Received, Rejected, RowsProcessed, StructurallyValidated, ValidatedOnly,
        };
        matches!(
            (self, next),
            (Received, StructurallyValidated)
                | (Received, Rejected)
                | (StructurallyValidated, RowsProcessed)
                | (RowsProcessed, Persisted)
                | (RowsProcessed, ValidatedOnly)
        )
    }
}

impl fmt::Display for ImportRunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ImportRunState::Received => "RECEIVED",
            ImportRunState::StructurallyValidated => "STRUCTURALLY_VALIDATED",
            ImportRunState::RowsProcessed => "ROWS_PROCESSED",
            ImportRunState::Persisted => "PERSISTED",
            ImportRunState::ValidatedOnly => "VALIDATED_ONLY",
            ImportRunState::Rejected => "REJECTED",
        };
        write!(f, "{}", s)
    }
}
