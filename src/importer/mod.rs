// ==========================================
// 会员组织管理系统 - 导入层
// ==========================================
// 职责: EXCO 职务 CSV 导入（结构校验 → 对账 → 规则 → 去重 → 落库）
// 支持: 本地文件、上传流（暂存为临时文件）
// ==========================================

// 模块声明
pub mod cancel;
pub mod conflict_handler;
pub mod entity_resolver;
pub mod error;
pub mod exco_importer_impl;
pub mod exco_importer_trait;
pub mod file_parser;
pub mod file_validator;
pub mod name_parser;
pub mod rule_validator;
pub mod upload;

// 重导出核心类型
pub use cancel::ImportCancelToken;
pub use conflict_handler::{DuplicateSource, DuplicateSuppressor};
pub use entity_resolver::ReferenceIndex;
pub use error::{ImporterError, ImporterResult};
pub use exco_importer_impl::ExcoImporterImpl;
pub use file_parser::CsvParser;
pub use file_validator::CsvStructuralValidator;
pub use name_parser::{NameParser, ParsedName};
pub use rule_validator::BusinessRuleValidator;
pub use upload::StagedUpload;

// 重导出 Trait 接口
pub use exco_importer_trait::{ExcoImporter, FileParser, ImportOptions};
