// ==========================================
// 会员组织管理系统 - 配置层
// ==========================================
// 职责: 导入策略配置（文件大小上限、限制部门、全国层级 ID）
// 存储: config_kv 表
// ==========================================

pub mod config_manager;
pub mod import_config_trait;
pub mod import_policy;

// 重导出核心配置类型
pub use config_manager::{config_keys, ConfigManager};
pub use import_config_trait::ImportConfigReader;
pub use import_policy::ImportPolicy;
