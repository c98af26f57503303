// ==========================================
// 会员组织管理系统 - 导入策略快照
// ==========================================
// 每次导入运行开始时从 ImportConfigReader 读取一次，运行期间不变
// ==========================================

use crate::config::import_config_trait::ImportConfigReader;
use crate::repository::error::RepositoryResult;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// 默认文件大小上限: 10 MB
pub const DEFAULT_MAX_FILE_SIZE_BYTES: u64 = 10 * 1024 * 1024;

/// 默认全国层级 ID
pub const DEFAULT_NATIONAL_LEVEL_ID: i64 = 1;

/// 默认限制部门（仅全国层级可任命）
pub const DEFAULT_RESTRICTED_DEPARTMENTS: [&str; 4] = [
    "VP Admin",
    "VP South-West",
    "VP North",
    "VP South-South/South-East",
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportPolicy {
    pub max_file_size_bytes: u64,
    pub national_level_id: i64,
    pub strict_member_rows: bool,
    // 小写+去空白后的名称
    restricted_departments: HashSet<String>,
}

impl ImportPolicy {
    pub fn new(
        max_file_size_bytes: u64,
        national_level_id: i64,
        strict_member_rows: bool,
        restricted_departments: impl IntoIterator<Item = impl AsRef<str>>,
    ) -> Self {
        Self {
            max_file_size_bytes,
            national_level_id,
            strict_member_rows,
            restricted_departments: restricted_departments
                .into_iter()
                .map(|name| normalize_key(name.as_ref()))
                .filter(|name| !name.is_empty())
                .collect(),
        }
    }

    /// 从配置读取器加载
    pub async fn load<C: ImportConfigReader + ?Sized>(config: &C) -> RepositoryResult<Self> {
        Ok(Self::new(
            config.get_max_file_size_bytes().await?,
            config.get_national_level_id().await?,
            config.get_strict_member_rows().await?,
            config.get_restricted_departments().await?,
        ))
    }

    /// 部门是否受限（忽略大小写与首尾空白）
    pub fn is_restricted_department(&self, department_name: &str) -> bool {
        self.restricted_departments
            .contains(&normalize_key(department_name))
    }

    pub fn restricted_department_count(&self) -> usize {
        self.restricted_departments.len()
    }
}

impl Default for ImportPolicy {
    fn default() -> Self {
        Self::new(
            DEFAULT_MAX_FILE_SIZE_BYTES,
            DEFAULT_NATIONAL_LEVEL_ID,
            false,
            DEFAULT_RESTRICTED_DEPARTMENTS,
        )
    }
}

/// 匹配键: TRIM + 小写
pub fn normalize_key(value: &str) -> String {
    value.trim().to_lowercase()
}
