// ==========================================
// 会员组织管理系统 - 配置管理器
// ==========================================
// 职责: 配置查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::config::import_config_trait::ImportConfigReader;
use crate::config::import_policy::{
    DEFAULT_MAX_FILE_SIZE_BYTES, DEFAULT_NATIONAL_LEVEL_ID, DEFAULT_RESTRICTED_DEPARTMENTS,
};
use crate::db::open_sqlite_connection;
use crate::repository::error::{RepositoryError, RepositoryResult};
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

// ==========================================
// 配置键
// ==========================================
pub mod config_keys {
    pub const MAX_FILE_SIZE_BYTES: &str = "import_max_file_size_bytes";
    pub const RESTRICTED_DEPARTMENTS: &str = "import_restricted_departments";
    pub const NATIONAL_LEVEL_ID: &str = "import_national_level_id";
    pub const STRICT_MEMBER_ROWS: &str = "import_strict_member_rows";
}

const GLOBAL_SCOPE: &str = "global";

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    pub fn get_global_config_value(&self, key: &str) -> RepositoryResult<Option<String>> {
        let conn = self.get_conn()?;

        let value = conn
            .query_row(
                "SELECT value FROM config_kv WHERE scope_id = ?1 AND key = ?2",
                params![GLOBAL_SCOPE, key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;

        Ok(value)
    }

    /// 写入 global scope 的配置值（存在则覆盖）
    pub fn set_global_config_value(&self, key: &str, value: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO config_kv (scope_id, key, value, updated_at)
            VALUES (?1, ?2, ?3, datetime('now'))
            ON CONFLICT(scope_id, key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
            params![GLOBAL_SCOPE, key, value],
        )?;
        Ok(())
    }

    /// 从 config_kv 表读取配置值，带默认值
    fn get_config_or_default(&self, key: &str, default: &str) -> RepositoryResult<String> {
        Ok(self
            .get_global_config_value(key)?
            .unwrap_or_else(|| default.to_string()))
    }

    /// 获取所有配置的快照
    pub fn get_config_snapshot(&self) -> RepositoryResult<HashMap<String, String>> {
        let conn = self.get_conn()?;

        let mut stmt =
            conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = ?1 ORDER BY key")?;
        let rows = stmt.query_map(params![GLOBAL_SCOPE], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut config_map = HashMap::new();
        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }
        Ok(config_map)
    }
}

// ==========================================
// ImportConfigReader Trait 实现
// ==========================================
#[async_trait]
impl ImportConfigReader for ConfigManager {
    async fn get_max_file_size_bytes(&self) -> RepositoryResult<u64> {
        let default = DEFAULT_MAX_FILE_SIZE_BYTES.to_string();
        let value = self.get_config_or_default(config_keys::MAX_FILE_SIZE_BYTES, &default)?;
        Ok(value
            .trim()
            .parse::<u64>()
            .ok()
            .filter(|v| *v > 0)
            .unwrap_or(DEFAULT_MAX_FILE_SIZE_BYTES))
    }

    async fn get_restricted_departments(&self) -> RepositoryResult<Vec<String>> {
        let defaults: Vec<String> = DEFAULT_RESTRICTED_DEPARTMENTS
            .iter()
            .map(|s| s.to_string())
            .collect();

        let value = match self.get_global_config_value(config_keys::RESTRICTED_DEPARTMENTS)? {
            Some(v) => v,
            None => return Ok(defaults),
        };

        // JSON 数组；空数组表示不限制
        match serde_json::from_str::<Vec<String>>(&value) {
            Ok(list) => Ok(list),
            Err(_) => {
                tracing::warn!(
                    config_key = config_keys::RESTRICTED_DEPARTMENTS,
                    raw_value = %value,
                    "限制部门配置格式错误，使用默认配置"
                );
                Ok(defaults)
            }
        }
    }

    async fn get_national_level_id(&self) -> RepositoryResult<i64> {
        let default = DEFAULT_NATIONAL_LEVEL_ID.to_string();
        let value = self.get_config_or_default(config_keys::NATIONAL_LEVEL_ID, &default)?;
        Ok(value
            .trim()
            .parse::<i64>()
            .unwrap_or(DEFAULT_NATIONAL_LEVEL_ID))
    }

    async fn get_strict_member_rows(&self) -> RepositoryResult<bool> {
        let value = self.get_config_or_default(config_keys::STRICT_MEMBER_ROWS, "false")?;
        Ok(matches!(
            value.trim().to_lowercase().as_str(),
            "1" | "true" | "yes" | "y"
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ImportPolicy;
    use crate::db::{configure_sqlite_connection, ensure_schema};

    fn setup_manager() -> ConfigManager {
        let conn = Connection::open_in_memory().unwrap();
        configure_sqlite_connection(&conn).unwrap();
        ensure_schema(&conn).unwrap();
        ConfigManager::from_connection(Arc::new(Mutex::new(conn)))
    }

    #[tokio::test]
    async fn test_defaults_when_unset() {
        let manager = setup_manager();

        assert_eq!(
            manager.get_max_file_size_bytes().await.unwrap(),
            DEFAULT_MAX_FILE_SIZE_BYTES
        );
        assert_eq!(manager.get_national_level_id().await.unwrap(), 1);
        assert!(!manager.get_strict_member_rows().await.unwrap());
        assert_eq!(manager.get_restricted_departments().await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_overrides_are_read() {
        let manager = setup_manager();
        manager
            .set_global_config_value(config_keys::MAX_FILE_SIZE_BYTES, "2048")
            .unwrap();
        manager
            .set_global_config_value(config_keys::RESTRICTED_DEPARTMENTS, r#"["President"]"#)
            .unwrap();
        manager
            .set_global_config_value(config_keys::STRICT_MEMBER_ROWS, "TRUE")
            .unwrap();
        manager
            .set_global_config_value(config_keys::NATIONAL_LEVEL_ID, "5")
            .unwrap();

        let policy = ImportPolicy::load(&manager).await.unwrap();
        assert_eq!(policy.max_file_size_bytes, 2048);
        assert_eq!(policy.national_level_id, 5);
        assert!(policy.strict_member_rows);
        assert!(policy.is_restricted_department("president"));
        assert!(!policy.is_restricted_department("VP Admin"));

        assert_eq!(manager.get_config_snapshot().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_malformed_values_fall_back() {
        let manager = setup_manager();
        manager
            .set_global_config_value(config_keys::MAX_FILE_SIZE_BYTES, "ten")
            .unwrap();
        manager
            .set_global_config_value(config_keys::RESTRICTED_DEPARTMENTS, "VP Admin")
            .unwrap();

        assert_eq!(
            manager.get_max_file_size_bytes().await.unwrap(),
            DEFAULT_MAX_FILE_SIZE_BYTES
        );
        assert_eq!(manager.get_restricted_departments().await.unwrap().len(), 4);
    }
}
