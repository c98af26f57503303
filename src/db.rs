// ==========================================
// 会员组织管理系统 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为（外键、busy_timeout）
// - 提供幂等建表（CREATE TABLE IF NOT EXISTS），不做迁移
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
///
/// 仅用于提示/告警，不做自动迁移。
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要“每个连接”单独开启
/// - busy_timeout 需要“每个连接”单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 建表（幂等）
///
/// 组织层级: national → state → unit → member
/// 职务模型: department × level → level_department → member_level_department
pub fn ensure_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS config_kv (
            scope_id TEXT NOT NULL,
            key TEXT NOT NULL,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (scope_id, key)
        );

        CREATE TABLE IF NOT EXISTS national (
            national_id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS state (
            state_id INTEGER PRIMARY KEY AUTOINCREMENT,
            national_id INTEGER NOT NULL REFERENCES national(national_id),
            name TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS unit (
            unit_id INTEGER PRIMARY KEY AUTOINCREMENT,
            state_id INTEGER NOT NULL REFERENCES state(state_id),
            name TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS member (
            member_id INTEGER PRIMARY KEY AUTOINCREMENT,
            first_name TEXT NOT NULL,
            last_name TEXT NOT NULL DEFAULT '',
            unit_id INTEGER NOT NULL REFERENCES unit(unit_id),
            email TEXT,
            phone TEXT,
            mkan_id TEXT
        );

        CREATE TABLE IF NOT EXISTS department (
            department_id INTEGER PRIMARY KEY AUTOINCREMENT,
            department_name TEXT NOT NULL UNIQUE
        );

        CREATE TABLE IF NOT EXISTS level (
            level_id INTEGER PRIMARY KEY AUTOINCREMENT,
            level_type TEXT NOT NULL CHECK (level_type IN ('National', 'State', 'Unit')),
            national_id INTEGER REFERENCES national(national_id),
            state_id INTEGER REFERENCES state(state_id),
            unit_id INTEGER REFERENCES unit(unit_id)
        );

        CREATE TABLE IF NOT EXISTS level_department (
            level_department_id INTEGER PRIMARY KEY AUTOINCREMENT,
            level_id INTEGER NOT NULL REFERENCES level(level_id),
            department_id INTEGER NOT NULL REFERENCES department(department_id),
            UNIQUE (level_id, department_id)
        );

        CREATE TABLE IF NOT EXISTS member_level_department (
            member_level_department_id INTEGER PRIMARY KEY AUTOINCREMENT,
            member_id INTEGER NOT NULL REFERENCES member(member_id),
            level_department_id INTEGER NOT NULL REFERENCES level_department(level_department_id),
            created_at TEXT NOT NULL,
            source_batch_id TEXT,
            UNIQUE (member_id, level_department_id)
        );

        CREATE TABLE IF NOT EXISTS import_batch (
            batch_id TEXT PRIMARY KEY,
            file_name TEXT,
            total_rows INTEGER NOT NULL,
            success_rows INTEGER NOT NULL,
            failed_rows INTEGER NOT NULL,
            skipped_rows INTEGER NOT NULL,
            imported_at TEXT NOT NULL,
            imported_by TEXT,
            elapsed_ms INTEGER NOT NULL,
            error_report_json TEXT
        );
        "#,
    )?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [CURRENT_SCHEMA_VERSION],
    )?;

    Ok(())
}

/// 读取 schema_version（若表不存在则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> =
        conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}

/// 默认数据库路径
///
/// 优先级: 环境变量 MEMBERSHIP_REGISTRY_DB_PATH → 用户数据目录 → 当前目录
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    if let Ok(path) = std::env::var("MEMBERSHIP_REGISTRY_DB_PATH") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./membership_registry.db");

    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("membership-registry");
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("membership_registry.db");
        }
    }

    path.to_string_lossy().to_string()
}
