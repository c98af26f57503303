// ==========================================
// 会员组织管理系统 - 职务导入 Repository 实现
// ==========================================
// 职责: 实现导入相关数据访问（使用 rusqlite）
// 红线: Repository 不含业务规则，只做数据读写
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::{
    Department, ImportBatch, Level, LevelDepartment, LevelType, Member, MemberLevelDepartment,
    MemberScope, NewAssignment, ReferenceSnapshot,
};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::membership_repo::MembershipRepository;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Transaction};
use std::sync::{Arc, Mutex};
use tracing::{debug, instrument};

fn parse_rfc3339(raw: &str, field: &str) -> RepositoryResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::FieldValueError {
            field: field.to_string(),
            message: format!("{} ({})", e, raw),
        })
}

// ==========================================
// MembershipRepositoryImpl
// ==========================================
pub struct MembershipRepositoryImpl {
    conn: Arc<Mutex<Connection>>,
}

impl MembershipRepositoryImpl {
    /// 创建新的 Repository 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建（与 OrganizationRepository / ConfigManager 共享连接）
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn lock(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn load_members(conn: &Connection) -> RepositoryResult<Vec<MemberScope>> {
        let mut stmt = conn.prepare(
            r#"
            SELECT m.member_id, m.first_name, m.last_name, m.unit_id,
                   m.email, m.phone, m.mkan_id, u.state_id
            FROM member m
            JOIN unit u ON u.unit_id = m.unit_id
            ORDER BY m.member_id
            "#,
        )?;

        let rows = stmt.query_map([], |row| {
            Ok(MemberScope {
                member: Member {
                    member_id: row.get(0)?,
                    first_name: row.get(1)?,
                    last_name: row.get(2)?,
                    unit_id: row.get(3)?,
                    email: row.get(4)?,
                    phone: row.get(5)?,
                    mkan_id: row.get(6)?,
                },
                state_id: row.get(7)?,
            })
        })?;

        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn load_departments(conn: &Connection) -> RepositoryResult<Vec<Department>> {
        let mut stmt = conn.prepare(
            "SELECT department_id, department_name FROM department ORDER BY department_id",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(Department {
                department_id: row.get(0)?,
                department_name: row.get(1)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn load_levels(conn: &Connection) -> RepositoryResult<Vec<Level>> {
        let mut stmt = conn.prepare(
            r#"
            SELECT level_id, level_type, national_id, state_id, unit_id
            FROM level
            ORDER BY level_id
            "#,
        )?;

        let raw_rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, Option<i64>>(2)?,
                    row.get::<_, Option<i64>>(3)?,
                    row.get::<_, Option<i64>>(4)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        raw_rows
            .into_iter()
            .map(|(level_id, level_type, national_id, state_id, unit_id)| {
                let level_type = LevelType::from_str(&level_type).ok_or_else(|| {
                    RepositoryError::FieldValueError {
                        field: "level_type".to_string(),
                        message: format!("未知层级类型: {}", level_type),
                    }
                })?;
                Ok(Level {
                    level_id,
                    level_type,
                    national_id,
                    state_id,
                    unit_id,
                })
            })
            .collect()
    }

    fn load_level_departments(conn: &Connection) -> RepositoryResult<Vec<LevelDepartment>> {
        let mut stmt = conn.prepare(
            r#"
            SELECT level_department_id, level_id, department_id
            FROM level_department
            ORDER BY level_department_id
            "#,
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(LevelDepartment {
                level_department_id: row.get(0)?,
                level_id: row.get(1)?,
                department_id: row.get(2)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn load_existing_assignments(conn: &Connection) -> RepositoryResult<Vec<NewAssignment>> {
        let mut stmt =
            conn.prepare("SELECT member_id, level_department_id FROM member_level_department")?;
        let rows = stmt.query_map([], |row| {
            Ok(NewAssignment {
                member_id: row.get(0)?,
                level_department_id: row.get(1)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// 在事务中批量插入职务任命
    fn batch_insert_assignments_tx(
        tx: &Transaction,
        batch_id: &str,
        created_at: &str,
        assignments: &[NewAssignment],
    ) -> RepositoryResult<usize> {
        let mut stmt = tx.prepare(
            r#"
            INSERT INTO member_level_department (
                member_id, level_department_id, created_at, source_batch_id
            ) VALUES (?1, ?2, ?3, ?4)
            "#,
        )?;

        let mut count = 0;
        for assignment in assignments {
            stmt.execute(params![
                assignment.member_id,
                assignment.level_department_id,
                created_at,
                batch_id,
            ])?;
            count += 1;
        }

        Ok(count)
    }

    fn insert_batch_tx(tx: &Transaction, batch: &ImportBatch) -> RepositoryResult<()> {
        tx.execute(
            r#"
            INSERT INTO import_batch (
                batch_id, file_name, total_rows, success_rows, failed_rows,
                skipped_rows, imported_at, imported_by, elapsed_ms, error_report_json
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
            params![
                batch.batch_id,
                batch.file_name,
                batch.total_rows,
                batch.success_rows,
                batch.failed_rows,
                batch.skipped_rows,
                batch.imported_at.to_rfc3339(),
                batch.imported_by,
                batch.elapsed_ms,
                batch.error_report_json,
            ],
        )?;
        Ok(())
    }
}

#[async_trait]
impl MembershipRepository for MembershipRepositoryImpl {
    #[instrument(skip(self))]
    async fn load_reference_snapshot(&self) -> RepositoryResult<ReferenceSnapshot> {
        let conn = self.lock()?;

        let snapshot = ReferenceSnapshot {
            members: Self::load_members(&conn)?,
            departments: Self::load_departments(&conn)?,
            levels: Self::load_levels(&conn)?,
            level_departments: Self::load_level_departments(&conn)?,
            existing_assignments: Self::load_existing_assignments(&conn)?,
        };

        debug!(
            members = snapshot.members.len(),
            departments = snapshot.departments.len(),
            levels = snapshot.levels.len(),
            level_departments = snapshot.level_departments.len(),
            existing_assignments = snapshot.existing_assignments.len(),
            "参照数据快照加载完成"
        );

        Ok(snapshot)
    }

    #[instrument(skip(self, batch, assignments), fields(batch_id = %batch.batch_id, count = assignments.len()))]
    async fn persist_import(
        &self,
        batch: ImportBatch,
        assignments: Vec<NewAssignment>,
    ) -> RepositoryResult<usize> {
        let conn = self.lock()?;
        let tx = conn.unchecked_transaction()?;

        let created_at = batch.imported_at.to_rfc3339();
        let count =
            Self::batch_insert_assignments_tx(&tx, &batch.batch_id, &created_at, &assignments)?;
        Self::insert_batch_tx(&tx, &batch)?;

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok(count)
    }

    async fn list_import_batches(&self, limit: i64) -> RepositoryResult<Vec<ImportBatch>> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT batch_id, file_name, total_rows, success_rows, failed_rows,
                   skipped_rows, imported_at, imported_by, elapsed_ms, error_report_json
            FROM import_batch
            ORDER BY imported_at DESC
            LIMIT ?1
            "#,
        )?;

        let raw_rows = stmt
            .query_map(params![limit], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, Option<String>>(1)?,
                    row.get::<_, i32>(2)?,
                    row.get::<_, i32>(3)?,
                    row.get::<_, i32>(4)?,
                    row.get::<_, i32>(5)?,
                    row.get::<_, String>(6)?,
                    row.get::<_, Option<String>>(7)?,
                    row.get::<_, i64>(8)?,
                    row.get::<_, Option<String>>(9)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        raw_rows
            .into_iter()
            .map(|r| {
                Ok(ImportBatch {
                    batch_id: r.0,
                    file_name: r.1,
                    total_rows: r.2,
                    success_rows: r.3,
                    failed_rows: r.4,
                    skipped_rows: r.5,
                    imported_at: parse_rfc3339(&r.6, "imported_at")?,
                    imported_by: r.7,
                    elapsed_ms: r.8,
                    error_report_json: r.9,
                })
            })
            .collect()
    }

    async fn list_member_assignments(
        &self,
        member_id: i64,
    ) -> RepositoryResult<Vec<MemberLevelDepartment>> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT member_level_department_id, member_id, level_department_id,
                   created_at, source_batch_id
            FROM member_level_department
            WHERE member_id = ?1
            ORDER BY member_level_department_id
            "#,
        )?;

        let raw_rows = stmt
            .query_map(params![member_id], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, i64>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, Option<String>>(4)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        raw_rows
            .into_iter()
            .map(|r| {
                Ok(MemberLevelDepartment {
                    member_level_department_id: r.0,
                    member_id: r.1,
                    level_department_id: r.2,
                    created_at: parse_rfc3339(&r.3, "created_at")?,
                    source_batch_id: r.4,
                })
            })
            .collect()
    }

    async fn count_assignments(&self) -> RepositoryResult<i64> {
        let conn = self.lock()?;
        let count = conn.query_row("SELECT COUNT(*) FROM member_level_department", [], |row| {
            row.get(0)
        })?;
        Ok(count)
    }
}
