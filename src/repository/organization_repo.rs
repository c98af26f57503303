use crate::db::open_sqlite_connection;
use crate::domain::{Department, Level, LevelDepartment, LevelType, Member, National, State, Unit};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex};

// ==========================================
// OrganizationRepository - 组织层级仓储
// ==========================================
/// 组织层级仓储
/// 职责: national / state / unit / member / department / level / level_department 的增查
/// 红线: 不含业务逻辑，只负责数据访问
pub struct OrganizationRepository {
    conn: Arc<Mutex<Connection>>,
}

impl OrganizationRepository {
    /// 创建新的 OrganizationRepository 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    // ===== 组织层级 =====

    pub fn create_national(&self, name: &str) -> RepositoryResult<National> {
        let conn = self.get_conn()?;
        conn.execute("INSERT INTO national (name) VALUES (?1)", params![name])?;
        Ok(National {
            national_id: conn.last_insert_rowid(),
            name: name.to_string(),
        })
    }

    pub fn create_state(&self, national_id: i64, name: &str) -> RepositoryResult<State> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO state (national_id, name) VALUES (?1, ?2)",
            params![national_id, name],
        )?;
        Ok(State {
            state_id: conn.last_insert_rowid(),
            national_id,
            name: name.to_string(),
        })
    }

    pub fn create_unit(&self, state_id: i64, name: &str) -> RepositoryResult<Unit> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO unit (state_id, name) VALUES (?1, ?2)",
            params![state_id, name],
        )?;
        Ok(Unit {
            unit_id: conn.last_insert_rowid(),
            state_id,
            name: name.to_string(),
        })
    }

    pub fn list_units(&self) -> RepositoryResult<Vec<Unit>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare("SELECT unit_id, state_id, name FROM unit ORDER BY unit_id")?;
        let rows = stmt.query_map([], |row| {
            Ok(Unit {
                unit_id: row.get(0)?,
                state_id: row.get(1)?,
                name: row.get(2)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    // ===== 会员 =====

    /// 新增会员（member_id 由数据库分配，入参中的 member_id 被忽略）
    pub fn create_member(&self, member: &Member) -> RepositoryResult<Member> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO member (first_name, last_name, unit_id, email, phone, mkan_id)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                member.first_name,
                member.last_name,
                member.unit_id,
                member.email,
                member.phone,
                member.mkan_id,
            ],
        )?;
        Ok(Member {
            member_id: conn.last_insert_rowid(),
            ..member.clone()
        })
    }

    pub fn find_member_by_id(&self, member_id: i64) -> RepositoryResult<Option<Member>> {
        let conn = self.get_conn()?;
        let member = conn
            .query_row(
                r#"
                SELECT member_id, first_name, last_name, unit_id, email, phone, mkan_id
                FROM member WHERE member_id = ?1
                "#,
                params![member_id],
                |row| {
                    Ok(Member {
                        member_id: row.get(0)?,
                        first_name: row.get(1)?,
                        last_name: row.get(2)?,
                        unit_id: row.get(3)?,
                        email: row.get(4)?,
                        phone: row.get(5)?,
                        mkan_id: row.get(6)?,
                    })
                },
            )
            .optional()?;
        Ok(member)
    }

    pub fn list_members_by_unit(&self, unit_id: i64) -> RepositoryResult<Vec<Member>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT member_id, first_name, last_name, unit_id, email, phone, mkan_id
            FROM member WHERE unit_id = ?1 ORDER BY member_id
            "#,
        )?;
        let rows = stmt.query_map(params![unit_id], |row| {
            Ok(Member {
                member_id: row.get(0)?,
                first_name: row.get(1)?,
                last_name: row.get(2)?,
                unit_id: row.get(3)?,
                email: row.get(4)?,
                phone: row.get(5)?,
                mkan_id: row.get(6)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    // ===== 部门与层级 =====

    pub fn create_department(&self, department_name: &str) -> RepositoryResult<Department> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO department (department_name) VALUES (?1)",
            params![department_name],
        )?;
        Ok(Department {
            department_id: conn.last_insert_rowid(),
            department_name: department_name.to_string(),
        })
    }

    /// 新增层级实例
    ///
    /// # 参数
    /// - level_type: 层级类型
    /// - scope_id: 与层级类型对应的 national_id / state_id / unit_id
    pub fn create_level(&self, level_type: LevelType, scope_id: i64) -> RepositoryResult<Level> {
        let (national_id, state_id, unit_id) = match level_type {
            LevelType::National => (Some(scope_id), None, None),
            LevelType::State => (None, Some(scope_id), None),
            LevelType::Unit => (None, None, Some(scope_id)),
        };

        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO level (level_type, national_id, state_id, unit_id)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![level_type.to_db_str(), national_id, state_id, unit_id],
        )?;
        Ok(Level {
            level_id: conn.last_insert_rowid(),
            level_type,
            national_id,
            state_id,
            unit_id,
        })
    }

    /// 声明某部门可在某层级任命
    pub fn create_level_department(
        &self,
        level_id: i64,
        department_id: i64,
    ) -> RepositoryResult<LevelDepartment> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO level_department (level_id, department_id) VALUES (?1, ?2)",
            params![level_id, department_id],
        )?;
        Ok(LevelDepartment {
            level_department_id: conn.last_insert_rowid(),
            level_id,
            department_id,
        })
    }

    /// 某层级可任命的部门列表
    pub fn list_departments_for_level(&self, level_id: i64) -> RepositoryResult<Vec<Department>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT d.department_id, d.department_name
            FROM level_department ld
            JOIN department d ON d.department_id = ld.department_id
            WHERE ld.level_id = ?1
            ORDER BY d.department_name
            "#,
        )?;
        let rows = stmt.query_map(params![level_id], |row| {
            Ok(Department {
                department_id: row.get(0)?,
                department_name: row.get(1)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}
