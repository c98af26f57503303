// ==========================================
// 会员组织管理系统 - 职务导入 Repository Trait
// ==========================================
// 职责: 定义导入相关数据访问接口（不包含业务逻辑）
// 红线: Repository 不含业务规则，只做数据读写
// ==========================================

use crate::domain::{ImportBatch, MemberLevelDepartment, NewAssignment, ReferenceSnapshot};
use crate::repository::error::RepositoryResult;
use async_trait::async_trait;

// ==========================================
// MembershipRepository Trait
// ==========================================
// 用途: 导入运行的唯一 I/O 边界（开始读一次，结束写一次）
// 实现者: MembershipRepositoryImpl（使用 rusqlite）
#[async_trait]
pub trait MembershipRepository: Send + Sync {
    /// 一次性读取参照数据快照
    ///
    /// # 返回
    /// - members（含 Unit→State 归属，按 member_id 升序）
    /// - departments / levels / level_departments
    /// - 已存在的职务任命 (member_id, level_department_id)
    async fn load_reference_snapshot(&self) -> RepositoryResult<ReferenceSnapshot>;

    /// 单事务写入：批量插入职务任命 + 批次记录
    ///
    /// # 返回
    /// - Ok(usize): 插入的职务任命数
    /// - Err: 数据库错误（整个事务回滚，含唯一约束冲突）
    async fn persist_import(
        &self,
        batch: ImportBatch,
        assignments: Vec<NewAssignment>,
    ) -> RepositoryResult<usize>;

    /// 最近的导入批次（按导入时间倒序）
    async fn list_import_batches(&self, limit: i64) -> RepositoryResult<Vec<ImportBatch>>;

    /// 查询会员的职务任命
    async fn list_member_assignments(
        &self,
        member_id: i64,
    ) -> RepositoryResult<Vec<MemberLevelDepartment>>;

    /// 职务任命总数
    async fn count_assignments(&self) -> RepositoryResult<i64>;
}
