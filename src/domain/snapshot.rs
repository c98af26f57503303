// ==========================================
// 会员组织管理系统 - 参照数据快照
// ==========================================
// 用途: 每次导入运行开始时一次性读取，运行期间只读
// ==========================================

use crate::domain::organization::{Department, Level, LevelDepartment, Member, NewAssignment};
use serde::{Deserialize, Serialize};

// ==========================================
// MemberScope - 会员及其 Unit→State 归属
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberScope {
    pub member: Member,
    pub state_id: i64, // 通过 unit.state_id 解析
}

// ==========================================
// ReferenceSnapshot - 参照数据快照
// ==========================================
// members 按 member_id 升序，重名时“快照顺序第一条”胜出
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReferenceSnapshot {
    pub members: Vec<MemberScope>,
    pub departments: Vec<Department>,
    pub levels: Vec<Level>,
    pub level_departments: Vec<LevelDepartment>,
    pub existing_assignments: Vec<NewAssignment>,
}
