// ==========================================
// 会员组织管理系统 - 组织与职务实体
// ==========================================
// 层级: National → State → Unit → Member
// 职务: Department × Level → LevelDepartment → MemberLevelDepartment
// ==========================================

use crate::domain::types::LevelType;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// National / State / Unit - 组织层级
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct National {
    pub national_id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct State {
    pub state_id: i64,
    pub national_id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    pub unit_id: i64,
    pub state_id: i64,
    pub name: String,
}

// ==========================================
// Member - 会员
// ==========================================
// (first_name, last_name) 假定唯一，但数据库不强制
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub member_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub unit_id: i64,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub mkan_id: Option<String>, // 外部会员编号
}

impl Member {
    /// 全名（用于报告展示）
    pub fn full_name(&self) -> String {
        if self.last_name.is_empty() {
            self.first_name.clone()
        } else {
            format!("{} {}", self.first_name, self.last_name)
        }
    }
}

// ==========================================
// Department - 部门
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Department {
    pub department_id: i64,
    pub department_name: String, // 唯一
}

// ==========================================
// Level - 层级实例
// ==========================================
// 与 level_type 对应的那个外键非空（National→national_id, State→state_id, Unit→unit_id）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Level {
    pub level_id: i64,
    pub level_type: LevelType,
    pub national_id: Option<i64>,
    pub state_id: Option<i64>,
    pub unit_id: Option<i64>,
}

// ==========================================
// LevelDepartment - 层级可设部门
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelDepartment {
    pub level_department_id: i64,
    pub level_id: i64,
    pub department_id: i64,
}

// ==========================================
// MemberLevelDepartment - 职务任命
// ==========================================
// (member_id, level_department_id) 唯一
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberLevelDepartment {
    pub member_level_department_id: i64,
    pub member_id: i64,
    pub level_department_id: i64,
    pub created_at: DateTime<Utc>,
    pub source_batch_id: Option<String>,
}

// ==========================================
// NewAssignment - 待写入的职务任命
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NewAssignment {
    pub member_id: i64,
    pub level_department_id: i64,
}
