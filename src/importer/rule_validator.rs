// ==========================================
// 会员组织管理系统 - 业务规则校验
// ==========================================
// 规则: 限制部门（VP 系列）只能在全国层级任命
// 时机: 层级解析成功之后、层级-部门查找之前
//       （否则会被更笼统的 InvalidLevelAssignment 掩盖）
// ==========================================

use crate::config::ImportPolicy;
use crate::domain::import::{ExcoRecord, ImportError};
use crate::domain::organization::{Department, Level};
use crate::domain::types::ImportErrorType;

pub struct BusinessRuleValidator<'p> {
    policy: &'p ImportPolicy,
}

impl<'p> BusinessRuleValidator<'p> {
    pub fn new(policy: &'p ImportPolicy) -> Self {
        Self { policy }
    }

    /// 部门任命范围校验
    pub fn check_department_scope(
        &self,
        department: &Department,
        level: &Level,
        record: &ExcoRecord,
    ) -> Result<(), ImportError> {
        if level.level_id == self.policy.national_level_id {
            return Ok(());
        }

        if self
            .policy
            .is_restricted_department(&department.department_name)
        {
            return Err(ImportError::row(
                ImportErrorType::RestrictedDepartmentAssignment,
                record,
                "DEPARTMENT",
                &record.department,
                format!(
                    "部门 {} 只能在全国层级任命，当前层级为 {} (level_id={})",
                    department.department_name, level.level_type, level.level_id
                ),
            ));
        }

        Ok(())
    }
}
