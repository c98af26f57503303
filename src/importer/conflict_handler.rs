// ==========================================
// 会员组织管理系统 - 重复任命检测
// ==========================================
// 职责: 检测 (member_id, level_department_id) 重复
// - 跨批次: 数据库中已存在的任命
// - 同批次: 本次运行中已排队的任命（第一次出现保留）
// ==========================================

use crate::domain::organization::NewAssignment;
use std::collections::HashSet;

/// 重复来源
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuplicateSource {
    Existing, // 数据库中已存在
    Queued,   // 本文件先前行已排队
}

pub struct DuplicateSuppressor {
    existing: HashSet<NewAssignment>,
    queued_set: HashSet<NewAssignment>,
    queued: Vec<NewAssignment>,
}

impl DuplicateSuppressor {
    pub fn from_existing(existing: &[NewAssignment]) -> Self {
        Self {
            existing: existing.iter().copied().collect(),
            queued_set: HashSet::new(),
            queued: Vec::new(),
        }
    }

    /// 检测并排队
    ///
    /// # 返回
    /// - Ok(()): 已排队
    /// - Err(DuplicateSource): 重复，未排队
    pub fn check_and_queue(&mut self, assignment: NewAssignment) -> Result<(), DuplicateSource> {
        if self.existing.contains(&assignment) {
            return Err(DuplicateSource::Existing);
        }
        if !self.queued_set.insert(assignment) {
            return Err(DuplicateSource::Queued);
        }
        self.queued.push(assignment);
        Ok(())
    }

    /// 已排队任命（保持文件顺序）
    pub fn queued(&self) -> &[NewAssignment] {
        &self.queued
    }

    pub fn into_queued(self) -> Vec<NewAssignment> {
        self.queued
    }
}
