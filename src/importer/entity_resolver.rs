// ==========================================
// 会员组织管理系统 - 实体对账（参照数据索引）
// ==========================================
// 每次运行构建一次索引，逐行查找为 O(1)
// 匹配口径: TRIM + 忽略大小写的完全相等
// 会员重名: 快照顺序（member_id 升序）第一条胜出，UNIT 列不参与消歧
// ==========================================

use crate::config::import_policy::normalize_key;
use crate::domain::import::{ExcoRecord, ImportError};
use crate::domain::organization::{Department, Level, LevelDepartment};
use crate::domain::snapshot::{MemberScope, ReferenceSnapshot};
use crate::domain::types::{ImportErrorType, LevelType};
use crate::importer::name_parser::ParsedName;
use std::collections::HashMap;

pub struct ReferenceIndex<'a> {
    members: HashMap<(String, String), &'a MemberScope>,
    departments: HashMap<String, &'a Department>,
    national_level: Option<&'a Level>,
    state_levels: HashMap<i64, &'a Level>,
    unit_levels: HashMap<i64, &'a Level>,
    level_departments: HashMap<(i64, i64), &'a LevelDepartment>,
}

impl<'a> ReferenceIndex<'a> {
    /// 构建索引
    ///
    /// # 参数
    /// - snapshot: 参照数据快照
    /// - national_level_id: 全国层级的规范 level_id
    pub fn build(snapshot: &'a ReferenceSnapshot, national_level_id: i64) -> Self {
        let mut members = HashMap::new();
        for scope in &snapshot.members {
            let key = (
                normalize_key(&scope.member.first_name),
                normalize_key(&scope.member.last_name),
            );
            members.entry(key).or_insert(scope);
        }

        let mut departments = HashMap::new();
        for department in &snapshot.departments {
            departments
                .entry(normalize_key(&department.department_name))
                .or_insert(department);
        }

        let national_level = snapshot
            .levels
            .iter()
            .find(|l| l.level_id == national_level_id && l.level_type == LevelType::National);

        let mut state_levels = HashMap::new();
        let mut unit_levels = HashMap::new();
        for level in &snapshot.levels {
            match (level.state_id, level.unit_id) {
                (Some(state_id), None) => {
                    state_levels.entry(state_id).or_insert(level);
                }
                (_, Some(unit_id)) => {
                    unit_levels.entry(unit_id).or_insert(level);
                }
                _ => {}
            }
        }

        let level_departments = snapshot
            .level_departments
            .iter()
            .map(|ld| ((ld.level_id, ld.department_id), ld))
            .collect();

        Self {
            members,
            departments,
            national_level,
            state_levels,
            unit_levels,
            level_departments,
        }
    }

    /// 会员查找
    pub fn resolve_member(
        &self,
        name: &ParsedName,
        record: &ExcoRecord,
    ) -> Result<&'a MemberScope, ImportError> {
        let key = (normalize_key(&name.first_name), normalize_key(&name.last_name));
        self.members.get(&key).copied().ok_or_else(|| {
            ImportError::row(
                ImportErrorType::MemberNotFound,
                record,
                "NAME",
                &record.name,
                format!(
                    "未找到会员: 名=\"{}\" 姓=\"{}\"",
                    name.first_name, name.last_name
                ),
            )
        })
    }

    /// 部门查找
    pub fn resolve_department(&self, record: &ExcoRecord) -> Result<&'a Department, ImportError> {
        self.departments
            .get(&normalize_key(&record.department))
            .copied()
            .ok_or_else(|| {
                ImportError::row(
                    ImportErrorType::DepartmentNotFound,
                    record,
                    "DEPARTMENT",
                    &record.department,
                    format!("未找到部门: {}", record.department.trim()),
                )
            })
    }

    /// 层级解析（LEVEL 为空时按 Unit 处理）
    pub fn resolve_level(
        &self,
        record: &ExcoRecord,
        member: &MemberScope,
    ) -> Result<&'a Level, ImportError> {
        let raw = record.level.trim();
        let level_type = if raw.is_empty() {
            Some(LevelType::Unit)
        } else {
            LevelType::from_str(raw)
        };

        let not_found = |message: String| {
            ImportError::row(
                ImportErrorType::LevelNotFound,
                record,
                "LEVEL",
                &record.level,
                message,
            )
        };

        match level_type {
            Some(LevelType::National) => self
                .national_level
                .ok_or_else(|| not_found("未配置全国层级".to_string())),
            Some(LevelType::State) => {
                self.state_levels
                    .get(&member.state_id)
                    .copied()
                    .ok_or_else(|| {
                        not_found(format!("会员所属州 (state_id={}) 无州层级", member.state_id))
                    })
            }
            Some(LevelType::Unit) => self
                .unit_levels
                .get(&member.member.unit_id)
                .copied()
                .ok_or_else(|| {
                    not_found(format!(
                        "会员所属单位 (unit_id={}) 无单位层级",
                        member.member.unit_id
                    ))
                }),
            None => Err(not_found(format!(
                "无法识别的层级: {}（可选 National / State / Unit）",
                raw
            ))),
        }
    }

    /// 层级-部门查找
    pub fn resolve_level_department(
        &self,
        level: &Level,
        department: &Department,
        record: &ExcoRecord,
    ) -> Result<&'a LevelDepartment, ImportError> {
        self.level_departments
            .get(&(level.level_id, department.department_id))
            .copied()
            .ok_or_else(|| {
                ImportError::row(
                    ImportErrorType::InvalidLevelAssignment,
                    record,
                    "DEPARTMENT",
                    &record.department,
                    format!(
                        "部门 {} 未在 {} 层级 (level_id={}) 开设",
                        department.department_name, level.level_type, level.level_id
                    ),
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::organization::Member;

    fn member(member_id: i64, first: &str, last: &str, unit_id: i64, state_id: i64) -> MemberScope {
        MemberScope {
            member: Member {
                member_id,
                first_name: first.to_string(),
                last_name: last.to_string(),
                unit_id,
                email: None,
                phone: None,
                mkan_id: None,
            },
            state_id,
        }
    }

    fn level(level_id: i64, level_type: LevelType, state_id: Option<i64>, unit_id: Option<i64>) -> Level {
        Level {
            level_id,
            level_type,
            national_id: if level_type == LevelType::National { Some(1) } else { None },
            state_id,
            unit_id,
        }
    }

    fn snapshot() -> ReferenceSnapshot {
        ReferenceSnapshot {
            members: vec![
                member(1, "Jane", "Doe", 10, 100),
                member(2, "jane", "DOE", 11, 100),
                member(3, "Cher", "", 11, 100),
            ],
            departments: vec![
                Department {
                    department_id: 1,
                    department_name: "Finance".to_string(),
                },
                Department {
                    department_id: 2,
                    department_name: "VP Admin".to_string(),
                },
            ],
            levels: vec![
                level(1, LevelType::National, None, None),
                level(2, LevelType::State, Some(100), None),
                level(3, LevelType::Unit, None, Some(10)),
            ],
            level_departments: vec![LevelDepartment {
                level_department_id: 7,
                level_id: 3,
                department_id: 1,
            }],
            existing_assignments: vec![],
        }
    }

    fn record(name: &str, department: &str, level: &str) -> ExcoRecord {
        ExcoRecord {
            name: name.to_string(),
            unit: "UnitA".to_string(),
            department: department.to_string(),
            level: level.to_string(),
            row_number: 2,
            ..ExcoRecord::default()
        }
    }

    fn name(first: &str, last: &str) -> ParsedName {
        ParsedName {
            first_name: first.to_string(),
            last_name: last.to_string(),
        }
    }

    #[test]
    fn test_member_first_match_wins() {
        let snap = snapshot();
        let index = ReferenceIndex::build(&snap, 1);
        let found = index
            .resolve_member(&name("JANE", "doe"), &record("JANE doe", "Finance", ""))
            .unwrap();
        assert_eq!(found.member.member_id, 1);
    }

    #[test]
    fn test_single_token_member() {
        let snap = snapshot();
        let index = ReferenceIndex::build(&snap, 1);
        let found = index
            .resolve_member(&name("cher", ""), &record("cher", "Finance", ""))
            .unwrap();
        assert_eq!(found.member.member_id, 3);
    }

    #[test]
    fn test_member_not_found() {
        let snap = snapshot();
        let index = ReferenceIndex::build(&snap, 1);
        let err = index
            .resolve_member(&name("John", "Roe"), &record("John Roe", "Finance", ""))
            .unwrap_err();
        assert_eq!(err.error_type, ImportErrorType::MemberNotFound);
        assert_eq!(err.field_name.as_deref(), Some("NAME"));
    }

    #[test]
    fn test_department_trimmed_case_insensitive() {
        let snap = snapshot();
        let index = ReferenceIndex::build(&snap, 1);
        let dept = index
            .resolve_department(&record("Jane Doe", "  fInAnCe ", ""))
            .unwrap();
        assert_eq!(dept.department_id, 1);

        let err = index
            .resolve_department(&record("Jane Doe", "Treasury", ""))
            .unwrap_err();
        assert_eq!(err.error_type, ImportErrorType::DepartmentNotFound);
    }

    #[test]
    fn test_level_resolution() {
        let snap = snapshot();
        let index = ReferenceIndex::build(&snap, 1);
        let jane = &snap.members[0];
        let other = &snap.members[1];

        assert_eq!(index.resolve_level(&record("", "", ""), jane).unwrap().level_id, 3);
        assert_eq!(index.resolve_level(&record("", "", "unit"), jane).unwrap().level_id, 3);
        assert_eq!(index.resolve_level(&record("", "", "State"), jane).unwrap().level_id, 2);
        assert_eq!(index.resolve_level(&record("", "", "NATIONAL"), jane).unwrap().level_id, 1);

        // unit 11 无单位层级
        let err = index.resolve_level(&record("", "", "Unit"), other).unwrap_err();
        assert_eq!(err.error_type, ImportErrorType::LevelNotFound);

        let err = index.resolve_level(&record("", "", "Zone"), jane).unwrap_err();
        assert_eq!(err.error_type, ImportErrorType::LevelNotFound);
    }

    #[test]
    fn test_national_level_requires_configured_id() {
        let snap = snapshot();
        let index = ReferenceIndex::build(&snap, 99);
        let err = index
            .resolve_level(&record("", "", "National"), &snap.members[0])
            .unwrap_err();
        assert_eq!(err.error_type, ImportErrorType::LevelNotFound);
    }

    #[test]
    fn test_level_department_lookup() {
        let snap = snapshot();
        let index = ReferenceIndex::build(&snap, 1);
        let rec = record("Jane Doe", "Finance", "");

        let ld = index
            .resolve_level_department(&snap.levels[2], &snap.departments[0], &rec)
            .unwrap();
        assert_eq!(ld.level_department_id, 7);

        let err = index
            .resolve_level_department(&snap.levels[1], &snap.departments[0], &rec)
            .unwrap_err();
        assert_eq!(err.error_type, ImportErrorType::InvalidLevelAssignment);
    }
}
