// ==========================================
// 会员组织管理系统 - EXCO 职务导入器实现
// ==========================================
// 职责: 整合导入流程，从文件到数据库
// 流程: 结构校验 → 解析 → 快照 → 逐行对账 → 规则 → 去重 → 落库
// 状态: Received → StructurallyValidated → RowsProcessed → Persisted | ValidatedOnly
//       Received → Rejected
// ==========================================

use crate::config::{ImportConfigReader, ImportPolicy};
use crate::domain::import::{ExcoRecord, ImportBatch, ImportError, ImportResult, ImportedAssignment};
use crate::domain::organization::NewAssignment;
use crate::domain::types::{ImportErrorType, ImportRunState};
use crate::importer::cancel::ImportCancelToken;
use crate::importer::conflict_handler::{DuplicateSource, DuplicateSuppressor};
use crate::importer::entity_resolver::ReferenceIndex;
use crate::importer::error::{ImporterError, ImporterResult};
use crate::importer::exco_importer_trait::{ExcoImporter, FileParser, ImportOptions};
use crate::importer::file_parser::{map_to_exco_record, CsvParser};
use crate::importer::file_validator::CsvStructuralValidator;
use crate::importer::name_parser::NameParser;
use crate::importer::rule_validator::BusinessRuleValidator;
use crate::repository::MembershipRepository;
use chrono::Utc;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

// ==========================================
// RunTracker - 单次运行状态
// ==========================================
struct RunTracker {
    batch_id: String,
    state: ImportRunState,
    started: Instant,
}

impl RunTracker {
    fn start() -> Self {
        Self {
            batch_id: Uuid::new_v4().to_string(),
            state: ImportRunState::Received,
            started: Instant::now(),
        }
    }

    fn advance(&mut self, next: ImportRunState) -> ImporterResult<()> {
        if !self.state.can_transition_to(next) {
            return Err(ImporterError::InternalError(format!(
                "非法状态迁移: {} → {}",
                self.state, next
            )));
        }
        debug!(batch_id = %self.batch_id, from = %self.state, to = %next, "导入状态迁移");
        self.state = next;
        Ok(())
    }

    fn elapsed_ms(&self) -> u64 {
        self.started.elapsed().as_millis() as u64
    }
}

/// 单行处理结果
enum RowOutcome {
    Imported(ImportedAssignment),
    Failed(ImportError),
    /// 仅会员行（部门为空），可附带严格模式下的警告
    Skipped(Option<ImportError>),
}

/// 逐行累加的计数与明细
#[derive(Default)]
struct RowTally {
    total: usize,
    skipped: usize,
    errors: Vec<ImportError>,
    imported: Vec<ImportedAssignment>,
}

impl RowTally {
    fn record(&mut self, outcome: RowOutcome) {
        self.total += 1;
        match outcome {
            RowOutcome::Imported(assignment) => self.imported.push(assignment),
            RowOutcome::Failed(err) => self.errors.push(err),
            RowOutcome::Skipped(warning) => {
                self.skipped += 1;
                self.errors.extend(warning);
            }
        }
    }

    fn failed(&self) -> usize {
        self.errors.iter().filter(|e| e.is_error()).count()
    }
}

// ==========================================
// ExcoImporterImpl - EXCO 职务导入器实现
// ==========================================
pub struct ExcoImporterImpl<R, C>
where
    R: MembershipRepository,
    C: ImportConfigReader,
{
    // 数据访问层
    repo: R,

    // 配置读取器
    config: C,

    // 导入组件
    file_parser: Box<dyn FileParser>,
    structural_validator: CsvStructuralValidator,
    name_parser: NameParser,
}

impl<R, C> ExcoImporterImpl<R, C>
where
    R: MembershipRepository,
    C: ImportConfigReader,
{
    /// 创建导入器（默认 CSV 解析器）
    pub fn new(repo: R, config: C) -> Self {
        Self::with_file_parser(repo, config, Box::new(CsvParser))
    }

    /// 创建导入器（自定义解析器）
    ///
    /// # 参数
    /// - repo: 职务导入仓储
    /// - config: 配置读取器
    /// - file_parser: 文件解析器
    pub fn with_file_parser(repo: R, config: C, file_parser: Box<dyn FileParser>) -> Self {
        Self {
            repo,
            config,
            file_parser,
            structural_validator: CsvStructuralValidator,
            name_parser: NameParser,
        }
    }

    fn reject(&self, tracker: &mut RunTracker, errors: Vec<ImportError>) -> ImporterResult<ImportResult> {
        tracker.advance(ImportRunState::Rejected)?;
        if let Some(first) = errors.iter().find(|e| e.is_error()) {
            warn!(
                batch_id = %tracker.batch_id,
                error_type = %first.error_type,
                message = %first.detailed_message,
                "文件结构校验失败，拒收"
            );
        }
        Ok(ImportResult::rejected(
            tracker.batch_id.clone(),
            errors,
            tracker.elapsed_ms(),
        ))
    }

    /// 结构校验 + 解析
    ///
    /// # 返回
    /// - Ok(Ok((records, warnings))): 可进入逐行处理
    /// - Ok(Err(errors)): 文件级拒收
    fn read_structure(
        &self,
        file_path: &Path,
        policy: &ImportPolicy,
    ) -> ImporterResult<Result<(Vec<ExcoRecord>, Vec<ImportError>), Vec<ImportError>>> {
        let size = std::fs::metadata(file_path)?.len();
        if let Err(err) = self
            .structural_validator
            .check_size(size, policy.max_file_size_bytes)
        {
            return Ok(Err(vec![err]));
        }

        let bytes = std::fs::read(file_path)?;
        let (content, encoding_warning) = self.structural_validator.decode(&bytes);
        let mut notes: Vec<ImportError> = encoding_warning.into_iter().collect();

        let raw = match self.file_parser.parse_content(&content) {
            Ok(raw) => raw,
            Err(err) => {
                notes.push(err);
                return Ok(Err(notes));
            }
        };

        let header = match self.structural_validator.validate_header(&raw.headers) {
            Ok(header) => header,
            Err(err) => {
                notes.push(err);
                return Ok(Err(notes));
            }
        };
        notes.extend(header.warnings);

        let mut records = Vec::with_capacity(raw.rows.len());
        let mut malformed = Vec::new();
        for row in &raw.rows {
            match map_to_exco_record(&header.layout, row) {
                Ok(record) => records.push(record),
                Err(err) => malformed.push(err),
            }
        }
        if !malformed.is_empty() {
            notes.extend(malformed);
            return Ok(Err(notes));
        }

        Ok(Ok((records, notes)))
    }

    /// 单行处理
    fn process_record(
        &self,
        record: &ExcoRecord,
        index: &ReferenceIndex<'_>,
        rules: &BusinessRuleValidator<'_>,
        suppressor: &mut DuplicateSuppressor,
        strict_member_rows: bool,
    ) -> RowOutcome {
        if record.department.trim().is_empty() {
            let warning = if strict_member_rows {
                self.check_member_only(record, index)
            } else {
                None
            };
            return RowOutcome::Skipped(warning);
        }

        match self.reconcile(record, index, rules, suppressor) {
            Ok(assignment) => RowOutcome::Imported(assignment),
            Err(err) => RowOutcome::Failed(err),
        }
    }

    /// 仅会员行的严格校验（只产生警告）
    fn check_member_only(&self, record: &ExcoRecord, index: &ReferenceIndex<'_>) -> Option<ImportError> {
        let name = match self.name_parser.parse(&record.name) {
            Some(name) => name,
            None => {
                return Some(
                    ImportError::row(
                        ImportErrorType::InvalidNameFormat,
                        record,
                        "NAME",
                        &record.name,
                        "仅会员行姓名为空",
                    )
                    .as_warning(),
                )
            }
        };
        index
            .resolve_member(&name, record)
            .err()
            .map(ImportError::as_warning)
    }

    /// 姓名 → 会员 → 部门 → 层级 → 限制部门 → 层级-部门 → 去重
    fn reconcile(
        &self,
        record: &ExcoRecord,
        index: &ReferenceIndex<'_>,
        rules: &BusinessRuleValidator<'_>,
        suppressor: &mut DuplicateSuppressor,
    ) -> Result<ImportedAssignment, ImportError> {
        let name = self.name_parser.parse(&record.name).ok_or_else(|| {
            ImportError::row(
                ImportErrorType::InvalidNameFormat,
                record,
                "NAME",
                &record.name,
                "姓名为空或仅含空白",
            )
        })?;

        let member = index.resolve_member(&name, record)?;
        let department = index.resolve_department(record)?;
        let level = index.resolve_level(record, member)?;
        rules.check_department_scope(department, level, record)?;
        let level_department = index.resolve_level_department(level, department, record)?;

        let assignment = NewAssignment {
            member_id: member.member.member_id,
            level_department_id: level_department.level_department_id,
        };
        suppressor.check_and_queue(assignment).map_err(|source| {
            let message = match source {
                DuplicateSource::Existing => format!(
                    "会员 {} 已担任 {} ({}) 职务",
                    member.member.full_name(),
                    department.department_name,
                    level.level_type
                ),
                DuplicateSource::Queued => format!(
                    "会员 {} 的 {} ({}) 职务在本文件中重复出现",
                    member.member.full_name(),
                    department.department_name,
                    level.level_type
                ),
            };
            ImportError::row(
                ImportErrorType::DuplicateAssignment,
                record,
                "DEPARTMENT",
                &record.department,
                message,
            )
        })?;

        Ok(ImportedAssignment {
            row_number: record.row_number,
            member_id: member.member.member_id,
            member_name: member.member.full_name(),
            department_id: department.department_id,
            department_name: department.department_name.clone(),
            level_id: level.level_id,
            level_type: level.level_type,
            level_department_id: level_department.level_department_id,
        })
    }
}

#[async_trait::async_trait]
impl<R, C> ExcoImporter for ExcoImporterImpl<R, C>
where
    R: MembershipRepository + Send + Sync,
    C: ImportConfigReader + Send + Sync,
{
    async fn import_from_csv(
        &self,
        file_path: &Path,
        options: &ImportOptions,
    ) -> ImporterResult<ImportResult> {
        self.import_from_csv_with_cancel(file_path, options, &ImportCancelToken::new())
            .await
    }

    #[instrument(skip(self, file_path, options, cancel), fields(batch_id))]
    async fn import_from_csv_with_cancel(
        &self,
        file_path: &Path,
        options: &ImportOptions,
        cancel: &ImportCancelToken,
    ) -> ImporterResult<ImportResult> {
        let mut tracker = RunTracker::start();
        tracing::Span::current().record("batch_id", tracker.batch_id.as_str());

        let file_name = options.source_name.clone().or_else(|| {
            file_path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
        });
        info!(
            batch_id = %tracker.batch_id,
            file_path = %file_path.display(),
            validate_only = options.validate_only,
            "开始导入 EXCO 职务"
        );

        if !file_path.is_file() {
            return Err(ImporterError::FileNotFound(file_path.display().to_string()));
        }

        let policy = ImportPolicy::load(&self.config).await?;
        let strict_member_rows = options
            .strict_member_rows
            .unwrap_or(policy.strict_member_rows);

        // === 步骤 1: 结构校验 ===
        debug!("步骤 1: 结构校验");
        let (records, notes) = match self.read_structure(file_path, &policy)? {
            Ok(parsed) => parsed,
            Err(errors) => return self.reject(&mut tracker, errors),
        };
        tracker.advance(ImportRunState::StructurallyValidated)?;
        info!(rows = records.len(), warnings = notes.len(), "结构校验通过");

        // === 步骤 2: 参照数据快照 ===
        debug!("步骤 2: 加载参照数据快照");
        let snapshot = self.repo.load_reference_snapshot().await?;
        let index = ReferenceIndex::build(&snapshot, policy.national_level_id);
        let rules = BusinessRuleValidator::new(&policy);
        let mut suppressor = DuplicateSuppressor::from_existing(&snapshot.existing_assignments);
        debug!(
            members = snapshot.members.len(),
            departments = snapshot.departments.len(),
            levels = snapshot.levels.len(),
            existing_assignments = snapshot.existing_assignments.len(),
            "快照加载完成"
        );

        // === 步骤 3: 逐行处理 ===
        debug!("步骤 3: 逐行对账");
        let mut tally = RowTally {
            errors: notes,
            ..RowTally::default()
        };
        for (processed, record) in records.iter().enumerate() {
            if cancel.is_cancelled() {
                warn!(processed_rows = processed, "导入已取消");
                return Err(ImporterError::Cancelled {
                    processed_rows: processed,
                });
            }
            let outcome = self.process_record(
                record,
                &index,
                &rules,
                &mut suppressor,
                strict_member_rows,
            );
            if let RowOutcome::Failed(err) = &outcome {
                debug!(
                    row_number = err.row_number,
                    error_type = %err.error_type,
                    "行处理失败"
                );
            }
            tally.record(outcome);
        }
        tracker.advance(ImportRunState::RowsProcessed)?;

        let failed = tally.failed();
        let successful = tally.imported.len();
        info!(
            total = tally.total,
            success = successful,
            failed = failed,
            skipped = tally.skipped,
            "逐行处理完成"
        );

        // === 步骤 4: 落库 ===
        let imported_assignments = if options.validate_only {
            tracker.advance(ImportRunState::ValidatedOnly)?;
            info!("仅校验模式，跳过写入");
            Vec::new()
        } else {
            let batch = ImportBatch {
                batch_id: tracker.batch_id.clone(),
                file_name,
                total_rows: tally.total as i32,
                success_rows: successful as i32,
                failed_rows: failed as i32,
                skipped_rows: tally.skipped as i32,
                imported_at: Utc::now(),
                imported_by: options.imported_by.clone(),
                elapsed_ms: tracker.elapsed_ms() as i64,
                error_report_json: if tally.errors.is_empty() {
                    None
                } else {
                    Some(serde_json::to_string(&tally.errors)?)
                },
            };
            let inserted = self
                .repo
                .persist_import(batch, suppressor.into_queued())
                .await?;
            tracker.advance(ImportRunState::Persisted)?;
            info!(inserted = inserted, "职务任命已写入");
            tally.imported
        };

        let result = ImportResult {
            batch_id: tracker.batch_id.clone(),
            state: tracker.state,
            total_records: tally.total,
            successful_imports: successful,
            failed_imports: failed,
            skipped_records: tally.skipped,
            errors: tally.errors,
            processing_time_ms: tracker.elapsed_ms(),
            imported_assignments,
        };

        info!(
            batch_id = %result.batch_id,
            state = %result.state,
            elapsed_ms = result.processing_time_ms,
            "导入完成"
        );
        Ok(result)
    }
}
