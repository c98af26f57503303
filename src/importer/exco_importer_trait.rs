// ==========================================
// 会员组织管理系统 - EXCO 导入 Trait
// ==========================================
// 职责: 定义职务导入接口（不包含实现）
// ==========================================

use crate::domain::import::{ImportError, ImportResult};
use crate::importer::cancel::ImportCancelToken;
use crate::importer::error::ImporterResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;

// ==========================================
// ImportOptions - 单次导入参数
// ==========================================
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImportOptions {
    /// 仅校验（dry run），不写库
    pub validate_only: bool,
    /// 覆盖配置中的“仅会员行”严格校验开关；None 表示沿用配置
    pub strict_member_rows: Option<bool>,
    /// 操作人
    pub imported_by: Option<String>,
    /// 源文件名（上传场景下暂存文件名无意义，由调用方传入原始文件名）
    pub source_name: Option<String>,
}

impl ImportOptions {
    pub fn validate_only() -> Self {
        Self {
            validate_only: true,
            ..Self::default()
        }
    }
}

// ==========================================
// ExcoImporter Trait
// ==========================================
// 用途: 职务导入主接口
// 实现者: ExcoImporterImpl
#[async_trait]
pub trait ExcoImporter: Send + Sync {
    /// 从 CSV 文件导入 EXCO 职务任命
    ///
    /// # 返回
    /// - Ok(ImportResult): 导入结果（含拒收 / 部分成功 / dry run）
    /// - Err: 运行级致命错误（文件不可读、数据库错误、取消）
    ///
    /// # 导入流程
    /// 1. 结构校验（大小 / 编码 / 表头）
    /// 2. 一次性加载参照数据快照
    /// 3. 逐行: 姓名解析 → 实体对账 → 业务规则 → 去重
    /// 4. 单事务批量落库（validate_only 时跳过）
    async fn import_from_csv(
        &self,
        file_path: &Path,
        options: &ImportOptions,
    ) -> ImporterResult<ImportResult>;

    /// 同上，支持行间取消
    async fn import_from_csv_with_cancel(
        &self,
        file_path: &Path,
        options: &ImportOptions,
        cancel: &ImportCancelToken,
    ) -> ImporterResult<ImportResult>;
}

// ==========================================
// RawCsv - 原始解析结果
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct RawCsv {
    pub headers: Vec<String>,
    pub rows: Vec<RawRow>,
}

#[derive(Debug, Clone)]
pub struct RawRow {
    pub row_number: usize, // 文件行号（表头为第 1 行）
    pub fields: Vec<String>,
}

// ==========================================
// FileParser Trait
// ==========================================
// 用途: 文本 → 表头 + 原始行
// 实现者: CsvParser
pub trait FileParser: Send + Sync {
    /// 解析已解码的文本内容
    ///
    /// # 返回
    /// - Ok(RawCsv): 表头与非空数据行
    /// - Err(ImportError): 文件级错误（InvalidCsvStructure），整个运行拒收
    fn parse_content(&self, content: &str) -> Result<RawCsv, ImportError>;
}
