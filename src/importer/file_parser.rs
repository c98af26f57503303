// ==========================================
// 会员组织管理系统 - CSV 解析器实现
// ==========================================
// 阶段: 文本 → 表头 + 原始行 → ExcoRecord
// ==========================================

use crate::domain::import::{ExcoRecord, ImportError};
use crate::domain::types::{ErrorSeverity, ImportErrorType};
use crate::importer::exco_importer_trait::{FileParser, RawCsv, RawRow};
use crate::importer::file_validator::HeaderLayout;
use csv::ReaderBuilder;

// ==========================================
// CSV Parser 实现
// ==========================================
pub struct CsvParser;

impl FileParser for CsvParser {
    fn parse_content(&self, content: &str) -> Result<RawCsv, ImportError> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true) // 允许行长度不一致
            .from_reader(content.as_bytes());

        // 读取表头
        let headers: Vec<String> = reader
            .headers()
            .map_err(csv_structure_error)?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        // 读取所有行
        let mut rows = Vec::new();
        for (idx, result) in reader.records().enumerate() {
            let record = result.map_err(csv_structure_error)?;
            let row_number = record
                .position()
                .map(|p| p.line() as usize)
                .unwrap_or(idx + 2);

            let fields: Vec<String> = record.iter().map(|v| v.trim().to_string()).collect();

            // 跳过完全空白的行
            if fields.iter().all(|v| v.is_empty()) {
                continue;
            }

            rows.push(RawRow { row_number, fields });
        }

        Ok(RawCsv { headers, rows })
    }
}

fn csv_structure_error(err: csv::Error) -> ImportError {
    let error_type = match err.kind() {
        csv::ErrorKind::Utf8 { .. } => ImportErrorType::MalformedData,
        _ => ImportErrorType::InvalidCsvStructure,
    };
    let mut import_error = ImportError::file_level(
        error_type,
        ErrorSeverity::Error,
        format!("CSV 解析失败: {}", err),
    );
    if let Some(pos) = err.position() {
        import_error.row_number = pos.line() as usize;
    }
    import_error
}

// ==========================================
// 字段映射: RawRow → ExcoRecord
// ==========================================
// 超出表头宽度且非空的多余字段视为数据错位（常见于姓名中未加引号的逗号），整文件拒收
pub fn map_to_exco_record(layout: &HeaderLayout, row: &RawRow) -> Result<ExcoRecord, ImportError> {
    if row.fields.len() > layout.width() {
        let overflow: Vec<&str> = row.fields[layout.width()..]
            .iter()
            .map(String::as_str)
            .filter(|v| !v.is_empty())
            .collect();
        if !overflow.is_empty() {
            let mut err = ImportError::file_level(
                ImportErrorType::MalformedData,
                ErrorSeverity::Error,
                format!(
                    "第 {} 行字段数 {} 超过表头列数 {}，多余内容: {}",
                    row.row_number,
                    row.fields.len(),
                    layout.width(),
                    overflow.join(",")
                ),
            );
            err.row_number = row.row_number;
            err.original_value = Some(row.fields.join(","));
            return Err(err);
        }
    }

    let text = |column: &str| -> String {
        layout
            .index_of(column)
            .and_then(|idx| row.fields.get(idx))
            .cloned()
            .unwrap_or_default()
    };
    let optional = |column: &str| -> Option<String> {
        let value = text(column);
        if value.is_empty() {
            None
        } else {
            Some(value)
        }
    };

    Ok(ExcoRecord {
        name: text("NAME"),
        unit: text("UNIT"),
        department: text("DEPARTMENT"),
        level: text("LEVEL"),
        email: optional("EMAIL"),
        phone: optional("PHONE"),
        mkan_id: optional("MKANID"),
        row_number: row.row_number,
    })
}
