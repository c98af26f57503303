// ==========================================
// 会员组织管理系统 - CSV 结构校验（预检）
// ==========================================
// 顺序: 空文件 → 大小上限 → 编码嗅探（软校验） → 表头
// 任一 Error 级结果即拒收整个文件，不处理任何数据行
// ==========================================

use crate::domain::import::ImportError;
use crate::domain::types::{ErrorSeverity, ImportErrorType};
use encoding_rs::{UTF_16BE, UTF_16LE, UTF_8, WINDOWS_1252};
use std::collections::HashMap;

/// 必需列
pub const REQUIRED_COLUMNS: [&str; 3] = ["NAME", "UNIT", "DEPARTMENT"];

/// 可选列
pub const OPTIONAL_COLUMNS: [&str; 4] = ["LEVEL", "EMAIL", "PHONE", "MKANID"];

const UTF8_BOM: [u8; 3] = [0xEF, 0xBB, 0xBF];

// ==========================================
// EncodingSniff - 编码嗅探结果
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodingSniff {
    Utf8,
    Utf8Bom,
    Utf16Le,
    Utf16Be,
    Utf32Le,
    Utf32Be,
    NonUtf8, // 无 BOM 且不是合法 UTF-8
}

impl EncodingSniff {
    fn label(&self) -> &'static str {
        match self {
            EncodingSniff::Utf8 => "UTF-8",
            EncodingSniff::Utf8Bom => "UTF-8 (BOM)",
            EncodingSniff::Utf16Le => "UTF-16 LE",
            EncodingSniff::Utf16Be => "UTF-16 BE",
            EncodingSniff::Utf32Le => "UTF-32 LE",
            EncodingSniff::Utf32Be => "UTF-32 BE",
            EncodingSniff::NonUtf8 => "非 UTF-8",
        }
    }

    fn decoded_as(&self) -> &'static str {
        match self {
            EncodingSniff::NonUtf8 => "Windows-1252",
            other => other.label(),
        }
    }

    fn bom_len(&self) -> usize {
        match self {
            EncodingSniff::Utf8Bom => 3,
            EncodingSniff::Utf16Le | EncodingSniff::Utf16Be => 2,
            EncodingSniff::Utf32Le | EncodingSniff::Utf32Be => 4,
            EncodingSniff::Utf8 | EncodingSniff::NonUtf8 => 0,
        }
    }
}

// 不完整的尾部字节与非法码点替换为 U+FFFD
fn decode_utf32(body: &[u8], to_u32: fn([u8; 4]) -> u32) -> String {
    let chunks = body.chunks_exact(4);
    let has_tail = !chunks.remainder().is_empty();
    let mut content: String = chunks
        .map(|chunk| {
            let unit = to_u32([chunk[0], chunk[1], chunk[2], chunk[3]]);
            char::from_u32(unit).unwrap_or(char::REPLACEMENT_CHARACTER)
        })
        .collect();
    if has_tail {
        content.push(char::REPLACEMENT_CHARACTER);
    }
    content
}

// ==========================================
// HeaderLayout - 表头列位置
// ==========================================
// 列名归一化: TRIM + 大写 + 去掉空白与下划线（"Mkan_Id" → "MKANID"）
#[derive(Debug, Clone)]
pub struct HeaderLayout {
    columns: HashMap<String, usize>,
    width: usize,
}

impl HeaderLayout {
    pub fn index_of(&self, column: &str) -> Option<usize> {
        self.columns.get(column).copied()
    }

    pub fn width(&self) -> usize {
        self.width
    }
}

/// 表头校验结果（含非致命警告）
#[derive(Debug, Clone)]
pub struct HeaderCheck {
    pub layout: HeaderLayout,
    pub warnings: Vec<ImportError>,
}

pub fn normalize_column_name(raw: &str) -> String {
    raw.trim()
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '_')
        .flat_map(char::to_uppercase)
        .collect()
}

// ==========================================
// CsvStructuralValidator
// ==========================================
pub struct CsvStructuralValidator;

impl CsvStructuralValidator {
    /// 空文件 / 大小上限
    pub fn check_size(&self, size: u64, max_size: u64) -> Result<(), ImportError> {
        if size == 0 {
            return Err(ImportError::file_level(
                ImportErrorType::EmptyFile,
                ErrorSeverity::Error,
                "上传文件为空（0 字节）",
            ));
        }

        if size > max_size {
            return Err(ImportError::file_level(
                ImportErrorType::FileSizeExceeded,
                ErrorSeverity::Error,
                format!("文件大小 {} 字节超过上限 {} 字节", size, max_size),
            ));
        }

        Ok(())
    }

    /// 编码嗅探（只看 BOM 与 UTF-8 合法性）
    pub fn sniff_encoding(&self, bytes: &[u8]) -> EncodingSniff {
        // UTF-32 LE 的 BOM 以 UTF-16 LE 的 BOM 开头，需先判断
        if bytes.starts_with(&[0xFF, 0xFE, 0x00, 0x00]) {
            EncodingSniff::Utf32Le
        } else if bytes.starts_with(&[0x00, 0x00, 0xFE, 0xFF]) {
            EncodingSniff::Utf32Be
        } else if bytes.starts_with(&UTF8_BOM) {
            EncodingSniff::Utf8Bom
        } else if bytes.starts_with(&[0xFF, 0xFE]) {
            EncodingSniff::Utf16Le
        } else if bytes.starts_with(&[0xFE, 0xFF]) {
            EncodingSniff::Utf16Be
        } else if std::str::from_utf8(bytes).is_ok() {
            EncodingSniff::Utf8
        } else {
            EncodingSniff::NonUtf8
        }
    }

    /// 解码为文本
    ///
    /// # 规则
    /// - UTF-8（含 BOM）: 去掉 BOM，无警告
    /// - UTF-16 LE/BE: 按 BOM 指示的编码解码
    /// - UTF-32 LE/BE: 按 4 字节码点解码（encoding_rs 不支持 UTF-32）
    /// - 无 BOM 且不是合法 UTF-8: 按 Windows-1252 解码（覆盖 Latin-1 可见字符）
    ///
    /// # 返回
    /// - String: 解码后的内容（不含 BOM）
    /// - Option<ImportError>: 非 UTF-8 编码时的 Warning（不阻断）
    pub fn decode(&self, bytes: &[u8]) -> (String, Option<ImportError>) {
        let sniff = self.sniff_encoding(bytes);
        let body = &bytes[sniff.bom_len()..];

        let content = match sniff {
            EncodingSniff::Utf8 | EncodingSniff::Utf8Bom => {
                UTF_8.decode_without_bom_handling(body).0.into_owned()
            }
            EncodingSniff::Utf16Le => UTF_16LE.decode_without_bom_handling(body).0.into_owned(),
            EncodingSniff::Utf16Be => UTF_16BE.decode_without_bom_handling(body).0.into_owned(),
            EncodingSniff::Utf32Le => decode_utf32(body, u32::from_le_bytes),
            EncodingSniff::Utf32Be => decode_utf32(body, u32::from_be_bytes),
            EncodingSniff::NonUtf8 => WINDOWS_1252.decode_without_bom_handling(body).0.into_owned(),
        };

        let warning = match sniff {
            EncodingSniff::Utf8 | EncodingSniff::Utf8Bom => None,
            other => Some(ImportError::file_level(
                ImportErrorType::UnicodeEncodingError,
                ErrorSeverity::Warning,
                format!(
                    "检测到 {} 编码（已按 {} 解码），建议另存为 UTF-8 后重新导入",
                    other.label(),
                    other.decoded_as()
                ),
            )),
        };

        (content, warning)
    }

    /// 表头校验
    ///
    /// # 规则
    /// - 表头缺失或全为空白 → Error（拒收）
    /// - 缺少必需列 → Error（拒收），列出缺失列
    /// - 未知列 / 重复列 → Warning（继续处理）
    pub fn validate_header(&self, headers: &[String]) -> Result<HeaderCheck, ImportError> {
        if headers.iter().all(|h| h.trim().is_empty()) {
            return Err(ImportError::file_level(
                ImportErrorType::HeaderValidationFailed,
                ErrorSeverity::Error,
                "缺少表头行",
            ));
        }

        let mut columns: HashMap<String, usize> = HashMap::new();
        let mut unknown = Vec::new();
        let mut duplicated = Vec::new();

        for (idx, raw) in headers.iter().enumerate() {
            let name = normalize_column_name(raw);
            if name.is_empty() {
                continue;
            }
            if !REQUIRED_COLUMNS.contains(&name.as_str())
                && !OPTIONAL_COLUMNS.contains(&name.as_str())
            {
                unknown.push(raw.trim().to_string());
                continue;
            }
            if columns.contains_key(&name) {
                duplicated.push(raw.trim().to_string());
                continue;
            }
            columns.insert(name, idx);
        }

        let missing: Vec<&str> = REQUIRED_COLUMNS
            .iter()
            .copied()
            .filter(|c| !columns.contains_key(*c))
            .collect();

        if !missing.is_empty() {
            let mut message = format!("缺少必需列: {}", missing.join(", "));
            if !unknown.is_empty() {
                message.push_str(&format!("；未识别列: {}", unknown.join(", ")));
            }
            let mut err = ImportError::file_level(
                ImportErrorType::HeaderValidationFailed,
                ErrorSeverity::Error,
                message,
            );
            err.row_number = 1;
            err.original_value = Some(headers.join(","));
            return Err(err);
        }

        let mut warnings = Vec::new();
        if !unknown.is_empty() {
            let mut warning = ImportError::file_level(
                ImportErrorType::HeaderValidationFailed,
                ErrorSeverity::Warning,
                format!("未识别列（已忽略）: {}", unknown.join(", ")),
            );
            warning.row_number = 1;
            warnings.push(warning);
        }
        if !duplicated.is_empty() {
            let mut warning = ImportError::file_level(
                ImportErrorType::HeaderValidationFailed,
                ErrorSeverity::Warning,
                format!("重复列（以首次出现为准）: {}", duplicated.join(", ")),
            );
            warning.row_number = 1;
            warnings.push(warning);
        }

        Ok(HeaderCheck {
            layout: HeaderLayout {
                columns,
                width: headers.len(),
            },
            warnings,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(cols: &[&str]) -> Vec<String> {
        cols.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn test_empty_file_rejected_before_size() {
        let err = CsvStructuralValidator.check_size(0, 0).unwrap_err();
        assert_eq!(err.error_type, ImportErrorType::EmptyFile);
        assert_eq!(err.severity, ErrorSeverity::Error);
    }

    #[test]
    fn test_size_limit() {
        let validator = CsvStructuralValidator;
        assert!(validator.check_size(10, 10).is_ok());
        let err = validator.check_size(11, 10).unwrap_err();
        assert_eq!(err.error_type, ImportErrorType::FileSizeExceeded);
    }

    #[test]
    fn test_sniff_encoding() {
        let validator = CsvStructuralValidator;
        assert_eq!(validator.sniff_encoding(b"NAME"), EncodingSniff::Utf8);
        assert_eq!(
            validator.sniff_encoding(&[0xEF, 0xBB, 0xBF, b'N']),
            EncodingSniff::Utf8Bom
        );
        assert_eq!(validator.sniff_encoding(&[0xFF, 0xFE, b'N', 0]), EncodingSniff::Utf16Le);
        assert_eq!(validator.sniff_encoding(&[0xFE, 0xFF, 0, b'N']), EncodingSniff::Utf16Be);
        assert_eq!(
            validator.sniff_encoding(&[0xFF, 0xFE, 0, 0]),
            EncodingSniff::Utf32Le
        );
        assert_eq!(
            validator.sniff_encoding(&[b'N', 0xE9, b'e']),
            EncodingSniff::NonUtf8
        );
    }

    #[test]
    fn test_decode_strips_utf8_bom_without_warning() {
        let (content, warning) = CsvStructuralValidator.decode(b"\xEF\xBB\xBFNAME,UNIT");
        assert_eq!(content, "NAME,UNIT");
        assert!(warning.is_none());
    }

    #[test]
    fn test_decode_latin1_is_soft_warning() {
        let (content, warning) = CsvStructuralValidator.decode(b"NAME\nRen\xE9 Doe");
        assert_eq!(content, "NAME\nRené Doe");
        let warning = warning.unwrap();
        assert_eq!(warning.error_type, ImportErrorType::UnicodeEncodingError);
        assert_eq!(warning.severity, ErrorSeverity::Warning);
    }

    fn utf16_bytes(text: &str, little_endian: bool) -> Vec<u8> {
        let mut bytes = if little_endian {
            vec![0xFF, 0xFE]
        } else {
            vec![0xFE, 0xFF]
        };
        for unit in text.encode_utf16() {
            let pair = if little_endian {
                unit.to_le_bytes()
            } else {
                unit.to_be_bytes()
            };
            bytes.extend_from_slice(&pair);
        }
        bytes
    }

    #[test]
    fn test_decode_utf16_with_bom() {
        let text = "NAME,UNIT\nJosé Doe,UnitA";

        let (content, warning) = CsvStructuralValidator.decode(&utf16_bytes(text, true));
        assert_eq!(content, text);
        assert_eq!(warning.unwrap().severity, ErrorSeverity::Warning);

        let (content, warning) = CsvStructuralValidator.decode(&utf16_bytes(text, false));
        assert_eq!(content, text);
        assert!(warning.unwrap().detailed_message.contains("UTF-16 BE"));
    }

    #[test]
    fn test_decode_utf32_le() {
        let mut bytes = vec![0xFF, 0xFE, 0x00, 0x00];
        for c in "NAME,é".chars() {
            bytes.extend_from_slice(&(c as u32).to_le_bytes());
        }
        let (content, warning) = CsvStructuralValidator.decode(&bytes);
        assert_eq!(content, "NAME,é");
        assert_eq!(
            warning.unwrap().error_type,
            ImportErrorType::UnicodeEncodingError
        );

        bytes.push(0x41);
        let (content, _) = CsvStructuralValidator.decode(&bytes);
        assert!(content.ends_with(char::REPLACEMENT_CHARACTER));
    }

    #[test]
    fn test_header_blank_rejected() {
        let err = CsvStructuralValidator
            .validate_header(&headers(&["", "  "]))
            .unwrap_err();
        assert_eq!(err.error_type, ImportErrorType::HeaderValidationFailed);

        let err = CsvStructuralValidator.validate_header(&[]).unwrap_err();
        assert_eq!(err.error_type, ImportErrorType::HeaderValidationFailed);
    }

    #[test]
    fn test_header_missing_required_lists_columns() {
        let err = CsvStructuralValidator
            .validate_header(&headers(&["NAME", "Dept"]))
            .unwrap_err();
        assert_eq!(err.severity, ErrorSeverity::Error);
        assert!(err.detailed_message.contains("UNIT"));
        assert!(err.detailed_message.contains("DEPARTMENT"));
        assert!(err.detailed_message.contains("Dept"));
    }

    #[test]
    fn test_header_case_insensitive_with_extras() {
        let check = CsvStructuralValidator
            .validate_header(&headers(&[" name", "Unit", "department ", "Mkan_Id", "Notes"]))
            .unwrap();
        assert_eq!(check.layout.index_of("NAME"), Some(0));
        assert_eq!(check.layout.index_of("DEPARTMENT"), Some(2));
        assert_eq!(check.layout.index_of("MKANID"), Some(3));
        assert_eq!(check.layout.index_of("LEVEL"), None);
        assert_eq!(check.layout.width(), 5);
        assert_eq!(check.warnings.len(), 1);
        assert_eq!(check.warnings[0].severity, ErrorSeverity::Warning);
        assert!(check.warnings[0].detailed_message.contains("Notes"));
    }
}
