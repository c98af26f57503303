// ==========================================
// 会员组织管理系统 - 上传流暂存
// ==========================================
// 上传内容先落到临时文件，再走与本地文件相同的导入流程
// 临时文件在 StagedUpload 释放时删除（含出错路径）
// ==========================================

use crate::importer::error::{ImporterError, ImporterResult};
use std::io::{self, Read, Write};
use std::path::Path;
use tempfile::NamedTempFile;

pub struct StagedUpload {
    file: NamedTempFile,
    bytes_written: u64,
}

impl StagedUpload {
    /// 暂存上传流
    ///
    /// # 参数
    /// - reader: 上传内容
    /// - max_bytes: 大小上限；最多多读 1 字节，超限交给结构校验报告 FileSizeExceeded
    pub fn from_reader<Rd: Read>(reader: Rd, max_bytes: Option<u64>) -> ImporterResult<Self> {
        let mut file = tempfile::Builder::new()
            .prefix("exco-upload-")
            .suffix(".csv")
            .tempfile()
            .map_err(staging_error)?;

        let bytes_written = match max_bytes {
            Some(max) => io::copy(&mut reader.take(max.saturating_add(1)), &mut file),
            None => {
                let mut reader = reader;
                io::copy(&mut reader, &mut file)
            }
        }
        .map_err(staging_error)?;

        file.flush().map_err(staging_error)?;

        tracing::debug!(
            path = %file.path().display(),
            bytes_written,
            "上传内容已暂存"
        );

        Ok(Self {
            file,
            bytes_written,
        })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }
}

fn staging_error(err: io::Error) -> ImporterError {
    ImporterError::UploadStagingError(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_staged_file_removed_on_drop() {
        let staged = StagedUpload::from_reader("NAME,UNIT,DEPARTMENT\n".as_bytes(), None).unwrap();
        let path = staged.path().to_path_buf();

        assert!(path.exists());
        assert_eq!(staged.bytes_written(), 21);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "NAME,UNIT,DEPARTMENT\n");

        drop(staged);
        assert!(!path.exists());
    }

    #[test]
    fn test_copy_stops_one_byte_past_limit() {
        let content = vec![b'a'; 100];
        let staged = StagedUpload::from_reader(content.as_slice(), Some(10)).unwrap();
        assert_eq!(staged.bytes_written(), 11);
    }
}
