//! The merged workbook as a downloadable file

use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDateTime};

use crate::error::Result;

/// MIME type of an `.xlsx` workbook
pub const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// `comptabilite_complete_20250131_154502.xlsx`
pub fn download_file_name(at: NaiveDateTime) -> String {
    format!("comptabilite_complete_{}.xlsx", at.format("%Y%m%d_%H%M%S"))
}

/// Serialized merge result, ready to hand to a user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Download {
    pub file_name: String,
    pub mime: &'static str,
    pub bytes: Vec<u8>,
}

impl Download {
    pub fn new(bytes: Vec<u8>, at: NaiveDateTime) -> Self {
        Self {
            file_name: download_file_name(at),
            mime: XLSX_MIME,
            bytes,
        }
    }

    /// Named after the local time
    pub fn now(bytes: Vec<u8>) -> Self {
        Self::new(bytes, Local::now().naive_local())
    }

    /// Write the bytes into `dir` under [`Download::file_name`]
    pub fn save_in<P: AsRef<Path>>(&self, dir: P) -> Result<PathBuf> {
        let path = dir.as_ref().join(&self.file_name);
        std::fs::write(&path, &self.bytes)?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 1, 31)
            .and_then(|d| d.and_hms_opt(15, 45, 2))
            .unwrap()
    }

    #[test]
    fn test_download_file_name() {
        assert_eq!(
            download_file_name(at()),
            "comptabilite_complete_20250131_154502.xlsx"
        );
    }

    #[test]
    fn test_download_now_shape() {
        let download = Download::now(vec![1, 2, 3]);
        assert_eq!(download.mime, XLSX_MIME);
        assert!(download.file_name.starts_with("comptabilite_complete_"));
        assert!(download.file_name.ends_with(".xlsx"));
        // prefix + yyyymmdd_hhmmss + extension
        assert_eq!(download.file_name.len(), "comptabilite_complete_".len() + 15 + 5);
    }

    #[test]
    fn test_save_in() {
        let dir = tempfile::tempdir().unwrap();
        let download = Download::new(b"PK".to_vec(), at());

        let path = download.save_in(dir.path()).unwrap();

        assert_eq!(
            path,
            dir.path().join("comptabilite_complete_20250131_154502.xlsx")
        );
        assert_eq!(std::fs::read(path).unwrap(), b"PK");
    }
}
