//! On-disk archive of uploaded CSV files
//!
//! Every upload is kept verbatim at `<root>/<YYYY-MM-DD>/<filename>` before it
//! is ingested.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use log::debug;

use crate::support::errors::InfraError;

const FALLBACK_NAME: &str = "upload.csv";

#[derive(Debug, Clone)]
pub struct UploadArchive {
    root: PathBuf,
}

impl UploadArchive {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write `bytes` under the day's directory, replacing any file of the
    /// same name. Returns the path written.
    pub async fn store(
        &self,
        date: NaiveDate,
        filename: &str,
        bytes: &[u8],
    ) -> Result<PathBuf, InfraError> {
        let dir = self.root.join(date.format("%Y-%m-%d").to_string());
        tokio::fs::create_dir_all(&dir).await?;

        let path = dir.join(sanitize_filename(filename));
        tokio::fs::write(&path, bytes).await?;
        debug!("Archived {} bytes to {}", bytes.len(), path.display());
        Ok(path)
    }
}

/// Reduce a client-supplied name to a bare file name.
pub fn sanitize_filename(raw: &str) -> String {
    let name = raw
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();

    match name {
        "" | "." | ".." => FALLBACK_NAME.to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_directories() {
        assert_eq!(sanitize_filename("toll.csv"), "toll.csv");
        assert_eq!(sanitize_filename("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_filename(r"C:\Users\me\toll.csv"), "toll.csv");
        assert_eq!(sanitize_filename("dir/"), FALLBACK_NAME);
        assert_eq!(sanitize_filename(".."), FALLBACK_NAME);
        assert_eq!(sanitize_filename(""), FALLBACK_NAME);
    }

    #[tokio::test]
    async fn stores_under_dated_directory() {
        let dir = tempfile::tempdir().unwrap();
        let archive = UploadArchive::new(dir.path().join("uploads"));
        let date = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();

        let path = archive.store(date, "../toll.csv", b"a,b\n").await.unwrap();

        assert_eq!(path, dir.path().join("uploads").join("2024-01-10").join("toll.csv"));
        assert_eq!(std::fs::read(&path).unwrap(), b"a,b\n");

        archive.store(date, "toll.csv", b"c,d\n").await.unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"c,d\n");
    }
}
