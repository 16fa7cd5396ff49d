//! Directory scanning for PDF files.

use super::has_pdf_extension;
use crate::error::{DocchatError, Result};
use std::path::PathBuf;
use tracing::info;

/// Finds every PDF in a directory (non-recursive).
pub struct DirectoryLoader {
    dir: PathBuf,
}

impl DirectoryLoader {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// List PDF files sorted by file name.
    pub fn pdf_files(&self) -> Result<Vec<PathBuf>> {
        if !self.dir.is_dir() {
            return Err(DocchatError::FileNotFound(format!(
                "Document directory {} does not exist",
                self.dir.display()
            )));
        }

        let mut files: Vec<PathBuf> = std::fs::read_dir(&self.dir)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_file() && has_pdf_extension(path))
            .collect();

        files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
        info!("Found {} PDF files in {}", files.len(), self.dir.display());
        Ok(files)
    }
}
