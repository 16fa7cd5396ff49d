//! PDF loader: one block per page.

use super::{Loader, SourceBlock, SourceKind, SourceMetadata};
use crate::error::{DocchatError, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument, warn};

/// Loads PDF files page by page.
pub struct PdfLoader {
    /// Directory relative paths are resolved against when they don't exist as given.
    base_dir: Option<PathBuf>,
}

impl PdfLoader {
    pub fn new() -> Self {
        Self { base_dir: None }
    }

    /// Resolve relative inputs against a document directory.
    pub fn with_base_dir(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: Some(base_dir.into()),
        }
    }

    /// Find the file for an input path.
    pub fn resolve(&self, input: &str) -> Result<PathBuf> {
        let path = PathBuf::from(input);
        if path.is_file() {
            return Ok(path);
        }

        if let Some(base) = &self.base_dir {
            if path.is_relative() {
                let joined = base.join(&path);
                if joined.is_file() {
                    return Ok(joined);
                }
                return Err(DocchatError::FileNotFound(joined.display().to_string()));
            }
        }

        Err(DocchatError::FileNotFound(path.display().to_string()))
    }

    /// Extract the text of every page, in page order.
    pub fn load_path(path: &Path) -> Result<Vec<SourceBlock>> {
        let document = lopdf::Document::load(path).map_err(|e| {
            DocchatError::Pdf(format!("Failed to open {}: {}", path.display(), e))
        })?;

        if document.is_encrypted() {
            return Err(DocchatError::Pdf(format!(
                "{} is encrypted",
                path.display()
            )));
        }

        let title = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("Untitled")
            .to_string();
        let source = path.display().to_string();

        // BTreeMap keys are page numbers, so iteration is already in page order.
        let pages = document.get_pages();
        let mut blocks = Vec::with_capacity(pages.len());

        for page_number in pages.keys() {
            let text = match document.extract_text(&[*page_number]) {
                Ok(text) => text,
                Err(e) => {
                    warn!("Skipping page {} of {}: {}", page_number, source, e);
                    continue;
                }
            };

            if text.trim().is_empty() {
                debug!("Page {} of {} has no text", page_number, source);
                continue;
            }

            blocks.push(SourceBlock::new(
                text,
                SourceMetadata {
                    source: source.clone(),
                    kind: SourceKind::Pdf,
                    title: title.clone(),
                    page: Some(*page_number),
                },
            ));
        }

        info!("Loaded {} pages from {}", blocks.len(), source);
        Ok(blocks)
    }
}

impl Default for PdfLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Loader for PdfLoader {
    #[instrument(skip(self))]
    async fn load(&self, input: &str) -> Result<Vec<SourceBlock>> {
        let path = self.resolve(input.trim())?;

        // lopdf parsing is CPU-bound and synchronous.
        tokio::task::spawn_blocking(move || Self::load_path(&path))
            .await
            .map_err(|e| DocchatError::Pdf(format!("PDF worker failed: {}", e)))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_against_base_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.pdf"), b"%PDF-1.4").unwrap();

        let loader = PdfLoader::with_base_dir(dir.path());
        assert_eq!(loader.resolve("a.pdf").unwrap(), dir.path().join("a.pdf"));

        match loader.resolve("missing.pdf") {
            Err(DocchatError::FileNotFound(p)) => assert!(p.ends_with("missing.pdf")),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_one_block_per_page_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("KYC_Data.pdf");
        crate::testing::write_pdf(&path, &["First page text", "", "Third page text"]);

        let blocks = PdfLoader::load_path(&path).unwrap();
        let pages: Vec<Option<u32>> = blocks.iter().map(|b| b.metadata.page).collect();
        assert_eq!(pages, vec![Some(1), Some(3)]);
        assert!(blocks[0].text.contains("First page text"));
        assert!(blocks[1].text.contains("Third page text"));
        assert_eq!(blocks[0].metadata.title, "KYC_Data");
        assert_eq!(blocks[0].metadata.kind, SourceKind::Pdf);
    }

    #[tokio::test]
    async fn test_missing_file_is_reported() {
        let loader = PdfLoader::new();
        let result = loader.load("/definitely/not/here.pdf").await;
        assert!(matches!(result, Err(DocchatError::FileNotFound(_))));
    }

    #[tokio::test]
    async fn test_malformed_pdf_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.pdf");
        std::fs::write(&path, b"this is not a pdf").unwrap();

        let loader = PdfLoader::new();
        let result = loader.load(path.to_str().unwrap()).await;
        assert!(matches!(result, Err(DocchatError::Pdf(_))));
    }
}
