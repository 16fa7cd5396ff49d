//! Document loaders for docchat.
//!
//! Loaders turn an input (PDF path, directory, YouTube URL) into an ordered
//! sequence of text blocks with source metadata.

mod directory;
mod pdf;
mod vtt;
mod youtube;

pub use directory::DirectoryLoader;
pub use pdf::PdfLoader;
pub use vtt::{parse_vtt, TranscriptCue};
pub use youtube::YoutubeLoader;

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Type of document source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Pdf,
    Youtube,
    Text,
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceKind::Pdf => write!(f, "pdf"),
            SourceKind::Youtube => write!(f, "youtube"),
            SourceKind::Text => write!(f, "text"),
        }
    }
}

impl std::str::FromStr for SourceKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "pdf" => Ok(SourceKind::Pdf),
            "youtube" => Ok(SourceKind::Youtube),
            "text" => Ok(SourceKind::Text),
            _ => Err(format!("Unknown source kind: {}", s)),
        }
    }
}

/// Where a block of text came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceMetadata {
    /// File path or canonical URL; the unit of replacement in the store.
    pub source: String,
    pub kind: SourceKind,
    /// Human-readable title (file stem or video title).
    pub title: String,
    /// 1-based page number for PDFs.
    pub page: Option<u32>,
}

impl SourceMetadata {
    /// Short citation such as `report.pdf p.3`.
    pub fn citation(&self) -> String {
        match self.page {
            Some(page) => format!("{} p.{}", self.title, page),
            None => self.title.clone(),
        }
    }
}

/// A page or transcript worth of text.
#[derive(Debug, Clone)]
pub struct SourceBlock {
    pub text: String,
    pub metadata: SourceMetadata,
}

impl SourceBlock {
    pub fn new(text: String, metadata: SourceMetadata) -> Self {
        Self { text, metadata }
    }
}

/// Trait for document loaders.
#[async_trait]
pub trait Loader: Send + Sync {
    /// Load the input into ordered text blocks.
    async fn load(&self, input: &str) -> Result<Vec<SourceBlock>>;
}

/// A classified ingestion input.
#[derive(Debug, Clone, PartialEq)]
pub enum Input {
    /// YouTube video id.
    Youtube(String),
    /// A single PDF file.
    Pdf(PathBuf),
    /// A directory scanned for PDFs.
    Directory(PathBuf),
}

/// Classify an ingestion input.
///
/// Existing directories win over everything else, then YouTube ids/URLs, then
/// anything ending in `.pdf`.
pub fn detect_input(input: &str) -> Option<Input> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }

    let path = Path::new(trimmed);
    if path.is_dir() {
        return Some(Input::Directory(path.to_path_buf()));
    }

    if let Some(id) = youtube::extract_video_id(trimmed) {
        if !has_pdf_extension(path) {
            return Some(Input::Youtube(id));
        }
    }

    if has_pdf_extension(path) {
        return Some(Input::Pdf(path.to_path_buf()));
    }

    None
}

/// Case-insensitive `.pdf` extension check.
pub(crate) fn has_pdf_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("pdf"))
}
