//! Configuration settings for docchat.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Environment variable overriding the PDF document directory.
pub const PDF_DIR_ENV: &str = "PDF_FILES_PATH";

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub openai: OpenAISettings,
    pub documents: DocumentSettings,
    pub splitter: SplitterSettings,
    pub embedding: EmbeddingSettings,
    pub vector_store: VectorStoreSettings,
    pub retrieval: RetrievalSettings,
    pub qa: QaSettings,
    pub chat: ChatSettings,
    pub prompts: PromptSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Directory for storing application data.
    pub data_dir: String,
    /// Directory for temporary files (subtitle downloads).
    pub temp_dir: String,
    /// Log level used when no -v flag is given (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            data_dir: "~/.docchat".to_string(),
            temp_dir: "/tmp/docchat".to_string(),
            log_level: "warn".to_string(),
        }
    }
}

/// OpenAI endpoint settings. The API key itself only ever comes from the environment.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct OpenAISettings {
    /// Alternative base URL for OpenAI-compatible endpoints.
    pub api_base: Option<String>,
}

/// Document source settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentSettings {
    /// Directory scanned for PDF files.
    pub pdf_dir: String,
    /// Preferred subtitle language for YouTube transcripts.
    pub youtube_language: String,
}

impl Default for DocumentSettings {
    fn default() -> Self {
        Self {
            pdf_dir: "PDF-docs".to_string(),
            youtube_language: "en".to_string(),
        }
    }
}

/// Text splitting strategy.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SplitStrategy {
    /// Fixed-size sliding window over characters.
    #[default]
    Window,
    /// Separator-aware recursive splitting (paragraphs, lines, words).
    Recursive,
}

impl std::str::FromStr for SplitStrategy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "window" | "character" => Ok(SplitStrategy::Window),
            "recursive" => Ok(SplitStrategy::Recursive),
            _ => Err(format!("Unknown split strategy: {}", s)),
        }
    }
}

impl std::fmt::Display for SplitStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SplitStrategy::Window => write!(f, "window"),
            SplitStrategy::Recursive => write!(f, "recursive"),
        }
    }
}

/// Text splitting settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitterSettings {
    /// Splitting strategy.
    pub strategy: SplitStrategy,
    /// Maximum chunk size in characters.
    pub chunk_size: usize,
    /// Characters shared between adjacent chunks.
    pub chunk_overlap: usize,
}

impl Default for SplitterSettings {
    fn default() -> Self {
        Self {
            strategy: SplitStrategy::Window,
            chunk_size: 1000,
            chunk_overlap: 100,
        }
    }
}

/// Embedding generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    /// Embedding model to use.
    pub model: String,
    /// Requested output dimensions. Only the text-embedding-3 family accepts this.
    pub dimensions: Option<u32>,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            model: "text-embedding-ada-002".to_string(),
            dimensions: None,
        }
    }
}

/// Vector store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorStoreSettings {
    /// Vector store provider (sqlite, memory).
    pub provider: String,
    /// Path to the SQLite database (for the sqlite provider).
    pub path: String,
}

impl Default for VectorStoreSettings {
    fn default() -> Self {
        Self {
            provider: "sqlite".to_string(),
            path: "~/.docchat/vectors.db".to_string(),
        }
    }
}

/// How the retriever ranks candidates.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SearchType {
    /// Plain cosine similarity.
    #[default]
    Similarity,
    /// Maximal marginal relevance over `fetch_k` candidates.
    Mmr,
}

impl std::str::FromStr for SearchType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "similarity" => Ok(SearchType::Similarity),
            "mmr" => Ok(SearchType::Mmr),
            _ => Err(format!("Unknown search type: {}", s)),
        }
    }
}

/// Retrieval settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalSettings {
    pub search_type: SearchType,
    /// Number of chunks handed to the model.
    pub k: usize,
    /// Candidates fetched before MMR re-ranking.
    pub fetch_k: usize,
    /// MMR trade-off: 1.0 is pure relevance, 0.0 is pure diversity.
    pub lambda_mult: f32,
    /// Minimum cosine similarity for a chunk to be used.
    pub min_score: Option<f32>,
    /// Have the model extract the relevant part of each retrieved chunk.
    pub compress: bool,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            search_type: SearchType::Similarity,
            k: 3,
            fetch_k: 10,
            lambda_mult: 0.5,
            min_score: None,
            compress: false,
        }
    }
}

/// How retrieved chunks are combined into an answer.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ChainType {
    /// All context in a single prompt.
    #[default]
    Stuff,
    /// Per-chunk extraction, then a combining call.
    MapReduce,
    /// Answer from the first chunk, refined by each following chunk.
    Refine,
}

impl std::str::FromStr for ChainType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "stuff" => Ok(ChainType::Stuff),
            "map_reduce" => Ok(ChainType::MapReduce),
            "refine" => Ok(ChainType::Refine),
            _ => Err(format!("Unknown chain type: {}", s)),
        }
    }
}

impl std::fmt::Display for ChainType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChainType::Stuff => write!(f, "stuff"),
            ChainType::MapReduce => write!(f, "map_reduce"),
            ChainType::Refine => write!(f, "refine"),
        }
    }
}

/// Built-in answer styles for question answering.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PromptStyle {
    #[default]
    Concise,
    Detailed,
}

impl std::str::FromStr for PromptStyle {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "concise" => Ok(PromptStyle::Concise),
            "detailed" => Ok(PromptStyle::Detailed),
            _ => Err(format!("Unknown prompt style: {}", s)),
        }
    }
}

/// One-shot question answering settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QaSettings {
    pub model: String,
    pub temperature: f32,
    pub chain_type: ChainType,
    pub style: PromptStyle,
}

impl Default for QaSettings {
    fn default() -> Self {
        Self {
            model: "gpt-4".to_string(),
            temperature: 0.0,
            chain_type: ChainType::Stuff,
            style: PromptStyle::Concise,
        }
    }
}

/// Interactive chat settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatSettings {
    pub model: String,
    pub temperature: f32,
    /// Rewrite follow-up questions into standalone questions before retrieval.
    pub condense_question: bool,
    /// Number of most recent turns included in each prompt.
    pub history_window: usize,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            model: "gpt-3.5-turbo".to_string(),
            temperature: 0.7,
            condense_question: true,
            history_window: 10,
        }
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct PromptSettings {
    /// Directory for custom prompts (overrides defaults).
    pub custom_dir: Option<String>,
    /// Custom variables available in all prompts as {{variable_name}}.
    pub variables: std::collections::HashMap<String, String>,
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    ///
    /// Environment overrides are applied after the file is read.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        let mut settings = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str(&content)?
        } else {
            Settings::default()
        };

        settings.apply_env(|key| std::env::var(key).ok());
        Ok(settings)
    }

    /// Apply environment overrides using the given lookup.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = lookup(PDF_DIR_ENV).filter(|d| !d.trim().is_empty()) {
            self.documents.pdf_dir = dir;
        }
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::DocchatError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("docchat")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded data directory path.
    pub fn data_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.data_dir)
    }

    /// Get the expanded temp directory path.
    pub fn temp_dir(&self) -> PathBuf {
        Self::expand_path(&self.general.temp_dir)
    }

    /// Get the expanded PDF directory path.
    pub fn pdf_dir(&self) -> PathBuf {
        Self::expand_path(&self.documents.pdf_dir)
    }

    /// Get the expanded vector database path.
    pub fn store_path(&self) -> PathBuf {
        Self::expand_path(&self.vector_store.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_ingestion_setup() {
        let settings = Settings::default();
        assert_eq!(settings.splitter.chunk_size, 1000);
        assert_eq!(settings.splitter.chunk_overlap, 100);
        assert_eq!(settings.embedding.model, "text-embedding-ada-002");
        assert_eq!(settings.retrieval.k, 3);
        assert_eq!(settings.documents.pdf_dir, "PDF-docs");
        assert_eq!(settings.qa.chain_type, ChainType::Stuff);
    }

    #[test]
    fn test_env_override_pdf_dir() {
        let mut settings = Settings::default();
        settings.apply_env(|key| match key {
            PDF_DIR_ENV => Some("/data/pdfs".to_string()),
            _ => None,
        });
        assert_eq!(settings.documents.pdf_dir, "/data/pdfs");

        let mut settings = Settings::default();
        settings.apply_env(|_| None);
        assert_eq!(settings.documents.pdf_dir, "PDF-docs");
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let settings: Settings = toml::from_str(
            r#"
            [qa]
            chain_type = "map_reduce"

            [retrieval]
            search_type = "mmr"
            k = 5
            "#,
        )
        .unwrap();

        assert_eq!(settings.qa.chain_type, ChainType::MapReduce);
        assert_eq!(settings.qa.model, "gpt-4");
        assert_eq!(settings.retrieval.search_type, SearchType::Mmr);
        assert_eq!(settings.retrieval.k, 5);
        assert_eq!(settings.retrieval.fetch_k, 10);
    }

    #[test]
    fn test_parse_enums() {
        assert_eq!("map-reduce".parse::<ChainType>().unwrap(), ChainType::MapReduce);
        assert_eq!("Refine".parse::<ChainType>().unwrap(), ChainType::Refine);
        assert_eq!("recursive".parse::<SplitStrategy>().unwrap(), SplitStrategy::Recursive);
        assert!("bogus".parse::<SearchType>().is_err());
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut settings = Settings::default();
        settings.chat.history_window = 4;
        settings.save_to(&path).unwrap();

        let loaded = Settings::load_from(Some(&path)).unwrap();
        assert_eq!(loaded.chat.history_window, 4);
    }
}
