//! Configuration module for docchat.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{ChatPrompts, Prompts, QaPrompts};
pub use settings::{
    ChainType, ChatSettings, DocumentSettings, EmbeddingSettings, GeneralSettings,
    OpenAISettings, PromptSettings, PromptStyle, QaSettings, RetrievalSettings, SearchType,
    Settings, SplitStrategy, SplitterSettings, VectorStoreSettings, PDF_DIR_ENV,
};
