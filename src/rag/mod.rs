//! RAG (Retrieval-Augmented Generation) for question answering with sources.
//!
//! One-shot answers go through [`QaEngine`]; interactive conversations through
//! [`ChatSession`], which keeps an append-only [`ConversationHistory`].

mod chat;
mod compress;
pub mod context;
mod history;
mod model;
mod qa;
mod response;

pub use chat::ChatSession;
pub use compress::{ContextCompressor, NO_OUTPUT};
pub use context::Retriever;
pub use history::{ConversationHistory, ConversationTurn};
pub use model::{ChatMessage, ChatModel, OpenAIChatModel, Role};
pub use qa::{QaEngine, NO_CONTEXT_ANSWER};
pub use response::RagResponse;

use crate::loader::SourceKind;
use crate::vector_store::SearchResult;

/// A retrieved chunk prepared for prompting and display.
#[derive(Debug, Clone)]
pub struct ContextChunk {
    pub source: String,
    pub kind: SourceKind,
    pub title: String,
    pub page: Option<u32>,
    pub chunk_index: u32,
    /// Text content.
    pub content: String,
    /// Similarity score.
    pub score: f32,
}

impl ContextChunk {
    /// Short citation such as `report p.3`.
    pub fn citation(&self) -> String {
        match self.page {
            Some(page) => format!("{} p.{}", self.title, page),
            None => self.title.clone(),
        }
    }

    #[cfg(test)]
    pub(crate) fn for_test(source: &str, content: &str) -> Self {
        Self {
            source: source.to_string(),
            kind: SourceKind::Pdf,
            title: source.to_string(),
            page: Some(1),
            chunk_index: 0,
            content: content.to_string(),
            score: 0.9,
        }
    }
}

impl From<SearchResult> for ContextChunk {
    fn from(result: SearchResult) -> Self {
        let chunk = result.chunk;
        Self {
            source: chunk.source,
            kind: chunk.kind,
            title: chunk.title,
            page: chunk.page,
            chunk_index: chunk.chunk_index,
            content: chunk.content,
            score: result.score,
        }
    }
}
