//! docchat - Chat with your documents
//!
//! A CLI and library for retrieval-augmented question answering over PDFs and
//! YouTube transcripts.
//!
//! # Overview
//!
//! docchat allows you to:
//! - Load PDFs (one block per page) and YouTube transcripts
//! - Split text into overlapping chunks and embed them
//! - Store embeddings in a local SQLite vector store
//! - Ask one-off questions or hold a conversation grounded in the documents
//!
//! # Architecture
//!
//! - `config` - Settings and prompt templates
//! - `loader` - Document loaders (PDF, directories, YouTube)
//! - `splitter` - Overlapping text splitters
//! - `embedding` - Embedding generation
//! - `vector_store` - Vector store abstraction (SQLite, in-memory)
//! - `rag` - Retrieval, question answering and conversational chat
//! - `orchestrator` - Ingestion pipeline coordination
//!
//! # Example
//!
//! ```rust,no_run
//! use docchat::config::Settings;
//! use docchat::orchestrator::Orchestrator;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let orchestrator = Orchestrator::new(settings)?;
//!
//!     let result = orchestrator.ingest("docs/KYC_Data.pdf", false).await?;
//!     println!("Indexed {} chunks", result.chunks_indexed);
//!
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod embedding;
pub mod error;
pub mod loader;
pub mod openai;
pub mod orchestrator;
pub mod rag;
pub mod splitter;
pub mod vector_store;

#[cfg(test)]
mod testing;

pub use error::{DocchatError, Result};
