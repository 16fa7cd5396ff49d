//! Text splitting into overlapping chunks for embedding and retrieval.

mod recursive;
mod window;

pub use recursive::RecursiveSplitter;
pub use window::WindowSplitter;

use crate::config::{SplitStrategy, SplitterSettings};
use crate::error::{DocchatError, Result};
use crate::loader::{SourceBlock, SourceMetadata};
use serde::{Deserialize, Serialize};

/// Separators tried in order by the recursive splitter.
pub const DEFAULT_SEPARATORS: [&str; 4] = ["\n\n", "\n", " ", ""];

/// A chunk of source text ready to be embedded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextChunk {
    /// Text content of this chunk.
    pub content: String,
    /// Metadata of the block the chunk came from.
    pub metadata: SourceMetadata,
    /// Position of this chunk within its source.
    pub index: u32,
}

/// Validated splitting parameters.
#[derive(Debug, Clone)]
pub struct SplitterConfig {
    pub strategy: SplitStrategy,
    /// Maximum chunk length in characters.
    pub chunk_size: usize,
    /// Characters shared by adjacent chunks.
    pub chunk_overlap: usize,
    pub separators: Vec<String>,
}

impl SplitterConfig {
    pub fn new(strategy: SplitStrategy, chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        let config = Self {
            strategy,
            chunk_size,
            chunk_overlap,
            separators: DEFAULT_SEPARATORS.iter().map(|s| s.to_string()).collect(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject sizes that cannot make progress.
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(DocchatError::Splitter("chunk_size must be greater than 0".to_string()));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(DocchatError::Splitter(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        Ok(())
    }
}

impl TryFrom<&SplitterSettings> for SplitterConfig {
    type Error = DocchatError;

    fn try_from(settings: &SplitterSettings) -> Result<Self> {
        Self::new(settings.strategy, settings.chunk_size, settings.chunk_overlap)
    }
}

/// Trait for text splitters.
pub trait TextSplitter: Send + Sync {
    /// Split text into ordered chunks.
    fn split(&self, text: &str) -> Vec<String>;
}

/// Create a splitter for the configured strategy.
pub fn create_splitter(config: &SplitterConfig) -> Result<Box<dyn TextSplitter>> {
    config.validate()?;
    Ok(match config.strategy {
        SplitStrategy::Window => Box::new(WindowSplitter::new(config.chunk_size, config.chunk_overlap)?),
        SplitStrategy::Recursive => Box::new(RecursiveSplitter::new(
            config.chunk_size,
            config.chunk_overlap,
            config.separators.clone(),
        )?),
    })
}

/// Split loaded blocks into chunks, numbering chunks per source in order.
pub fn split_blocks(blocks: &[SourceBlock], config: &SplitterConfig) -> Result<Vec<TextChunk>> {
    let splitter = create_splitter(config)?;
    let mut chunks = Vec::new();
    let mut counters: std::collections::HashMap<&str, u32> = std::collections::HashMap::new();

    for block in blocks {
        for content in splitter.split(&block.text) {
            let counter = counters.entry(block.metadata.source.as_str()).or_insert(0);
            chunks.push(TextChunk {
                content,
                metadata: block.metadata.clone(),
                index: *counter,
            });
            *counter += 1;
        }
    }

    Ok(chunks)
}

/// Character count, the unit chunk sizes are measured in.
pub(crate) fn char_len(text: &str) -> usize {
    text.chars().count()
}
