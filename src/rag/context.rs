//! Retrieval of context chunks for a query.

use super::{ContextChunk, ContextCompressor};
use crate::config::{RetrievalSettings, SearchType};
use crate::embedding::Embedder;
use crate::error::Result;
use crate::vector_store::{SearchFilter, VectorStore};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Embeds queries and fetches the most relevant chunks.
pub struct Retriever {
    vector_store: Arc<dyn VectorStore>,
    embedder: Arc<dyn Embedder>,
    search_type: SearchType,
    k: usize,
    fetch_k: usize,
    lambda_mult: f32,
    filter: SearchFilter,
    compressor: Option<ContextCompressor>,
}

impl Retriever {
    pub fn new(
        vector_store: Arc<dyn VectorStore>,
        embedder: Arc<dyn Embedder>,
        settings: &RetrievalSettings,
    ) -> Self {
        Self {
            vector_store,
            embedder,
            search_type: settings.search_type,
            k: settings.k,
            fetch_k: settings.fetch_k,
            lambda_mult: settings.lambda_mult,
            filter: SearchFilter {
                min_score: settings.min_score,
                ..Default::default()
            },
            compressor: None,
        }
    }

    /// Set the number of chunks returned.
    pub fn with_k(mut self, k: usize) -> Self {
        self.k = k;
        self
    }

    pub fn with_search_type(mut self, search_type: SearchType) -> Self {
        self.search_type = search_type;
        self
    }

    /// Restrict retrieval to one source.
    pub fn with_source(mut self, source: Option<String>) -> Self {
        self.filter.source = source;
        self
    }

    /// Run retrieved chunks through a compressor before returning them.
    pub fn with_compressor(mut self, compressor: ContextCompressor) -> Self {
        self.compressor = Some(compressor);
        self
    }

    pub fn k(&self) -> usize {
        self.k
    }

    #[instrument(skip(self), fields(search_type = ?self.search_type, k = self.k))]
    pub async fn retrieve(&self, query: &str) -> Result<Vec<ContextChunk>> {
        if self.k == 0 {
            return Ok(Vec::new());
        }

        let query_embedding = self.embedder.embed(query).await?;

        let results = match self.search_type {
            SearchType::Similarity => {
                self.vector_store
                    .search_filtered(&query_embedding, self.k, &self.filter)
                    .await?
            }
            SearchType::Mmr => {
                self.vector_store
                    .search_mmr(
                        &query_embedding,
                        self.k,
                        self.fetch_k,
                        self.lambda_mult,
                        &self.filter,
                    )
                    .await?
            }
        };

        debug!("Retrieved {} chunks", results.len());
        let chunks: Vec<ContextChunk> = results.into_iter().map(ContextChunk::from).collect();
        match &self.compressor {
            Some(compressor) if !chunks.is_empty() => compressor.compress(query, chunks).await,
            _ => Ok(chunks),
        }
    }
}

/// Join chunk contents for a prompt, in retrieval order.
pub fn format_context_for_prompt(chunks: &[ContextChunk]) -> String {
    chunks
        .iter()
        .map(|chunk| chunk.content.trim())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Format context chunks for display to the user.
pub fn format_context_for_display(chunks: &[ContextChunk]) -> String {
    chunks
        .iter()
        .enumerate()
        .map(|(i, chunk)| {
            format!(
                "[{}] {} (score: {:.2})\n    {}",
                i + 1,
                chunk.citation(),
                chunk.score,
                chunk.source
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Prompts;
    use crate::rag::NO_OUTPUT;
    use crate::testing::{stored, FakeChatModel, KeywordEmbedder};
    use crate::vector_store::MemoryVectorStore;

    async fn populated() -> (Arc<dyn VectorStore>, Arc<dyn Embedder>) {
        let embedder: Arc<dyn Embedder> = Arc::new(KeywordEmbedder::new());
        let store: Arc<dyn VectorStore> = Arc::new(MemoryVectorStore::new());
        let texts = [
            ("kyc.pdf", "customer identity verification"),
            ("kyc.pdf", "customer identity verification steps"),
            ("aml.pdf", "suspicious transaction reporting"),
        ];
        let mut chunks = Vec::new();
        for (i, (source, text)) in texts.iter().enumerate() {
            chunks.push(stored(source, i as u32, text, embedder.embed(text).await.unwrap()));
        }
        store.upsert_batch(&chunks).await.unwrap();
        (store, embedder)
    }

    #[tokio::test]
    async fn test_similarity_retrieval() {
        let (store, embedder) = populated().await;
        let retriever = Retriever::new(store, embedder, &RetrievalSettings::default()).with_k(2);

        let chunks = retriever.retrieve("customer identity verification").await.unwrap();
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].content, "customer identity verification");
        assert!(chunks.iter().all(|c| c.source == "kyc.pdf"));
    }

    #[tokio::test]
    async fn test_source_filter_and_zero_k() {
        let (store, embedder) = populated().await;
        let retriever = Retriever::new(store, embedder, &RetrievalSettings::default())
            .with_source(Some("aml.pdf".to_string()));

        let chunks = retriever.retrieve("customer identity").await.unwrap();
        assert!(chunks.iter().all(|c| c.source == "aml.pdf"));

        let none = retriever.with_k(0).retrieve("anything").await.unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn test_mmr_retrieval_returns_k() {
        let (store, embedder) = populated().await;
        let retriever = Retriever::new(store, embedder, &RetrievalSettings::default())
            .with_search_type(SearchType::Mmr)
            .with_k(2);

        let chunks = retriever.retrieve("customer identity verification").await.unwrap();
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].content, "customer identity verification");
    }

    #[tokio::test]
    async fn test_compressed_retrieval() {
        let (store, embedder) = populated().await;
        let model = Arc::new(FakeChatModel::new(""));
        model.queue(&["identity verification", NO_OUTPUT]);
        let retriever = Retriever::new(store, embedder, &RetrievalSettings::default())
            .with_k(2)
            .with_compressor(ContextCompressor::new(model.clone(), Prompts::default()));

        let chunks = retriever.retrieve("customer identity verification").await.unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].content, "identity verification");
        assert_eq!(chunks[0].source, "kyc.pdf");
        assert_eq!(model.calls().len(), 2);

        // nothing retrieved, nothing to compress
        let none = retriever.with_k(0).retrieve("anything").await.unwrap();
        assert!(none.is_empty());
        assert_eq!(model.calls().len(), 2);
    }

    #[test]
    fn test_format_context_for_prompt() {
        let chunks = vec![
            ContextChunk::for_test("a.pdf", "  first  "),
            ContextChunk::for_test("b.pdf", "second"),
        ];
        assert_eq!(format_context_for_prompt(&chunks), "first\n\nsecond");
        assert!(format_context_for_display(&chunks).starts_with("[1] a.pdf p.1"));
    }
}
