//! Vector store abstraction for docchat.
//!
//! Provides a trait-based interface over the stored chunks and their
//! embeddings, with brute-force cosine ranking and MMR re-ranking.

mod memory;
mod sqlite;

pub use memory::MemoryVectorStore;
pub use sqlite::SqliteVectorStore;

use crate::config::VectorStoreSettings;
use crate::error::{DocchatError, Result};
use crate::loader::{SourceKind, SourceMetadata};
use crate::splitter::TextChunk;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use uuid::Uuid;

/// A chunk stored in the vector database.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredChunk {
    /// Unique chunk ID.
    pub id: Uuid,
    /// File path or URL the chunk came from.
    pub source: String,
    pub kind: SourceKind,
    pub title: String,
    /// 1-based page for PDF chunks.
    pub page: Option<u32>,
    /// Order of this chunk within its source.
    pub chunk_index: u32,
    /// Text content of this chunk.
    pub content: String,
    /// Embedding vector.
    pub embedding: Vec<f32>,
    /// When this chunk was indexed.
    pub indexed_at: DateTime<Utc>,
}

impl StoredChunk {
    /// Pair a text chunk with its embedding.
    pub fn new(chunk: TextChunk, embedding: Vec<f32>) -> Self {
        let TextChunk {
            content,
            metadata,
            index,
        } = chunk;
        Self {
            id: Uuid::new_v4(),
            source: metadata.source,
            kind: metadata.kind,
            title: metadata.title,
            page: metadata.page,
            chunk_index: index,
            content,
            embedding,
            indexed_at: Utc::now(),
        }
    }

    pub fn metadata(&self) -> SourceMetadata {
        SourceMetadata {
            source: self.source.clone(),
            kind: self.kind,
            title: self.title.clone(),
            page: self.page,
        }
    }

    /// Short citation such as `report p.3`.
    pub fn citation(&self) -> String {
        self.metadata().citation()
    }
}

/// A search result with score.
#[derive(Debug, Clone)]
pub struct SearchResult {
    /// The matched chunk.
    pub chunk: StoredChunk,
    /// Cosine similarity to the query (higher is better).
    pub score: f32,
}

/// Restricts which chunks a search considers.
#[derive(Debug, Clone, Default)]
pub struct SearchFilter {
    /// Only chunks from this source.
    pub source: Option<String>,
    /// Only chunks of this kind.
    pub kind: Option<SourceKind>,
    /// Drop results scoring below this. Without one, every match is ranked.
    pub min_score: Option<f32>,
}

impl SearchFilter {
    pub fn source(source: impl Into<String>) -> Self {
        Self {
            source: Some(source.into()),
            ..Default::default()
        }
    }

    pub fn with_min_score(mut self, min_score: f32) -> Self {
        self.min_score = Some(min_score);
        self
    }

    /// Whether a score clears the threshold.
    pub fn accepts_score(&self, score: f32) -> bool {
        self.min_score.map_or(true, |min| score >= min)
    }

    pub fn matches(&self, chunk: &StoredChunk) -> bool {
        self.source.as_deref().map_or(true, |s| chunk.source == s)
            && self.kind.map_or(true, |k| chunk.kind == k)
    }
}

/// Summary information about an indexed source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexedSource {
    pub source: String,
    pub kind: SourceKind,
    pub title: String,
    /// Number of indexed chunks.
    pub chunk_count: u32,
    /// Number of distinct pages (0 for transcripts and texts).
    pub page_count: u32,
    /// When the source was indexed.
    pub indexed_at: DateTime<Utc>,
}

/// Trait for vector store implementations.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Bulk insert chunks.
    async fn upsert_batch(&self, chunks: &[StoredChunk]) -> Result<usize>;

    /// Rank chunks matching `filter` by similarity to the query.
    async fn search_filtered(
        &self,
        query_embedding: &[f32],
        limit: usize,
        filter: &SearchFilter,
    ) -> Result<Vec<SearchResult>>;

    /// Search for similar chunks.
    async fn search(&self, query_embedding: &[f32], limit: usize) -> Result<Vec<SearchResult>> {
        self.search_filtered(query_embedding, limit, &SearchFilter::default())
            .await
    }

    /// Search with a minimum similarity threshold.
    async fn search_with_threshold(
        &self,
        query_embedding: &[f32],
        limit: usize,
        min_score: f32,
    ) -> Result<Vec<SearchResult>> {
        let filter = SearchFilter::default().with_min_score(min_score);
        self.search_filtered(query_embedding, limit, &filter).await
    }

    /// Fetch `fetch_k` candidates and re-rank them for diversity.
    async fn search_mmr(
        &self,
        query_embedding: &[f32],
        limit: usize,
        fetch_k: usize,
        lambda_mult: f32,
        filter: &SearchFilter,
    ) -> Result<Vec<SearchResult>> {
        let candidates = self
            .search_filtered(query_embedding, fetch_k.max(limit), filter)
            .await?;
        Ok(max_marginal_relevance(candidates, limit, lambda_mult))
    }

    /// Delete all chunks of a source.
    async fn delete_by_source(&self, source: &str) -> Result<usize>;

    /// List all indexed sources, most recently indexed first.
    async fn list_sources(&self) -> Result<Vec<IndexedSource>>;

    /// Get all chunks of a source in chunk order.
    async fn get_by_source(&self, source: &str) -> Result<Vec<StoredChunk>>;

    /// Get total chunk count.
    async fn document_count(&self) -> Result<usize>;

    /// Remove everything.
    async fn clear(&self) -> Result<usize>;
}

/// Open the configured store.
pub fn open_store(settings: &VectorStoreSettings, path: &Path) -> Result<Arc<dyn VectorStore>> {
    match settings.provider.as_str() {
        "sqlite" => Ok(Arc::new(SqliteVectorStore::new(path)?)),
        "memory" => Ok(Arc::new(MemoryVectorStore::new())),
        other => Err(DocchatError::Config(format!(
            "Unknown vector store provider: {}",
            other
        ))),
    }
}

/// Compute cosine similarity between two vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

/// Rank candidates by score, best first, and keep the top `limit`.
pub(crate) fn rank(mut results: Vec<SearchResult>, limit: usize) -> Vec<SearchResult> {
    results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    results.truncate(limit);
    results
}

/// Greedy maximal marginal relevance selection.
///
/// `candidates` carry their similarity to the query as `score`. Each step picks
/// the candidate maximising `lambda * sim(query) - (1 - lambda) * max sim(selected)`.
/// `lambda_mult` of 1.0 reduces to plain similarity ranking.
pub fn max_marginal_relevance(
    candidates: Vec<SearchResult>,
    k: usize,
    lambda_mult: f32,
) -> Vec<SearchResult> {
    let lambda = lambda_mult.clamp(0.0, 1.0);
    let mut remaining = candidates;
    let mut selected: Vec<SearchResult> = Vec::with_capacity(k.min(remaining.len()));

    while selected.len() < k && !remaining.is_empty() {
        let mut best_idx = 0;
        let mut best_score = f32::NEG_INFINITY;

        for (idx, candidate) in remaining.iter().enumerate() {
            let redundancy = selected
                .iter()
                .map(|s| cosine_similarity(&candidate.chunk.embedding, &s.chunk.embedding))
                .fold(f32::NEG_INFINITY, f32::max);
            let redundancy = if selected.is_empty() { 0.0 } else { redundancy };
            let mmr = lambda * candidate.score - (1.0 - lambda) * redundancy;
            if mmr > best_score {
                best_score = mmr;
                best_idx = idx;
            }
        }

        selected.push(remaining.remove(best_idx));
    }

    selected
}

/// Map a poisoned lock into a store error.
pub(crate) fn lock_error<E: std::fmt::Display>(e: E) -> DocchatError {
    DocchatError::VectorStore(format!("Failed to acquire lock: {}", e))
}


#[cfg(test)]
mod tests {
    use super::test_support::chunk;
    use super::*;

    #[test]
    fn test_cosine_similarity() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &b) - 1.0).abs() < 0.001);

        let c = vec![0.0, 1.0, 0.0];
        assert!((cosine_similarity(&a, &c)).abs() < 0.001);

        let d = vec![-1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &d) + 1.0).abs() < 0.001);

        assert_eq!(cosine_similarity(&a, &[1.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&a, &[0.0, 0.0, 0.0]), 0.0);
    }

    fn scored(content: &str, embedding: Vec<f32>, query: &[f32]) -> SearchResult {
        let score = cosine_similarity(query, &embedding);
        SearchResult {
            chunk: chunk("a.pdf", 0, content, embedding),
            score,
        }
    }

    #[test]
    fn test_mmr_prefers_diverse_results() {
        let query = [1.0, 0.0, 0.0];
        let candidates = rank(
            vec![
                scored("different", vec![0.8, 0.0, 0.6], &query),
                scored("first", vec![1.0, 0.1, 0.0], &query),
                scored("near duplicate", vec![1.0, 0.11, 0.0], &query),
            ],
            10,
        );

        let plain = max_marginal_relevance(candidates.clone(), 2, 1.0);
        let plain: Vec<&str> = plain.iter().map(|r| r.chunk.content.as_str()).collect();
        assert_eq!(plain, vec!["first", "near duplicate"]);

        let diverse = max_marginal_relevance(candidates, 2, 0.3);
        let diverse: Vec<&str> = diverse.iter().map(|r| r.chunk.content.as_str()).collect();
        assert_eq!(diverse, vec!["first", "different"]);
    }

    #[test]
    fn test_mmr_limits() {
        let query = [1.0, 0.0];
        let candidates = vec![scored("only", vec![1.0, 0.0], &query)];
        assert_eq!(max_marginal_relevance(candidates.clone(), 5, 0.5).len(), 1);
        assert!(max_marginal_relevance(candidates, 0, 0.5).is_empty());
        assert!(max_marginal_relevance(Vec::new(), 3, 0.5).is_empty());
    }

    #[test]
    fn test_stored_chunk_from_text_chunk() {
        let stored = chunk("report.pdf", 5, "text", vec![0.5]);
        assert_eq!(stored.chunk_index, 5);
        assert_eq!(stored.page, Some(3));
        assert_eq!(stored.citation(), "report.pdf p.3");
    }

    #[test]
    fn test_open_store_rejects_unknown_provider() {
        let settings = VectorStoreSettings {
            provider: "pinecone".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            open_store(&settings, Path::new("/tmp/unused.db")),
            Err(DocchatError::Config(_))
        ));
    }
}
