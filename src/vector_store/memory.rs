//! In-memory vector store implementation.
//!
//! Useful for testing and throwaway stores.

use super::{
    cosine_similarity, lock_error, rank, IndexedSource, SearchFilter, SearchResult, StoredChunk,
    VectorStore,
};
use crate::error::Result;
use async_trait::async_trait;
use std::collections::{BTreeSet, HashMap};
use std::sync::RwLock;
use uuid::Uuid;

/// In-memory vector store.
pub struct MemoryVectorStore {
    chunks: RwLock<HashMap<Uuid, StoredChunk>>,
}

impl MemoryVectorStore {
    /// Create a new in-memory vector store.
    pub fn new() -> Self {
        Self {
            chunks: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for MemoryVectorStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VectorStore for MemoryVectorStore {
    async fn upsert_batch(&self, chunks: &[StoredChunk]) -> Result<usize> {
        let mut store = self.chunks.write().map_err(lock_error)?;
        for chunk in chunks {
            store.insert(chunk.id, chunk.clone());
        }
        Ok(chunks.len())
    }

    async fn search_filtered(
        &self,
        query_embedding: &[f32],
        limit: usize,
        filter: &SearchFilter,
    ) -> Result<Vec<SearchResult>> {
        let chunks = self.chunks.read().map_err(lock_error)?;

        let results: Vec<SearchResult> = chunks
            .values()
            .filter(|chunk| filter.matches(chunk))
            .map(|chunk| SearchResult {
                chunk: chunk.clone(),
                score: cosine_similarity(query_embedding, &chunk.embedding),
            })
            .filter(|r| filter.accepts_score(r.score))
            .collect();

        Ok(rank(results, limit))
    }

    async fn delete_by_source(&self, source: &str) -> Result<usize> {
        let mut chunks = self.chunks.write().map_err(lock_error)?;
        let initial_len = chunks.len();
        chunks.retain(|_, chunk| chunk.source != source);
        Ok(initial_len - chunks.len())
    }

    async fn list_sources(&self) -> Result<Vec<IndexedSource>> {
        let chunks = self.chunks.read().map_err(lock_error)?;

        let mut by_source: HashMap<&str, (IndexedSource, BTreeSet<u32>)> = HashMap::new();
        for chunk in chunks.values() {
            let (entry, pages) = by_source.entry(chunk.source.as_str()).or_insert_with(|| {
                (
                    IndexedSource {
                        source: chunk.source.clone(),
                        kind: chunk.kind,
                        title: chunk.title.clone(),
                        chunk_count: 0,
                        page_count: 0,
                        indexed_at: chunk.indexed_at,
                    },
                    BTreeSet::new(),
                )
            });

            entry.chunk_count += 1;
            if let Some(page) = chunk.page {
                pages.insert(page);
            }
            if chunk.indexed_at > entry.indexed_at {
                entry.indexed_at = chunk.indexed_at;
            }
        }

        let mut sources: Vec<IndexedSource> = by_source
            .into_values()
            .map(|(mut source, pages)| {
                source.page_count = pages.len() as u32;
                source
            })
            .collect();
        sources.sort_by(|a, b| {
            b.indexed_at
                .cmp(&a.indexed_at)
                .then_with(|| a.source.cmp(&b.source))
        });

        Ok(sources)
    }

    async fn get_by_source(&self, source: &str) -> Result<Vec<StoredChunk>> {
        let chunks = self.chunks.read().map_err(lock_error)?;
        let mut result: Vec<StoredChunk> = chunks
            .values()
            .filter(|c| c.source == source)
            .cloned()
            .collect();
        result.sort_by_key(|c| c.chunk_index);
        Ok(result)
    }

    async fn document_count(&self) -> Result<usize> {
        Ok(self.chunks.read().map_err(lock_error)?.len())
    }

    async fn clear(&self) -> Result<usize> {
        let mut chunks = self.chunks.write().map_err(lock_error)?;
        let count = chunks.len();
        chunks.clear();
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{chunk, exercise_negative_scores, exercise_store};
    use super::*;

    #[tokio::test]
    async fn test_memory_vector_store() {
        let store = MemoryVectorStore::new();
        exercise_store(&store).await;
    }

    #[tokio::test]
    async fn test_search_keeps_negative_scores() {
        let store = MemoryVectorStore::new();
        exercise_negative_scores(&store).await;
    }

    #[test]
    fn test_upsert_same_id_overwrites() {
        let store = MemoryVectorStore::new();
        let mut first = chunk("a.pdf", 0, "old text", vec![1.0, 0.0]);
        tokio_test::block_on(store.upsert_batch(&[first.clone()])).unwrap();

        first.content = "new text".to_string();
        tokio_test::block_on(store.upsert_batch(&[first])).unwrap();

        assert_eq!(tokio_test::block_on(store.document_count()).unwrap(), 1);
        let stored = tokio_test::block_on(store.get_by_source("a.pdf")).unwrap();
        assert_eq!(stored[0].content, "new text");
    }
}
