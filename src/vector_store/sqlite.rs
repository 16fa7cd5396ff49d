//! SQLite-based vector store implementation.
//!
//! Chunks and their embeddings live in one table; similarity is computed in
//! Rust over every row that passes the filter.

use super::{
    cosine_similarity, lock_error, rank, IndexedSource, SearchFilter, SearchResult, StoredChunk,
    VectorStore,
};
use crate::error::{DocchatError, Result};
use crate::loader::SourceKind;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, info, instrument};

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS chunks (
        id TEXT PRIMARY KEY,
        source TEXT NOT NULL,
        source_kind TEXT NOT NULL,
        title TEXT NOT NULL,
        page INTEGER,
        chunk_index INTEGER NOT NULL,
        content TEXT NOT NULL,
        embedding BLOB NOT NULL,
        indexed_at TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_chunks_source ON chunks(source);
"#;

const SELECT_COLUMNS: &str =
    "SELECT id, source, source_kind, title, page, chunk_index, content, embedding, indexed_at FROM chunks";

/// SQLite-based vector store.
pub struct SqliteVectorStore {
    conn: Mutex<Connection>,
}

/// Columns of one row, before validation.
struct RawChunk {
    id: String,
    source: String,
    kind: String,
    title: String,
    page: Option<u32>,
    chunk_index: u32,
    content: String,
    embedding: Vec<u8>,
    indexed_at: String,
}

impl RawChunk {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            source: row.get(1)?,
            kind: row.get(2)?,
            title: row.get(3)?,
            page: row.get(4)?,
            chunk_index: row.get(5)?,
            content: row.get(6)?,
            embedding: row.get(7)?,
            indexed_at: row.get(8)?,
        })
    }

    fn decode(self) -> Result<StoredChunk> {
        let corrupt = |what: &str| {
            DocchatError::VectorStore(format!("Corrupt row {} ({}): bad {}", self.id, self.source, what))
        };

        let id = uuid::Uuid::parse_str(&self.id).map_err(|_| corrupt("id"))?;
        let kind: SourceKind = self.kind.parse().map_err(|_| corrupt("source kind"))?;
        let embedding = bytes_to_embedding(&self.embedding).ok_or_else(|| corrupt("embedding"))?;
        let indexed_at = parse_timestamp(&self.indexed_at).ok_or_else(|| corrupt("timestamp"))?;

        Ok(StoredChunk {
            id,
            source: self.source,
            kind,
            title: self.title,
            page: self.page,
            chunk_index: self.chunk_index,
            content: self.content,
            embedding,
            indexed_at,
        })
    }
}

impl SqliteVectorStore {
    /// Open (or create) a store at `path`.
    #[instrument(skip_all, fields(path = %path.display()))]
    pub fn new(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path).map_err(|e| {
            DocchatError::VectorStore(format!("Failed to open {}: {}", path.display(), e))
        })?;

        // WAL mode for better concurrent performance
        conn.execute_batch("PRAGMA journal_mode=WAL;")
            .and_then(|_| conn.execute_batch(SCHEMA))
            .map_err(|e| {
                DocchatError::VectorStore(format!(
                    "{} is not a usable vector store: {}",
                    path.display(),
                    e
                ))
            })?;

        info!("Opened SQLite vector store at {:?}", path);

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    #[cfg(test)]
    pub(crate) fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn query_chunks(
        &self,
        sql: &str,
        params: impl rusqlite::Params,
    ) -> Result<Vec<StoredChunk>> {
        let conn = self.conn.lock().map_err(lock_error)?;
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt.query_map(params, RawChunk::from_row)?;

        let mut chunks = Vec::new();
        for row in rows {
            chunks.push(row?.decode()?);
        }
        Ok(chunks)
    }
}

/// Serialize embedding to little-endian bytes.
fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
    embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
}

/// Deserialize embedding bytes; `None` when the length is not a multiple of 4.
fn bytes_to_embedding(bytes: &[u8]) -> Option<Vec<f32>> {
    if bytes.len() % 4 != 0 {
        return None;
    }
    Some(
        bytes
            .chunks_exact(4)
            .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect(),
    )
}

fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

#[async_trait]
impl VectorStore for SqliteVectorStore {
    #[instrument(skip(self, chunks), fields(count = chunks.len()))]
    async fn upsert_batch(&self, chunks: &[StoredChunk]) -> Result<usize> {
        let conn = self.conn.lock().map_err(lock_error)?;
        let tx = conn.unchecked_transaction()?;

        for chunk in chunks {
            tx.execute(
                r#"
                INSERT OR REPLACE INTO chunks
                (id, source, source_kind, title, page, chunk_index, content, embedding, indexed_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                "#,
                params![
                    chunk.id.to_string(),
                    chunk.source,
                    chunk.kind.to_string(),
                    chunk.title,
                    chunk.page,
                    chunk.chunk_index,
                    chunk.content,
                    embedding_to_bytes(&chunk.embedding),
                    chunk.indexed_at.to_rfc3339(),
                ],
            )?;
        }

        tx.commit()?;
        info!("Batch upserted {} chunks", chunks.len());
        Ok(chunks.len())
    }

    #[instrument(skip(self, query_embedding))]
    async fn search_filtered(
        &self,
        query_embedding: &[f32],
        limit: usize,
        filter: &SearchFilter,
    ) -> Result<Vec<SearchResult>> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let sql = format!(
            "{} WHERE (?1 IS NULL OR source = ?1) AND (?2 IS NULL OR source_kind = ?2)",
            SELECT_COLUMNS
        );
        let kind = filter.kind.map(|k| k.to_string());
        let chunks = self.query_chunks(&sql, params![filter.source, kind])?;

        let results: Vec<SearchResult> = chunks
            .into_iter()
            .map(|chunk| {
                let score = cosine_similarity(query_embedding, &chunk.embedding);
                SearchResult { chunk, score }
            })
            .filter(|r| filter.accepts_score(r.score))
            .collect();

        let results = rank(results, limit);
        debug!("Found {} matching chunks", results.len());
        Ok(results)
    }

    #[instrument(skip(self))]
    async fn delete_by_source(&self, source: &str) -> Result<usize> {
        let conn = self.conn.lock().map_err(lock_error)?;
        let deleted = conn.execute("DELETE FROM chunks WHERE source = ?1", params![source])?;

        info!("Deleted {} chunks for {}", deleted, source);
        Ok(deleted)
    }

    #[instrument(skip(self))]
    async fn list_sources(&self) -> Result<Vec<IndexedSource>> {
        let conn = self.conn.lock().map_err(lock_error)?;

        let mut stmt = conn.prepare(
            r#"
            SELECT source, source_kind, MIN(title), COUNT(*), COUNT(DISTINCT page),
                   MAX(indexed_at) AS last_indexed
            FROM chunks
            GROUP BY source
            ORDER BY last_indexed DESC, source
            "#,
        )?;

        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, u32>(3)?,
                row.get::<_, u32>(4)?,
                row.get::<_, String>(5)?,
            ))
        })?;

        let mut sources = Vec::new();
        for row in rows {
            let (source, kind, title, chunk_count, page_count, indexed_at) = row?;
            let kind = kind.parse().map_err(|e: String| {
                DocchatError::VectorStore(format!("Corrupt source {}: {}", source, e))
            })?;
            let indexed_at = parse_timestamp(&indexed_at).ok_or_else(|| {
                DocchatError::VectorStore(format!("Corrupt timestamp for source {}", source))
            })?;
            sources.push(IndexedSource {
                source,
                kind,
                title,
                chunk_count,
                page_count,
                indexed_at,
            });
        }

        Ok(sources)
    }

    #[instrument(skip(self))]
    async fn get_by_source(&self, source: &str) -> Result<Vec<StoredChunk>> {
        let sql = format!("{} WHERE source = ?1 ORDER BY chunk_index", SELECT_COLUMNS);
        let chunks = self.query_chunks(&sql, params![source])?;
        debug!("Found {} chunks for {}", chunks.len(), source);
        Ok(chunks)
    }

    async fn document_count(&self) -> Result<usize> {
        let conn = self.conn.lock().map_err(lock_error)?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM chunks", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    #[instrument(skip(self))]
    async fn clear(&self) -> Result<usize> {
        let conn = self.conn.lock().map_err(lock_error)?;
        let deleted = conn.execute("DELETE FROM chunks", [])?;
        info!("Cleared {} chunks", deleted);
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{chunk, exercise_negative_scores, exercise_store};
    use super::*;

    #[tokio::test]
    async fn test_sqlite_vector_store() {
        let store = SqliteVectorStore::in_memory().unwrap();
        exercise_store(&store).await;
    }

    #[tokio::test]
    async fn test_search_keeps_negative_scores() {
        let store = SqliteVectorStore::in_memory().unwrap();
        exercise_negative_scores(&store).await;
    }

    #[tokio::test]
    async fn test_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("vectors.db");

        {
            let store = SqliteVectorStore::new(&path).unwrap();
            store
                .upsert_batch(&[chunk("a.pdf", 0, "kept", vec![0.25, -1.5, 3.0])])
                .await
                .unwrap();
        }

        let store = SqliteVectorStore::new(&path).unwrap();
        let chunks = store.get_by_source("a.pdf").await.unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].content, "kept");
        assert_eq!(chunks[0].embedding, vec![0.25, -1.5, 3.0]);
        assert_eq!(chunks[0].page, Some(1));
    }

    #[test]
    fn test_rejects_non_database_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vectors.db");
        std::fs::write(&path, "not a database ".repeat(300)).unwrap();

        assert!(matches!(
            SqliteVectorStore::new(&path),
            Err(DocchatError::VectorStore(_))
        ));
    }

    #[tokio::test]
    async fn test_corrupt_embedding_is_an_error() {
        let store = SqliteVectorStore::in_memory().unwrap();
        store
            .upsert_batch(&[chunk("a.pdf", 0, "fine", vec![1.0, 0.0])])
            .await
            .unwrap();
        {
            let conn = store.conn.lock().unwrap();
            conn.execute("UPDATE chunks SET embedding = x'010203'", []).unwrap();
        }

        assert!(matches!(
            store.search(&[1.0, 0.0], 3).await,
            Err(DocchatError::VectorStore(_))
        ));
    }

    #[test]
    fn test_embedding_bytes() {
        let embedding = vec![1.0f32, -0.5, 0.0];
        let bytes = embedding_to_bytes(&embedding);
        assert_eq!(bytes.len(), 12);
        assert_eq!(bytes_to_embedding(&bytes), Some(embedding));
        assert_eq!(bytes_to_embedding(&[0, 1, 2]), None);
    }
}
