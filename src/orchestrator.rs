//! Ingestion pipeline for docchat.
//!
//! Coordinates loading, splitting, embedding and storing of documents.

use crate::config::Settings;
use crate::embedding::{Embedder, OpenAIEmbedder};
use crate::error::{DocchatError, Result};
use crate::loader::{
    detect_input, DirectoryLoader, Input, Loader, PdfLoader, SourceBlock, SourceKind,
    SourceMetadata, YoutubeLoader,
};
use crate::splitter::{split_blocks, SplitterConfig};
use crate::vector_store::{open_store, StoredChunk, VectorStore};
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// The ingestion orchestrator.
pub struct Orchestrator {
    settings: Settings,
    splitter: SplitterConfig,
    embedder: Arc<dyn Embedder>,
    vector_store: Arc<dyn VectorStore>,
}

/// One source written to the store.
#[derive(Debug, Clone)]
pub struct IngestedSource {
    pub source: String,
    pub title: String,
    pub chunks: usize,
}

/// A source that could not be ingested while processing a directory.
#[derive(Debug, Clone)]
pub struct SkippedSource {
    pub source: String,
    pub reason: String,
}

/// Result of an ingestion run.
#[derive(Debug, Default)]
pub struct IngestResult {
    pub sources: Vec<IngestedSource>,
    /// Number of chunks indexed.
    pub chunks_indexed: usize,
    pub skipped: Vec<SkippedSource>,
    /// Chunks removed by a rebuild.
    pub cleared: usize,
}

impl Orchestrator {
    /// Create an orchestrator backed by the OpenAI embedder and the configured store.
    pub fn new(settings: Settings) -> Result<Self> {
        let embedder = Arc::new(OpenAIEmbedder::from_settings(
            &settings.openai,
            &settings.embedding,
        )?);
        let vector_store = open_store(&settings.vector_store, &settings.store_path())?;
        Self::with_components(settings, embedder, vector_store)
    }

    /// Create an orchestrator with custom components.
    pub fn with_components(
        settings: Settings,
        embedder: Arc<dyn Embedder>,
        vector_store: Arc<dyn VectorStore>,
    ) -> Result<Self> {
        let splitter = SplitterConfig::try_from(&settings.splitter)?;
        Ok(Self {
            settings,
            splitter,
            embedder,
            vector_store,
        })
    }

    /// Override the splitting parameters.
    pub fn with_splitter(mut self, splitter: SplitterConfig) -> Result<Self> {
        splitter.validate()?;
        self.splitter = splitter;
        Ok(self)
    }

    /// Get a reference to the vector store.
    pub fn vector_store(&self) -> Arc<dyn VectorStore> {
        self.vector_store.clone()
    }

    /// Get a reference to the embedder.
    pub fn embedder(&self) -> Arc<dyn Embedder> {
        self.embedder.clone()
    }

    /// Get the settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Ingest a YouTube video, a PDF file, or every PDF in a directory.
    ///
    /// Re-ingesting a source replaces its chunks. With `rebuild` the whole
    /// store is cleared, but only once every input has been loaded and
    /// embedded, so a failed run leaves the store untouched.
    #[instrument(skip(self), fields(input = %input))]
    pub async fn ingest(&self, input: &str, rebuild: bool) -> Result<IngestResult> {
        let detected = detect_input(input).ok_or_else(|| {
            DocchatError::InvalidInput(format!(
                "Not a YouTube URL/ID, PDF file or directory: {}",
                input
            ))
        })?;

        let mut result = IngestResult::default();
        let mut batches = Vec::new();

        match detected {
            Input::Youtube(video_id) => {
                let loader = YoutubeLoader::new(
                    &self.settings.documents.youtube_language,
                    &self.settings.temp_dir(),
                );
                let blocks = loader.load(&video_id).await?;
                batches.push(self.prepare(blocks).await?);
            }
            Input::Pdf(path) => {
                let blocks = self.load_pdf(&path).await?;
                batches.push(self.prepare(blocks).await?);
            }
            Input::Directory(dir) => {
                let files = DirectoryLoader::new(&dir).pdf_files()?;
                if files.is_empty() {
                    warn!("No PDF files found in {}", dir.display());
                }

                for file in files {
                    let outcome = match self.load_pdf(&file).await {
                        Ok(blocks) => self.prepare(blocks).await,
                        Err(e) => Err(e),
                    };
                    match outcome {
                        Ok(batch) => batches.push(batch),
                        // Embedding failures affect every file, so stop.
                        Err(e @ (DocchatError::Pdf(_) | DocchatError::FileNotFound(_))) => {
                            warn!("Skipping {}: {}", file.display(), e);
                            result.skipped.push(SkippedSource {
                                source: file.display().to_string(),
                                reason: e.to_string(),
                            });
                        }
                        Err(e) => return Err(e),
                    }
                }
            }
        }

        if rebuild {
            result.cleared = self.vector_store.clear().await?;
            info!("Cleared {} chunks before rebuild", result.cleared);
        }

        for batch in batches {
            result.record(self.commit(batch).await?);
        }

        info!(
            "Ingested {} sources ({} chunks)",
            result.sources.len(),
            result.chunks_indexed
        );
        Ok(result)
    }

    /// Store raw texts under one source, replacing earlier chunks of that source.
    #[instrument(skip(self, texts), fields(count = texts.len()))]
    pub async fn ingest_texts(&self, texts: &[String], source: &str) -> Result<IngestResult> {
        let blocks = texts
            .iter()
            .filter(|t| !t.trim().is_empty())
            .map(|text| {
                SourceBlock::new(
                    text.clone(),
                    SourceMetadata {
                        source: source.to_string(),
                        kind: SourceKind::Text,
                        title: source.to_string(),
                        page: None,
                    },
                )
            })
            .collect();

        let batch = self.prepare(blocks).await?;
        let mut result = IngestResult::default();
        result.record(self.commit(batch).await?);
        Ok(result)
    }

    async fn load_pdf(&self, path: &Path) -> Result<Vec<SourceBlock>> {
        let input = path.to_string_lossy();
        PdfLoader::with_base_dir(self.settings.pdf_dir())
            .load(&input)
            .await
    }

    /// Split and embed blocks without touching the store.
    #[instrument(
        skip(self, blocks),
        fields(model = self.embedder.model(), dimensions = self.embedder.dimensions(), blocks = blocks.len())
    )]
    async fn prepare(&self, blocks: Vec<SourceBlock>) -> Result<PreparedBatch> {
        let chunks = split_blocks(&blocks, &self.splitter)?;
        if chunks.is_empty() {
            if let Some(block) = blocks.first() {
                warn!("{} produced no text", block.metadata.source);
            }
            return Ok(PreparedBatch::default());
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await?;
        if embeddings.len() != chunks.len() {
            return Err(DocchatError::Embedding(format!(
                "Expected {} embeddings, got {}",
                chunks.len(),
                embeddings.len()
            )));
        }

        let mut sources: Vec<IngestedSource> = Vec::new();
        for chunk in &chunks {
            match sources.iter_mut().find(|s| s.source == chunk.metadata.source) {
                Some(source) => source.chunks += 1,
                None => sources.push(IngestedSource {
                    source: chunk.metadata.source.clone(),
                    title: chunk.metadata.title.clone(),
                    chunks: 1,
                }),
            }
        }

        let chunks = chunks
            .into_iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| StoredChunk::new(chunk, embedding))
            .collect();

        Ok(PreparedBatch { sources, chunks })
    }

    /// Replace the chunks of every source in the batch.
    async fn commit(&self, batch: PreparedBatch) -> Result<Vec<IngestedSource>> {
        if batch.chunks.is_empty() {
            return Ok(Vec::new());
        }

        let sources: BTreeSet<&str> = batch.sources.iter().map(|s| s.source.as_str()).collect();
        for source in sources {
            let removed = self.vector_store.delete_by_source(source).await?;
            if removed > 0 {
                info!("Replacing {} existing chunks of {}", removed, source);
            }
        }

        self.vector_store.upsert_batch(&batch.chunks).await?;
        Ok(batch.sources)
    }
}

/// Embedded chunks waiting to be written.
#[derive(Default)]
struct PreparedBatch {
    sources: Vec<IngestedSource>,
    chunks: Vec<StoredChunk>,
}

impl IngestResult {
    fn record(&mut self, sources: Vec<IngestedSource>) {
        self.chunks_indexed += sources.iter().map(|s| s.chunks).sum::<usize>();
        self.sources.extend(sources);
    }
}
