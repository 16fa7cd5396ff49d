//! Search command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::{SearchType, Settings};
use crate::orchestrator::Orchestrator;
use crate::rag::Retriever;
use anyhow::Result;

/// Options for a search.
#[derive(Debug)]
pub struct SearchOptions {
    pub k: usize,
    pub mmr: bool,
    pub fetch_k: usize,
    pub source: Option<String>,
    pub min_score: Option<f32>,
    pub compress: bool,
}

/// Run the search command.
pub async fn run_search(query: &str, options: SearchOptions, settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Query) {
        Output::error(&format!("{}", e));
        return Err(e.into());
    }

    let mut retrieval = settings.retrieval.clone();
    retrieval.k = options.k;
    retrieval.fetch_k = options.fetch_k.max(options.k);
    if options.min_score.is_some() {
        retrieval.min_score = options.min_score;
    }
    if options.mmr {
        retrieval.search_type = SearchType::Mmr;
    }

    let compress = options.compress || retrieval.compress;
    let orchestrator = Orchestrator::new(settings.clone())?;
    let mut retriever = Retriever::new(orchestrator.vector_store(), orchestrator.embedder(), &retrieval)
        .with_source(options.source);
    if compress {
        retriever = retriever.with_compressor(super::compressor(&settings, super::load_prompts(&settings)?)?);
    }

    let spinner = Output::spinner("Searching...");
    let results = retriever.retrieve(query).await;
    spinner.finish_and_clear();

    match results {
        Ok(chunks) => {
            if chunks.is_empty() {
                Output::warning("No results found matching your query.");
            } else {
                Output::success(&format!("Found {} results", chunks.len()));
                for chunk in &chunks {
                    Output::search_result(chunk, 300);
                }
                println!();
            }
        }
        Err(e) => {
            Output::error(&format!("Search failed: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
