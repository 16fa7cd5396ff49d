//! Ingest command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::loader::{detect_input, Input};
use crate::orchestrator::Orchestrator;
use crate::splitter::SplitterConfig;
use anyhow::Result;

/// Splitting overrides from the command line.
#[derive(Debug, Default)]
pub struct SplitOverrides {
    pub strategy: Option<String>,
    pub chunk_size: Option<usize>,
    pub chunk_overlap: Option<usize>,
}

/// Run the ingest command.
pub async fn run_ingest(
    input: Option<String>,
    rebuild: bool,
    overrides: SplitOverrides,
    settings: Settings,
) -> Result<()> {
    let defaulted = input.is_none();
    let input = input.unwrap_or_else(|| settings.pdf_dir().to_string_lossy().to_string());

    let operation = match detect_input(&input) {
        Some(Input::Youtube(_)) => Operation::IngestYoutube,
        Some(_) => Operation::Ingest,
        None if defaulted => {
            Output::error(&format!("Document directory {} does not exist.", input));
            Output::info("Run 'docchat init' or pass a PDF, directory or YouTube URL.");
            anyhow::bail!("missing document directory: {}", input);
        }
        None => {
            Output::error(&format!("Not a YouTube URL/ID, PDF file or directory: {}", input));
            anyhow::bail!("invalid input: {}", input);
        }
    };

    if let Err(e) = preflight::check(operation) {
        Output::error(&format!("{}", e));
        Output::info("Run 'docchat doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let splitter = SplitterConfig::new(
        super::parse_or(overrides.strategy.as_deref(), settings.splitter.strategy, "strategy")?,
        overrides.chunk_size.unwrap_or(settings.splitter.chunk_size),
        overrides.chunk_overlap.unwrap_or(settings.splitter.chunk_overlap),
    )?;

    let orchestrator = Orchestrator::new(settings)?.with_splitter(splitter)?;

    let spinner = Output::spinner(&format!("Ingesting {}...", input));
    let result = orchestrator.ingest(&input, rebuild).await;
    spinner.finish_and_clear();

    let result = match result {
        Ok(result) => result,
        Err(e) => {
            Output::error(&format!("Ingestion failed: {}", e));
            return Err(e.into());
        }
    };

    if rebuild {
        Output::info(&format!("Cleared {} existing chunks", result.cleared));
    }

    for skipped in &result.skipped {
        Output::warning(&format!("Skipped {}: {}", skipped.source, skipped.reason));
    }

    if result.sources.is_empty() {
        Output::warning("Nothing was indexed. No readable text found.");
        return Ok(());
    }

    Output::header("Indexed");
    for source in &result.sources {
        Output::list_item(&format!("{} ({} chunks)", source.title, source.chunks));
    }
    println!();
    Output::success(&format!(
        "Indexed {} chunks from {} source(s)",
        result.chunks_indexed,
        result.sources.len()
    ));

    Ok(())
}
