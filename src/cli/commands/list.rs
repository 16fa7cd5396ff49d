//! List command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::vector_store::open_store;
use anyhow::Result;

/// Run the list command.
pub async fn run_list(settings: Settings) -> Result<()> {
    let store = open_store(&settings.vector_store, &settings.store_path())?;

    match store.list_sources().await {
        Ok(sources) => {
            if sources.is_empty() {
                Output::info("No documents indexed yet. Use 'docchat ingest <input>' to add content.");
            } else {
                Output::header(&format!("Indexed Sources ({})", sources.len()));
                println!();

                for source in &sources {
                    Output::source_info(source);
                }

                let total_chunks: u32 = sources.iter().map(|s| s.chunk_count).sum();
                println!();
                Output::kv("Total sources", &sources.len().to_string());
                Output::kv("Total chunks", &total_chunks.to_string());
            }
        }
        Err(e) => {
            Output::error(&format!("Failed to list sources: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
