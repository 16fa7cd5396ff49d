//! CLI command implementations.

mod ask;
mod chat;
mod config;
mod doctor;
mod ingest;
mod init;
mod list;
mod search;

pub use ask::{run_ask, AskOptions};
pub use chat::run_chat;
pub use config::run_config;
pub use doctor::run_doctor;
pub use ingest::{run_ingest, SplitOverrides};
pub use init::run_init;
pub use list::run_list;
pub use search::{run_search, SearchOptions};

use crate::config::{Prompts, Settings};
use crate::rag::{ContextCompressor, OpenAIChatModel};
use std::sync::Arc;

/// Load prompt templates, honouring a custom prompt directory.
fn load_prompts(settings: &Settings) -> crate::error::Result<Prompts> {
    Prompts::load(
        settings.prompts.custom_dir.as_deref(),
        Some(&settings.prompts.variables),
    )
}

/// Build the chunk compressor.
///
/// Extraction runs on the QA model at temperature 0 so it stays deterministic
/// whatever temperature the answers use.
fn compressor(settings: &Settings, prompts: Prompts) -> crate::error::Result<ContextCompressor> {
    let model = OpenAIChatModel::from_settings(&settings.openai, &settings.qa.model, 0.0)?;
    Ok(ContextCompressor::new(Arc::new(model), prompts))
}

/// Parse an optional CLI value, falling back to the configured one.
fn parse_or<T>(value: Option<&str>, default: T, what: &str) -> anyhow::Result<T>
where
    T: std::str::FromStr<Err = String>,
{
    match value {
        Some(v) => v
            .parse()
            .map_err(|e: String| anyhow::anyhow!("Invalid {}: {}", what, e)),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ChainType;

    #[test]
    fn test_parse_or() {
        assert_eq!(parse_or(None, ChainType::Stuff, "chain").unwrap(), ChainType::Stuff);
        assert_eq!(
            parse_or(Some("refine"), ChainType::Stuff, "chain").unwrap(),
            ChainType::Refine
        );
        assert!(parse_or(Some("bogus"), ChainType::Stuff, "chain").is_err());
    }
}
