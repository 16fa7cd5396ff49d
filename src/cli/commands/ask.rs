//! Ask command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::{SearchType, Settings};
use crate::orchestrator::Orchestrator;
use crate::rag::{OpenAIChatModel, QaEngine, Retriever};
use anyhow::{Context, Result};
use std::sync::Arc;

/// Options for a single question.
#[derive(Debug, Default)]
pub struct AskOptions {
    pub model: Option<String>,
    pub chain: Option<String>,
    pub style: Option<String>,
    /// Path to a custom prompt template.
    pub template: Option<String>,
    pub k: Option<usize>,
    pub mmr: bool,
    pub compress: bool,
}

/// Run the ask command.
pub async fn run_ask(question: &str, options: AskOptions, settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Query) {
        Output::error(&format!("{}", e));
        Output::info("Run 'docchat doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let chain_type = super::parse_or(options.chain.as_deref(), settings.qa.chain_type, "chain type")?;
    let style = super::parse_or(options.style.as_deref(), settings.qa.style, "style")?;
    let template = match &options.template {
        Some(path) => Some(
            std::fs::read_to_string(Settings::expand_path(path))
                .with_context(|| format!("Failed to read template {}", path))?,
        ),
        None => None,
    };

    let prompts = super::load_prompts(&settings)?;
    let orchestrator = Orchestrator::new(settings.clone())?;

    let model = options.model.unwrap_or_else(|| settings.qa.model.clone());
    let chat_model = Arc::new(OpenAIChatModel::from_settings(
        &settings.openai,
        &model,
        settings.qa.temperature,
    )?);

    let mut retriever = Retriever::new(
        orchestrator.vector_store(),
        orchestrator.embedder(),
        &settings.retrieval,
    );
    if let Some(k) = options.k {
        retriever = retriever.with_k(k);
    }
    if options.mmr {
        retriever = retriever.with_search_type(SearchType::Mmr);
    }
    if options.compress || settings.retrieval.compress {
        retriever = retriever.with_compressor(super::compressor(&settings, prompts.clone())?);
    }

    let engine = QaEngine::new(retriever, chat_model, prompts)
        .with_chain_type(chain_type)
        .with_style(style);

    let spinner = Output::spinner("Searching documents...");
    let result = engine.ask(question, template.as_deref()).await;
    spinner.finish_and_clear();

    match result {
        // Plain text when piped
        Ok(response) if !console::Term::stdout().is_term() => {
            println!("{}", response.format_for_display());
        }
        Ok(response) => {
            println!("\n{}\n", response.answer);
            Output::sources(&response.sources);
        }
        Err(e) => {
            Output::error(&format!("Failed to generate answer: {}", e));
            return Err(e.into());
        }
    }

    Ok(())
}
