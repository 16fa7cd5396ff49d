//! docchat CLI entry point.

use anyhow::Result;
use clap::Parser;
use docchat::cli::commands::{self, AskOptions, SearchOptions, SplitOverrides};
use docchat::cli::{Cli, Commands};
use docchat::config::Settings;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is fine.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let config_path = cli.config.as_deref().map(Settings::expand_path);
    let settings = Settings::load_from(config_path.as_ref())?;

    let log_level = match cli.verbose {
        0 => settings.general.log_level.clone(),
        1 => "info".to_string(),
        2 => "debug".to_string(),
        _ => "trace".to_string(),
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("docchat={}", log_level)),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    std::fs::create_dir_all(settings.data_dir())?;

    match cli.command {
        Commands::Init => {
            commands::run_init(&settings)?;
        }

        Commands::Doctor => {
            commands::run_doctor(&settings)?;
        }

        Commands::Ingest {
            input,
            rebuild,
            strategy,
            chunk_size,
            chunk_overlap,
        } => {
            let overrides = SplitOverrides {
                strategy,
                chunk_size,
                chunk_overlap,
            };
            commands::run_ingest(input, rebuild, overrides, settings).await?;
        }

        Commands::Ask {
            question,
            model,
            chain,
            style,
            template,
            k,
            mmr,
            compress,
        } => {
            let options = AskOptions {
                model,
                chain,
                style,
                template,
                k,
                mmr,
                compress,
            };
            commands::run_ask(&question, options, settings).await?;
        }

        Commands::Search {
            query,
            k,
            mmr,
            fetch_k,
            source,
            min_score,
            compress,
        } => {
            let options = SearchOptions {
                k,
                mmr,
                fetch_k,
                source,
                min_score,
                compress,
            };
            commands::run_search(&query, options, settings).await?;
        }

        Commands::Chat {
            model,
            source,
            compress,
        } => {
            commands::run_chat(model, source, compress, settings).await?;
        }

        Commands::List => {
            commands::run_list(settings).await?;
        }

        Commands::Config { action } => {
            commands::run_config(&action, config_path, settings)?;
        }
    }

    Ok(())
}
