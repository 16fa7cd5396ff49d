//! Init command - interactive first-run setup.

use crate::cli::Output;
use crate::config::Settings;
use crate::openai::API_KEY_ENV;
use console::style;
use std::io::{self, Write};
use std::path::Path;

/// Run the init command for first-time setup.
pub fn run_init(settings: &Settings) -> anyhow::Result<()> {
    Output::header("docchat Setup");
    println!();
    println!("Welcome to docchat! Let's make sure everything is configured correctly.\n");

    // Step 1: API key
    println!("{}", style("Step 1: Checking API configuration").bold().cyan());
    println!();

    if std::env::var(API_KEY_ENV).map(|k| k.trim().is_empty()).unwrap_or(true) {
        Output::warning(&format!("{} is not set.", API_KEY_ENV));
        println!();
        println!("  docchat needs an OpenAI API key for embeddings and answers.");
        println!(
            "  Get your API key from: {}",
            style("https://platform.openai.com/api-keys").underlined()
        );
        println!();
        println!("  Put it in a .env file next to where you run docchat, or export it:");
        println!("  {}", style(format!("export {}='sk-...'", API_KEY_ENV)).green());
        println!();

        if !prompt_continue("Continue without API key?")? {
            println!();
            Output::info("Setup cancelled. Set your API key and run 'docchat init' again.");
            return Ok(());
        }
    } else {
        Output::success("OpenAI API key is configured!");
    }

    println!();

    // Step 2: YouTube support
    println!("{}", style("Step 2: Checking optional tools").bold().cyan());
    println!();

    if std::process::Command::new("yt-dlp").arg("--version").output().is_ok() {
        Output::success("yt-dlp is installed, YouTube ingestion is available.");
    } else {
        Output::info("yt-dlp not found. PDFs work without it; install it to ingest YouTube videos.");
    }

    println!();

    // Step 3: Directories
    println!("{}", style("Step 3: Setting up directories").bold().cyan());
    println!();

    ensure_dir("Data directory", &settings.data_dir())?;
    ensure_dir("Temp directory", &settings.temp_dir())?;
    ensure_dir("Document directory", &settings.pdf_dir())?;

    println!();

    // Step 4: Config file
    println!("{}", style("Step 4: Configuration file").bold().cyan());
    println!();

    let config_path = Settings::default_config_path();
    if config_path.exists() {
        Output::info(&format!("Config file exists: {}", config_path.display()));
    } else if prompt_continue("Create default configuration file?")? {
        settings.save_to(&config_path)?;
        Output::success(&format!("Created config file: {}", config_path.display()));
        println!();
        println!("  Edit your config with: {}", style("docchat config edit").green());
    } else {
        Output::info("Skipped config file creation. Using defaults.");
    }

    println!();

    println!("{}", style("Setup Complete!").bold().green());
    println!();
    println!("Next steps:");
    println!(
        "  {} Put PDFs in {}",
        style("1.").cyan(),
        settings.pdf_dir().display()
    );
    println!("  {} Index them", style("docchat ingest").cyan());
    println!("  {} Ask a question", style("docchat ask \"<question>\"").cyan());
    println!("  {} Start a conversation", style("docchat chat").cyan());
    println!();
    println!("For more help: {}", style("docchat --help").cyan());

    Ok(())
}

/// Create a directory if it is missing and report what happened.
fn ensure_dir(label: &str, path: &Path) -> io::Result<()> {
    if path.exists() {
        Output::info(&format!("{} exists: {}", label, path.display()));
    } else {
        std::fs::create_dir_all(path)?;
        Output::success(&format!("Created {}: {}", label.to_lowercase(), path.display()));
    }
    Ok(())
}

/// Prompt user for yes/no confirmation.
fn prompt_continue(message: &str) -> io::Result<bool> {
    print!("{} {} ", style("?").cyan(), message);
    print!("{} ", style("[y/N]").dim());
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;

    Ok(is_yes(&input))
}

fn is_yes(input: &str) -> bool {
    matches!(input.trim().to_lowercase().as_str(), "y" | "yes")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_yes() {
        assert!(is_yes("y\n"));
        assert!(is_yes(" YES "));
        assert!(!is_yes(""));
        assert!(!is_yes("nope"));
    }

    #[test]
    fn test_ensure_dir_creates_nested() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        ensure_dir("Nested", &nested).unwrap();
        assert!(nested.is_dir());
        ensure_dir("Nested", &nested).unwrap();
    }
}
