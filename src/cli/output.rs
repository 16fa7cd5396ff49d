//! CLI output formatting utilities.

use crate::rag::ContextChunk;
use crate::vector_store::IndexedSource;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

/// Output helper for CLI formatting.
pub struct Output;

impl Output {
    /// Print an info message.
    pub fn info(msg: &str) {
        println!("{} {}", style(">>").cyan().bold(), msg);
    }

    /// Print a success message.
    pub fn success(msg: &str) {
        println!("{} {}", style(">>").green().bold(), msg);
    }

    /// Print a warning message.
    pub fn warning(msg: &str) {
        eprintln!("{} {}", style(">>").yellow().bold(), msg);
    }

    /// Print an error message.
    pub fn error(msg: &str) {
        eprintln!("{} {}", style(">>").red().bold(), msg);
    }

    /// Print a header.
    pub fn header(msg: &str) {
        println!("\n{}", style(msg).bold().underlined());
    }

    /// Print a key-value pair.
    pub fn kv(key: &str, value: &str) {
        println!("  {}: {}", style(key).dim(), value);
    }

    /// Print a list item.
    pub fn list_item(msg: &str) {
        println!("  {} {}", style("*").cyan(), msg);
    }

    /// Print one indexed source.
    pub fn source_info(source: &IndexedSource) {
        let pages = if source.page_count > 0 {
            format!(", {} pages", source.page_count)
        } else {
            String::new()
        };
        println!(
            "  {} {} [{}] ({} chunks{}, indexed {})",
            style("*").cyan(),
            style(&source.title).bold(),
            source.kind,
            source.chunk_count,
            pages,
            source.indexed_at.format("%Y-%m-%d %H:%M")
        );
        println!("    {}", style(&source.source).dim());
    }

    /// Print a retrieved chunk.
    pub fn search_result(chunk: &ContextChunk, preview_len: usize) {
        println!(
            "\n{} {} (score: {:.2})",
            style(">>").green(),
            style(chunk.citation()).bold(),
            chunk.score
        );
        println!("   {}", content_preview(&chunk.content, preview_len));
        println!("   {}", style(&chunk.source).dim());
    }

    /// Print the sources an answer was grounded on.
    pub fn sources(chunks: &[ContextChunk]) {
        if chunks.is_empty() {
            return;
        }
        Output::header("Sources");
        for chunk in chunks {
            Output::search_result(chunk, 100);
        }
        println!();
    }

    /// Create a spinner.
    pub fn spinner(msg: &str) -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        if let Ok(spinner_style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
            pb.set_style(spinner_style);
        }
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        pb
    }
}

/// Collapse newlines and truncate on a character boundary.
fn content_preview(content: &str, max_chars: usize) -> String {
    let content = content.split_whitespace().collect::<Vec<_>>().join(" ");
    if content.chars().count() <= max_chars {
        content
    } else {
        let truncated: String = content.chars().take(max_chars).collect();
        format!("{}...", truncated)
    }
}
