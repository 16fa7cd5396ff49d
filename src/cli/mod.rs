//! CLI module for docchat.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand};

/// docchat - Chat with your documents
///
/// Ingest PDFs and YouTube transcripts into a local vector store, then ask
/// questions about them or chat with follow-ups.
#[derive(Parser, Debug)]
#[command(name = "docchat")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize docchat and verify system requirements
    Init,

    /// Check system requirements and configuration
    Doctor,

    /// Load, split, embed and store documents
    Ingest {
        /// PDF file, directory of PDFs, or YouTube URL/ID (default: the document directory)
        input: Option<String>,

        /// Clear the whole store before ingesting
        #[arg(long)]
        rebuild: bool,

        /// Splitting strategy (window, recursive)
        #[arg(long)]
        strategy: Option<String>,

        /// Maximum chunk size in characters
        #[arg(long)]
        chunk_size: Option<usize>,

        /// Characters shared by adjacent chunks
        #[arg(long)]
        chunk_overlap: Option<usize>,
    },

    /// Ask a single question about the indexed documents
    Ask {
        /// The question to ask
        question: String,

        /// LLM model to use for response generation
        #[arg(short, long)]
        model: Option<String>,

        /// How retrieved chunks are combined (stuff, map_reduce, refine)
        #[arg(long)]
        chain: Option<String>,

        /// Answer style (concise, detailed)
        #[arg(long)]
        style: Option<String>,

        /// File with a custom prompt using {{context}} and {{question}}
        #[arg(long)]
        template: Option<String>,

        /// Number of chunks to retrieve
        #[arg(short, long)]
        k: Option<usize>,

        /// Use MMR re-ranking for retrieval
        #[arg(long)]
        mmr: bool,

        /// Have the model extract the relevant part of each retrieved chunk
        #[arg(long)]
        compress: bool,
    },

    /// Search for relevant chunks without generating an answer
    Search {
        /// Search query
        query: String,

        /// Maximum number of results
        #[arg(short, long, default_value = "3")]
        k: usize,

        /// Re-rank candidates with MMR for diversity
        #[arg(long)]
        mmr: bool,

        /// Candidates fetched before MMR re-ranking
        #[arg(long, default_value = "10")]
        fetch_k: usize,

        /// Only search chunks from this source (file path or URL)
        #[arg(short, long)]
        source: Option<String>,

        /// Minimum similarity score (-1.0 to 1.0)
        #[arg(long)]
        min_score: Option<f32>,

        /// Have the model extract the relevant part of each result
        #[arg(long)]
        compress: bool,
    },

    /// Start an interactive chat session
    Chat {
        /// LLM model to use
        #[arg(short, long)]
        model: Option<String>,

        /// Only use chunks from this source
        #[arg(short, long)]
        source: Option<String>,

        /// Have the model extract the relevant part of each retrieved chunk
        #[arg(long)]
        compress: bool,
    },

    /// List indexed sources
    List,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Open configuration file in editor
    Edit,

    /// Show configuration file path
    Path,
}
