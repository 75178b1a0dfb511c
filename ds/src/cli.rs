//! CLI argument parsing for docstore

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "ds")]
#[command(author, version, about = "Maintenance document store with lexical retrieval", long_about = None)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Ingest files, directories or glob patterns into a new context
    Ingest {
        /// File paths, directories or glob patterns to ingest
        #[arg(required = true)]
        paths: Vec<String>,

        /// Chunk size in bytes (default: 2KB)
        #[arg(short = 's', long)]
        chunk_size: Option<usize>,

        /// Overlap between chunks in bytes (default: 256)
        #[arg(short, long)]
        overlap: Option<usize>,
    },

    /// Rank passages across all contexts for a query
    Retrieve {
        /// Free-text query
        #[arg(required = true)]
        query: String,

        /// Number of passages to return
        #[arg(short = 'k', long)]
        top_k: Option<usize>,
    },

    /// Regex search within a context
    Search {
        /// Context ID to search
        #[arg(required = true)]
        context_id: String,

        /// Search pattern (regex)
        #[arg(required = true)]
        pattern: String,

        /// Maximum results to return
        #[arg(short, long)]
        max_results: Option<usize>,

        /// Case insensitive matching
        #[arg(short = 'i', long)]
        ignore_case: bool,
    },

    /// Display a chunk's content
    Cat {
        /// Chunk reference: context_id/chunk_num
        #[arg(required = true)]
        chunk_id: String,
    },

    /// Get a window of text around an offset in a chunk
    Window {
        /// Chunk reference: context_id/chunk_num
        #[arg(required = true)]
        chunk_id: String,

        /// Center offset in bytes
        #[arg(required = true)]
        offset: usize,

        /// Radius in bytes
        #[arg(short, long, default_value = "500")]
        radius: usize,
    },

    /// Show statistics for a context
    Stats {
        /// Context ID
        #[arg(required = true)]
        context_id: String,
    },

    /// List all contexts
    List,

    /// Delete a context
    Delete {
        /// Context ID to delete
        #[arg(required = true)]
        context_id: String,
    },
}
