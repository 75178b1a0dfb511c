use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use log::info;

use docstore::cli::{Cli, Command};
use docstore::config::Config;
use docstore::{DocStore, IngestOptions, SearchOptions};

fn setup_logging() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Warn)
        .init();
    Ok(())
}

fn main() -> Result<()> {
    setup_logging().context("Failed to setup logging")?;

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    info!("docstore starting at {}", config.store_path.display());
    let store = DocStore::open(&config.store_path)?;

    match cli.command {
        Command::Ingest {
            paths,
            chunk_size,
            overlap,
        } => {
            let ctx_id = store.ingest(
                &paths,
                IngestOptions {
                    chunk_size: chunk_size.unwrap_or(config.chunk_size),
                    overlap: overlap.unwrap_or(config.overlap),
                },
            )?;
            println!("{} Ingested to context: {}", "✓".green(), ctx_id.cyan());
        }
        Command::Retrieve { query, top_k } => {
            let passages = store.retrieve(&query, top_k.unwrap_or(config.top_k))?;
            if passages.is_empty() {
                println!("No passages matched");
            }
            for p in passages {
                println!(
                    "{} {} {}",
                    p.chunk_ref.yellow(),
                    format!("terms={} hits={}", p.matched_terms, p.hits).dimmed(),
                    p.source
                );
                println!("{}\n", p.text.trim());
            }
        }
        Command::Search {
            context_id,
            pattern,
            max_results,
            ignore_case,
        } => {
            let matches = store.search(
                &context_id,
                &pattern,
                SearchOptions {
                    max_results: max_results.unwrap_or(10),
                    case_insensitive: ignore_case,
                },
            )?;
            for m in matches {
                println!(
                    "{}:{} {}",
                    m.chunk_id.yellow(),
                    m.offset.to_string().dimmed(),
                    m.snippet
                );
            }
        }
        Command::Cat { chunk_id } => {
            println!("{}", store.get_chunk(&chunk_id)?);
        }
        Command::Window {
            chunk_id,
            offset,
            radius,
        } => {
            println!("{}", store.get_window(&chunk_id, offset, radius)?);
        }
        Command::Stats { context_id } => {
            let stats = store.stats(&context_id)?;
            println!("Context: {}", context_id.cyan());
            println!("  Chunks: {}", stats.chunk_count);
            println!("  Total bytes: {}", stats.total_bytes);
            println!("  Sources: {}", stats.source_count);
        }
        Command::List => {
            let contexts = store.list_contexts()?;
            if contexts.is_empty() {
                println!("No contexts found");
            } else {
                for ctx in contexts {
                    println!("{}", ctx);
                }
            }
        }
        Command::Delete { context_id } => {
            store.delete(&context_id)?;
            println!("{} Deleted context: {}", "✓".green(), context_id);
        }
    }

    Ok(())
}
