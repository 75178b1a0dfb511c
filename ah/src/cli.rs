//! CLI command definitions and subcommands

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::debug;

/// AeroHub - aircraft-maintenance planning agents
#[derive(Parser)]
#[command(
    name = "ah",
    about = "Multi-agent aircraft-maintenance planning hub",
    version = env!("CARGO_PKG_VERSION"),
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        short = 'l',
        long = "log-level",
        global = true,
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,

    /// Output format
    #[arg(short, long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Plan a fault: research, work package, resource plan and review
    Plan {
        /// Fault description
        fault: String,

        /// Skip the QA review stage
        #[arg(long)]
        no_review: bool,
    },

    /// Review an existing plan
    Review {
        /// File with the technical context
        #[arg(long)]
        tech_context: PathBuf,

        /// File with the work package
        #[arg(long)]
        work_package: PathBuf,

        /// File with the resource plan
        #[arg(long)]
        resource_plan: PathBuf,
    },

    /// Ask the guarded maintenance assistant one question
    Ask {
        /// Question text
        question: String,
    },

    /// Interactive question answering
    Chat,

    /// Translate a free-text backlog request and apply it
    Sprint {
        /// Request, e.g. "add a task to replace the actuator seal"
        request: String,
    },

    /// Efficiency summary and suggestions from completed work packages
    Efficiency {
        /// Limit to one sprint
        #[arg(short, long)]
        sprint: Option<String>,
    },

    /// Inspect the backlog directly
    Backlog {
        #[command(subcommand)]
        command: BacklogCommand,
    },

    /// Record and list completed work packages
    Completed {
        #[command(subcommand)]
        command: CompletedCommand,
    },

    /// Manage personnel, tool and part inventory
    Inventory {
        #[command(subcommand)]
        command: InventoryCommand,
    },

    /// Match a work package file against the inventory
    Match {
        /// Work package JSON file
        file: PathBuf,
    },
}

/// Backlog subcommands
#[derive(Debug, Subcommand)]
pub enum BacklogCommand {
    /// List backlog items
    List {
        /// Filter by type (product, sprint)
        #[arg(short = 't', long = "type")]
        item_type: Option<String>,

        /// Filter by sprint name
        #[arg(long)]
        sprint: Option<String>,

        /// Filter by status (todo, in_progress, done or a synonym)
        #[arg(short, long)]
        status: Option<String>,
    },
}

/// Completed work package subcommands
#[derive(Debug, Subcommand)]
pub enum CompletedCommand {
    /// Add records from a JSON or YAML file (one record or a list)
    Add {
        file: PathBuf,
    },

    /// List completed work packages
    List {
        /// Filter by sprint id
        #[arg(short, long)]
        sprint: Option<String>,
    },
}

/// Inventory subcommands
#[derive(Debug, Subcommand)]
pub enum InventoryCommand {
    /// Upsert inventory records, the built-in sample when no file is given
    Seed {
        /// Inventory YAML or JSON file
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// List all inventory records
    List,
}

/// Get the log file path
pub fn get_log_path() -> PathBuf {
    debug!("get_log_path: called");
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("aerohub")
        .join("logs")
        .join("aerohub.log")
}

/// Output format for command results
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        debug!(%s, "OutputFormat::from_str: called");
        match s.to_lowercase().as_str() {
            "text" | "plain" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(format!("Unknown format: {}. Use: text or json", s)),
        }
    }
}
