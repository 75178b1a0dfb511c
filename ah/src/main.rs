//! AeroHub - aircraft-maintenance planning agents
//!
//! CLI entry point for planning, question answering and backlog management.

use std::fs;
use std::path::{Path, PathBuf};

use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use serde::Serialize;
use tracing::{debug, info};

use aerohub::agents::{BacklogResult, EfficiencyReport, QaAnswer};
use aerohub::cli::{BacklogCommand, Cli, Command, CompletedCommand, InventoryCommand, OutputFormat, get_log_path};
use aerohub::config::Config;
use aerohub::domain::{BacklogFilter, BacklogItem, CompletedWorkPackage, Inventory};
use aerohub::hub::{Hub, open_state};
use aerohub::pipeline::PlanningResult;
use aerohub::tools::{ResourceMatcherTool, Tool};

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    // Note: Can't log params here since logging isn't initialized yet
    let log_path = get_log_path();
    if let Some(log_dir) = log_path.parent() {
        fs::create_dir_all(log_dir).context("Failed to create log directory")?;
    }

    // Priority: CLI --log-level > config file > default (INFO)
    let level = match cli_log_level.or(config_log_level) {
        Some(s) => match s.to_uppercase().as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", s);
                tracing::Level::INFO
            }
        },
        None => tracing::Level::INFO,
    };

    let log_file = fs::File::create(&log_path).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load log level from config file early (before full config load)
    let config_log_level = Config::load_log_level(cli.config.as_ref());
    setup_logging(cli.log_level.as_deref(), config_log_level.as_deref()).context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    info!(provider = %config.llm.provider, model = %config.llm.model, "AeroHub loaded config");

    let format = cli.format;
    debug!(command = ?cli.command, "main: dispatching command");
    match cli.command {
        Command::Plan { fault, no_review } => cmd_plan(&config, &fault, !no_review, format).await,
        Command::Review {
            tech_context,
            work_package,
            resource_plan,
        } => cmd_review(&config, &tech_context, &work_package, &resource_plan, format).await,
        Command::Ask { question } => cmd_ask(&config, &question, format).await,
        Command::Chat => cmd_chat(&config, format).await,
        Command::Sprint { request } => cmd_sprint(&config, &request, format).await,
        Command::Efficiency { sprint } => cmd_efficiency(&config, sprint, format).await,
        Command::Backlog { command } => match command {
            BacklogCommand::List {
                item_type,
                sprint,
                status,
            } => {
                let filter = BacklogFilter {
                    item_type,
                    sprint,
                    status,
                };
                cmd_backlog_list(&config, filter, format).await
            }
        },
        Command::Completed { command } => match command {
            CompletedCommand::Add { file } => cmd_completed_add(&config, &file, format).await,
            CompletedCommand::List { sprint } => cmd_completed_list(&config, sprint, format).await,
        },
        Command::Inventory { command } => match command {
            InventoryCommand::Seed { file } => cmd_inventory_seed(&config, file, format).await,
            InventoryCommand::List => cmd_inventory_list(&config, format).await,
        },
        Command::Match { file } => cmd_match(&config, &file).await,
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn heading(title: &str) {
    println!("\n{}", format!("== {} ==", title).bold().cyan());
}

fn read_file(path: &Path) -> Result<String> {
    fs::read_to_string(path).context(format!("Failed to read {}", path.display()))
}

/// Run the planning pipeline on a fault description
async fn cmd_plan(config: &Config, fault: &str, with_review: bool, format: OutputFormat) -> Result<()> {
    debug!(%fault, with_review, "cmd_plan: called");
    let hub = Hub::build(config).await?;
    let result = hub.pipeline().run(fault, with_review).await?;

    match format {
        OutputFormat::Json => print_json(&result),
        OutputFormat::Text => {
            print_plan(&result);
            Ok(())
        }
    }
}

fn print_plan(result: &PlanningResult) {
    heading("Technical Context");
    println!("{}", result.tech_context.trim());

    heading("Work Package");
    println!("{}", result.work_package.trim());
    if let Some(ref report) = result.work_package_report {
        if report.is_clean() {
            println!("{} work package is consistent", "✓".green());
        } else {
            for issue in &report.issues {
                println!("{} {}", "!".yellow(), issue);
            }
            println!(
                "Recomputed total: {} min",
                report.work_package.total_estimated_minutes
            );
        }
    }
    if let Some(ref error) = result.work_package_error {
        println!("{} {}", "✗".red(), error);
    }

    heading("Resource Plan");
    println!("{}", result.resource_plan.trim());

    if let Some(ref review) = result.qa_review {
        heading("QA Review");
        println!("{}", review.trim());
    }
}

/// Review an existing plan from files
async fn cmd_review(
    config: &Config,
    tech_context: &Path,
    work_package: &Path,
    resource_plan: &Path,
    format: OutputFormat,
) -> Result<()> {
    debug!("cmd_review: called");
    let tech_context = read_file(tech_context)?;
    let work_package = read_file(work_package)?;
    let resource_plan = read_file(resource_plan)?;

    let hub = Hub::build(config).await?;
    let review = hub.pipeline().review(&tech_context, &work_package, &resource_plan).await?;

    match format {
        OutputFormat::Json => print_json(&serde_json::json!({ "qa_review": review })),
        OutputFormat::Text => {
            println!("{}", review.trim());
            Ok(())
        }
    }
}

/// Answer one question
async fn cmd_ask(config: &Config, question: &str, format: OutputFormat) -> Result<()> {
    debug!(%question, "cmd_ask: called");
    let hub = Hub::build(config).await?;
    let answer = hub.qa().answer(question).await?;
    print_answer(&answer, format)
}

fn print_answer(answer: &QaAnswer, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => print_json(answer),
        OutputFormat::Text => {
            println!("{}", answer.answer.trim());
            Ok(())
        }
    }
}

/// Interactive QA loop
async fn cmd_chat(config: &Config, format: OutputFormat) -> Result<()> {
    debug!("cmd_chat: called");
    let hub = Hub::build(config).await?;
    let qa = hub.qa();
    let mut editor = DefaultEditor::new()?;

    println!("AeroHub assistant. Ask about aircraft maintenance; 'exit' or Ctrl-D to quit.");
    loop {
        match editor.readline("ah> ") {
            Ok(line) => {
                let question = line.trim();
                if question.is_empty() {
                    continue;
                }
                if matches!(question, "exit" | "quit") {
                    break;
                }
                let _ = editor.add_history_entry(question);

                match qa.answer(question).await {
                    Ok(answer) => print_answer(&answer, format)?,
                    Err(e) => eprintln!("{} {}", "error:".red(), e),
                }
                println!();
            }
            Err(ReadlineError::Interrupted) => continue,
            Err(ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        }
    }

    info!("Chat session ended");
    Ok(())
}

/// Translate and apply a backlog request
async fn cmd_sprint(config: &Config, request: &str, format: OutputFormat) -> Result<()> {
    debug!(%request, "cmd_sprint: called");
    let hub = Hub::build(config).await?;
    let result = hub.sprint().run(request).await?;

    if format == OutputFormat::Json {
        return print_json(&result);
    }

    match result {
        BacklogResult::Created {
            created, backlog_size, ..
        } => {
            println!(
                "{} Created {} item(s), backlog size {}",
                "✓".green(),
                created.len(),
                backlog_size
            );
            for id in created {
                println!("  {}", id.yellow());
            }
        }
        BacklogResult::Updated { item, .. } => {
            println!("{} Updated", "✓".green());
            print_items(std::slice::from_ref(&item));
        }
        BacklogResult::Listed { items, .. } => print_items(&items),
        BacklogResult::Failed { operation, error } => {
            println!("{} {}: {}", "✗".red(), operation, error);
        }
    }
    Ok(())
}

fn print_items(items: &[BacklogItem]) {
    if items.is_empty() {
        println!("No backlog items");
        return;
    }
    for item in items {
        let sprint = item.sprint.as_deref().unwrap_or("-");
        println!(
            "{}  {:<8} {:<12} {:<10} {}",
            item.id.yellow(),
            item.item_type.to_string(),
            item.status.to_string(),
            sprint,
            item.title
        );
    }
}

/// Efficiency analysis
async fn cmd_efficiency(config: &Config, sprint: Option<String>, format: OutputFormat) -> Result<()> {
    debug!(?sprint, "cmd_efficiency: called");
    let hub = Hub::build(config).await?;
    let report = hub.efficiency().run(sprint).await?;

    match format {
        OutputFormat::Json => print_json(&report),
        OutputFormat::Text => {
            print_efficiency(&report);
            Ok(())
        }
    }
}

fn print_efficiency(report: &EfficiencyReport) {
    let m = &report.metrics;
    heading("Metrics");
    println!("Completed work packages: {}", m.total_completed);
    println!("First-pass success:      {:.1}%", m.first_pass_success_rate);
    println!("Average rework count:    {:.1}", m.avg_rework_count);
    if let Some(variance) = m.schedule_variance_pct {
        println!("Schedule variance:       {:+.1}%", variance);
    }

    heading("Summary");
    println!("{}", report.summary.trim());

    if !report.suggestions.is_empty() {
        heading("Suggestions");
        for suggestion in &report.suggestions {
            println!("- {}", suggestion);
        }
    }
}

/// List backlog items without the LLM
async fn cmd_backlog_list(config: &Config, filter: BacklogFilter, format: OutputFormat) -> Result<()> {
    debug!(?filter, "cmd_backlog_list: called");
    let state = open_state(config).await?;
    let items = state.list_backlog_items(filter).await?;

    match format {
        OutputFormat::Json => print_json(&items),
        OutputFormat::Text => {
            print_items(&items);
            Ok(())
        }
    }
}

/// Parse one completed record or a list of them
fn load_completed(path: &Path) -> Result<Vec<CompletedWorkPackage>> {
    let text = read_file(path)?;
    let value: serde_yaml::Value = serde_yaml::from_str(&text).context("Failed to parse completed work packages")?;
    let records = if value.is_sequence() {
        serde_yaml::from_value(value)?
    } else {
        vec![serde_yaml::from_value(value)?]
    };
    Ok(records)
}

async fn cmd_completed_add(config: &Config, file: &Path, format: OutputFormat) -> Result<()> {
    debug!(file = %file.display(), "cmd_completed_add: called");
    let records = load_completed(file)?;
    let state = open_state(config).await?;

    let mut ids = Vec::with_capacity(records.len());
    for record in records {
        ids.push(state.add_completed(record).await?);
    }
    state.sync().await?;

    match format {
        OutputFormat::Json => print_json(&serde_json::json!({ "added": ids })),
        OutputFormat::Text => {
            println!("{} Recorded {} completed work package(s)", "✓".green(), ids.len());
            Ok(())
        }
    }
}

async fn cmd_completed_list(config: &Config, sprint: Option<String>, format: OutputFormat) -> Result<()> {
    debug!(?sprint, "cmd_completed_list: called");
    let state = open_state(config).await?;
    let completed = state.list_completed(sprint).await?;

    match format {
        OutputFormat::Json => print_json(&completed),
        OutputFormat::Text => {
            if completed.is_empty() {
                println!("No completed work packages");
            }
            for c in &completed {
                let result = if c.first_pass_success {
                    "first-pass".green()
                } else {
                    format!("rework x{}", c.rework_count).yellow()
                };
                println!(
                    "{}  {:<10} {:<8} {} {}",
                    c.id.yellow(),
                    c.sprint_id.as_deref().unwrap_or("-"),
                    c.criticality,
                    result,
                    c.completed_at.format("%Y-%m-%d %H:%M")
                );
            }
            Ok(())
        }
    }
}

async fn cmd_inventory_seed(config: &Config, file: Option<PathBuf>, format: OutputFormat) -> Result<()> {
    debug!(?file, "cmd_inventory_seed: called");
    let inventory = match file {
        Some(ref path) => Inventory::from_yaml(&read_file(path)?).context("Failed to parse inventory file")?,
        None => Inventory::sample()?,
    };
    let state = open_state(config).await?;
    let count = state.upsert_inventory(inventory).await?;
    state.sync().await?;

    match format {
        OutputFormat::Json => print_json(&serde_json::json!({ "upserted": count })),
        OutputFormat::Text => {
            println!("{} Upserted {} inventory record(s)", "✓".green(), count);
            Ok(())
        }
    }
}

async fn cmd_inventory_list(config: &Config, format: OutputFormat) -> Result<()> {
    debug!("cmd_inventory_list: called");
    let state = open_state(config).await?;
    let inventory = state.inventory().await?;

    match format {
        OutputFormat::Json => print_json(&inventory),
        OutputFormat::Text => {
            heading("Personnel");
            for p in &inventory.personnel {
                println!(
                    "{}  {:<20} {:<10} {:<8} {}",
                    p.id.yellow(),
                    p.name,
                    p.ratings.join(","),
                    p.shift,
                    p.availability
                );
            }
            heading("Tools");
            for t in &inventory.tools {
                println!("{}  {:<28} {}", t.id.yellow(), t.name, t.location);
            }
            heading("Parts");
            for p in &inventory.parts {
                println!("{}  {:<14} {:<32} stock {}", p.id.yellow(), p.part_no, p.name, p.stock_level);
            }
            Ok(())
        }
    }
}

/// Resource-match a work package file without the LLM
async fn cmd_match(config: &Config, file: &Path) -> Result<()> {
    debug!(file = %file.display(), "cmd_match: called");
    let work_package = read_file(file)?;
    let state = open_state(config).await?;

    let output = ResourceMatcherTool::new(state).invoke(&work_package).await?;
    let value: serde_json::Value = serde_json::from_str(&output)?;
    print_json(&value)
}
