mod config;

use std::{
    fs,
    io::{self, Read, Write},
    path::PathBuf,
};

use agent::{Agent, BatchReport, Event};
use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use classifier::{snapshot, Model};
use config::{load_settings, prepare_database_url, Settings};
use serde_json::{json, Map, Value};
use storage::Storage;
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(name = "nbctl", about = "Event-driven naive Bayes classifier")]
struct Cli {
    /// TOML settings file. Defaults to ./nbctl.toml when present.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[arg(long, global = true)]
    database_url: Option<String>,
    /// Agent whose model is read and updated.
    #[arg(long, global = true)]
    agent: Option<String>,
    #[arg(long, global = true)]
    min_value: Option<String>,
    #[arg(long, global = true)]
    propagate_training_events: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Feed JSON events (one object per line) through the agent.
    Receive {
        /// Read events from this file instead of stdin.
        #[arg(long)]
        input: Option<PathBuf>,
    },
    Classify {
        text: String,
    },
    /// Train (or with a leading '-', untrain) space separated categories.
    Train {
        categories: String,
        text: String,
    },
    /// Replace the model with a YAML or JSON snapshot file.
    Load {
        file: PathBuf,
    },
    Dump,
    Purge {
        threshold: String,
    },
    DeleteCategory {
        #[arg(required = true)]
        names: Vec<String>,
    },
    Stats,
    /// Drop the stored model for the agent.
    Reset,
    /// List agents that have a stored model.
    Agents,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut settings = load_settings(cli.config.as_deref())?;
    apply_cli_overrides(&mut settings, &cli);

    tracing_subscriber::fmt()
        .with_env_filter(settings.log_filter.as_str())
        .with_writer(io::stderr)
        .init();

    let database_url = prepare_database_url(&settings.database_url);
    let storage = Storage::new(&database_url).await.map_err(|error| {
        error!(%database_url, error = %error, "failed to initialize storage");
        error
    })?;
    storage.health_check().await?;
    info!(agent = %settings.agent_id, %database_url, "storage ready");

    execute(cli.command, &settings, &storage).await
}

async fn execute(command: Command, settings: &Settings, storage: &Storage) -> Result<()> {
    match command {
        Command::Receive { input } => {
            let raw = match input {
                Some(path) => fs::read_to_string(&path)
                    .with_context(|| format!("failed to read events from '{}'", path.display()))?,
                None => {
                    let mut raw = String::new();
                    io::stdin()
                        .read_to_string(&mut raw)
                        .context("failed to read events from stdin")?;
                    raw
                }
            };
            let events = parse_events(&raw)?;
            run_batch(settings, storage, events).await?;
        }
        Command::Classify { text } => {
            run_batch(settings, storage, vec![Event::new(text, "")]).await?;
        }
        Command::Train { categories, text } => {
            run_batch(settings, storage, vec![Event::new(text, categories)]).await?;
        }
        Command::Load { file } => {
            let content = fs::read_to_string(&file)
                .with_context(|| format!("failed to read snapshot '{}'", file.display()))?;
            run_batch(settings, storage, vec![Event::new(content, "=loadYML")]).await?;
        }
        Command::Dump => {
            let model = load_model(storage, &settings.agent_id).await?;
            print!("{}", snapshot::dump(&model)?);
        }
        Command::Purge { threshold } => {
            run_batch(settings, storage, vec![Event::new(threshold, "=purgeTokens")]).await?;
        }
        Command::DeleteCategory { names } => {
            run_batch(settings, storage, vec![Event::new(names.join(" "), "=delCat")]).await?;
        }
        Command::Stats => {
            let model = load_model(storage, &settings.agent_id).await?;
            let updated_at = storage
                .load_stored_model(&settings.agent_id)
                .await?
                .map(|stored| stored.updated_at.to_rfc3339());
            let report = json!({
                "agent": settings.agent_id,
                "updated_at": updated_at,
                "model": model.stats(),
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::Reset => {
            let removed = storage.delete_snapshot(&settings.agent_id).await?;
            info!(agent = %settings.agent_id, removed, "reset model");
        }
        Command::Agents => {
            for agent_id in storage.list_agents().await? {
                println!("{agent_id}");
            }
        }
    }

    Ok(())
}

/// Reads the stored model without building an agent, so read-only commands
/// do not depend on valid agent options.
async fn load_model(storage: &Storage, agent_id: &str) -> Result<Model> {
    let stored = storage.load_snapshot(agent_id).await?;
    snapshot::load(stored.as_deref().unwrap_or_default())
        .with_context(|| format!("stored model for agent '{agent_id}' is unreadable"))
}

fn apply_cli_overrides(settings: &mut Settings, cli: &Cli) {
    if let Some(v) = &cli.database_url {
        settings.database_url = v.clone();
    }
    if let Some(v) = &cli.agent {
        settings.agent_id = v.clone();
    }
    if let Some(v) = &cli.min_value {
        settings.min_value = v.clone();
    }
    if let Some(v) = &cli.propagate_training_events {
        settings.propagate_training_events = v.clone();
    }
}

/// One JSON object per non-blank line.
fn parse_events(raw: &str) -> Result<Vec<Event>> {
    raw.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(line_no, line)| {
            let payload: Map<String, Value> = serde_json::from_str(line)
                .with_context(|| format!("line {}: event must be a JSON object", line_no + 1))?;
            Ok(Event::from_payload(payload))
        })
        .collect()
}

async fn run_batch(settings: &Settings, storage: &Storage, events: Vec<Event>) -> Result<()> {
    let mut agent = Agent::new(
        settings.agent_id.clone(),
        &settings.agent_options(),
        storage.clone(),
    )?;
    let report = agent.receive(events).await?;
    write_emitted(&report, &mut io::stdout().lock())?;

    for (index, rejection) in &report.rejected {
        warn!(index, error = %rejection, "category rejected");
    }
    if !report.failures.is_empty() {
        for failure in &report.failures {
            error!(index = failure.index, error = %failure.error, "event failed");
        }
        bail!("{} event(s) failed", report.failures.len());
    }
    Ok(())
}

fn write_emitted(report: &BatchReport, out: &mut impl Write) -> Result<()> {
    for event in &report.emitted {
        writeln!(out, "{}", serde_json::to_string(event.payload())?)?;
    }
    Ok(())
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
