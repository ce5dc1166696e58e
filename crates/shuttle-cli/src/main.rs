use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::Value;
use tracing_subscriber::EnvFilter;

use shuttle_core::domain::TaskDecision;
use shuttle_core::{CycleStatus, DecisionCycle};

#[derive(Debug, Parser)]
#[command(name = "shuttle", about = "Decide the next workflow actions from a history")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Decide the next actions for one or more tasks
    Decide {
        /// Task definition file (a single definition or an array)
        #[arg(long)]
        task: PathBuf,

        /// History file (array of raw history records)
        #[arg(long)]
        history: PathBuf,

        /// Pretty-print the output
        #[arg(long)]
        pretty: bool,
    },
}

#[derive(Debug, Serialize)]
struct Output {
    decisions: Vec<TaskDecision>,
    status: CycleStatus,
}

fn read_json(path: &Path) -> Result<Value> {
    let raw = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parse {}", path.display()))
}

fn decide(task: &Path, history: &Path, pretty: bool) -> Result<String> {
    let cycle = DecisionCycle::from_json(&read_json(task)?)
        .with_context(|| format!("tasks {}", task.display()))?;
    let decisions = cycle
        .decide_json(&read_json(history)?)
        .with_context(|| format!("history {}", history.display()))?;

    let status = CycleStatus::from_decisions(&decisions);
    if status.should_halt() {
        tracing::warn!(fatal = status.fatal, "workflow should halt");
    }

    let output = Output { decisions, status };
    let rendered = if pretty {
        serde_json::to_string_pretty(&output)?
    } else {
        serde_json::to_string(&output)?
    };
    Ok(rendered)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    match Cli::parse().command {
        Command::Decide {
            task,
            history,
            pretty,
        } => println!("{}", decide(&task, &history, pretty)?),
    }
    Ok(())
}
