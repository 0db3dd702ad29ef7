//! Command set and dispatch.
//!
//! コマンド一覧は clap の derive enum で起動時に一度だけ組み立てる。
//! dispatch は TaskStore trait 越しなので、テストでは InMemoryTaskStore を使う。

use std::io::Write;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tasks_core::{Position, TaskStore};

pub const WELCOME: &str = "welcome to tasks, enter `tasks --help` to see a list of commands";

#[derive(Debug, Parser)]
#[command(name = "tasks")]
#[command(about = "Tasks is a simple todo application")]
#[command(
    long_about = "A simple cli todo application that will allow you to keep track of things todo"
)]
#[command(version)]
pub struct Cli {
    /// JSON config file ({"path": ..., "lock_timeout_ms": ...})
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<std::path::PathBuf>,

    /// Database file (overrides the config file)
    #[arg(long, global = true, value_name = "PATH")]
    pub db: Option<std::path::PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Add a task
    Add {
        /// Words of the task; joined with single spaces
        #[arg(required = true, num_args = 1..)]
        words: Vec<String>,
    },

    /// List your tasks
    List {
        /// Print a JSON array instead of numbered lines
        #[arg(long)]
        json: bool,
    },

    /// Mark task as done when passed a task number
    Do {
        /// 1-based position as shown by `list`
        #[arg(allow_hyphen_values = true)]
        position: String,
    },

    /// Print store statistics as JSON
    Stats,
}

/// A parsed command that is ready to run against a store.
///
/// position の解釈は store を開く前に済ませる（不正なら transaction を開かない）。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Add(String),
    List { json: bool },
    Do(Position),
    Stats,
}

impl Action {
    pub fn from_command(command: &Command) -> Result<Self> {
        let action = match command {
            Command::Add { words } => Self::Add(words.join(" ")),
            Command::List { json } => Self::List { json: *json },
            Command::Do { position } => Self::Do(position.parse()?),
            Command::Stats => Self::Stats,
        };
        Ok(action)
    }
}

#[derive(Serialize)]
struct ListRow<'a> {
    position: usize,
    id: u64,
    text: &'a str,
}

pub fn run<S: TaskStore>(store: &mut S, action: &Action, out: &mut impl Write) -> Result<()> {
    match action {
        Action::Add(text) => {
            let task = store.add_task(text).context("add task")?;
            writeln!(out, "Added task: {}", task.text)?;
        }
        Action::List { json } => {
            let entries = store.list_tasks().context("list tasks")?;
            if *json {
                let entries = entries.collect::<Result<Vec<_>, _>>()?;
                let rows: Vec<ListRow<'_>> = entries
                    .iter()
                    .map(|e| ListRow {
                        position: e.position.get(),
                        id: e.id.get(),
                        text: &e.text,
                    })
                    .collect();
                serde_json::to_writer_pretty(&mut *out, &rows)?;
                writeln!(out)?;
            } else {
                for entry in entries {
                    writeln!(out, "{}", entry?)?;
                }
            }
        }
        Action::Do(position) => {
            let task = store
                .complete_task(*position)
                .with_context(|| format!("complete task {position}"))?;
            writeln!(out, "Completed task: {}", task.text)?;
        }
        Action::Stats => {
            let stats = store.stats().context("read store stats")?;
            serde_json::to_writer_pretty(&mut *out, &stats)?;
            writeln!(out)?;
        }
    }
    Ok(())
}
