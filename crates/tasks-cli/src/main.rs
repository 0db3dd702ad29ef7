mod commands;

use std::io;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tasks_core::{StoreConfig, TaskDb};
use tracing_subscriber::EnvFilter;

use crate::commands::{Action, Cli, WELCOME};

fn main() -> ExitCode {
    // stdout はコマンド出力専用、ログは stderr（RUST_LOG=debug で詳細）
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(io::stderr)
        .init();

    match real_main(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn real_main(cli: Cli) -> Result<()> {
    let Some(command) = cli.command.as_ref() else {
        println!("{WELCOME}");
        return Ok(());
    };

    let mut config = match &cli.config {
        Some(file) => StoreConfig::from_json_file(file)?,
        None => StoreConfig::default(),
    };
    if let Some(db) = &cli.db {
        config.path = db.clone();
    }

    // 引数の検証は store を開く前
    let action = Action::from_command(command)?;

    let mut store = TaskDb::open(&config)
        .with_context(|| format!("open task store {}", config.path.display()))?;

    let mut out = io::stdout().lock();
    let result = commands::run(&mut store, &action, &mut out);

    // 失敗した操作のあとでも close して lock を解放する
    let closed = store.close().context("close task store");
    result.and(closed)
}
