mod commands;
mod config;

use anyhow::Context;
use binlog_index::BinlogEventIndex;
use binlog_logging::BinlogSubscriberBuilder;
use clap::Parser;
use tracing::info;

use crate::config::{Cli, IndexConfig};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = IndexConfig::load(&cli)?;

    // Keep the guard alive so file output is flushed on exit
    let _log_guard = BinlogSubscriberBuilder::new()
        .with_config(config.log.clone())
        .try_init()
        .context("failed to initialize logging")?;

    let db_path = config.store.db_path.clone();
    let index = BinlogEventIndex::open_default(config.store)
        .with_context(|| format!("cannot open event index at {}", db_path.display()))?;
    info!(path = %db_path.display(), command = ?cli.command, "Running command");

    for line in commands::run(&index, cli.command)? {
        println!("{}", serde_json::to_string(&line)?);
    }
    Ok(())
}
