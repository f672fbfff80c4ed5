mod bridge;
mod cli;
mod clipboard;
mod controller;
mod debounce;
mod error;
mod file_scanner;
mod host;
mod model;
mod panel;
mod projection;
mod reconcile;
mod store;
mod tree_builder;
mod tui;
mod ui_state;
mod utils;
mod workflow;

use anyhow::{Context, Result};
use clap::Parser;
use std::fs::File;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

// The panel draws on the terminal, so logs only go to stderr in headless mode.
fn init_logging(cli_args: &cli::Cli) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if let Some(path) = &cli_args.log_file {
        let file = File::create(path)
            .with_context(|| format!("cannot create log file {}", path.display()))?;
        builder.with_ansi(false).with_writer(Mutex::new(file)).init();
    } else if cli_args.headless {
        builder.with_writer(std::io::stderr).init();
    } else {
        builder.with_writer(std::io::sink).init();
    }
    Ok(())
}

fn main() -> Result<()> {
    // Handle daemon mode first. This should stay in main.rs as it's an early exit.
    if clipboard::check_and_run_daemon_if_requested()? {
        return Ok(());
    }

    let cli_args = cli::Cli::parse();
    init_logging(&cli_args)?;

    // Delegate the main application logic to the workflow module
    workflow::run_yankboard(cli_args)
}
