//! CLI entry point for the openaire tool.

use std::io::{self, IsTerminal};
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use tracing::debug;

mod app_config;
mod cli;
mod commands;
mod exit_handler;
mod output;

use app_config::{EffectiveConfig, load_default_file_config};
use cli::{Cli, Command, ConfigCommand};
use exit_handler::ProcessExit;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let cli = Cli::parse();

    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let default_level = if cli.quiet {
        "error"
    } else {
        match cli.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };
    init_tracing(default_level);
    debug!(command = ?cli.command, "CLI arguments parsed");

    let loaded = load_default_file_config()?;
    let effective = EffectiveConfig::resolve(
        cli.api_key.as_deref(),
        cli.base_url.as_deref(),
        loaded.config.as_ref(),
    );
    debug!(config = ?effective, "Effective configuration");

    let exit = match &cli.command {
        Command::Search(args) => commands::run_search_command(args, &effective).await?,
        Command::Harvest(args) => commands::run_harvest_command(args, &effective).await?,
        Command::Bibtex(args) => {
            let show_progress = io::stderr().is_terminal() && !cli.quiet;
            commands::run_bibtex_command(args, &effective, show_progress).await?
        }
        Command::Config { command } => match command {
            ConfigCommand::Show => {
                commands::run_config_show_command(&loaded, &effective)?;
                ProcessExit::Success
            }
        },
    };

    Ok(exit.into())
}

/// Logs go to stderr so record output on stdout stays machine-readable.
fn init_tracing(default_level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .try_init();
}
