//! steadfast CLI
//!
//! Reads, writes and removes files through the durable writer.

mod cli;
mod commands;
mod error;
mod logging;

use clap::Parser;
use colored::Colorize;
use steadfast_fs::{NormalizedPath, Settings};

use cli::{Cli, Commands};
use error::{CliError, Result};

fn main() {
    if let Err(e) = run() {
        eprintln!("{}: {}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    logging::init(cli.verbose).map_err(|e| CliError::user(format!("Failed to set up logging: {e}")))?;
    tracing::debug!("Verbose mode enabled");

    let settings = match &cli.config {
        Some(path) => Settings::load(&NormalizedPath::parse(path)?)?,
        None => Settings::default(),
    };

    execute_command(&settings, cli.command)
}

fn execute_command(settings: &Settings, cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Read { path } => commands::run_read(settings, &path),
        Commands::Write { path, expect } => commands::run_write(settings, &path, expect.as_deref()),
        Commands::Rm { path } => commands::run_rm(settings, &path),
        Commands::Fingerprint { path } => commands::run_fingerprint(settings, &path),
    }
}
