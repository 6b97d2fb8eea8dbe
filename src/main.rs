//! raiden - redundant file splitter
//!
//! Usage:
//!   raiden split <file> <disks>  - Write <file>_0 .. <file>_(disks-1)
//!   raiden merge <file> <disks>  - Rebuild <file> into res__<file>

use clap::{Parser, Subcommand};
use raiden::{config::Config, Result};
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, Level};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "raiden")]
#[command(author = "raiden Contributors")]
#[command(version)]
#[command(about = "Split a file across disks with parity and merge it back")]
struct Cli {
    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Split a file into data and parity shards
    Split {
        /// File to split
        file: PathBuf,

        /// Number of disks (at least 2)
        disks: usize,
    },

    /// Merge shards back into res__<file>, tolerating one missing disk
    Merge {
        /// Original file path the shards were split from
        file: PathBuf,

        /// Number of disks the file was split into
        disks: usize,
    },
}

fn main() {
    let cli = Cli::parse();

    // Setup logging
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_env("RAIDEN_LOG")
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(std::io::stderr().is_terminal())
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(cli) {
        if tracing::enabled!(Level::ERROR) {
            error!("Error: {}", e);
        } else {
            // Logging is filtered out; the failure still needs a message
            eprintln!("raiden: {}", e);
        }
        std::process::exit(e.exit_code());
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = Config::resolve(cli.config.as_deref())?;
    run_command(cli.command, &config)
}

fn run_command(command: Commands, config: &Config) -> Result<()> {
    match command {
        Commands::Split { file, disks } => cmd_split(&file, disks, config),
        Commands::Merge { file, disks } => cmd_merge(&file, disks, config),
    }
}

fn cmd_split(file: &Path, disks: usize, config: &Config) -> Result<()> {
    let report = raiden::split(file, disks, config)?;
    for path in &report.shard_paths {
        debug!("Wrote {}", path.display());
    }
    Ok(())
}

fn cmd_merge(file: &Path, disks: usize, config: &Config) -> Result<()> {
    let report = raiden::merge(file, disks, config)?;
    if let Some(index) = report.missing {
        info!("Merged without disk {}", index);
    }
    Ok(())
}
