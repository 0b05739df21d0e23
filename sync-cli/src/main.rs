//! # sync-cli
//!
//! CLI tool for watching peersync progress.
//!
//! ## Commands
//!
//! - `watch`: Run a simulated sync session and print each snapshot
//! - `aggregate`: Compute overall progress from a file of peer records
//!
//! ## Example
//!
//! ```bash
//! # Watch 15 simulated devices sync
//! peersync watch --peers 15
//!
//! # Same, as one JSON snapshot per line, with a config file
//! peersync --config peersync.toml watch --json
//!
//! # Aggregate a peer dump
//! peersync aggregate peers.json
//! ```
//!
//! Logs go to stderr and are controlled by `RUST_LOG` (default `warn`).

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;

use commands::{aggregate, watch};
use config::Config;

/// CLI tool for watching peersync progress.
#[derive(Parser, Debug)]
#[command(name = "peersync")]
#[command(version, about, long_about = None)]
struct Cli {
    /// TOML configuration file (defaults apply when omitted)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a simulated sync session and print each snapshot
    Watch {
        /// Number of simulated peers (overrides config)
        #[arg(long)]
        peers: Option<usize>,

        /// Seed for deterministic simulation (overrides config)
        #[arg(long)]
        seed: Option<u64>,

        /// Stop after this many seconds even if sync is unfinished
        #[arg(long, default_value = "30")]
        duration_secs: u64,

        /// Print one JSON snapshot per line
        #[arg(long)]
        json: bool,
    },

    /// Compute overall progress from a JSON file of peer records
    Aggregate {
        /// File containing `[{"id": .., "name": .., "has": .., "wants": ..}, ..]`
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => Config::default(),
    };

    match cli.command {
        Commands::Watch {
            peers,
            seed,
            duration_secs,
            json,
        } => {
            let options = watch::WatchOptions {
                peers,
                seed,
                duration: Duration::from_secs(duration_secs),
                json,
            };
            watch::run(&config, options).await?;
        }
        Commands::Aggregate { file } => {
            aggregate::run(&file)?;
        }
    }

    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
