//! Screenplay CLI - Headless Player Driver
//!
//! Features:
//! - Scripted playback sessions against a simulated backend
//! - Seek clamp and tolerance checks
//! - Effective configuration dump

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod output;
mod script;

/// Screenplay CLI - Playback abstraction toolkit
#[derive(Parser)]
#[command(name = "screenplay")]
#[command(author = "Screenplay Developers")]
#[command(version)]
#[command(about = "Drive and inspect Screenplay players", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Output format (text, json, table)
    #[arg(short, long, default_value = "text")]
    format: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a scripted session against the simulated backend
    Simulate {
        /// Path to the script (JSON)
        script: PathBuf,

        /// Player configuration (JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Show where a seek target lands in a range
    Clamp {
        /// Seek target in seconds
        seconds: f64,

        /// Range start in seconds
        #[arg(long, default_value = "0")]
        start: f64,

        /// Range end in seconds
        #[arg(long)]
        end: f64,

        /// Current playhead, to check the near-time tolerance
        #[arg(long)]
        current: Option<f64>,

        /// Player configuration (JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Print the effective player configuration
    Config {
        /// Player configuration (JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(level)
        .with_writer(std::io::stderr)
        .init();
    screenplay_core::init();

    match cli.command {
        Commands::Simulate { script, config } => {
            commands::simulate(&script, config.as_deref(), &cli.format).await?;
        }
        Commands::Clamp { seconds, start, end, current, config } => {
            commands::clamp(seconds, start, end, current, config.as_deref(), &cli.format)?;
        }
        Commands::Config { config } => {
            commands::show_config(config.as_deref())?;
        }
    }

    Ok(())
}
