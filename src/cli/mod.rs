//! Command-line interface definitions.

pub mod check;
pub mod run;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Pipepool - rate-limited request dispatch over pooled connections.
#[derive(Parser, Debug)]
#[command(name = "pipepool")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the demo pipeline
    Run(RunArgs),

    /// Validate a configuration file
    Check(ConfigPathArg),
}

/// Shared argument for commands that only need a config path.
#[derive(Parser, Debug)]
pub struct ConfigPathArg {
    /// Path to configuration file (defaults are used when omitted)
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

/// Arguments for the `run` subcommand.
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Path to configuration file (defaults are used when omitted)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Override the number of generated messages
    #[arg(long)]
    pub messages: Option<usize>,

    /// Override the rate limit (messages per second)
    #[arg(long)]
    pub rate: Option<u64>,

    /// Override the pool size
    #[arg(long)]
    pub max_connections: Option<usize>,

    /// Override log level (debug, info, warn, error)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Use JSON log format instead of pretty
    #[arg(long)]
    pub json_logs: bool,

    /// Print the run report as JSON on stdout
    #[arg(long)]
    pub json: bool,
}
