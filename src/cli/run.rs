//! Handler for the `run` command.

use tokio::signal;
use tracing::info;

use crate::app::{App, RunReport};
use crate::cli::RunArgs;
use crate::config::Config;
use crate::error::Result;

/// Load the configuration named by `args` and apply its overrides.
///
/// # Errors
///
/// Returns an error if the file cannot be loaded or the overridden
/// configuration is invalid.
pub fn resolve_config(args: &RunArgs) -> Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    if let Some(messages) = args.messages {
        config.source.messages = messages;
    }
    if let Some(rate) = args.rate {
        config.limiter.rate = rate;
    }
    if let Some(max) = args.max_connections {
        config.pool.max_connections = max;
    }
    if let Some(ref level) = args.log_level {
        config.logging.level = level.clone();
    }
    if args.json_logs {
        config.logging.format = "json".to_string();
    }

    config.validate()?;
    Ok(config)
}

/// Execute the run command.
pub async fn execute(args: &RunArgs) -> Result<()> {
    let config = resolve_config(args)?;
    config.init_logging();
    info!("pipepool starting");

    tokio::select! {
        result = App::new(config).run() => print_report(&result?, args.json)?,
        _ = signal::ctrl_c() => {
            info!("Shutdown signal received");
        }
    }

    info!("pipepool stopped");
    Ok(())
}

fn print_report(report: &RunReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string(report)?);
        return Ok(());
    }

    let s = &report.summary;
    println!("Messages: {} ({} ok, {} failed)", s.total, s.ok, s.failed);
    println!("Elapsed:  {:.2}s ({:.2} msg/s)", s.elapsed_secs, s.rate);
    println!(
        "Pool:     {} dials, {} failed dials, {} replacements",
        report.pool.dials, report.pool.dial_failures, report.pool.replacements
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    use crate::cli::{Cli, Commands};

    fn run_args(argv: &[&str]) -> RunArgs {
        let cli = Cli::try_parse_from(argv).unwrap();
        match cli.command {
            Commands::Run(args) => args,
            other => panic!("expected run, got {other:?}"),
        }
    }

    #[test]
    fn overrides_apply_on_defaults() {
        let args = run_args(&[
            "pipepool",
            "run",
            "--messages",
            "3",
            "--rate",
            "7",
            "--max-connections",
            "2",
            "--json-logs",
        ]);
        let config = resolve_config(&args).unwrap();
        assert_eq!(config.source.messages, 3);
        assert_eq!(config.limiter.rate, 7);
        assert_eq!(config.pool.max_connections, 2);
        assert_eq!(config.logging.format, "json");
    }

    #[test]
    fn invalid_override_is_rejected() {
        let args = run_args(&["pipepool", "run", "--rate", "0"]);
        assert!(resolve_config(&args).is_err());
    }
}
