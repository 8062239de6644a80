//! Handler for the `check` command.

use std::path::Path;

use crate::config::Config;
use crate::error::Result;

/// Validate a configuration file without starting the pipeline.
pub fn execute(config_path: Option<&Path>) -> Result<()> {
    let config = match config_path {
        Some(path) => {
            println!("Checking configuration: {}", path.display());
            Config::load(path)?
        }
        None => {
            println!("No configuration file given, checking defaults");
            let config = Config::default();
            config.validate()?;
            config
        }
    };

    println!();
    println!("✓ Configuration is valid");
    println!();
    println!("Summary:");
    println!("  Messages: {}", config.source.messages);
    println!("  Names: {}", config.source.names.join(", "));
    println!("  Destination: {}", config.source.destination_template);
    println!(
        "  Rate limit: {} per second ({:?}, poll every {}ms)",
        config.limiter.rate, config.limiter.algorithm, config.limiter.wait_time_ms
    );
    println!(
        "  Pool: {} connections, health check every {}ms",
        config.pool.max_connections, config.pool.check_interval_ms
    );
    println!("  Request timeout: {}ms", config.transport.timeout_ms);
    Ok(())
}
