//! Application configuration loading and validation.
//!
//! Provides the [`Config`] struct aggregating every section. All sections
//! are optional in the TOML file and fall back to their defaults.
//!
//! # Example
//!
//! ```no_run
//! use pipepool::config::Config;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load("pipepool.toml")?;
//!     config.init_logging();
//!     Ok(())
//! }
//! ```

use std::path::Path;

use serde::Deserialize;

use super::limiter::RateLimiterConfig;
use super::logging::LoggingConfig;
use super::pool::PoolConfig;
use super::source::SourceConfig;
use super::transport::TransportConfig;
use crate::error::{ConfigError, Result};

/// Main application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Generated workload.
    #[serde(default)]
    pub source: SourceConfig,

    /// Admission control ahead of the pool.
    #[serde(default)]
    pub limiter: RateLimiterConfig,

    /// Connection pool sizing and health checks.
    #[serde(default)]
    pub pool: PoolConfig,

    /// Outbound HTTP settings.
    #[serde(default)]
    pub transport: TransportConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file cannot be read
    /// - The TOML content is malformed
    /// - Validation fails
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
        Self::parse_toml(&content)
    }

    /// Parse and validate configuration from a TOML string.
    pub fn parse_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate every section.
    pub fn validate(&self) -> Result<()> {
        self.source.validate()?;
        self.limiter.validate()?;
        self.pool.validate()?;
        self.transport.validate()?;
        Ok(())
    }

    /// Initialize logging with the configured settings.
    pub fn init_logging(&self) {
        self.logging.init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RateLimitAlgorithm;
    use crate::error::Error;

    #[test]
    fn empty_file_uses_defaults() {
        let config = Config::parse_toml("").unwrap();
        assert_eq!(config.limiter.rate, 1);
        assert_eq!(config.limiter.wait_time_ms, 500);
        assert_eq!(config.limiter.algorithm, RateLimitAlgorithm::TokenBucket);
        assert_eq!(config.pool.max_connections, 5);
        assert_eq!(config.pool.check_interval_ms, 5_000);
        assert_eq!(config.source.messages, 10);
        assert_eq!(config.source.names, vec!["Alice", "Bob"]);
        assert_eq!(config.transport.timeout_ms, 5_000);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn sections_override_defaults() {
        let config = Config::parse_toml(
            r#"
            [limiter]
            algorithm = "token_bucket"
            rate = 20
            wait_time_ms = 50

            [pool]
            max_connections = 2
            check_interval_ms = 250

            [source]
            messages = 3
            names = ["Carol"]
            seed = 7

            [logging]
            format = "json"
            "#,
        )
        .unwrap();

        assert_eq!(config.limiter.rate, 20);
        assert_eq!(config.limiter.wait_time().as_millis(), 50);
        assert_eq!(config.pool.max_connections, 2);
        assert_eq!(config.pool.check_interval().as_millis(), 250);
        assert_eq!(config.source.messages, 3);
        assert_eq!(config.source.seed, Some(7));
        assert_eq!(config.logging.format, "json");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn rejects_zero_rate() {
        let err = Config::parse_toml("[limiter]\nrate = 0\n").unwrap_err();
        assert!(matches!(
            err,
            Error::Config(ConfigError::InvalidValue {
                field: "limiter.rate",
                ..
            })
        ));
    }

    #[test]
    fn rejects_zero_max_connections() {
        let err = Config::parse_toml("[pool]\nmax_connections = 0\n").unwrap_err();
        assert!(matches!(
            err,
            Error::Config(ConfigError::InvalidValue {
                field: "pool.max_connections",
                ..
            })
        ));
    }

    #[test]
    fn rejects_negative_rate_at_parse_time() {
        let err = Config::parse_toml("[limiter]\nrate = -1\n").unwrap_err();
        assert!(matches!(err, Error::Config(ConfigError::Parse(_))));
    }

    #[test]
    fn rejects_unknown_algorithm() {
        let err = Config::parse_toml("[limiter]\nalgorithm = \"leaky_bucket\"\n").unwrap_err();
        assert!(matches!(err, Error::Config(ConfigError::Parse(_))));
    }

    #[test]
    fn rejects_empty_names() {
        let err = Config::parse_toml("[source]\nnames = []\n").unwrap_err();
        assert!(matches!(
            err,
            Error::Config(ConfigError::InvalidValue {
                field: "source.names",
                ..
            })
        ));
    }
}
