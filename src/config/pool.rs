//! Connection pool configuration.

use std::time::Duration;

use serde::Deserialize;

use super::invalid;
use crate::error::ConfigError;

/// Connection pool settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PoolConfig {
    /// Upper bound on simultaneously live connections.
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,
    /// Health check cadence (milliseconds).
    #[serde(default = "default_check_interval_ms")]
    pub check_interval_ms: u64,
}

const fn default_max_connections() -> usize {
    5
}

const fn default_check_interval_ms() -> u64 {
    5_000
}

impl PoolConfig {
    pub fn new(max_connections: usize, check_interval: Duration) -> Self {
        Self {
            max_connections,
            check_interval_ms: u64::try_from(check_interval.as_millis()).unwrap_or(u64::MAX),
        }
    }

    pub fn check_interval(&self) -> Duration {
        Duration::from_millis(self.check_interval_ms)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_connections == 0 {
            return Err(invalid("pool.max_connections", "must be > 0"));
        }
        if self.check_interval_ms == 0 {
            return Err(invalid("pool.check_interval_ms", "must be > 0"));
        }
        Ok(())
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: default_max_connections(),
            check_interval_ms: default_check_interval_ms(),
        }
    }
}
