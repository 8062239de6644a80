//! Rate limiter configuration.

use std::time::Duration;

use serde::Deserialize;

use super::invalid;
use crate::error::ConfigError;

/// Rate-limiting algorithm selector.
///
/// Only the token bucket is implemented; the selector is kept so configs
/// stay forward compatible.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateLimitAlgorithm {
    #[default]
    TokenBucket,
}

/// Admission-control settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RateLimiterConfig {
    /// Algorithm to use.
    #[serde(default)]
    pub algorithm: RateLimitAlgorithm,
    /// Messages admitted per second; also the bucket capacity.
    #[serde(default = "default_rate")]
    pub rate: u64,
    /// Sleep between refill checks while the bucket is empty (milliseconds).
    #[serde(default = "default_wait_time_ms")]
    pub wait_time_ms: u64,
}

const fn default_rate() -> u64 {
    1
}

const fn default_wait_time_ms() -> u64 {
    500
}

impl RateLimiterConfig {
    pub fn new(rate: u64, wait_time: Duration) -> Self {
        Self {
            algorithm: RateLimitAlgorithm::TokenBucket,
            rate,
            wait_time_ms: u64::try_from(wait_time.as_millis()).unwrap_or(u64::MAX),
        }
    }

    pub fn wait_time(&self) -> Duration {
        Duration::from_millis(self.wait_time_ms)
    }

    /// Reject settings that would starve forever or spin without sleeping.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rate == 0 {
            return Err(invalid("limiter.rate", "must be > 0"));
        }
        if self.wait_time_ms == 0 {
            return Err(invalid("limiter.wait_time_ms", "must be > 0"));
        }
        Ok(())
    }
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self {
            algorithm: RateLimitAlgorithm::default(),
            rate: default_rate(),
            wait_time_ms: default_wait_time_ms(),
        }
    }
}
