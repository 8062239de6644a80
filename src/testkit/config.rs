//! Canonical test configurations.
//!
//! Single source of truth for config structs used across tests.

use std::time::Duration;

use crate::config::{PoolConfig, RateLimiterConfig};

/// Pool config with a fast health check.
pub fn pool(max_connections: usize, check_interval_ms: u64) -> PoolConfig {
    PoolConfig::new(max_connections, Duration::from_millis(check_interval_ms))
}

/// Token bucket admitting `rate` per time unit, polling every `wait_ms`.
pub fn limiter(rate: u64, wait_ms: u64) -> RateLimiterConfig {
    RateLimiterConfig::new(rate, Duration::from_millis(wait_ms))
}
