//! Admission control stages.
//!
//! The rate limiter sits upstream of the connection pool and delays items
//! so that at most `rate` of them enter the pool per time unit. It never
//! drops items.

mod token_bucket;

pub use token_bucket::TokenBucket;

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::{RateLimitAlgorithm, RateLimiterConfig};
use crate::error::{ConfigError, Result};
use crate::pipeline::{Inlet, Outlet, Stage};

/// Clock returning a monotonically non-decreasing integer "now".
///
/// The unit is whatever the rate is expressed in; the default clock counts
/// whole seconds.
pub type TimeSource = Arc<dyn Fn() -> i64 + Send + Sync>;

/// Wall-clock time in whole seconds since the Unix epoch.
pub fn wall_clock_seconds() -> TimeSource {
    Arc::new(|| chrono::Utc::now().timestamp())
}

/// A rate-limiting stage built from configuration.
pub enum RateLimiter<T> {
    TokenBucket(TokenBucket<T>),
}

impl<T> RateLimiter<T> {
    /// Replace the clock of the underlying algorithm.
    #[must_use]
    pub fn with_time_source(self, time_source: TimeSource) -> Self {
        match self {
            Self::TokenBucket(bucket) => Self::TokenBucket(bucket.with_time_source(time_source)),
        }
    }

    pub fn algorithm(&self) -> RateLimitAlgorithm {
        match self {
            Self::TokenBucket(_) => RateLimitAlgorithm::TokenBucket,
        }
    }
}

/// Build the rate limiter selected by `config.algorithm`.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidValue`] for a zero rate or wait time, so a
/// misconfigured limiter fails here instead of starving forever.
pub fn new_rate_limiter<T>(
    config: &RateLimiterConfig,
) -> std::result::Result<RateLimiter<T>, ConfigError> {
    match config.algorithm {
        RateLimitAlgorithm::TokenBucket => Ok(RateLimiter::TokenBucket(TokenBucket::new(config)?)),
    }
}

#[async_trait]
impl<T: Send + 'static> Stage for RateLimiter<T> {
    type Input = T;
    type Output = T;
    const NAME: &'static str = "rate_limiter";

    async fn serve(&mut self, input: Inlet<T>, output: Outlet<T>) -> Result<()> {
        match self {
            Self::TokenBucket(bucket) => bucket.serve(input, output).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn builds_token_bucket_by_default() {
        let limiter = new_rate_limiter::<u32>(&RateLimiterConfig::default()).unwrap();
        assert_eq!(limiter.algorithm(), RateLimitAlgorithm::TokenBucket);
    }

    #[test]
    fn invalid_config_fails_fast() {
        let cfg = RateLimiterConfig::new(0, Duration::from_millis(100));
        assert!(matches!(
            new_rate_limiter::<u32>(&cfg),
            Err(ConfigError::InvalidValue { field: "limiter.rate", .. })
        ));
    }

    #[test]
    fn wall_clock_is_non_decreasing() {
        let clock = wall_clock_seconds();
        let a = clock();
        let b = clock();
        assert!(b >= a);
        assert!(a > 1_600_000_000);
    }
}
