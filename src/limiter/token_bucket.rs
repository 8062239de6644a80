//! Token bucket admission control.
//!
//! See <https://en.wikipedia.org/wiki/Token_bucket>.

use std::marker::PhantomData;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, trace};

use super::{wall_clock_seconds, TimeSource};
use crate::config::RateLimiterConfig;
use crate::error::{ConfigError, Result};
use crate::pipeline::{Inlet, Outlet, Stage};

/// Stage forwarding at most `rate` items per time unit, in arrival order.
///
/// The bucket holds at most `rate` tokens and starts full when the stage
/// starts. Each forwarded item takes one token; whole elapsed time units
/// refill `rate` tokens each, capped at capacity. When the bucket is empty
/// the stage sleeps `wait_time` and re-derives the token count, so a clock
/// that has not advanced keeps the stage waiting instead of over-admitting.
/// Items are delayed, never dropped.
pub struct TokenBucket<T> {
    rate: u64,
    wait_time: Duration,
    time_source: TimeSource,
    tokens: u64,
    timestamp: i64,
    _item: PhantomData<fn(T) -> T>,
}

impl<T> TokenBucket<T> {
    /// Create a token bucket using the wall clock in whole seconds.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] for a zero rate or wait time.
    pub fn new(config: &RateLimiterConfig) -> std::result::Result<Self, ConfigError> {
        config.validate()?;
        let time_source = wall_clock_seconds();
        let timestamp = time_source();
        Ok(Self {
            rate: config.rate,
            wait_time: config.wait_time(),
            time_source,
            tokens: config.rate,
            timestamp,
            _item: PhantomData,
        })
    }

    /// Replace the clock, e.g. with a controllable one in tests.
    #[must_use]
    pub fn with_time_source(mut self, time_source: TimeSource) -> Self {
        self.timestamp = time_source();
        self.time_source = time_source;
        self
    }

    /// Tokens currently in the bucket. Always within `0..=rate`.
    pub fn tokens(&self) -> u64 {
        self.tokens
    }

    pub fn rate(&self) -> u64 {
        self.rate
    }

    pub fn wait_time(&self) -> Duration {
        self.wait_time
    }

    /// Fill the bucket and restart the refill clock.
    pub fn reset(&mut self) {
        self.tokens = self.rate;
        self.timestamp = (self.time_source)();
    }

    /// Credit tokens for the whole time units elapsed since the last refill.
    fn refill(&mut self) {
        let now = (self.time_source)();
        let elapsed = u64::try_from(now.saturating_sub(self.timestamp)).unwrap_or(0);
        let delta = self.rate.saturating_mul(elapsed);
        self.tokens = self.rate.min(self.tokens.saturating_add(delta));
        self.timestamp = now;
    }

    /// Refill, then take a token if one is available.
    pub fn try_acquire(&mut self) -> bool {
        self.refill();
        if self.tokens < 1 {
            return false;
        }
        self.tokens -= 1;
        true
    }

    /// Wait until a token is available and take it.
    ///
    /// Polls every `wait_time`; returns the number of sleeps taken.
    pub async fn acquire(&mut self) -> u32 {
        let mut waits = 0u32;
        while !self.try_acquire() {
            trace!(wait_ms = self.wait_time.as_millis() as u64, "Bucket empty");
            tokio::time::sleep(self.wait_time).await;
            waits = waits.saturating_add(1);
        }
        waits
    }
}

#[async_trait]
impl<T: Send + 'static> Stage for TokenBucket<T> {
    type Input = T;
    type Output = T;
    const NAME: &'static str = "token_bucket";

    async fn serve(&mut self, input: Inlet<T>, output: Outlet<T>) -> Result<()> {
        self.reset();
        debug!(rate = self.rate, "Token bucket started");

        let mut admitted: u64 = 0;
        while let Some(item) = input.recv().await {
            let waits = self.acquire().await;
            if waits > 0 {
                debug!(waits, tokens = self.tokens, "Throttled");
            }
            output.send(item).await?;
            admitted += 1;
        }

        debug!(admitted, "Token bucket drained");
        output.close();
        Ok(())
    }
}
