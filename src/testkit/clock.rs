//! Controllable time sources.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use crate::limiter::TimeSource;

/// A clock that only moves when told to.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<AtomicI64>,
}

impl ManualClock {
    pub fn new(start: i64) -> Self {
        Self {
            now: Arc::new(AtomicI64::new(start)),
        }
    }

    pub fn now(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }

    pub fn set(&self, now: i64) {
        self.now.store(now, Ordering::SeqCst);
    }

    pub fn advance(&self, units: i64) {
        self.now.fetch_add(units, Ordering::SeqCst);
    }

    /// A [`TimeSource`] reading this clock.
    pub fn source(&self) -> TimeSource {
        let now = self.now.clone();
        Arc::new(move || now.load(Ordering::SeqCst))
    }
}

/// Whole seconds elapsed on the tokio clock since this call.
///
/// Under `#[tokio::test(start_paused = true)]` the tokio clock only advances
/// through timers, which makes the rate limiter fully deterministic.
pub fn tokio_seconds() -> TimeSource {
    let base = tokio::time::Instant::now();
    Arc::new(move || i64::try_from(base.elapsed().as_secs()).unwrap_or(i64::MAX))
}
