//! Terminal reporting stage.

use async_trait::async_trait;
use serde::Serialize;
use tokio::time::Instant;
use tracing::{info, warn};

use super::request::Request;
use crate::domain::Message;
use crate::error::Result;
use crate::pipeline::{Inlet, Outlet, Stage};

/// Totals for one pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Summary {
    pub total: u64,
    pub ok: u64,
    pub failed: u64,
    /// Wall time from the first message to the input closing, in seconds.
    pub elapsed_secs: f64,
    /// Messages per second over `elapsed_secs`; zero for an empty run.
    pub rate: f64,
}

impl Summary {
    fn finish(mut self, elapsed_secs: f64) -> Self {
        self.elapsed_secs = elapsed_secs;
        self.rate = if elapsed_secs > 0.0 {
            self.total as f64 / elapsed_secs
        } else {
            0.0
        };
        self
    }
}

/// Sink that logs every result and emits one [`Summary`] when its input
/// closes.
#[derive(Debug, Default)]
pub struct StatsReporter {
    summary: Summary,
}

impl StatsReporter {
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&mut self, message: &Message<Request>) {
        self.summary.total += 1;
        let outcome = message.outcome();
        if outcome.is_ok() {
            self.summary.ok += 1;
            info!(
                n = self.summary.total,
                seq = message.seq(),
                data = %message.payload().templated_data,
                %outcome,
                "Result"
            );
        } else {
            self.summary.failed += 1;
            warn!(
                n = self.summary.total,
                seq = message.seq(),
                data = %message.payload().templated_data,
                %outcome,
                "Result"
            );
        }
    }
}

#[async_trait]
impl Stage for StatsReporter {
    type Input = Message<Request>;
    type Output = Summary;
    const NAME: &'static str = "stats_reporter";

    async fn serve(&mut self, input: Inlet<Message<Request>>, output: Outlet<Summary>) -> Result<()> {
        let mut started = None;
        while let Some(message) = input.recv().await {
            started.get_or_insert_with(Instant::now);
            self.record(&message);
        }

        let elapsed = started.map_or(0.0, |t: Instant| t.elapsed().as_secs_f64());
        let summary = std::mem::take(&mut self.summary).finish(elapsed);
        info!(
            total = summary.total,
            ok = summary.ok,
            failed = summary.failed,
            elapsed_secs = summary.elapsed_secs,
            rate = summary.rate,
            "Run complete"
        );
        output.send(summary).await?;
        output.close();
        Ok(())
    }
}
