//! Connection pool stage.
//!
//! The pool owns up to `max_connections` live connections and fans messages
//! out across them.
//!
//! # Architecture
//!
//! Each connection is owned by a dedicated worker task. Workers pull from
//! the pool's input, which they all share, so whichever worker is idle takes the next message
//! and no scheduler is needed. Results go out through forks of the pool's
//! output; messages handled by different connections may therefore leave in
//! a different order than they arrived.
//!
//! The stage task itself is the management loop. It provisions connections
//! on start, then on every `check_interval` tick:
//! - **Retires** connections that reported themselves dead (their worker has
//!   already forwarded the failed message and exited)
//! - **Backfills** empty slots by dialing, one attempt per slot per tick
//!
//! A failed dial leaves the pool degraded until a later tick succeeds; with
//! zero live connections, messages wait on the input and backpressure
//! propagates upstream.
//!
//! # Shutdown
//!
//! When the input is closed and drained, every worker exits. The loop stops
//! ticking, joins all workers, and only then releases the output, so the
//! downstream stage sees the channel close exactly once, after the last
//! result.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::config::PoolConfig;
use crate::domain::{ConnectionId, Message};
use crate::error::{ConfigError, PipelineError, Result};
use crate::pipeline::{Inlet, Outlet, Stage};

mod connection;
mod manage;
mod spawn;
mod state;

pub use connection::{Connection, Dialer};
pub use state::{PoolMonitor, PoolStats};

use manage::ManagementContext;
use state::{lock_or_recover, ConnectionState, SharedCounters, WorkerExit};

/// Stage dispatching messages across a bounded set of pooled connections.
pub struct ConnectionPool<P: Send + 'static> {
    config: PoolConfig,
    dialer: Box<dyn Dialer<P>>,
    connections: Arc<Mutex<Vec<ConnectionState>>>,
    counters: Arc<SharedCounters>,
    next_id: ConnectionId,
}

impl<P: Send + 'static> ConnectionPool<P> {
    /// Create a new connection pool.
    ///
    /// No connections are dialed until the stage starts serving.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid:
    /// - `max_connections` must be > 0
    /// - `check_interval_ms` must be > 0
    #[must_use = "returns Result that must be checked"]
    pub fn new(
        config: PoolConfig,
        dialer: impl Dialer<P> + 'static,
    ) -> std::result::Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            dialer: Box::new(dialer),
            connections: Arc::new(Mutex::new(Vec::new())),
            counters: Arc::new(SharedCounters::new()),
            next_id: ConnectionId::new(1),
        })
    }

    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    /// Handle for reading pool statistics while the stage runs.
    pub fn monitor(&self) -> PoolMonitor {
        PoolMonitor {
            connections: self.connections.clone(),
            counters: self.counters.clone(),
        }
    }

    /// Runtime statistics for observability.
    pub fn stats(&self) -> PoolStats {
        self.monitor().stats()
    }
}

#[async_trait]
impl<P: Send + 'static> Stage for ConnectionPool<P> {
    type Input = Message<P>;
    type Output = Message<P>;
    const NAME: &'static str = "connection_pool";

    async fn serve(&mut self, input: Inlet<Message<P>>, output: Outlet<Message<P>>) -> Result<()> {
        let stopped = Arc::new(Notify::new());
        let ctx = ManagementContext {
            connections: self.connections.clone(),
            counters: self.counters.clone(),
            input,
            output,
            stopped: stopped.clone(),
            max_connections: self.config.max_connections,
        };

        let provisioned = ctx.backfill(self.dialer.as_mut(), &mut self.next_id).await;
        info!(
            live = provisioned,
            max_connections = self.config.max_connections,
            check_interval_ms = self.config.check_interval_ms,
            "Connection pool started"
        );

        let check_interval = self.config.check_interval();
        let mut interval =
            tokio::time::interval_at(tokio::time::Instant::now() + check_interval, check_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                () = stopped.notified() => break,
                _ = interval.tick() => {
                    if ctx.input.is_drained() || ctx.output.is_disconnected() {
                        break;
                    }
                    ctx.health_check(self.dialer.as_mut(), &mut self.next_id).await;
                }
            }
        }

        let downstream_closed = ctx.output.is_disconnected();
        let workers = ctx.take_all();
        debug!(workers = workers.len(), downstream_closed, "Joining workers");

        for state in workers {
            if downstream_closed {
                state.handle.abort();
            }
            match state.handle.await {
                Ok(exit) => debug!(connection_id = state.id.get(), ?exit, "Worker joined"),
                Err(e) if e.is_cancelled() => {}
                Err(e) => warn!(connection_id = state.id.get(), error = %e, "Worker failed"),
            }
        }

        info!(stats = ?self.stats(), "Connection pool stopped");
        ctx.output.close();

        if downstream_closed {
            return Err(PipelineError::DownstreamClosed { stage: Self::NAME }.into());
        }
        Ok(())
    }
}

impl<P: Send + 'static> Drop for ConnectionPool<P> {
    fn drop(&mut self) {
        for c in lock_or_recover(&self.connections).drain(..) {
            c.handle.abort();
        }
    }
}
