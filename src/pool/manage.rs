//! Connection pool management.
//!
//! Health checks run in two phases: retire every connection that is no
//! longer served by a live worker (brief lock), then dial replacements one
//! at a time until the pool is back at `max_connections`. Dialing happens
//! outside the lock.

use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex};

use tokio::sync::Notify;
use tracing::{debug, info, warn};

use crate::domain::{ConnectionId, Message};
use crate::pipeline::{Inlet, Outlet};

use super::connection::Dialer;
use super::spawn::new_connection;
use super::state::{lock_or_recover, ConnectionState, SharedCounters};

/// Shared resources the management phases operate on.
pub(super) struct ManagementContext<P: Send + 'static> {
    pub(super) connections: Arc<Mutex<Vec<ConnectionState>>>,
    pub(super) counters: Arc<SharedCounters>,
    pub(super) input: Inlet<Message<P>>,
    pub(super) output: Outlet<Message<P>>,
    pub(super) stopped: Arc<Notify>,
    pub(super) max_connections: usize,
}

impl<P: Send + 'static> ManagementContext<P> {
    /// Remove connections that died or whose worker finished.
    ///
    /// A retired worker may still be forwarding its last message; its
    /// handle is detached, not aborted, so that message is not lost.
    pub(super) fn retire_dead(&self) -> usize {
        let retired: Vec<ConnectionState> = {
            let mut conns = lock_or_recover(&self.connections);
            let (active, retired): (Vec<_>, Vec<_>) =
                conns.drain(..).partition(ConnectionState::is_active);
            *conns = active;
            retired
        };

        for c in &retired {
            info!(
                connection_id = c.id.get(),
                age_secs = c.spawned_at.elapsed().as_secs(),
                "Retiring dead connection"
            );
        }
        self.counters
            .replacements
            .fetch_add(retired.len() as u64, Ordering::Relaxed);
        retired.len()
    }

    /// Dial until the pool holds `max_connections`, returning how many
    /// connections were added.
    ///
    /// Each empty slot gets one attempt per call. A failed dial leaves the
    /// slot empty for the next health check.
    pub(super) async fn backfill(
        &self,
        dialer: &mut dyn Dialer<P>,
        next_id: &mut ConnectionId,
    ) -> usize {
        let current = lock_or_recover(&self.connections).len();
        let missing = self.max_connections.saturating_sub(current);
        if missing == 0 {
            return 0;
        }
        debug!(current, missing, "Backfilling pool");

        let mut added = 0;
        for _ in 0..missing {
            let id = *next_id;
            *next_id = id.next();
            self.counters.dials.fetch_add(1, Ordering::Relaxed);

            let connection = match dialer.dial(id).await {
                Ok(c) if c.is_live() => c,
                Ok(_) => {
                    self.counters.dial_failures.fetch_add(1, Ordering::Relaxed);
                    warn!(connection_id = id.get(), "Dialer returned a dead connection");
                    continue;
                }
                Err(e) => {
                    self.counters.dial_failures.fetch_add(1, Ordering::Relaxed);
                    warn!(connection_id = id.get(), error = %e, "Dial failed");
                    continue;
                }
            };

            info!(connection_id = connection.id().get(), "New connection");
            let state = new_connection(
                connection,
                self.input.clone(),
                self.output.fork(),
                self.counters.clone(),
                self.stopped.clone(),
            );
            lock_or_recover(&self.connections).push(state);
            added += 1;
        }
        added
    }

    /// Retire dead connections and dial replacements.
    pub(super) async fn health_check(
        &self,
        dialer: &mut dyn Dialer<P>,
        next_id: &mut ConnectionId,
    ) {
        let retired = self.retire_dead();
        let added = self.backfill(dialer, next_id).await;
        if retired > 0 || added > 0 {
            info!(
                retired,
                added,
                live = lock_or_recover(&self.connections).len(),
                max = self.max_connections,
                "Health check complete"
            );
        }
    }

    /// Take every tracked worker handle, leaving the set empty.
    pub(super) fn take_all(&self) -> Vec<ConnectionState> {
        lock_or_recover(&self.connections).drain(..).collect()
    }
}
