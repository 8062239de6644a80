//! Connection pool internal state types.
//!
//! Provides the bookkeeping shared between the pool's management loop, its
//! workers, and any [`PoolMonitor`] handed out to observers.

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use serde::Serialize;
use tracing::warn;

use crate::domain::ConnectionId;

/// Shared counters updated atomically by workers and the management loop.
pub(super) struct SharedCounters {
    /// Messages currently inside `Connection::process`.
    pub(super) in_flight: AtomicUsize,
    /// Dial attempts, successful or not.
    pub(super) dials: AtomicU64,
    /// Dial attempts that returned an error.
    pub(super) dial_failures: AtomicU64,
    /// Dead connections removed from the active set.
    pub(super) replacements: AtomicU64,
    /// Messages that went through `process`.
    pub(super) processed: AtomicU64,
    /// Processed messages annotated as failed.
    pub(super) failed: AtomicU64,
}

impl SharedCounters {
    /// Create a new set of zeroed counters.
    pub(super) fn new() -> Self {
        Self {
            in_flight: AtomicUsize::new(0),
            dials: AtomicU64::new(0),
            dial_failures: AtomicU64::new(0),
            replacements: AtomicU64::new(0),
            processed: AtomicU64::new(0),
            failed: AtomicU64::new(0),
        }
    }
}

/// Why a worker stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum WorkerExit {
    /// The shared input is closed and empty.
    InputDrained,
    /// The connection reported itself not live.
    ConnectionDead,
    /// The pool's output has no receiver left.
    DownstreamClosed,
}

/// Tracks the lifecycle of a single pooled connection.
pub(super) struct ConnectionState {
    pub(super) id: ConnectionId,
    /// Liveness published by the worker owning the connection.
    pub(super) live: Arc<AtomicBool>,
    pub(super) spawned_at: Instant,
    pub(super) handle: tokio::task::JoinHandle<WorkerExit>,
}

impl ConnectionState {
    /// Live and still served by a running worker.
    pub(super) fn is_active(&self) -> bool {
        self.live.load(Ordering::Acquire) && !self.handle.is_finished()
    }
}

/// Lock a mutex, recovering from poisoning if necessary.
///
/// If a thread panicked while holding the lock, logs a warning and recovers
/// the data. This keeps the pool operational while surfacing the issue.
pub(super) fn lock_or_recover<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            warn!("Mutex poisoned (previous holder panicked), recovering");
            poisoned.into_inner()
        }
    }
}

/// Point-in-time view of a pool.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PoolStats {
    pub live_connections: usize,
    pub in_flight: usize,
    pub dials: u64,
    pub dial_failures: u64,
    pub replacements: u64,
    pub processed: u64,
    pub failed: u64,
}

/// Read-only handle on a pool's bookkeeping, usable while the pool runs.
#[derive(Clone)]
pub struct PoolMonitor {
    pub(super) connections: Arc<Mutex<Vec<ConnectionState>>>,
    pub(super) counters: Arc<SharedCounters>,
}

impl PoolMonitor {
    /// Runtime statistics for observability.
    pub fn stats(&self) -> PoolStats {
        PoolStats {
            live_connections: self.live_connections(),
            in_flight: self.counters.in_flight.load(Ordering::Relaxed),
            dials: self.counters.dials.load(Ordering::Relaxed),
            dial_failures: self.counters.dial_failures.load(Ordering::Relaxed),
            replacements: self.counters.replacements.load(Ordering::Relaxed),
            processed: self.counters.processed.load(Ordering::Relaxed),
            failed: self.counters.failed.load(Ordering::Relaxed),
        }
    }

    /// Connections that are live and served by a running worker.
    pub fn live_connections(&self) -> usize {
        lock_or_recover(&self.connections)
            .iter()
            .filter(|c| c.is_active())
            .count()
    }

    /// Ids of the connections currently tracked, oldest first.
    pub fn connection_ids(&self) -> Vec<ConnectionId> {
        lock_or_recover(&self.connections)
            .iter()
            .map(|c| c.id)
            .collect()
    }
}
