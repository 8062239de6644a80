//! Scripted [`Connection`] and [`Dialer`] implementations for testing.
//!
//! - [`ScriptedDialer`]: pre-loaded dial results (defaults to success when
//!   exhausted) and a failure plan for the connections it creates.
//! - [`ScriptedConnection`]: succeeds or fails per plan, optionally after a
//!   delay, and records what happened in a shared [`ConnectionProbe`].

use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::domain::{ConnectionId, Message};
use crate::error::DialError;
use crate::pool::{Connection, Dialer};

/// Counters shared by a dialer and every connection it created.
#[derive(Debug, Default)]
pub struct ConnectionProbe {
    dials: AtomicU32,
    dial_failures: AtomicU32,
    processed: AtomicU32,
    failed: AtomicU32,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    dispatched_while_dead: AtomicU32,
}

impl ConnectionProbe {
    pub fn dials(&self) -> u32 {
        self.dials.load(Ordering::SeqCst)
    }

    pub fn dial_failures(&self) -> u32 {
        self.dial_failures.load(Ordering::SeqCst)
    }

    pub fn processed(&self) -> u32 {
        self.processed.load(Ordering::SeqCst)
    }

    pub fn failed(&self) -> u32 {
        self.failed.load(Ordering::SeqCst)
    }

    /// Highest number of simultaneous `process` calls observed.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// `process` calls made on a connection already marked dead.
    pub fn dispatched_while_dead(&self) -> u32 {
        self.dispatched_while_dead.load(Ordering::SeqCst)
    }
}

/// When a scripted connection fails.
#[derive(Debug, Clone, Default)]
struct FailurePlan {
    /// Fail every message after this many successes on one connection.
    after: Option<u32>,
    /// Fail these sequence numbers wherever they are processed.
    seqs: Arc<HashSet<u64>>,
}

/// A connection whose behavior is fixed up front.
pub struct ScriptedConnection {
    id: ConnectionId,
    live: bool,
    processed: u32,
    delay: Duration,
    plan: FailurePlan,
    probe: Arc<ConnectionProbe>,
}

impl ScriptedConnection {
    /// A connection that always succeeds.
    pub fn new(id: ConnectionId) -> Self {
        Self {
            id,
            live: true,
            processed: 0,
            delay: Duration::ZERO,
            plan: FailurePlan::default(),
            probe: Arc::new(ConnectionProbe::default()),
        }
    }

    /// Fail (and die) on the message after `successes` successful ones.
    #[must_use]
    pub fn failing_after(mut self, successes: u32) -> Self {
        self.plan.after = Some(successes);
        self
    }

    pub fn probe(&self) -> Arc<ConnectionProbe> {
        self.probe.clone()
    }
}

#[async_trait]
impl<P: Send + 'static> Connection<P> for ScriptedConnection {
    fn id(&self) -> ConnectionId {
        self.id
    }

    fn is_live(&self) -> bool {
        self.live
    }

    async fn process(&mut self, message: Message<P>) -> Message<P> {
        if !self.live {
            self.probe.dispatched_while_dead.fetch_add(1, Ordering::SeqCst);
        }

        let now = self.probe.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.probe.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.probe.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.probe.processed.fetch_add(1, Ordering::SeqCst);

        let fail = self.plan.after.is_some_and(|n| self.processed >= n)
            || self.plan.seqs.contains(&message.seq());
        self.processed += 1;

        if fail {
            self.live = false;
            self.probe.failed.fetch_add(1, Ordering::SeqCst);
            message.failed(format!("connection {} failed", self.id))
        } else {
            message.ok()
        }
    }
}

/// A dialer returning [`ScriptedConnection`]s.
pub struct ScriptedDialer {
    results: VecDeque<Result<(), DialError>>,
    always_fail: bool,
    delay: Duration,
    plan: FailurePlan,
    probe: Arc<ConnectionProbe>,
}

impl ScriptedDialer {
    /// A dialer that always succeeds with connections that never fail.
    pub fn new() -> Self {
        Self {
            results: VecDeque::new(),
            always_fail: false,
            delay: Duration::ZERO,
            plan: FailurePlan::default(),
            probe: Arc::new(ConnectionProbe::default()),
        }
    }

    /// Fail the first `n` dials, then succeed.
    #[must_use]
    pub fn failing_first(mut self, n: usize) -> Self {
        self.results = (0..n)
            .map(|i| Err(DialError::Refused(format!("scripted failure {}", i + 1))))
            .collect();
        self
    }

    /// Fail every dial.
    #[must_use]
    pub fn always_failing(mut self) -> Self {
        self.always_fail = true;
        self
    }

    /// Make each `process` call take `delay`.
    #[must_use]
    pub fn with_process_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Connections fail (and die) after `successes` successful messages.
    #[must_use]
    pub fn connections_failing_after(mut self, successes: u32) -> Self {
        self.plan.after = Some(successes);
        self
    }

    /// Messages with these sequence numbers fail and kill their connection.
    #[must_use]
    pub fn failing_seqs(mut self, seqs: impl IntoIterator<Item = u64>) -> Self {
        self.plan.seqs = Arc::new(seqs.into_iter().collect());
        self
    }

    pub fn probe(&self) -> Arc<ConnectionProbe> {
        self.probe.clone()
    }
}

impl Default for ScriptedDialer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<P: Send + 'static> Dialer<P> for ScriptedDialer {
    async fn dial(&mut self, id: ConnectionId) -> Result<Box<dyn Connection<P>>, DialError> {
        self.probe.dials.fetch_add(1, Ordering::SeqCst);

        let result = if self.always_fail {
            Err(DialError::Refused("scripted: always failing".into()))
        } else {
            self.results.pop_front().unwrap_or(Ok(()))
        };
        if let Err(e) = result {
            self.probe.dial_failures.fetch_add(1, Ordering::SeqCst);
            return Err(e);
        }

        Ok(Box::new(ScriptedConnection {
            id,
            live: true,
            processed: 0,
            delay: self.delay,
            plan: self.plan.clone(),
            probe: self.probe.clone(),
        }))
    }
}
