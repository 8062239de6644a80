//! The unit of work flowing through a pipeline.

use std::fmt;

use serde::Serialize;

/// Delivery outcome recorded on a [`Message`].
///
/// Stages may annotate the outcome but never reinterpret the payload. A
/// failure is data, not control flow: downstream stages see failed messages
/// and decide what to do with them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "lowercase")]
pub enum Outcome {
    /// Not yet delivered.
    #[default]
    Pending,
    /// Delivered successfully.
    Ok,
    /// Delivery failed; the reason is kept for reporting.
    Failed(String),
}

impl Outcome {
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "PENDING"),
            Self::Ok => write!(f, "OK"),
            Self::Failed(reason) => write!(f, "FAIL ({reason})"),
        }
    }
}

/// A payload plus its delivery outcome.
///
/// The payload type is a type parameter, so a stage that expects one payload
/// shape cannot be wired to a producer of another. `seq` is assigned by the
/// producer and never touched by the runtime; the connection pool may reorder
/// messages, and consumers that need arrival order re-sequence on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message<P> {
    seq: u64,
    payload: P,
    outcome: Outcome,
}

impl<P> Message<P> {
    /// Create a pending message.
    pub fn new(seq: u64, payload: P) -> Self {
        Self {
            seq,
            payload,
            outcome: Outcome::Pending,
        }
    }

    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub fn payload(&self) -> &P {
        &self.payload
    }

    pub fn payload_mut(&mut self) -> &mut P {
        &mut self.payload
    }

    pub fn outcome(&self) -> &Outcome {
        &self.outcome
    }

    /// Record a successful delivery.
    pub fn mark_ok(&mut self) {
        self.outcome = Outcome::Ok;
    }

    /// Record a failed delivery.
    pub fn mark_failed(&mut self, reason: impl Into<String>) {
        self.outcome = Outcome::Failed(reason.into());
    }

    /// Builder-style variant of [`mark_ok`](Self::mark_ok).
    #[must_use]
    pub fn ok(mut self) -> Self {
        self.mark_ok();
        self
    }

    /// Builder-style variant of [`mark_failed`](Self::mark_failed).
    #[must_use]
    pub fn failed(mut self, reason: impl Into<String>) -> Self {
        self.mark_failed(reason);
        self
    }

    /// Transform the payload, keeping sequence number and outcome.
    pub fn map<Q>(self, f: impl FnOnce(P) -> Q) -> Message<Q> {
        Message {
            seq: self.seq,
            payload: f(self.payload),
            outcome: self.outcome,
        }
    }

    pub fn into_payload(self) -> P {
        self.payload
    }
}
