//! Unidirectional stage channels.
//!
//! A channel has exactly one owning [`Outlet`]. The owner closes it by
//! consuming the outlet with [`Outlet::close`] (or by dropping it), so closing
//! twice does not compile. Fan-in stages hand [`Outlet::fork`]s to their
//! workers; the channel closes once the owner and every fork are gone, which
//! turns "join all workers, then close" into an ownership fact.
//!
//! [`Inlet`] is multi-consumer: cloning it lets several workers pull from the
//! same stream, and whichever is idle receives the next item.

use std::fmt;

use tracing::trace;

use crate::error::PipelineError;

/// Capacity of [`channel`]. A send completes once the previous item has been
/// taken, so a stage that stops draining stalls its upstream.
pub const RENDEZVOUS_CAPACITY: usize = 1;

const UNBOUND_OWNER: &str = "unbound";

/// Create a channel with [`RENDEZVOUS_CAPACITY`].
pub fn channel<T>() -> (Outlet<T>, Inlet<T>) {
    bounded(RENDEZVOUS_CAPACITY)
}

/// Create a channel holding up to `capacity` items. Zero is raised to one.
pub fn bounded<T>(capacity: usize) -> (Outlet<T>, Inlet<T>) {
    let (tx, rx) = async_channel::bounded(capacity.max(1));
    (
        Outlet {
            tx,
            owner: UNBOUND_OWNER,
        },
        Inlet { rx },
    )
}

/// Sending half of a stage channel.
pub struct Outlet<T> {
    tx: async_channel::Sender<T>,
    owner: &'static str,
}

impl<T> Outlet<T> {
    /// Send one item, waiting while the channel is full.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::DownstreamClosed`] if every receiver is gone.
    pub async fn send(&self, item: T) -> Result<(), PipelineError> {
        self.tx
            .send(item)
            .await
            .map_err(|_| PipelineError::DownstreamClosed { stage: self.owner })
    }

    /// Another handle on the same channel, for a worker of the owning stage.
    pub fn fork(&self) -> Self {
        Self {
            tx: self.tx.clone(),
            owner: self.owner,
        }
    }

    /// Release this handle. The channel closes once no handles remain.
    pub fn close(self) {
        trace!(stage = self.owner, forks = self.tx.sender_count() - 1, "Outlet closed");
    }

    /// Name of the stage that owns this outlet.
    pub fn owner(&self) -> &'static str {
        self.owner
    }

    /// True if every receiver is gone.
    pub fn is_disconnected(&self) -> bool {
        self.tx.is_closed()
    }

    pub(crate) fn bind(mut self, owner: &'static str) -> Self {
        self.owner = owner;
        self
    }
}

impl<T> fmt::Debug for Outlet<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Outlet")
            .field("owner", &self.owner)
            .field("len", &self.tx.len())
            .finish()
    }
}

/// Receiving half of a stage channel.
pub struct Inlet<T> {
    rx: async_channel::Receiver<T>,
}

impl<T> Inlet<T> {
    /// Receive the next item, or `None` once the channel is closed and empty.
    pub async fn recv(&self) -> Option<T> {
        self.rx.recv().await.ok()
    }

    /// True once every outlet is gone. Buffered items may remain.
    pub fn is_closed(&self) -> bool {
        self.rx.is_closed()
    }

    /// True once the channel is closed and every buffered item was taken.
    pub fn is_drained(&self) -> bool {
        self.rx.is_closed() && self.rx.is_empty()
    }

    /// Number of buffered items.
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}

impl<T> Clone for Inlet<T> {
    fn clone(&self) -> Self {
        Self {
            rx: self.rx.clone(),
        }
    }
}

impl<T> fmt::Debug for Inlet<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Inlet")
            .field("len", &self.rx.len())
            .field("closed", &self.rx.is_closed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn close_ends_stream_after_buffered_items() {
        let (out, inlet) = bounded(4);
        out.send(1).await.unwrap();
        out.send(2).await.unwrap();
        out.close();

        assert!(inlet.is_closed());
        assert!(!inlet.is_drained());
        assert_eq!(inlet.recv().await, Some(1));
        assert_eq!(inlet.recv().await, Some(2));
        assert_eq!(inlet.recv().await, None);
        assert!(inlet.is_drained());
    }

    #[tokio::test]
    async fn channel_stays_open_while_forks_live() {
        let (out, inlet) = bounded::<u32>(4);
        let fork = out.fork();
        out.close();
        assert!(!inlet.is_closed());

        fork.send(7).await.unwrap();
        drop(fork);
        assert_eq!(inlet.recv().await, Some(7));
        assert_eq!(inlet.recv().await, None);
    }

    #[tokio::test]
    async fn send_to_dropped_receiver_is_a_wiring_error() {
        let (out, inlet) = channel::<u32>();
        let out = out.bind("producer");
        drop(inlet);

        assert!(out.is_disconnected());
        match out.send(1).await {
            Err(PipelineError::DownstreamClosed { stage }) => assert_eq!(stage, "producer"),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn rendezvous_channel_applies_backpressure() {
        let (out, inlet) = channel::<u32>();
        out.send(1).await.unwrap();

        let blocked =
            tokio::time::timeout(std::time::Duration::from_millis(20), out.send(2)).await;
        assert!(blocked.is_err(), "second send should wait for the reader");

        assert_eq!(inlet.recv().await, Some(1));
    }

    #[tokio::test]
    async fn cloned_inlets_share_the_stream() {
        let (out, a) = bounded(4);
        let b = a.clone();
        out.send(1).await.unwrap();
        out.send(2).await.unwrap();
        out.close();

        let mut got = vec![a.recv().await.unwrap(), b.recv().await.unwrap()];
        got.sort_unstable();
        assert_eq!(got, vec![1, 2]);
        assert_eq!(a.recv().await, None);
        assert_eq!(b.recv().await, None);
    }
}
