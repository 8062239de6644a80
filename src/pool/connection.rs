//! Connection and dialer capabilities the pool is built on.

use async_trait::async_trait;

use crate::domain::{ConnectionId, Message};
use crate::error::DialError;

/// One network endpoint.
///
/// Exactly one pool worker owns a connection at any time, so implementations
/// keep their transport state private and need no internal locking.
#[async_trait]
pub trait Connection<P: Send + 'static>: Send {
    /// Pool-assigned identifier.
    fn id(&self) -> ConnectionId;

    /// Whether the connection can still be used.
    ///
    /// A pure query: repeated calls return the same value until a `process`
    /// call changes it.
    fn is_live(&self) -> bool;

    /// Send `message` over the transport and wait for the response, bounded
    /// by the transport's own timeout.
    ///
    /// Returns the message annotated with its outcome. On an unrecoverable
    /// transport error the connection marks itself not live before
    /// returning; it is never left in an ambiguous state.
    async fn process(&mut self, message: Message<P>) -> Message<P>;
}

/// Factory for new connections.
///
/// The pool serializes dial attempts, so implementations may keep mutable
/// state (counters, credentials) without synchronization.
#[async_trait]
pub trait Dialer<P: Send + 'static>: Send {
    /// Establish a connection that will be known as `id`.
    async fn dial(&mut self, id: ConnectionId) -> Result<Box<dyn Connection<P>>, DialError>;
}
