//! HTTP transport for the demo pipeline.
//!
//! Each [`HttpConnection`] owns its own `reqwest::Client`, limited to one
//! idle socket per host, so a pooled connection maps to one reusable
//! keep-alive connection rather than a shared client pool.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use tracing::{debug, warn};

use super::request::Request;
use crate::config::TransportConfig;
use crate::domain::{ConnectionId, Message};
use crate::error::DialError;
use crate::pool::{Connection, Dialer};

/// A pooled HTTP connection sending `GET destination`.
pub struct HttpConnection {
    id: ConnectionId,
    client: Client,
    live: bool,
}

impl HttpConnection {
    /// Build a connection whose requests time out after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`DialError::Transport`] if the HTTP client cannot be built
    /// (for example when no TLS backend is available).
    pub fn new(id: ConnectionId, timeout: Duration) -> Result<Self, DialError> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .pool_max_idle_per_host(1)
            .build()?;
        Ok(Self {
            id,
            client,
            live: true,
        })
    }
}

#[async_trait]
impl Connection<Request> for HttpConnection {
    fn id(&self) -> ConnectionId {
        self.id
    }

    fn is_live(&self) -> bool {
        self.live
    }

    async fn process(&mut self, message: Message<Request>) -> Message<Request> {
        let url = message.payload().destination.clone();
        match self.client.get(&url).send().await {
            Ok(response) if response.status() == StatusCode::OK => {
                debug!(connection_id = self.id.get(), seq = message.seq(), "Request succeeded");
                message.ok()
            }
            Ok(response) => {
                let status = response.status();
                warn!(
                    connection_id = self.id.get(),
                    seq = message.seq(),
                    %status,
                    url = %url,
                    "Unexpected response status"
                );
                message.failed(format!("unexpected status {status}"))
            }
            Err(e) => {
                self.live = false;
                warn!(
                    connection_id = self.id.get(),
                    seq = message.seq(),
                    error = %e,
                    url = %url,
                    "Request failed, connection marked dead"
                );
                message.failed(e.to_string())
            }
        }
    }
}

/// Dials [`HttpConnection`]s with the configured timeout.
#[derive(Debug, Clone)]
pub struct HttpDialer {
    timeout: Duration,
}

impl HttpDialer {
    pub fn new(config: &TransportConfig) -> Self {
        Self {
            timeout: config.timeout(),
        }
    }
}

#[async_trait]
impl Dialer<Request> for HttpDialer {
    async fn dial(&mut self, id: ConnectionId) -> Result<Box<dyn Connection<Request>>, DialError> {
        Ok(Box::new(HttpConnection::new(id, self.timeout)?))
    }
}
