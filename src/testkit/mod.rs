//! Shared test utilities available to both unit and integration tests.
//!
//! Enabled via `#[cfg(test)]` (unit tests) or the `testkit` feature
//! (integration tests).
//!
//! # Modules
//!
//! - [`clock`]: controllable [`TimeSource`](crate::limiter::TimeSource)s.
//! - [`connection`]: scripted [`Connection`](crate::pool::Connection) and
//!   [`Dialer`](crate::pool::Dialer) with shared probes for assertions.
//! - [`config`]: canonical test configurations.

pub mod clock;
pub mod config;
pub mod connection;
