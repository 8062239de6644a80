//! Pipepool - a streaming pipeline runtime for dispatching outbound requests
//! through a bounded pool of reusable connections, with admission control
//! applied upstream.
//!
//! # Architecture
//!
//! Independent stages run on their own tasks and talk only through bounded
//! channels:
//!
//! - **`pipeline`** - The [`Stage`](pipeline::Stage) contract, channels with a
//!   single owning closer, and a fluent [`Pipeline`](pipeline::Pipeline)
//!   builder
//! - **`limiter`** - Token-bucket rate limiter stage
//! - **`pool`** - Connection pool stage: provisioning, per-connection workers,
//!   periodic health checks and replacement
//!
//! # Modules
//!
//! - [`config`] - Configuration loading from TOML files
//! - [`domain`] - Messages, outcomes, connection ids
//! - [`error`] - Error types for the crate
//! - [`app`] - Demo application sending HTTP requests through the pipeline
//! - [`cli`] - Command-line interface
//!
//! # Example
//!
//! ```no_run
//! use pipepool::app::App;
//! use pipepool::config::Config;
//!
//! # async fn demo() -> pipepool::error::Result<()> {
//! let config = Config::load("pipepool.toml")?;
//! let report = App::new(config).run().await?;
//! println!("{} ok, {} failed", report.summary.ok, report.summary.failed);
//! # Ok(())
//! # }
//! ```

pub mod app;
pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod limiter;
pub mod pipeline;
pub mod pool;

#[cfg(any(test, feature = "testkit"))]
pub mod testkit;
