//! Stage composition over unidirectional channels.
//!
//! # Core Concepts
//!
//! - [`Stage`]: a unit of concurrency consuming an [`Inlet`] and producing
//!   into an [`Outlet`]. One task per stage.
//! - [`channel`] / [`bounded`]: the only coupling between stages. Bounded
//!   sends are the sole backpressure mechanism: a stage that stops draining
//!   its input stalls every stage upstream of it.
//! - [`Pipeline`]: fluent builder that wires channels and spawns stages.
//!
//! Shutdown propagates by closing: when the first channel closes, each stage
//! drains, returns, and thereby closes its own output.

mod builder;
mod channel;
mod stage;

pub use builder::{Pipeline, PipelineHandle};
pub use channel::{bounded, channel, Inlet, Outlet, RENDEZVOUS_CAPACITY};
pub use stage::{spawn_stage, FilterMapStage, MapStage, Stage, StageHandle};
