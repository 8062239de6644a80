//! Pipeline domain types: messages flowing between stages and the
//! identifiers the pool hands out.

mod ids;
mod message;

pub use ids::ConnectionId;
pub use message::{Message, Outcome};
