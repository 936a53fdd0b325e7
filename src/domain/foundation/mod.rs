//! Foundation layer: shared value objects and traits.
//!
//! Everything here is pure and dependency-free so the rest of the domain
//! can build on it without pulling in I/O concerns.

mod errors;
mod ids;
mod state_machine;
mod timestamp;

pub use errors::{DomainError, ErrorCode, ValidationError};
pub use ids::{ChatId, ItemCode, OrderId};
pub use state_machine::StateMachine;
pub use timestamp::Timestamp;
