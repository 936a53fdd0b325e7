//! Application layer: services and the conversation engine.
//!
//! Services own the shared mutable state (cached tables, the ledger
//! counter) behind their contracts; the engine and dispatcher drive the
//! per-chat dialogue over them.

mod catalog_cache;
mod destinations;
mod dispatcher;
mod engine;
mod events;
mod ledger;
pub mod menus;

pub use catalog_cache::CatalogCache;
pub use destinations::DestinationDirectory;
pub use dispatcher::Dispatcher;
pub use engine::ConversationEngine;
pub use events::{Command, EventKind, InboundEvent, OutboundAction};
pub use ledger::OrderLedger;
