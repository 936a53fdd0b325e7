//! Quartermaster - Supply Order Conversation Core
//!
//! This crate implements the multi-step ordering dialogue for a supply
//! request chat bot: a per-chat state machine, a TTL-cached item catalog,
//! a destination directory with recency tracking, and an append-only
//! order ledger. Message transport and the spreadsheet wire protocol are
//! consumed through ports.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
