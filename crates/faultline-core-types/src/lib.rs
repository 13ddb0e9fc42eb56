//! Core types shared across faultline crates
//!
//! This crate provides the leaf types used by the router, the sinks and
//! the config loader:
//!
//! - **Correlation types**: EventId, stamped on every record of one routed exception
//! - **Schema constants**: Canonical field keys, event names and context keys

pub mod correlation;
pub mod schema;

pub use correlation::EventId;
