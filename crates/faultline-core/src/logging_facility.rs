//! Logging facility for faultline's own diagnostics
//!
//! - Single initialization point via `init(&LoggingOptions)`
//! - `call_site!` for building a [`CallSite`](crate::context::CallSite)
//!   with a snapshot of chosen locals
//! - Test capture mode for deterministic assertions on emitted events
//!
//! # Usage
//!
//! ```rust
//! use faultline_core::logging_facility::{init, LoggingOptions, Profile};
//!
//! init(&LoggingOptions::new(Profile::Development).with_debug(true));
//! ```

pub mod init;
pub mod macros;
pub mod test_capture;

pub use init::{init, LoggingOptions, Profile};
pub use test_capture::{init_test_capture, CapturedEvent, TestCapture};
