//! Faultline Core - configurable exception routing
//!
//! This crate provides the runtime half of faultline:
//! - A static exception-type model with multiple inheritance and a name registry
//! - Per-function rules (watched types, custom message, tags, behaviors)
//! - Context gathering at three detail levels
//! - Behavior resolution and the exception router
//! - Caller-owned primary sinks and scoped auxiliary sinks
//! - Wrapping of functions and methods so their failures are routed
//!
//! Config documents are decoded by the `faultline-config` crate.

pub mod context;
pub mod errors;
pub mod exception;
pub mod handler;
pub mod logging_facility;
pub mod registry;
pub mod resolver;
pub mod router;
pub mod rules;
pub mod settings;
pub mod sink;
pub mod terminate;
pub mod unhandled;
pub mod wrap;

// Re-export commonly used types
pub use context::{CallSite, ContextBuilder, ExceptionContext, HostProbe, SystemProbe};
pub use errors::{ExError, ExErrorKind, FaultlineError, Result};
pub use exception::{BoxedException, Exception, ExceptionType, Fault};
pub use handler::ExceptionHandler;
pub use registry::ExceptionRegistry;
pub use resolver::{BehaviorResolver, ResolvedAction};
pub use router::{ExceptionRouter, ExceptionRouterBuilder};
pub use rules::{BehaviorAction, RuleEntry, RuleStore};
pub use settings::{ContextLevel, Settings};
pub use sink::{LogRecord, Severity, Sink, SinkHandle, SinkRegistry};
pub use terminate::{ProcessTerminator, RecordingTerminator, Terminator};
pub use unhandled::{install_panic_hook, report_unhandled};
pub use wrap::{guard, RouteErr, WrapEngine};
