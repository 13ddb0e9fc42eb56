//! Structured log records produced by the router

use crate::context::ExceptionContext;
use crate::exception::Exception;
use chrono::{SecondsFormat, Utc};
use faultline_core_types::schema::{EVENT_EXCEPTION, EVENT_LOG, EVENT_MIRRORED};
use faultline_core_types::EventId;
use serde::Serialize;
use std::fmt;

/// Record severity; `Critical` is reserved for panic-mode exits
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Debug,
    Info,
    Warning,
    Error,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Debug => "DEBUG",
            Severity::Info => "INFO",
            Severity::Warning => "WARNING",
            Severity::Error => "ERROR",
            Severity::Critical => "CRITICAL",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Type, message and rendered cause chain of the routed exception
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExceptionDetails {
    pub type_name: String,
    pub qualified_type: String,
    pub message: String,
    pub traceback: Vec<String>,
}

impl ExceptionDetails {
    pub fn capture(exc: &dyn Exception) -> Self {
        let ty = exc.exception_type();
        let qualified_type = ty.qualified_name();
        let message = exc.to_string();

        let mut traceback = vec![format!("{}: {}", qualified_type, message)];
        let mut cause = exc.source();
        while let Some(err) = cause {
            traceback.push(format!("caused by: {}", err));
            cause = err.source();
        }

        Self {
            type_name: ty.name().to_string(),
            qualified_type,
            message,
            traceback,
        }
    }
}

/// One structured record delivered to sinks
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogRecord {
    pub event_id: EventId,
    pub event: &'static str,
    pub timestamp: String,
    pub severity: Severity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub function: Option<String>,
    pub message: String,
    pub extra: ExceptionContext,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exception: Option<ExceptionDetails>,
    pub mirrored: bool,
}

impl LogRecord {
    pub fn new(event_id: EventId, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            event_id,
            event: EVENT_LOG,
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
            severity,
            function: None,
            message: message.into(),
            extra: ExceptionContext::new(),
            exception: None,
            mirrored: false,
        }
    }

    /// Error-level record carrying the exception details
    pub fn exception(
        event_id: EventId,
        message: impl Into<String>,
        extra: ExceptionContext,
        exc: &dyn Exception,
    ) -> Self {
        let mut record = Self::new(event_id, Severity::Error, message);
        record.event = EVENT_EXCEPTION;
        record.extra = extra;
        record.exception = Some(ExceptionDetails::capture(exc));
        record
    }

    pub fn with_event(mut self, event: &'static str) -> Self {
        self.event = event;
        self
    }

    pub fn with_function(mut self, function: impl Into<String>) -> Self {
        self.function = Some(function.into());
        self
    }

    pub fn with_extra(mut self, extra: ExceptionContext) -> Self {
        self.extra = extra;
        self
    }

    /// Copy for an auxiliary destination, message prefixed with the mirror marker
    pub fn mirrored_to(&self, destination: &str) -> Self {
        let mut record = self.clone();
        record.message = format!("[Mirrored to {}] {}", destination, self.message);
        record.event = EVENT_MIRRORED;
        record.mirrored = true;
        record
    }
}
