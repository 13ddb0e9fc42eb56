//! Primary sink that forwards records as structured `tracing` events

use super::record::{LogRecord, Severity};
use super::Sink;
use crate::errors::Result;

/// `tracing` target of every forwarded record
pub const RECORD_TARGET: &str = "faultline::record";

/// Emits each record through the global `tracing` dispatcher
///
/// Field names follow `faultline_core_types::schema`.
///
/// `Critical` maps onto `ERROR`, the highest `tracing` level; the original
/// severity stays visible in the `severity` field.
#[derive(Debug, Clone)]
pub struct TracingSink {
    name: String,
}

impl TracingSink {
    pub fn new() -> Self {
        Self {
            name: "tracing".to_string(),
        }
    }
}

impl Default for TracingSink {
    fn default() -> Self {
        Self::new()
    }
}

macro_rules! forward {
    ($level:expr, $record:expr, $extra:expr, $exc_type:expr) => {
        tracing::event!(
            target: RECORD_TARGET,
            $level,
            component = module_path!(),
            function = $record.function.as_deref().unwrap_or(""),
            event = $record.event,
            event_id = %$record.event_id,
            severity = $record.severity.as_str(),
            extra = %$extra,
            exc.type = $exc_type,
            mirrored = $record.mirrored,
            "{}",
            $record.message
        )
    };
}

impl Sink for TracingSink {
    fn name(&self) -> &str {
        &self.name
    }

    fn emit(&self, record: &LogRecord) -> Result<()> {
        let extra = serde_json::to_string(&record.extra)?;
        let exc_type = record
            .exception
            .as_ref()
            .map(|e| e.qualified_type.as_str())
            .unwrap_or("");

        match record.severity {
            Severity::Debug => forward!(tracing::Level::DEBUG, record, extra, exc_type),
            Severity::Info => forward!(tracing::Level::INFO, record, extra, exc_type),
            Severity::Warning => forward!(tracing::Level::WARN, record, extra, exc_type),
            Severity::Error | Severity::Critical => {
                forward!(tracing::Level::ERROR, record, extra, exc_type)
            }
        }
        Ok(())
    }
}
