//! Reporting of errors and panics that escaped every handler

use crate::router::ExceptionRouter;
use crate::sink::{LogRecord, Severity};
use faultline_core_types::schema::EVENT_UNHANDLED;
use faultline_core_types::EventId;
use std::panic;
use std::sync::Arc;

pub const UNHANDLED_FUNCTION: &str = "<unhandled>";

pub fn unhandled_message(message: &str) -> String {
    format!("An unhandled exception has occurred: {}", message)
}

/// Emit an error record for an escaped failure, then apply panic mode
pub fn report_unhandled(router: &ExceptionRouter, message: &str) -> EventId {
    let event_id = EventId::new();
    let record = LogRecord::new(event_id, Severity::Error, unhandled_message(message))
        .with_event(EVENT_UNHANDLED)
        .with_function(UNHANDLED_FUNCTION);
    router.sinks().emit(&record);
    router.apply_panic_mode(&event_id, UNHANDLED_FUNCTION);
    event_id
}

/// Route Rust panics through [`report_unhandled`], then run the previous hook
pub fn install_panic_hook(router: Arc<ExceptionRouter>) {
    let previous = panic::take_hook();
    panic::set_hook(Box::new(move |info| {
        let payload = info
            .payload()
            .downcast_ref::<&str>()
            .map(|s| (*s).to_string())
            .or_else(|| info.payload().downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "panic".to_string());
        let message = match info.location() {
            Some(location) => format!("{} at {}", payload, location),
            None => payload,
        };
        report_unhandled(&router, &message);
        previous(info);
    }));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;
    use crate::sink::MemorySink;
    use crate::terminate::RecordingTerminator;

    #[test]
    fn test_report_unhandled_applies_panic_mode() {
        let memory = MemorySink::new("mem");
        let terminator = RecordingTerminator::new();
        let router = ExceptionRouter::builder(Settings::default().with_panic_mode(true))
            .sink(Arc::new(memory.clone()))
            .terminator(Arc::new(terminator.clone()))
            .build();

        report_unhandled(&router, "stack overflow");

        let records = memory.records();
        assert_eq!(records.len(), 2);
        assert_eq!(
            records[0].message,
            "An unhandled exception has occurred: stack overflow"
        );
        assert_eq!(records[0].severity, Severity::Error);
        assert_eq!(records[1].severity, Severity::Critical);
        assert_eq!(records[0].event_id, records[1].event_id);
        assert_eq!(terminator.codes(), vec![1]);
    }
}
