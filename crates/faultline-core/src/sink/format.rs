//! Record formatters for text and JSON-lines output

use super::record::{LogRecord, Severity};
use serde_json::Value;

/// Turns a record into a line of output
pub trait RecordFormatter: Send + Sync {
    fn format(&self, record: &LogRecord) -> String;

    fn serialize(&self, record: &LogRecord) -> Value {
        serde_json::to_value(record).unwrap_or(Value::Null)
    }
}

/// `timestamp | LEVEL | function - message | extra` with the traceback
/// on following lines
#[derive(Debug, Clone, Copy, Default)]
pub struct TextFormatter {
    colored: bool,
}

impl TextFormatter {
    pub fn new(colored: bool) -> Self {
        Self { colored }
    }

    fn level(&self, severity: Severity) -> String {
        let padded = format!("{:<8}", severity.as_str());
        if !self.colored {
            return padded;
        }
        let code = match severity {
            Severity::Debug => "34",
            Severity::Info => "32",
            Severity::Warning => "33",
            Severity::Error => "31",
            Severity::Critical => "1;31",
        };
        format!("\x1b[{}m{}\x1b[0m", code, padded)
    }
}

impl RecordFormatter for TextFormatter {
    fn format(&self, record: &LogRecord) -> String {
        let mut line = format!(
            "{} | {} | {} - {}",
            record.timestamp,
            self.level(record.severity),
            record.function.as_deref().unwrap_or("-"),
            record.message
        );
        if !record.extra.is_empty() {
            let extra = serde_json::to_string(&record.extra).unwrap_or_default();
            line.push_str(" | extra: ");
            line.push_str(&extra);
        }
        if let Some(exc) = &record.exception {
            for frame in &exc.traceback {
                line.push_str("\n    ");
                line.push_str(frame);
            }
        }
        line
    }
}

/// One JSON object per line
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonFormatter;

impl RecordFormatter for JsonFormatter {
    fn format(&self, record: &LogRecord) -> String {
        serde_json::to_string(record).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ExceptionContext;
    use crate::exception::{Fault, VALUE_ERROR};
    use faultline_core_types::EventId;

    const EVENT: &str = "01890a5d-ac96-774b-bcce-b302099a8057";

    fn record() -> LogRecord {
        let mut extra = ExceptionContext::new();
        extra.insert("tags", vec!["x"]);
        LogRecord::exception(
            EVENT.parse::<EventId>().unwrap(),
            "Exception caught in F",
            extra,
            &Fault::new(&VALUE_ERROR, "boom"),
        )
        .with_function("F")
    }

    #[test]
    fn test_plain_text_has_no_ansi() {
        let line = TextFormatter::new(false).format(&record());
        assert!(line.contains("| ERROR    | F - Exception caught in F"));
        assert!(line.contains("extra: {\"tags\":[\"x\"]}"));
        assert!(line.contains("\n    ValueError: boom"));
        assert!(!line.contains('\x1b'));
    }

    #[test]
    fn test_colored_text_wraps_level() {
        let line = TextFormatter::new(true).format(&record());
        assert!(line.contains("\x1b[31mERROR"));
    }

    #[test]
    fn test_json_is_single_line_object() {
        let line = JsonFormatter.format(&record());
        assert!(!line.contains('\n'));
        let value: Value = serde_json::from_str(&line).unwrap();
        assert_eq!(value["event_id"], EVENT);
        assert_eq!(value["extra"]["tags"][0], "x");
        assert_eq!(value["exception"]["type_name"], "ValueError");
    }
}
