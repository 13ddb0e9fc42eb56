//! In-memory capture of `tracing` output for assertions in tests
//!
//! The capture subscriber is process-wide. Tests running in parallel share
//! it, so each test should route under a function name nobody else uses.

use crate::sink::RECORD_TARGET;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, OnceLock, PoisonError};
use tracing::field::{Field, Visit};
use tracing::{Level, Subscriber};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::Layer;

/// One `tracing` event, fields rendered as strings
#[derive(Clone, Debug)]
pub struct CapturedEvent {
    pub level: Level,
    pub target: String,
    pub function: Option<String>,
    pub event: Option<String>,
    pub message: Option<String>,
    pub fields: HashMap<String, String>,
}

impl CapturedEvent {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// Whether this event is a record forwarded by `TracingSink`
    pub fn is_record(&self) -> bool {
        self.target == RECORD_TARGET
    }

    pub fn exception_type(&self) -> Option<&str> {
        self.field("exc.type").filter(|t| !t.is_empty())
    }

    fn matches(&self, function: &str, event: &str) -> bool {
        self.function.as_deref() == Some(function) && self.event.as_deref() == Some(event)
    }
}

#[derive(Default)]
struct FieldCollector(HashMap<String, String>);

impl FieldCollector {
    fn put(&mut self, field: &Field, value: String) {
        self.0.insert(field.name().to_string(), value);
    }
}

impl Visit for FieldCollector {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.put(field, format!("{:?}", value));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.put(field, value.to_string());
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.put(field, value.to_string());
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.put(field, value.to_string());
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.put(field, value.to_string());
    }
}

type Buffer = Arc<Mutex<Vec<CapturedEvent>>>;

struct CaptureLayer {
    buffer: Buffer,
}

impl<S> Layer<S> for CaptureLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        let mut collector = FieldCollector::default();
        event.record(&mut collector);
        let fields = collector.0;

        let captured = CapturedEvent {
            level: *metadata.level(),
            target: metadata.target().to_string(),
            function: fields.get("function").cloned(),
            event: fields.get("event").cloned(),
            message: fields.get("message").cloned(),
            fields,
        };

        self.buffer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(captured);
    }
}

/// Read handle over the captured events
#[derive(Clone)]
pub struct TestCapture {
    buffer: Buffer,
}

impl TestCapture {
    pub fn events(&self) -> Vec<CapturedEvent> {
        self.buffer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Events whose `function` field equals `function`
    pub fn events_for(&self, function: &str) -> Vec<CapturedEvent> {
        self.events()
            .into_iter()
            .filter(|e| e.function.as_deref() == Some(function))
            .collect()
    }

    /// Records forwarded by `TracingSink` for `function`, in emission order
    pub fn records_for(&self, function: &str) -> Vec<CapturedEvent> {
        self.events_for(function)
            .into_iter()
            .filter(CapturedEvent::is_record)
            .collect()
    }

    pub fn find(&self, function: &str, event: &str) -> Option<CapturedEvent> {
        self.events().into_iter().find(|e| e.matches(function, event))
    }

    /// # Panics
    ///
    /// Panics if no event with this function and event name was captured
    pub fn assert_event_exists(&self, function: &str, event: &str) -> CapturedEvent {
        match self.find(function, event) {
            Some(found) => found,
            None => panic!(
                "no event function={} event={} among {} captured",
                function,
                event,
                self.events().len()
            ),
        }
    }

    pub fn count_events<F>(&self, predicate: F) -> usize
    where
        F: Fn(&CapturedEvent) -> bool,
    {
        self.events().iter().filter(|e| predicate(e)).count()
    }

    pub fn clear(&self) {
        self.buffer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

static CAPTURE: OnceLock<TestCapture> = OnceLock::new();

/// Install the capture subscriber once and return its handle
///
/// If another global subscriber won the race the handle stays empty.
pub fn init_test_capture() -> TestCapture {
    CAPTURE
        .get_or_init(|| {
            let buffer = Buffer::default();
            let layer = CaptureLayer {
                buffer: Arc::clone(&buffer),
            };
            tracing_subscriber::registry().with(layer).try_init().ok();
            TestCapture { buffer }
        })
        .clone()
}
