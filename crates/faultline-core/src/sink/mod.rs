//! Log sinks and the caller-owned sink registry
//!
//! Primary sinks are attached to a [`SinkRegistry`] owned by the router.
//! Auxiliary sinks are opened per emission through an
//! [`AuxiliarySinkFactory`] and released by [`ScopedSink`] when it drops.

pub mod file;
pub mod format;
pub mod memory;
pub mod record;
pub mod rotate;
pub mod tracing_sink;

pub use file::{FileSink, FileSinkFactory};
pub use format::{JsonFormatter, RecordFormatter, TextFormatter};
pub use memory::{MemorySink, MemorySinkFactory};
pub use record::{ExceptionDetails, LogRecord, Severity};
pub use rotate::{RotatingFile, DEFAULT_AUXILIARY_MAX_BYTES, DEFAULT_LOG_MAX_BYTES};
pub use tracing_sink::{TracingSink, RECORD_TARGET};

use crate::errors::Result;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

/// A log destination
pub trait Sink: Send + Sync {
    fn name(&self) -> &str;

    /// Write one record
    ///
    /// # Errors
    ///
    /// `SinkWrite` or `AuxiliarySink` when the destination rejects the record.
    fn emit(&self, record: &LogRecord) -> Result<()>;

    /// Flush buffered output
    ///
    /// # Errors
    ///
    /// Returns an error when buffered output cannot be written.
    fn flush(&self) -> Result<()> {
        Ok(())
    }
}

/// Handle returned by [`SinkRegistry::attach`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SinkHandle(u64);

/// Ordered set of primary sinks
#[derive(Default)]
pub struct SinkRegistry {
    next_id: AtomicU64,
    sinks: RwLock<Vec<(SinkHandle, Arc<dyn Sink>)>>,
}

impl SinkRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attach(&self, sink: Arc<dyn Sink>) -> SinkHandle {
        let handle = SinkHandle(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.sinks
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push((handle, sink));
        handle
    }

    /// Remove a sink; `false` if the handle was not attached
    pub fn detach(&self, handle: SinkHandle) -> bool {
        let mut sinks = self.sinks.write().unwrap_or_else(PoisonError::into_inner);
        let before = sinks.len();
        sinks.retain(|(h, _)| *h != handle);
        sinks.len() != before
    }

    /// Deliver `record` to every attached sink, returning how many accepted it
    ///
    /// A failing sink is reported and skipped; the others still receive the record.
    pub fn emit(&self, record: &LogRecord) -> usize {
        let sinks = self.snapshot();
        let mut delivered = 0;
        for sink in &sinks {
            match sink.emit(record) {
                Ok(()) => delivered += 1,
                Err(err) => {
                    tracing::warn!(sink = sink.name(), error = %err, "sink rejected record");
                }
            }
        }
        delivered
    }

    pub fn flush(&self) {
        for sink in self.snapshot() {
            if let Err(err) = sink.flush() {
                tracing::warn!(sink = sink.name(), error = %err, "sink flush failed");
            }
        }
    }

    pub fn len(&self) -> usize {
        self.sinks
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn snapshot(&self) -> Vec<Arc<dyn Sink>> {
        self.sinks
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, sink)| Arc::clone(sink))
            .collect()
    }
}

impl fmt::Debug for SinkRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SinkRegistry")
            .field("len", &self.len())
            .finish()
    }
}

/// Opens the destination named by a `log_to_specific_file` behavior
pub trait AuxiliarySinkFactory: Send + Sync {
    /// # Errors
    ///
    /// `AuxiliarySink` when the destination cannot be opened.
    fn open(&self, destination: &str) -> Result<Box<dyn Sink>>;
}

/// Auxiliary sink scoped to a single emission; flushed and released on drop
pub struct ScopedSink {
    destination: String,
    sink: Box<dyn Sink>,
}

impl ScopedSink {
    /// # Errors
    ///
    /// Propagates the factory's open failure.
    pub fn open(factory: &dyn AuxiliarySinkFactory, destination: &str) -> Result<Self> {
        let sink = factory.open(destination)?;
        Ok(Self {
            destination: destination.to_string(),
            sink,
        })
    }

    /// # Errors
    ///
    /// Propagates the sink's write failure.
    pub fn emit(&self, record: &LogRecord) -> Result<()> {
        self.sink.emit(record)
    }

    pub fn destination(&self) -> &str {
        &self.destination
    }
}

impl Drop for ScopedSink {
    fn drop(&mut self) {
        if let Err(err) = self.sink.flush() {
            tracing::warn!(destination = %self.destination, error = %err, "auxiliary flush failed");
        }
    }
}
