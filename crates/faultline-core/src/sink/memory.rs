//! In-process sinks for capturing records

use super::record::LogRecord;
use super::{AuxiliarySinkFactory, Sink};
use crate::errors::Result;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// Keeps every record in memory; clones share storage
#[derive(Debug, Clone)]
pub struct MemorySink {
    name: String,
    records: Arc<Mutex<Vec<LogRecord>>>,
}

impl MemorySink {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            records: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn records(&self) -> Vec<LogRecord> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn len(&self) -> usize {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    pub fn count<F>(&self, predicate: F) -> usize
    where
        F: Fn(&LogRecord) -> bool,
    {
        self.records().iter().filter(|r| predicate(r)).count()
    }
}

impl Sink for MemorySink {
    fn name(&self) -> &str {
        &self.name
    }

    fn emit(&self, record: &LogRecord) -> Result<()> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(record.clone());
        Ok(())
    }
}

/// Hands out one [`MemorySink`] per destination, reused across opens
#[derive(Debug, Default)]
pub struct MemorySinkFactory {
    sinks: Mutex<HashMap<String, MemorySink>>,
    opens: AtomicUsize,
}

impl MemorySinkFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records mirrored to `destination` so far
    pub fn records(&self, destination: &str) -> Vec<LogRecord> {
        self.sinks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(destination)
            .map(MemorySink::records)
            .unwrap_or_default()
    }

    pub fn destinations(&self) -> Vec<String> {
        let mut names: Vec<_> = self
            .sinks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }

    /// Number of times `open` was called
    pub fn open_count(&self) -> usize {
        self.opens.load(Ordering::Relaxed)
    }
}

impl AuxiliarySinkFactory for MemorySinkFactory {
    fn open(&self, destination: &str) -> Result<Box<dyn Sink>> {
        self.opens.fetch_add(1, Ordering::Relaxed);
        let sink = self
            .sinks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(destination.to_string())
            .or_insert_with(|| MemorySink::new(destination))
            .clone();
        Ok(Box::new(sink))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::record::Severity;
    use faultline_core_types::EventId;

    #[test]
    fn test_clones_share_records() {
        let sink = MemorySink::new("mem");
        let clone = sink.clone();
        clone
            .emit(&LogRecord::new(EventId::new(), Severity::Info, "a"))
            .unwrap();
        assert_eq!(sink.len(), 1);
        sink.clear();
        assert!(clone.is_empty());
    }

    #[test]
    fn test_factory_reuses_destination() {
        let factory = MemorySinkFactory::new();
        for _ in 0..2 {
            let sink = factory.open("a.log").unwrap();
            sink.emit(&LogRecord::new(EventId::new(), Severity::Error, "x"))
                .unwrap();
        }
        assert_eq!(factory.open_count(), 2);
        assert_eq!(factory.records("a.log").len(), 2);
        assert_eq!(factory.destinations(), vec!["a.log".to_string()]);
        assert!(factory.records("b.log").is_empty());
    }
}
