//! Append-only file sink with size-based rotation

use super::format::{JsonFormatter, RecordFormatter};
use super::record::LogRecord;
use super::rotate::{RotatingFile, DEFAULT_AUXILIARY_MAX_BYTES};
use super::{AuxiliarySinkFactory, Sink};
use crate::errors::{FaultlineError, Result};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

/// Appends one formatted line per record
pub struct FileSink {
    name: String,
    path: PathBuf,
    file: Mutex<RotatingFile>,
    formatter: Box<dyn RecordFormatter>,
}

impl FileSink {
    /// Open `path` for appending, creating parent directories
    ///
    /// The file grows without limit until [`FileSink::with_max_bytes`] is set.
    ///
    /// # Errors
    ///
    /// `Io` if the directory or file cannot be created.
    pub fn open(path: impl AsRef<Path>, formatter: Box<dyn RecordFormatter>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = RotatingFile::open(&path, None).map_err(|e| io_error("open", &path, e))?;

        Ok(Self {
            name: path.display().to_string(),
            path,
            file: Mutex::new(file),
            formatter,
        })
    }

    /// Rotate to `<path>.1` once the next line would exceed `max_bytes`
    pub fn with_max_bytes(self, max_bytes: u64) -> Self {
        self.file
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .set_max_bytes(Some(max_bytes));
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Sink for FileSink {
    fn name(&self) -> &str {
        &self.name
    }

    fn emit(&self, record: &LogRecord) -> Result<()> {
        let mut line = self.formatter.format(record);
        line.push('\n');
        let mut file = self.file.lock().unwrap_or_else(PoisonError::into_inner);
        file.write_all(line.as_bytes())
            .map_err(|e| FaultlineError::SinkWrite {
                sink: self.name.clone(),
                reason: e.to_string(),
            })
    }

    fn flush(&self) -> Result<()> {
        self.file
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .flush()
            .map_err(|e| io_error("flush", &self.path, e))
    }
}

/// Opens JSON-lines [`FileSink`]s for behavior-specified destinations
///
/// Each destination rotates at [`DEFAULT_AUXILIARY_MAX_BYTES`] unless
/// configured otherwise.
#[derive(Debug, Clone, Copy)]
pub struct FileSinkFactory {
    max_bytes: Option<u64>,
}

impl FileSinkFactory {
    pub fn new() -> Self {
        Self {
            max_bytes: Some(DEFAULT_AUXILIARY_MAX_BYTES),
        }
    }

    pub fn with_max_bytes(mut self, max_bytes: u64) -> Self {
        self.max_bytes = Some(max_bytes);
        self
    }

    pub fn unbounded() -> Self {
        Self { max_bytes: None }
    }

    pub fn max_bytes(&self) -> Option<u64> {
        self.max_bytes
    }
}

impl Default for FileSinkFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl AuxiliarySinkFactory for FileSinkFactory {
    fn open(&self, destination: &str) -> Result<Box<dyn Sink>> {
        let sink = FileSink::open(destination, Box::new(JsonFormatter)).map_err(|e| {
            FaultlineError::AuxiliarySink {
                destination: destination.to_string(),
                reason: e.to_string(),
            }
        })?;
        Ok(Box::new(match self.max_bytes {
            Some(limit) => sink.with_max_bytes(limit),
            None => sink,
        }))
    }
}

fn io_error(op: &str, path: &Path, err: std::io::Error) -> FaultlineError {
    FaultlineError::Io {
        op: op.to_string(),
        message: format!("{}: {}", path.display(), err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::record::Severity;
    use crate::sink::TextFormatter;
    use faultline_core_types::EventId;
    use std::fs;
    use tempfile::TempDir;

    fn record(message: &str) -> LogRecord {
        LogRecord::new(EventId::new(), Severity::Info, message)
    }

    #[test]
    fn test_appends_lines_and_creates_dirs() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("app.log");
        let sink = FileSink::open(&path, Box::new(TextFormatter::new(false))).unwrap();

        sink.emit(&record("first")).unwrap();
        sink.emit(&record("second")).unwrap();
        sink.flush().unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("- first"));
    }

    #[test]
    fn test_capped_sink_rotates_to_backup() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.log");
        let sink = FileSink::open(&path, Box::new(TextFormatter::new(false)))
            .unwrap()
            .with_max_bytes(200);

        for n in 0..10 {
            sink.emit(&record(&format!("line {}", n))).unwrap();
        }
        sink.flush().unwrap();

        let current = fs::read_to_string(&path).unwrap();
        let backup = fs::read_to_string(dir.path().join("app.log.1")).unwrap();
        assert!(current.len() <= 200);
        assert!(backup.len() <= 200);
        assert!(current.ends_with("- line 9\n"));
    }

    #[test]
    fn test_factory_writes_json_lines() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("aux.json");
        let destination = path.to_string_lossy().into_owned();

        {
            let sink = FileSinkFactory::default().open(&destination).unwrap();
            sink.emit(&LogRecord::new(EventId::new(), Severity::Error, "mirrored"))
                .unwrap();
        }

        let content = fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(content.trim()).unwrap();
        assert_eq!(value["message"], "mirrored");
    }

    #[test]
    fn test_factory_defaults_to_auxiliary_limit() {
        assert_eq!(
            FileSinkFactory::default().max_bytes(),
            Some(DEFAULT_AUXILIARY_MAX_BYTES)
        );
        assert_eq!(FileSinkFactory::unbounded().max_bytes(), None);
    }

    #[test]
    fn test_factory_reports_unopenable_destination() {
        let dir = TempDir::new().unwrap();
        // A directory cannot be opened as a log file
        let destination = dir.path().to_string_lossy().into_owned();
        let err = FileSinkFactory::default().open(&destination).err().unwrap();
        assert!(matches!(err, FaultlineError::AuxiliarySink { .. }));
    }
}
