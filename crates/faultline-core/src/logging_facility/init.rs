//! Logging initialization
//!
//! Installs the global `tracing` subscriber once per process.

use crate::settings::Settings;
use crate::sink::{RotatingFile, DEFAULT_LOG_MAX_BYTES};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, Once};
use tracing::Subscriber;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

pub const TEXT_LOG_FILE: &str = "faultline.log";
pub const JSON_LOG_FILE: &str = "faultline.json";

/// Logging profile
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    /// Human-readable console output
    Development,
    /// JSON console output
    Production,
    /// No output; tests install `test_capture` instead
    Test,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingOptions {
    pub profile: Profile,
    pub debug: bool,
    /// ANSI colouring on the console
    pub formatting: bool,
    /// Directory for `faultline.log` and `faultline.json`; no files when unset
    pub log_dir: Option<PathBuf>,
    /// Size at which each log file rolls over to `<file>.1`
    pub max_file_bytes: u64,
}

impl LoggingOptions {
    pub fn new(profile: Profile) -> Self {
        Self {
            profile,
            debug: false,
            formatting: true,
            log_dir: None,
            max_file_bytes: DEFAULT_LOG_MAX_BYTES,
        }
    }

    pub fn from_settings(profile: Profile, settings: &Settings) -> Self {
        Self {
            profile,
            debug: settings.debug,
            formatting: settings.formatting,
            log_dir: None,
            max_file_bytes: DEFAULT_LOG_MAX_BYTES,
        }
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn with_formatting(mut self, formatting: bool) -> Self {
        self.formatting = formatting;
        self
    }

    pub fn with_log_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.log_dir = Some(dir.into());
        self
    }

    pub fn with_max_file_bytes(mut self, max_file_bytes: u64) -> Self {
        self.max_file_bytes = max_file_bytes;
        self
    }

    /// Filter used when `RUST_LOG` is not set
    pub fn default_directive(&self) -> &'static str {
        if self.debug {
            "faultline=debug"
        } else {
            "faultline=info"
        }
    }
}

static INIT_ONCE: Once = Once::new();

/// Initialize the logging facility
///
/// Only the first call has any effect. If another global subscriber is
/// already installed (for example by `init_test_capture`) this is a no-op.
///
/// # Example
///
/// ```
/// use faultline_core::logging_facility::{init, LoggingOptions, Profile};
///
/// init(&LoggingOptions::new(Profile::Test));
/// ```
pub fn init(options: &LoggingOptions) {
    INIT_ONCE.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(options.default_directive()));

        let opened = options
            .log_dir
            .as_deref()
            .map(|dir| LogFiles::open(dir, options.max_file_bytes));
        let (files, dir_error) = match opened {
            Some(Ok(files)) => (Some(files), None),
            Some(Err(err)) => (None, Some(err)),
            None => (None, None),
        };
        let installed = match options.profile {
            Profile::Development => tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_ansi(options.formatting))
                .with(file_layers(files))
                .try_init(),
            Profile::Production => tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json())
                .with(file_layers(files))
                .try_init(),
            // Test capture is installed separately via init_test_capture()
            Profile::Test => tracing_subscriber::registry().try_init(),
        };

        if installed.is_ok() {
            if let Some(err) = dir_error {
                tracing::warn!(error = %err, "log directory unavailable, file output disabled");
            }
        }
    });
}

/// `faultline.log` and `faultline.json` under one directory
struct LogFiles {
    text: RotatingFile,
    json: RotatingFile,
}

impl LogFiles {
    fn open(dir: &Path, max_bytes: u64) -> io::Result<Self> {
        Ok(Self {
            text: RotatingFile::open(dir.join(TEXT_LOG_FILE), Some(max_bytes))?,
            json: RotatingFile::open(dir.join(JSON_LOG_FILE), Some(max_bytes))?,
        })
    }
}

fn file_layers<S>(files: Option<LogFiles>) -> Option<Box<dyn Layer<S> + Send + Sync>>
where
    S: Subscriber + for<'a> LookupSpan<'a> + 'static,
{
    let files = files?;
    let text = fmt::layer()
        .with_ansi(false)
        .with_writer(Mutex::new(files.text));
    let json = fmt::layer().json().with_writer(Mutex::new(files.json));
    Some(text.and_then(json).boxed())
}
