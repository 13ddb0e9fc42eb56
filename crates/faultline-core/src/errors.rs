use thiserror::Error;

/// Result type alias using FaultlineError
pub type Result<T> = std::result::Result<T, FaultlineError>;

/// Coarse classification of a [`FaultlineError`]
///
/// Each kind carries a stable `ERR_*` code for log fields and assertions.
/// Only `ConfigNotFound` and `ConfigParse` abort a config load; every other
/// kind is reported and degraded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExErrorKind {
    // Config loading (fatal to the load)
    ConfigNotFound,
    ConfigParse,

    // Config validation (non-fatal, entry dropped)
    RuleResolution,
    BehaviorValidation,

    // Routing (non-fatal, downgraded to a warning)
    AuxiliarySink,
    SinkWrite,
    ProbeUnavailable,

    // General
    InvalidInput,
    Io,
    Serialization,
}

impl ExErrorKind {
    pub fn code(&self) -> &'static str {
        match self {
            ExErrorKind::ConfigNotFound => "ERR_CONFIG_NOT_FOUND",
            ExErrorKind::ConfigParse => "ERR_CONFIG_PARSE",
            ExErrorKind::RuleResolution => "ERR_RULE_RESOLUTION",
            ExErrorKind::BehaviorValidation => "ERR_BEHAVIOR_VALIDATION",
            ExErrorKind::AuxiliarySink => "ERR_AUXILIARY_SINK",
            ExErrorKind::SinkWrite => "ERR_SINK_WRITE",
            ExErrorKind::ProbeUnavailable => "ERR_PROBE_UNAVAILABLE",
            ExErrorKind::InvalidInput => "ERR_INVALID_INPUT",
            ExErrorKind::Io => "ERR_IO",
            ExErrorKind::Serialization => "ERR_SERIALIZATION",
        }
    }

    /// Whether an error of this kind aborts the operation that raised it
    pub fn is_fatal(&self) -> bool {
        matches!(self, ExErrorKind::ConfigNotFound | ExErrorKind::ConfigParse)
    }
}

/// Structured error with the operation, monitored function and file it concerns
#[derive(Debug, Clone)]
pub struct ExError {
    kind: ExErrorKind,
    op: Option<String>,
    function: Option<String>,
    path: Option<String>,
    message: String,
    source: Option<Box<ExError>>,
}

impl ExError {
    pub fn new(kind: ExErrorKind) -> Self {
        Self {
            kind,
            op: None,
            function: None,
            path: None,
            message: String::new(),
            source: None,
        }
    }

    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    pub fn with_function(mut self, function: impl Into<String>) -> Self {
        self.function = Some(function.into());
        self
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn with_source(mut self, source: ExError) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    pub fn kind(&self) -> ExErrorKind {
        self.kind
    }

    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    pub fn function(&self) -> Option<&str> {
        self.function.as_deref()
    }

    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Typed view of the wrapped cause
    pub fn source_error(&self) -> Option<&ExError> {
        self.source.as_deref()
    }
}

impl std::fmt::Display for ExError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(function) = &self.function {
            write!(f, " (function: {})", function)?;
        }
        if let Some(path) = &self.path {
            write!(f, " (path: {})", path)?;
        }
        Ok(())
    }
}

impl std::error::Error for ExError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|s| s as &(dyn std::error::Error + 'static))
    }
}

/// Error taxonomy for faultline operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FaultlineError {
    // ===== Config loading =====
    /// No file `<prefix>.<ext>` exists for any supported extension
    #[error("No matching configuration file found for {prefix} with extensions {extensions:?}")]
    ConfigNotFound {
        prefix: String,
        extensions: Vec<String>,
    },

    /// The config file exists but could not be read or decoded
    #[error("Failed to parse configuration file '{path}': {reason}")]
    ConfigParse { path: String, reason: String },

    // ===== Exception type resolution =====
    /// Name is neither a built-in nor a registered application type
    #[error("Unknown exception type '{name}'")]
    UnknownExceptionType { name: String },

    /// Bare name that is not a built-in (application types need a module path)
    #[error("Exception name '{name}' is not a built-in and has no module path")]
    MalformedExceptionName { name: String },

    /// Name resolved to a descriptor that does not derive from the root error type
    #[error("'{name}' is not an exception type")]
    NotAnException { name: String },

    // ===== Sinks =====
    /// Opening or writing the behavior-specified destination failed
    #[error("Failed to log to specific file {destination}: {reason}")]
    AuxiliarySink { destination: String, reason: String },

    /// A primary sink rejected a record
    #[error("Sink '{sink}' failed to write record: {reason}")]
    SinkWrite { sink: String, reason: String },

    // ===== Settings / probes =====
    /// Context level string is not one of the accepted aliases
    #[error("Invalid context level '{value}'")]
    InvalidContextLevel { value: String },

    /// A system probe is unsupported on this platform or failed
    #[error("System probe '{probe}' unavailable: {reason}")]
    ProbeUnavailable { probe: String, reason: String },

    // ===== IO / serialization =====
    #[error("IO error during {op}: {message}")]
    Io { op: String, message: String },

    #[error("Serialization error: {message}")]
    Serialization { message: String },
}

impl From<FaultlineError> for ExError {
    fn from(err: FaultlineError) -> Self {
        let message = err.to_string();
        match err {
            FaultlineError::ConfigNotFound { prefix, .. } => {
                ExError::new(ExErrorKind::ConfigNotFound)
                    .with_op("config_discover")
                    .with_path(prefix)
                    .with_message(message)
            }

            FaultlineError::ConfigParse { path, .. } => ExError::new(ExErrorKind::ConfigParse)
                .with_op("config_parse")
                .with_path(path)
                .with_message(message),

            FaultlineError::UnknownExceptionType { .. }
            | FaultlineError::MalformedExceptionName { .. }
            | FaultlineError::NotAnException { .. } => ExError::new(ExErrorKind::RuleResolution)
                .with_op("resolve_exception_type")
                .with_message(message),

            FaultlineError::AuxiliarySink { destination, .. } => {
                ExError::new(ExErrorKind::AuxiliarySink)
                    .with_op("emit_mirrored")
                    .with_path(destination)
                    .with_message(message)
            }

            FaultlineError::SinkWrite { .. } => ExError::new(ExErrorKind::SinkWrite)
                .with_op("emit")
                .with_message(message),

            FaultlineError::InvalidContextLevel { .. } => {
                ExError::new(ExErrorKind::InvalidInput).with_message(message)
            }

            FaultlineError::ProbeUnavailable { .. } => {
                ExError::new(ExErrorKind::ProbeUnavailable)
                    .with_op("probe")
                    .with_message(message)
            }

            FaultlineError::Io { op, .. } => ExError::new(ExErrorKind::Io)
                .with_op(op)
                .with_message(message),

            FaultlineError::Serialization { .. } => {
                ExError::new(ExErrorKind::Serialization).with_message(message)
            }
        }
    }
}

impl From<serde_json::Error> for FaultlineError {
    fn from(err: serde_json::Error) -> Self {
        FaultlineError::Serialization {
            message: err.to_string(),
        }
    }
}
