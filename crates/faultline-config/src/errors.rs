//! Error handling for faultline-config
//!
//! Wraps faultline-core ExError with config-specific helpers

use faultline_core::errors::{ExError, FaultlineError};
use std::path::Path;

/// Result type alias using ExError
pub type Result<T> = std::result::Result<T, ExError>;

/// No `<prefix>.<ext>` file exists for any extension
pub fn config_not_found(prefix: &str, extensions: &[String]) -> ExError {
    FaultlineError::ConfigNotFound {
        prefix: prefix.to_string(),
        extensions: extensions.to_vec(),
    }
    .into()
}

/// The file exists but could not be read, decoded or validated
pub fn config_parse(path: &Path, reason: impl Into<String>) -> ExError {
    FaultlineError::ConfigParse {
        path: path.display().to_string(),
        reason: reason.into(),
    }
    .into()
}

/// Unsupported extension
pub fn unsupported_format(path: &Path, extension: &str) -> ExError {
    config_parse(
        path,
        format!("Unsupported configuration file format: {}", extension),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use faultline_core::errors::ExErrorKind;

    #[test]
    fn test_not_found_carries_prefix() {
        let err = config_not_found("app", &["json".to_string()]);
        assert_eq!(err.kind(), ExErrorKind::ConfigNotFound);
        assert_eq!(err.path(), Some("app"));
        assert!(err.message().contains("[\"json\"]"));
    }

    #[test]
    fn test_parse_error_is_fatal() {
        let err = config_parse(Path::new("app.yaml"), "bad indent");
        assert_eq!(err.code(), "ERR_CONFIG_PARSE");
        assert!(err.kind().is_fatal());
        assert_eq!(err.path(), Some("app.yaml"));
    }
}
