//! Non-fatal problems found while validating a config document

use faultline_core::errors::ExErrorKind;
use thiserror::Error;

/// A dropped entry; the rest of the document still loads
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadWarning {
    /// A value had the wrong shape and was skipped
    #[error("Invalid configuration for '{function}': {reason}. Skipping.")]
    InvalidEntry { function: String, reason: String },

    /// An exception name could not be resolved to an exception type
    #[error("Could not load or validate exception '{name}' for '{function}': {reason}. Skipping.")]
    RuleResolution {
        function: String,
        name: String,
        reason: String,
    },

    /// A behavior or one of its actions was malformed
    #[error("Invalid behavior '{behavior}' for '{function}': {reason}. Skipping.")]
    BehaviorValidation {
        function: String,
        behavior: String,
        reason: String,
    },
}

impl LoadWarning {
    /// Owning function key (or `debug_mode` for the reserved flag)
    pub fn function(&self) -> &str {
        match self {
            LoadWarning::InvalidEntry { function, .. }
            | LoadWarning::RuleResolution { function, .. }
            | LoadWarning::BehaviorValidation { function, .. } => function,
        }
    }

    pub fn kind(&self) -> ExErrorKind {
        match self {
            LoadWarning::InvalidEntry { .. } => ExErrorKind::InvalidInput,
            LoadWarning::RuleResolution { .. } => ExErrorKind::RuleResolution,
            LoadWarning::BehaviorValidation { .. } => ExErrorKind::BehaviorValidation,
        }
    }
}

/// Collects warnings, logging each as it is recorded
#[derive(Debug, Default)]
pub(crate) struct WarningLog {
    warnings: Vec<LoadWarning>,
}

impl WarningLog {
    pub(crate) fn push(&mut self, warning: LoadWarning) {
        tracing::warn!(
            function = warning.function(),
            err.code = warning.kind().code(),
            "{}",
            warning
        );
        self.warnings.push(warning);
    }

    pub(crate) fn invalid(&mut self, function: &str, reason: impl Into<String>) {
        self.push(LoadWarning::InvalidEntry {
            function: function.to_string(),
            reason: reason.into(),
        });
    }

    pub(crate) fn behavior(&mut self, function: &str, behavior: &str, reason: impl Into<String>) {
        self.push(LoadWarning::BehaviorValidation {
            function: function.to_string(),
            behavior: behavior.to_string(),
            reason: reason.into(),
        });
    }

    pub(crate) fn into_vec(self) -> Vec<LoadWarning> {
        self.warnings
    }
}
