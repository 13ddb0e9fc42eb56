//! Router settings
//!
//! Selected once at configuration time. The config document only carries
//! `debug_mode`; everything else comes from code or the environment.

use crate::errors::{FaultlineError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const ENV_CONTEXT_LEVEL: &str = "FAULTLINE_CONTEXT_LEVEL";
pub const ENV_DEBUG: &str = "FAULTLINE_DEBUG";
pub const ENV_PANIC_MODE: &str = "FAULTLINE_PANIC_MODE";
pub const ENV_FORMATTING: &str = "FAULTLINE_FORMATTING";

/// How much context is gathered per exception, ordered by amount
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(try_from = "String", into = "String")]
pub enum ContextLevel {
    /// Timestamp only
    #[default]
    Minimal,
    /// Adds the caller's local variables
    Medium,
    /// Adds memory, CPU count and environment
    Detailed,
}

impl ContextLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContextLevel::Minimal => "minimal",
            ContextLevel::Medium => "medium",
            ContextLevel::Detailed => "detailed",
        }
    }

    /// Parse, falling back to `Minimal` with a warning on unknown input
    pub fn parse_lenient(value: &str) -> Self {
        value.parse::<ContextLevel>().unwrap_or_else(|err| {
            tracing::warn!(value, error = %err, "Unknown context level, using minimal");
            ContextLevel::Minimal
        })
    }

    pub fn includes_locals(&self) -> bool {
        *self >= ContextLevel::Medium
    }

    pub fn includes_system(&self) -> bool {
        *self >= ContextLevel::Detailed
    }
}

impl FromStr for ContextLevel {
    type Err = FaultlineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "min" | "minimal" => Ok(ContextLevel::Minimal),
            "med" | "medium" => Ok(ContextLevel::Medium),
            "det" | "detailed" => Ok(ContextLevel::Detailed),
            _ => Err(FaultlineError::InvalidContextLevel {
                value: s.to_string(),
            }),
        }
    }
}

impl TryFrom<String> for ContextLevel {
    type Error = FaultlineError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<ContextLevel> for String {
    fn from(level: ContextLevel) -> Self {
        level.as_str().to_string()
    }
}

impl fmt::Display for ContextLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Global router settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub context_level: ContextLevel,
    /// Debug verbosity; also enables wrap-engine debug notes
    pub debug: bool,
    /// ANSI colouring in text output
    pub formatting: bool,
    /// Terminate the process after every routed exception
    pub panic_mode: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            context_level: ContextLevel::Minimal,
            debug: false,
            formatting: true,
            panic_mode: false,
        }
    }
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_context_level(mut self, level: ContextLevel) -> Self {
        self.context_level = level;
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn with_formatting(mut self, formatting: bool) -> Self {
        self.formatting = formatting;
        self
    }

    pub fn with_panic_mode(mut self, panic_mode: bool) -> Self {
        self.panic_mode = panic_mode;
        self
    }

    /// Defaults overlaid with the `FAULTLINE_*` environment variables
    pub fn from_env() -> Self {
        Self::default().overlay_env(|key| std::env::var(key).ok())
    }

    /// Overlay values produced by `lookup`; unparsable values are ignored
    /// with a warning
    pub fn overlay_env<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(level) = lookup(ENV_CONTEXT_LEVEL) {
            self.context_level = ContextLevel::parse_lenient(&level);
        }
        if let Some(debug) = lookup(ENV_DEBUG).and_then(|v| parse_flag(ENV_DEBUG, &v)) {
            self.debug = debug;
        }
        if let Some(panic) = lookup(ENV_PANIC_MODE).and_then(|v| parse_flag(ENV_PANIC_MODE, &v)) {
            self.panic_mode = panic;
        }
        if let Some(fmt) = lookup(ENV_FORMATTING).and_then(|v| parse_flag(ENV_FORMATTING, &v)) {
            self.formatting = fmt;
        }
        self
    }

    /// Apply the config document's `debug_mode`, when it has one
    pub fn merge_debug_mode(&mut self, debug_mode: Option<bool>) {
        if let Some(debug) = debug_mode {
            self.debug = debug;
        }
    }
}

fn parse_flag(key: &str, value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => {
            tracing::warn!(key, value, "Ignoring unparsable boolean setting");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashMap;

    #[test]
    fn test_aliases() {
        assert_eq!("min".parse::<ContextLevel>().unwrap(), ContextLevel::Minimal);
        assert_eq!("MED".parse::<ContextLevel>().unwrap(), ContextLevel::Medium);
        assert_eq!(
            "detailed".parse::<ContextLevel>().unwrap(),
            ContextLevel::Detailed
        );
    }

    #[test]
    fn test_unknown_level_is_error_but_lenient_falls_back() {
        assert!("verbose".parse::<ContextLevel>().is_err());
        assert_eq!(ContextLevel::parse_lenient("verbose"), ContextLevel::Minimal);
    }

    #[test]
    fn test_levels_totally_ordered() {
        assert!(ContextLevel::Minimal < ContextLevel::Medium);
        assert!(ContextLevel::Medium < ContextLevel::Detailed);
        assert!(!ContextLevel::Minimal.includes_locals());
        assert!(ContextLevel::Medium.includes_locals());
        assert!(!ContextLevel::Medium.includes_system());
        assert!(ContextLevel::Detailed.includes_system());
    }

    #[test]
    fn test_overlay_env() {
        let vars: HashMap<&str, &str> = [
            (ENV_CONTEXT_LEVEL, "det"),
            (ENV_PANIC_MODE, "true"),
            (ENV_DEBUG, "maybe"),
        ]
        .into_iter()
        .collect();

        let settings =
            Settings::default().overlay_env(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(settings.context_level, ContextLevel::Detailed);
        assert!(settings.panic_mode);
        assert!(!settings.debug, "unparsable flag leaves the default");
        assert!(settings.formatting);
    }

    #[test]
    fn test_merge_debug_mode_only_when_present() {
        let mut settings = Settings::new().with_debug(true);
        settings.merge_debug_mode(None);
        assert!(settings.debug);
        settings.merge_debug_mode(Some(false));
        assert!(!settings.debug);
    }

    #[test]
    fn test_settings_deserialize_with_defaults() {
        let settings: Settings =
            serde_json::from_str(r#"{"context_level": "med", "panic_mode": true}"#).unwrap();
        assert_eq!(settings.context_level, ContextLevel::Medium);
        assert!(settings.panic_mode);
        assert!(settings.formatting);
    }

    proptest! {
        #[test]
        fn prop_canonical_names_round_trip(level in prop_oneof![
            Just(ContextLevel::Minimal),
            Just(ContextLevel::Medium),
            Just(ContextLevel::Detailed),
        ]) {
            let parsed: ContextLevel = level.as_str().parse().unwrap();
            prop_assert_eq!(parsed, level);
            let short: ContextLevel = level.as_str()[..3].parse().unwrap();
            prop_assert_eq!(short, level);
        }
    }
}
