//! Config source discovery

use crate::errors::{config_not_found, unsupported_format, Result};
use std::fmt;
use std::path::{Path, PathBuf};

pub const DEFAULT_PREFIX: &str = "faultline_config";

/// Extensions tried, in order
pub const DEFAULT_EXTENSIONS: &[&str] = &["json", "yaml", "yml", "toml"];

/// Document format, chosen from the file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Json,
    Yaml,
    Toml,
}

impl ConfigFormat {
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_ascii_lowercase().as_str() {
            "json" => Some(ConfigFormat::Json),
            "yaml" | "yml" => Some(ConfigFormat::Yaml),
            "toml" => Some(ConfigFormat::Toml),
            _ => None,
        }
    }

    /// # Errors
    ///
    /// `ConfigParse` when the extension is missing or unsupported.
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();
        Self::from_extension(extension).ok_or_else(|| unsupported_format(path, extension))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigFormat::Json => "json",
            ConfigFormat::Yaml => "yaml",
            ConfigFormat::Toml => "toml",
        }
    }
}

impl fmt::Display for ConfigFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where to look for the config file: `<prefix>.<ext>` for each extension
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigSource {
    prefix: PathBuf,
    extensions: Vec<String>,
}

impl ConfigSource {
    pub fn new(prefix: impl Into<PathBuf>) -> Self {
        Self {
            prefix: prefix.into(),
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
        }
    }

    /// Replace the extension preference order
    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extensions = extensions.into_iter().map(Into::into).collect();
        self
    }

    pub fn prefix(&self) -> &Path {
        &self.prefix
    }

    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }

    /// Candidate paths in preference order
    pub fn candidates(&self) -> Vec<PathBuf> {
        self.extensions
            .iter()
            .map(|ext| {
                let mut name = self.prefix.clone().into_os_string();
                name.push(".");
                name.push(ext);
                PathBuf::from(name)
            })
            .collect()
    }

    /// First candidate that exists
    ///
    /// # Errors
    ///
    /// `ConfigNotFound` naming the prefix and extensions when none exists.
    pub fn discover(&self) -> Result<PathBuf> {
        self.candidates()
            .into_iter()
            .find(|path| path.is_file())
            .ok_or_else(|| config_not_found(&self.prefix.display().to_string(), &self.extensions))
    }
}

impl Default for ConfigSource {
    fn default() -> Self {
        Self::new(DEFAULT_PREFIX)
    }
}
