//! Loading rule tables from config files

use crate::errors::{config_parse, Result};
use crate::parser::{decode, parse_document};
use crate::source::{ConfigFormat, ConfigSource};
use crate::warnings::LoadWarning;
use faultline_core::{ExceptionRegistry, ExceptionRouter, RuleStore};
use std::fs;
use std::path::{Path, PathBuf};

/// A validated config file
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    /// File the rules came from; `None` for in-memory documents
    pub source: Option<PathBuf>,
    pub format: ConfigFormat,
    /// Reserved `debug_mode` flag; merged into settings separately
    pub debug_mode: Option<bool>,
    pub rules: RuleStore,
    pub warnings: Vec<LoadWarning>,
}

/// Load from the default source (`faultline_config.<ext>` in the working directory)
///
/// # Errors
///
/// `ConfigNotFound` or `ConfigParse`; see [`load_from`].
pub fn load(registry: &ExceptionRegistry) -> Result<LoadedConfig> {
    load_from(&ConfigSource::default(), registry)
}

/// Discover the first matching file of `source` and load it
///
/// # Errors
///
/// `ConfigNotFound` when no candidate exists, `ConfigParse` when the file
/// cannot be read or decoded, or its root is not a mapping.
pub fn load_from(source: &ConfigSource, registry: &ExceptionRegistry) -> Result<LoadedConfig> {
    let path = source.discover()?;
    load_path(&path, registry)
}

/// Load a specific file, its format chosen from the extension
///
/// # Errors
///
/// `ConfigParse` for an unsupported extension, a read failure, a decode
/// failure or a non-mapping root.
pub fn load_path(path: &Path, registry: &ExceptionRegistry) -> Result<LoadedConfig> {
    let format = ConfigFormat::from_path(path)?;
    let content = fs::read_to_string(path)
        .map_err(|e| config_parse(path, format!("Failed to read file: {}", e)))?;

    let mut loaded = parse_labeled(&content, format, path, registry)?;
    loaded.source = Some(path.to_path_buf());
    tracing::info!(
        path = %path.display(),
        format = format.as_str(),
        functions = loaded.rules.len(),
        warnings = loaded.warnings.len(),
        "configuration loaded"
    );
    Ok(loaded)
}

/// Load an in-memory document
///
/// # Errors
///
/// `ConfigParse` when the content does not decode or its root is not a mapping.
pub fn parse_str(
    content: &str,
    format: ConfigFormat,
    registry: &ExceptionRegistry,
) -> Result<LoadedConfig> {
    parse_labeled(content, format, Path::new("<inline>"), registry)
}

/// Load `source` and swap its rules into `router`
///
/// The router keeps its current rules when loading fails. On success the
/// document's `debug_mode`, if any, is applied to the router settings.
///
/// # Errors
///
/// Same as [`load_from`].
pub fn reload_into(router: &ExceptionRouter, source: &ConfigSource) -> Result<Vec<LoadWarning>> {
    let loaded = load_from(source, &router.registry())?;
    router.merge_debug_mode(loaded.debug_mode);
    router.replace_rules(loaded.rules);
    Ok(loaded.warnings)
}

fn parse_labeled(
    content: &str,
    format: ConfigFormat,
    origin: &Path,
    registry: &ExceptionRegistry,
) -> Result<LoadedConfig> {
    let document = decode(content, format, origin)?;
    let parsed = parse_document(&document, registry);
    Ok(LoadedConfig {
        source: None,
        format,
        debug_mode: parsed.debug_mode,
        rules: parsed.rules,
        warnings: parsed.warnings,
    })
}
