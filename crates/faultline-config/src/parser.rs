//! Document decoding and validation into a rule table
//!
//! Validation never fails as a whole: a malformed entry is dropped with a
//! [`LoadWarning`] and the rest of the document still loads.

use crate::errors::{config_parse, Result};
use crate::source::ConfigFormat;
use crate::warnings::{LoadWarning, WarningLog};
use faultline_core::{BehaviorAction, ExceptionRegistry, RuleEntry, RuleStore};
use faultline_core_types::schema::{
    ACTION_ADD_METADATA, ACTION_LOG_TO_SPECIFIC_FILE, CONFIG_DEBUG_MODE,
};
use serde_json::{Map, Value};
use std::path::Path;

const KEY_EXCEPTIONS: &str = "exceptions";
const KEY_CUSTOM_MESSAGE: &str = "custom_message";
const KEY_TAGS: &str = "tags";
const KEY_BEHAVIORS: &str = "behaviors";

/// Validated document
#[derive(Debug, Clone, Default)]
pub struct ParsedConfig {
    /// Reserved `debug_mode` flag, when present and boolean
    pub debug_mode: Option<bool>,
    pub rules: RuleStore,
    pub warnings: Vec<LoadWarning>,
}

/// Decode `content` into a mapping
///
/// `origin` only labels errors.
///
/// # Errors
///
/// `ConfigParse` when the content does not decode or its root is not a mapping.
pub fn decode(content: &str, format: ConfigFormat, origin: &Path) -> Result<Map<String, Value>> {
    let value: Value = match format {
        ConfigFormat::Json => serde_json::from_str(content).map_err(|e| e.to_string()),
        ConfigFormat::Yaml => serde_yaml::from_str(content).map_err(|e| e.to_string()),
        ConfigFormat::Toml => toml::from_str(content).map_err(|e| e.to_string()),
    }
    .map_err(|reason| config_parse(origin, reason))?;

    match value {
        Value::Object(map) => Ok(map),
        other => Err(config_parse(
            origin,
            format!(
                "Root of configuration must be a mapping, got {}",
                describe(&other)
            ),
        )),
    }
}

/// Validate a decoded document against `registry`
pub fn parse_document(document: &Map<String, Value>, registry: &ExceptionRegistry) -> ParsedConfig {
    let mut log = WarningLog::default();
    let mut rules = RuleStore::new();
    let mut debug_mode = None;

    for (key, value) in document {
        if key == CONFIG_DEBUG_MODE {
            match value {
                Value::Bool(flag) => debug_mode = Some(*flag),
                other => log.invalid(
                    key,
                    format!("'{}' must be a boolean, got {}", key, describe(other)),
                ),
            }
            continue;
        }

        let Value::Object(definition) = value else {
            log.invalid(
                key,
                format!("configuration is not a mapping, got {}", describe(value)),
            );
            continue;
        };

        rules.insert(key.clone(), parse_entry(key, definition, registry, &mut log));
    }

    ParsedConfig {
        debug_mode,
        rules,
        warnings: log.into_vec(),
    }
}

fn parse_entry(
    function: &str,
    definition: &Map<String, Value>,
    registry: &ExceptionRegistry,
    log: &mut WarningLog,
) -> RuleEntry {
    let mut entry = RuleEntry::new();

    for item in list_field(function, definition, KEY_EXCEPTIONS, log) {
        let Value::String(name) = item else {
            log.invalid(
                function,
                format!("exception name must be a string, got {}", describe(item)),
            );
            continue;
        };
        match registry.resolve(name) {
            Ok(ty) => entry.push_named_exception(name.as_str(), ty),
            Err(err) => log.push(LoadWarning::RuleResolution {
                function: function.to_string(),
                name: name.clone(),
                reason: err.to_string(),
            }),
        }
    }

    let custom_message = match definition.get(KEY_CUSTOM_MESSAGE) {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(message)) => message.clone(),
        Some(scalar @ (Value::Number(_) | Value::Bool(_))) => scalar.to_string(),
        Some(other) => {
            log.invalid(
                function,
                format!("'custom_message' must be a string, got {}", describe(other)),
            );
            String::new()
        }
    };

    let mut tags = Vec::new();
    for item in list_field(function, definition, KEY_TAGS, log) {
        match item {
            Value::String(tag) => tags.push(tag.clone()),
            Value::Number(_) | Value::Bool(_) => tags.push(item.to_string()),
            other => log.invalid(
                function,
                format!("tag must be a string or number, got {}", describe(other)),
            ),
        }
    }

    entry = entry.with_custom_message(custom_message).with_tags(tags);

    match definition.get(KEY_BEHAVIORS) {
        None | Some(Value::Null) => {}
        Some(Value::Object(behaviors)) => {
            for (key, action) in behaviors {
                if let Some(action) = parse_behavior(function, key, action, log) {
                    entry = entry.with_behavior(key.clone(), action);
                }
            }
        }
        Some(other) => log.invalid(
            function,
            format!("'behaviors' must be a mapping, got {}", describe(other)),
        ),
    }

    entry
}

/// `None` when the whole definition is not a mapping
fn parse_behavior(
    function: &str,
    key: &str,
    definition: &Value,
    log: &mut WarningLog,
) -> Option<BehaviorAction> {
    let Value::Object(actions) = definition else {
        log.behavior(
            function,
            key,
            format!("definition must be a mapping, got {}", describe(definition)),
        );
        return None;
    };

    let mut action = BehaviorAction::default();
    for (name, value) in actions {
        match name.as_str() {
            ACTION_ADD_METADATA => match value {
                Value::Object(metadata) => action.add_metadata = Some(metadata.clone()),
                other => log.behavior(
                    function,
                    key,
                    format!("'add_metadata' must be a mapping, got {}", describe(other)),
                ),
            },
            ACTION_LOG_TO_SPECIFIC_FILE => match value {
                Value::String(path) if !path.trim().is_empty() => {
                    action.log_to_specific_file = Some(path.clone());
                }
                other => log.behavior(
                    function,
                    key,
                    format!(
                        "'log_to_specific_file' must be a non-empty string, got {}",
                        describe(other)
                    ),
                ),
            },
            unknown => log.behavior(function, key, format!("unknown action '{}'", unknown)),
        }
    }
    Some(action)
}

fn list_field<'a>(
    function: &str,
    definition: &'a Map<String, Value>,
    field: &str,
    log: &mut WarningLog,
) -> &'a [Value] {
    match definition.get(field) {
        None | Some(Value::Null) => &[],
        Some(Value::Array(items)) => items,
        Some(other) => {
            log.invalid(
                function,
                format!("'{}' must be a list, got {}", field, describe(other)),
            );
            &[]
        }
    }
}

fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "a mapping",
    }
}
