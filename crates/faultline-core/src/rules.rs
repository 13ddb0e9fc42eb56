//! Static rule table: which exceptions each monitored function intercepts
//! and how their records are enriched
//!
//! Entries are immutable once built. A reload builds a fresh [`RuleStore`]
//! and swaps it in whole (see `ExceptionRouter::replace_rules`).

use crate::exception::{Exception, ExceptionType};
use faultline_core_types::schema::BEHAVIOR_DEFAULT;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};

/// Enrichment actions attached to a behavior key
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BehaviorAction {
    /// Merged flat into the record context
    #[serde(skip_serializing_if = "Option::is_none")]
    pub add_metadata: Option<Map<String, Value>>,
    /// Destination that receives a mirrored copy of the record
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_to_specific_file: Option<String>,
}

impl BehaviorAction {
    pub fn with_metadata(mut self, metadata: Map<String, Value>) -> Self {
        self.add_metadata = Some(metadata);
        self
    }

    pub fn with_specific_file(mut self, path: impl Into<String>) -> Self {
        self.log_to_specific_file = Some(path.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.add_metadata.is_none() && self.log_to_specific_file.is_none()
    }

    /// Shallow merge at action granularity: each action `specific` defines
    /// replaces the one in `self` as a whole.
    pub fn overlay(&self, specific: &BehaviorAction) -> BehaviorAction {
        BehaviorAction {
            add_metadata: specific
                .add_metadata
                .clone()
                .or_else(|| self.add_metadata.clone()),
            log_to_specific_file: specific
                .log_to_specific_file
                .clone()
                .or_else(|| self.log_to_specific_file.clone()),
        }
    }
}

/// Per-function rule
#[derive(Debug, Clone, Default)]
pub struct RuleEntry {
    exception_types: Vec<&'static ExceptionType>,
    /// Names as declared, parallel to `exception_types`
    exception_names: Vec<String>,
    custom_message: String,
    tags: Vec<String>,
    behaviors: HashMap<String, BehaviorAction>,
}

impl RuleEntry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a watched type; duplicates are ignored, declaration order is kept
    pub fn with_exception(mut self, ty: &'static ExceptionType) -> Self {
        self.push_exception(ty);
        self
    }

    pub fn with_custom_message(mut self, message: impl Into<String>) -> Self {
        self.custom_message = message.into();
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_behavior(mut self, key: impl Into<String>, action: BehaviorAction) -> Self {
        self.behaviors.insert(key.into(), action);
        self
    }

    pub fn push_exception(&mut self, ty: &'static ExceptionType) {
        self.push_named_exception(ty.qualified_name(), ty);
    }

    /// Add a watched type under the name it was declared with
    pub fn push_named_exception(&mut self, name: impl Into<String>, ty: &'static ExceptionType) {
        if !self.exception_types.contains(&ty) {
            self.exception_types.push(ty);
            self.exception_names.push(name.into());
        }
    }

    pub fn exception_types(&self) -> &[&'static ExceptionType] {
        &self.exception_types
    }

    /// Watched type names as declared, in declaration order
    pub fn exception_names(&self) -> &[String] {
        &self.exception_names
    }

    pub fn custom_message(&self) -> &str {
        &self.custom_message
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn behaviors(&self) -> &HashMap<String, BehaviorAction> {
        &self.behaviors
    }

    pub fn behavior(&self, key: &str) -> Option<&BehaviorAction> {
        self.behaviors.get(key)
    }

    pub fn default_behavior(&self) -> Option<&BehaviorAction> {
        self.behavior(BEHAVIOR_DEFAULT)
    }

    /// First watched type, in declaration order, the exception is an instance of
    pub fn first_match(&self, exc: &dyn Exception) -> Option<&'static ExceptionType> {
        self.exception_types
            .iter()
            .copied()
            .find(|ty| exc.is_instance_of(ty))
    }
}

/// Function name -> rule entry
#[derive(Debug, Clone, Default)]
pub struct RuleStore {
    entries: BTreeMap<String, RuleEntry>,
}

impl RuleStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, function: impl Into<String>, entry: RuleEntry) {
        self.entries.insert(function.into(), entry);
    }

    pub fn with_rule(mut self, function: impl Into<String>, entry: RuleEntry) -> Self {
        self.insert(function, entry);
        self
    }

    pub fn get(&self, function: &str) -> Option<&RuleEntry> {
        self.entries.get(function)
    }

    pub fn contains(&self, function: &str) -> bool {
        self.entries.contains_key(function)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Monitored function names, sorted
    pub fn function_names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RuleEntry)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl FromIterator<(String, RuleEntry)> for RuleStore {
    fn from_iter<T: IntoIterator<Item = (String, RuleEntry)>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exception::{Fault, KEY_ERROR, LOOKUP_ERROR, TYPE_ERROR, VALUE_ERROR};
    use serde_json::json;

    fn metadata(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_duplicate_exception_types_ignored() {
        let entry = RuleEntry::new()
            .with_exception(&VALUE_ERROR)
            .with_exception(&TYPE_ERROR)
            .with_exception(&VALUE_ERROR);
        assert_eq!(entry.exception_names(), vec!["ValueError", "TypeError"]);
    }

    #[test]
    fn test_declared_names_kept_as_written() {
        let mut entry = RuleEntry::new().with_exception(&VALUE_ERROR);
        entry.push_named_exception("builtins.LookupError", &LOOKUP_ERROR);
        entry.push_named_exception("LookupError", &LOOKUP_ERROR);
        assert_eq!(
            entry.exception_names(),
            vec!["ValueError", "builtins.LookupError"]
        );
        assert_eq!(entry.exception_types().len(), 2);
    }

    #[test]
    fn test_first_match_uses_declaration_order() {
        let entry = RuleEntry::new()
            .with_exception(&LOOKUP_ERROR)
            .with_exception(&KEY_ERROR);
        let fault = Fault::new(&KEY_ERROR, "missing");
        assert_eq!(entry.first_match(&fault), Some(&LOOKUP_ERROR));
    }

    #[test]
    fn test_first_match_none_when_unrelated() {
        let entry = RuleEntry::new().with_exception(&TYPE_ERROR);
        let fault = Fault::new(&VALUE_ERROR, "bad");
        assert!(entry.first_match(&fault).is_none());
    }

    #[test]
    fn test_overlay_specific_wins_per_action() {
        let default = BehaviorAction::default()
            .with_metadata(metadata(json!({"a": 1, "b": 2})))
            .with_specific_file("default.log");
        let specific = BehaviorAction::default().with_metadata(metadata(json!({"b": 3})));

        let merged = default.overlay(&specific);
        assert_eq!(merged.add_metadata, Some(metadata(json!({"b": 3}))));
        assert_eq!(merged.log_to_specific_file.as_deref(), Some("default.log"));
    }

    #[test]
    fn test_store_function_names_sorted() {
        let store = RuleStore::new()
            .with_rule("zeta", RuleEntry::new())
            .with_rule("alpha", RuleEntry::new());
        let names: Vec<_> = store.function_names().collect();
        assert_eq!(names, vec!["alpha", "zeta"]);
    }
}
