//! Behavior resolution: which message, tags and actions apply to one
//! exception raised in one function

use crate::exception::{Exception, ExceptionType};
use crate::rules::{BehaviorAction, RuleEntry};
use faultline_core_types::schema::BEHAVIOR_DEFAULT;

/// Outcome of resolving a rule entry against a concrete exception
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedAction {
    /// Watched type that matched, first in declaration order
    pub matched_type: Option<&'static ExceptionType>,
    pub custom_message: Option<String>,
    pub tags: Option<Vec<String>>,
    /// `default` behavior overlaid with the exception-specific behavior
    pub behavior: BehaviorAction,
}

impl ResolvedAction {
    pub fn is_match(&self) -> bool {
        self.matched_type.is_some()
    }
}

/// Stateless resolver
#[derive(Debug, Clone, Copy, Default)]
pub struct BehaviorResolver;

impl BehaviorResolver {
    /// Resolve enrichment for `exc`.
    ///
    /// Behaviors, tags and the custom message apply only when one of the
    /// entry's watched types matched. Empty messages and empty tag lists
    /// resolve to `None`.
    pub fn resolve(&self, entry: Option<&RuleEntry>, exc: &dyn Exception) -> ResolvedAction {
        let Some(entry) = entry else {
            return ResolvedAction::default();
        };
        let Some(matched) = entry.first_match(exc) else {
            return ResolvedAction::default();
        };

        let custom_message =
            Some(entry.custom_message().to_string()).filter(|m| !m.is_empty());
        let tags = Some(entry.tags().to_vec()).filter(|t| !t.is_empty());

        let empty = BehaviorAction::default();
        let default_behavior = entry.behavior(BEHAVIOR_DEFAULT).unwrap_or(&empty);
        // Specific behaviors are keyed by the raised type's simple name,
        // not the matched (possibly ancestor) type.
        let specific_behavior = entry
            .behavior(exc.exception_type().name())
            .unwrap_or(&empty);

        ResolvedAction {
            matched_type: Some(matched),
            custom_message,
            tags,
            behavior: default_behavior.overlay(specific_behavior),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exception::{Fault, KEY_ERROR, LOOKUP_ERROR, TYPE_ERROR, VALUE_ERROR};
    use crate::exception_type;
    use serde_json::{json, Map, Value};

    exception_type!(static DUAL_ERROR = "DualError" in "tests", extends [VALUE_ERROR, TYPE_ERROR]);

    fn metadata(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    fn entry() -> RuleEntry {
        RuleEntry::new()
            .with_exception(&VALUE_ERROR)
            .with_exception(&TYPE_ERROR)
            .with_custom_message("bad input")
            .with_tags(["x", "y"])
            .with_behavior(
                "default",
                BehaviorAction::default()
                    .with_metadata(metadata(json!({"team": "core", "tier": 1})))
                    .with_specific_file("errors.log"),
            )
            .with_behavior(
                "TypeError",
                BehaviorAction::default().with_specific_file("type_errors.log"),
            )
    }

    #[test]
    fn test_no_entry_resolves_empty() {
        let resolved = BehaviorResolver.resolve(None, &Fault::new(&VALUE_ERROR, "boom"));
        assert_eq!(resolved, ResolvedAction::default());
    }

    #[test]
    fn test_unmatched_type_ignores_default_behavior() {
        let resolved = BehaviorResolver.resolve(Some(&entry()), &Fault::new(&KEY_ERROR, "k"));
        assert!(!resolved.is_match());
        assert!(resolved.custom_message.is_none());
        assert!(resolved.tags.is_none());
        assert!(resolved.behavior.is_empty());
    }

    #[test]
    fn test_match_applies_default_behavior() {
        let resolved =
            BehaviorResolver.resolve(Some(&entry()), &Fault::new(&VALUE_ERROR, "boom"));
        assert_eq!(resolved.matched_type, Some(&VALUE_ERROR));
        assert_eq!(resolved.custom_message.as_deref(), Some("bad input"));
        assert_eq!(resolved.tags, Some(vec!["x".to_string(), "y".to_string()]));
        assert_eq!(
            resolved.behavior.log_to_specific_file.as_deref(),
            Some("errors.log")
        );
    }

    #[test]
    fn test_specific_behavior_overrides_default() {
        let resolved = BehaviorResolver.resolve(Some(&entry()), &Fault::new(&TYPE_ERROR, "t"));
        assert_eq!(
            resolved.behavior.log_to_specific_file.as_deref(),
            Some("type_errors.log")
        );
        // add_metadata not overridden, default kept
        assert_eq!(
            resolved.behavior.add_metadata,
            Some(metadata(json!({"team": "core", "tier": 1})))
        );
    }

    #[test]
    fn test_declaration_order_tie_break() {
        let fault = Fault::new(&DUAL_ERROR, "both");
        for _ in 0..10 {
            let resolved = BehaviorResolver.resolve(Some(&entry()), &fault);
            assert_eq!(resolved.matched_type, Some(&VALUE_ERROR));
        }
    }

    #[test]
    fn test_ancestor_match_uses_raised_type_for_specific_behavior() {
        let entry = RuleEntry::new().with_exception(&LOOKUP_ERROR).with_behavior(
            "KeyError",
            BehaviorAction::default().with_specific_file("keys.log"),
        );
        let resolved = BehaviorResolver.resolve(Some(&entry), &Fault::new(&KEY_ERROR, "k"));
        assert_eq!(resolved.matched_type, Some(&LOOKUP_ERROR));
        assert_eq!(
            resolved.behavior.log_to_specific_file.as_deref(),
            Some("keys.log")
        );
    }

    #[test]
    fn test_empty_message_and_tags_resolve_to_none() {
        let entry = RuleEntry::new().with_exception(&VALUE_ERROR);
        let resolved = BehaviorResolver.resolve(Some(&entry), &Fault::new(&VALUE_ERROR, "v"));
        assert!(resolved.is_match());
        assert!(resolved.custom_message.is_none());
        assert!(resolved.tags.is_none());
    }
}
