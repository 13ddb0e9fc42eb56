//! Registry mapping config strings to exception type descriptors
//!
//! Lookup order mirrors how a config author thinks about names: a bare name
//! is a built-in, anything else must be qualified as `module.Name` or
//! `module::Name` and registered by the embedding application.

use crate::errors::{FaultlineError, Result};
use crate::exception::{ExceptionType, BUILTINS};
use std::collections::HashMap;

/// String-keyed registry of statically declared exception types
#[derive(Debug, Clone)]
pub struct ExceptionRegistry {
    builtins: HashMap<&'static str, &'static ExceptionType>,
    application: HashMap<String, &'static ExceptionType>,
}

impl ExceptionRegistry {
    /// Create a registry pre-populated with the built-in descriptors
    pub fn new() -> Self {
        let builtins = BUILTINS.iter().map(|ty| (ty.name, *ty)).collect();
        Self {
            builtins,
            application: HashMap::new(),
        }
    }

    /// Register an application descriptor under its qualified name
    ///
    /// Registering a descriptor that does not derive from the root type is
    /// allowed; resolving it later reports `NotAnException`.
    pub fn register(&mut self, ty: &'static ExceptionType) -> &mut Self {
        if ty.is_builtin() {
            self.builtins.insert(ty.name, ty);
        } else {
            self.application
                .insert(qualified_key(ty.module, ty.name), ty);
        }
        self
    }

    /// Resolve a config string to a descriptor
    ///
    /// # Errors
    ///
    /// - `MalformedExceptionName` for a bare name that is not a built-in
    /// - `UnknownExceptionType` when the qualified name is not registered
    /// - `NotAnException` when the descriptor does not reach the root type
    pub fn resolve(&self, name: &str) -> Result<&'static ExceptionType> {
        let name = name.trim();
        if let Some(ty) = self.builtins.get(name) {
            return Ok(*ty);
        }

        let (module, class) =
            split_qualified(name).ok_or_else(|| FaultlineError::MalformedExceptionName {
                name: name.to_string(),
            })?;

        let ty = self
            .application
            .get(&qualified_key(module, class))
            .copied()
            .ok_or_else(|| FaultlineError::UnknownExceptionType {
                name: name.to_string(),
            })?;

        if !ty.is_exception() {
            return Err(FaultlineError::NotAnException {
                name: name.to_string(),
            });
        }
        Ok(ty)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.resolve(name).is_ok()
    }

    /// Number of registered descriptors, built-ins included
    pub fn len(&self) -> usize {
        self.builtins.len() + self.application.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for ExceptionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn qualified_key(module: &str, name: &str) -> String {
    format!("{}::{}", module.replace('.', "::"), name)
}

fn split_qualified(name: &str) -> Option<(&str, &str)> {
    let (module, class) = match name.rfind("::") {
        Some(idx) => (&name[..idx], &name[idx + 2..]),
        None => name.rsplit_once('.')?,
    };
    if module.is_empty() || class.is_empty() {
        return None;
    }
    Some((module, class))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exception::{VALUE_ERROR, ZERO_DIVISION_ERROR};
    use crate::exception_type;

    exception_type!(static QUOTA_ERROR = "QuotaError" in "billing.limits", extends [VALUE_ERROR]);

    static NOT_AN_ERROR: ExceptionType = ExceptionType {
        name: "Widget",
        module: "billing",
        parents: &[],
    };

    fn registry() -> ExceptionRegistry {
        let mut registry = ExceptionRegistry::new();
        registry.register(&QUOTA_ERROR).register(&NOT_AN_ERROR);
        registry
    }

    #[test]
    fn test_builtin_lookup_by_simple_name() {
        let registry = ExceptionRegistry::new();
        assert_eq!(registry.resolve("ValueError").unwrap(), &VALUE_ERROR);
        assert_eq!(
            registry.resolve("ZeroDivisionError").unwrap(),
            &ZERO_DIVISION_ERROR
        );
    }

    #[test]
    fn test_qualified_lookup_accepts_both_separators() {
        let registry = registry();
        assert_eq!(
            registry.resolve("billing.limits.QuotaError").unwrap(),
            &QUOTA_ERROR
        );
        assert_eq!(
            registry.resolve("billing::limits::QuotaError").unwrap(),
            &QUOTA_ERROR
        );
    }

    #[test]
    fn test_bare_unknown_name_is_malformed() {
        let err = registry().resolve("NoSuchError").unwrap_err();
        assert!(matches!(err, FaultlineError::MalformedExceptionName { .. }));
    }

    #[test]
    fn test_unregistered_qualified_name_is_unknown() {
        let err = registry().resolve("billing.NoSuchError").unwrap_err();
        assert!(matches!(err, FaultlineError::UnknownExceptionType { .. }));
    }

    #[test]
    fn test_non_exception_descriptor_rejected() {
        let err = registry().resolve("billing.Widget").unwrap_err();
        assert_eq!(
            err,
            FaultlineError::NotAnException {
                name: "billing.Widget".to_string()
            }
        );
    }

    #[test]
    fn test_empty_segments_rejected() {
        let registry = registry();
        assert!(registry.resolve(".QuotaError").is_err());
        assert!(registry.resolve("billing.").is_err());
    }
}
