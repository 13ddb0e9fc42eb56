//! Pluggable handlers run after a routed exception has been emitted

use crate::context::ExceptionContext;
use crate::exception::{Exception, ExceptionType};

/// Extra processing for routed exceptions (alerting, counters, cleanup)
///
/// Handlers run after the primary and auxiliary emissions and before a
/// panic-mode exit. They receive the enriched context.
pub trait ExceptionHandler: Send + Sync {
    fn name(&self) -> &str;

    fn can_handle(&self, exc: &dyn Exception) -> bool;

    fn handle(&self, function: &str, exc: &dyn Exception, context: &ExceptionContext);
}

/// Handler that accepts any exception of one type (or its subtypes) and
/// forwards it to a closure
pub struct TypeHandler<F> {
    name: String,
    watched: &'static ExceptionType,
    callback: F,
}

impl<F> TypeHandler<F>
where
    F: Fn(&str, &dyn Exception, &ExceptionContext) + Send + Sync,
{
    pub fn new(name: impl Into<String>, watched: &'static ExceptionType, callback: F) -> Self {
        Self {
            name: name.into(),
            watched,
            callback,
        }
    }
}

impl<F> ExceptionHandler for TypeHandler<F>
where
    F: Fn(&str, &dyn Exception, &ExceptionContext) + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn can_handle(&self, exc: &dyn Exception) -> bool {
        exc.is_instance_of(self.watched)
    }

    fn handle(&self, function: &str, exc: &dyn Exception, context: &ExceptionContext) {
        (self.callback)(function, exc, context);
    }
}
