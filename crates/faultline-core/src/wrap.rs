//! Wrapping callables so their failures are routed and handed back
//!
//! Two shapes are offered. At a single call site, [`guard`] or
//! [`RouteErr::route_err`] route an `Err` and return it unchanged. For a
//! whole collection of callables, [`WrapEngine::wrap_all`] replaces every
//! function and method body of a [`Module`] with a routed version.

use crate::context::CallSite;
use crate::exception::{BoxedException, Exception};
use crate::router::ExceptionRouter;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Borrow an error as a routable exception
pub trait AsException {
    fn as_exception(&self) -> &dyn Exception;
}

impl<E: Exception> AsException for E {
    fn as_exception(&self) -> &dyn Exception {
        self
    }
}

impl AsException for BoxedException {
    fn as_exception(&self) -> &dyn Exception {
        self.as_ref()
    }
}

/// Route the error of a `Result` without consuming it
pub trait RouteErr<T, E> {
    fn route_err(self, router: &ExceptionRouter, site: &CallSite) -> Result<T, E>;
}

impl<T, E: AsException> RouteErr<T, E> for Result<T, E> {
    fn route_err(self, router: &ExceptionRouter, site: &CallSite) -> Result<T, E> {
        if let Err(err) = &self {
            router.route(site, err.as_exception());
        }
        self
    }
}

/// Run `body`; on error, route it and return it unchanged
pub fn guard<T, E, F>(router: &ExceptionRouter, site: &CallSite, body: F) -> Result<T, E>
where
    F: FnOnce() -> Result<T, E>,
    E: AsException,
{
    body().route_err(router, site)
}

type Body<A, R> = Arc<dyn Fn(A) -> Result<R, BoxedException> + Send + Sync>;

/// A function or method body
pub struct Callable<A, R> {
    body: Body<A, R>,
    wrapped: bool,
}

impl<A, R> Callable<A, R> {
    pub fn new<F>(body: F) -> Self
    where
        F: Fn(A) -> Result<R, BoxedException> + Send + Sync + 'static,
    {
        Self {
            body: Arc::new(body),
            wrapped: false,
        }
    }

    /// # Errors
    ///
    /// Whatever the body returns.
    pub fn call(&self, args: A) -> Result<R, BoxedException> {
        (self.body)(args)
    }

    pub fn is_wrapped(&self) -> bool {
        self.wrapped
    }
}

impl<A, R> Clone for Callable<A, R> {
    fn clone(&self) -> Self {
        Self {
            body: Arc::clone(&self.body),
            wrapped: self.wrapped,
        }
    }
}

impl<A, R> fmt::Debug for Callable<A, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callable")
            .field("wrapped", &self.wrapped)
            .finish_non_exhaustive()
    }
}

/// How a method is bound to its class
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodKind {
    Instance,
    Static,
    Class,
}

#[derive(Debug, Clone)]
pub enum ClassMember<A, R> {
    Method {
        kind: MethodKind,
        body: Callable<A, R>,
    },
    Attribute(Value),
}

/// Named group of methods and attributes
#[derive(Debug, Clone)]
pub struct Class<A, R> {
    name: String,
    members: Vec<(String, ClassMember<A, R>)>,
}

impl<A, R> Class<A, R> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            members: Vec::new(),
        }
    }

    pub fn with_method<F>(mut self, name: impl Into<String>, kind: MethodKind, body: F) -> Self
    where
        F: Fn(A) -> Result<R, BoxedException> + Send + Sync + 'static,
    {
        self.members.push((
            name.into(),
            ClassMember::Method {
                kind,
                body: Callable::new(body),
            },
        ));
        self
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.members
            .push((name.into(), ClassMember::Attribute(value.into())));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn method(&self, name: &str) -> Option<(MethodKind, &Callable<A, R>)> {
        self.members.iter().find_map(|(n, m)| match m {
            ClassMember::Method { kind, body } if n == name => Some((*kind, body)),
            _ => None,
        })
    }

    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.members.iter().find_map(|(n, m)| match m {
            ClassMember::Attribute(value) if n == name => Some(value),
            _ => None,
        })
    }

    /// # Errors
    ///
    /// The method's error, or `None` when no such method exists.
    pub fn call(&self, name: &str, args: A) -> Option<Result<R, BoxedException>> {
        self.method(name).map(|(_, body)| body.call(args))
    }
}

#[derive(Debug, Clone)]
pub enum Member<A, R> {
    Function(Callable<A, R>),
    Class(Class<A, R>),
    Value(Value),
}

/// Ordered, named collection of functions, classes and plain values
#[derive(Debug, Clone)]
pub struct Module<A, R> {
    name: String,
    members: Vec<(String, Member<A, R>)>,
}

impl<A, R> Module<A, R> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            members: Vec::new(),
        }
    }

    pub fn with_function<F>(mut self, name: impl Into<String>, body: F) -> Self
    where
        F: Fn(A) -> Result<R, BoxedException> + Send + Sync + 'static,
    {
        self.members
            .push((name.into(), Member::Function(Callable::new(body))));
        self
    }

    pub fn with_class(mut self, class: Class<A, R>) -> Self {
        self.members
            .push((class.name.clone(), Member::Class(class)));
        self
    }

    pub fn with_value(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.members.push((name.into(), Member::Value(value.into())));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn get(&self, name: &str) -> Option<&Member<A, R>> {
        self.members
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, m)| m)
    }

    pub fn function(&self, name: &str) -> Option<&Callable<A, R>> {
        match self.get(name) {
            Some(Member::Function(callable)) => Some(callable),
            _ => None,
        }
    }

    pub fn class(&self, name: &str) -> Option<&Class<A, R>> {
        match self.get(name) {
            Some(Member::Class(class)) => Some(class),
            _ => None,
        }
    }

    /// # Errors
    ///
    /// The function's error, or `None` when no such function exists.
    pub fn call(&self, name: &str, args: A) -> Option<Result<R, BoxedException>> {
        self.function(name).map(|f| f.call(args))
    }
}

/// What one `wrap_all` pass did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WrapReport {
    pub wrapped: Vec<String>,
    pub skipped: Vec<String>,
}

/// Replaces callables with routed versions
#[derive(Debug, Clone)]
pub struct WrapEngine {
    router: Arc<ExceptionRouter>,
}

impl WrapEngine {
    pub fn new(router: Arc<ExceptionRouter>) -> Self {
        Self { router }
    }

    /// Wrap every function and method of `module` in place.
    ///
    /// Rule lookup uses the simple member name, so same-named methods of
    /// different classes share a rule. Method kinds are preserved. Members
    /// already wrapped are left alone.
    pub fn wrap_all<A, R>(&self, module: &mut Module<A, R>) -> WrapReport
    where
        A: 'static,
        R: 'static,
    {
        let debug = self.router.settings().debug;
        let mut report = WrapReport::default();

        for (name, member) in &mut module.members {
            match member {
                Member::Function(callable) => {
                    if self.wrap_in_place(name, callable, &mut report) && debug {
                        tracing::debug!(
                            module = %module.name,
                            member = %name,
                            "wrapped function"
                        );
                    }
                }
                Member::Class(class) => {
                    for (method_name, class_member) in &mut class.members {
                        match class_member {
                            ClassMember::Method { kind, body } => {
                                if self.wrap_in_place(method_name, body, &mut report) && debug {
                                    tracing::debug!(
                                        class = %class.name,
                                        member = %method_name,
                                        kind = ?kind,
                                        "wrapped method"
                                    );
                                }
                            }
                            ClassMember::Attribute(_) => {
                                if debug {
                                    tracing::debug!(
                                        class = %class.name,
                                        member = %method_name,
                                        "skipping non-callable class member"
                                    );
                                }
                                report.skipped.push(format!("{}.{}", class.name, method_name));
                            }
                        }
                    }
                }
                Member::Value(_) => {
                    if debug {
                        tracing::debug!(
                            module = %module.name,
                            member = %name,
                            "skipping non-callable member"
                        );
                    }
                    report.skipped.push(name.clone());
                }
            }
        }

        report
    }

    /// Routed version of a single callable
    pub fn wrap<A, R>(&self, name: &str, callable: &Callable<A, R>) -> Callable<A, R>
    where
        A: 'static,
        R: 'static,
    {
        if callable.wrapped {
            return callable.clone();
        }

        let inner = Arc::clone(&callable.body);
        let router = Arc::clone(&self.router);
        let name = name.to_string();
        Callable {
            body: Arc::new(move |args| {
                inner(args).map_err(|err| {
                    router.route_named(&name, err.as_ref());
                    err
                })
            }),
            wrapped: true,
        }
    }

    /// Returns whether `callable` was replaced
    fn wrap_in_place<A, R>(
        &self,
        name: &str,
        callable: &mut Callable<A, R>,
        report: &mut WrapReport,
    ) -> bool
    where
        A: 'static,
        R: 'static,
    {
        if callable.wrapped {
            return false;
        }
        *callable = self.wrap(name, callable);
        report.wrapped.push(name.to_string());
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exception::{Fault, TYPE_ERROR};
    use crate::settings::Settings;
    use crate::sink::MemorySink;

    fn router(memory: &MemorySink) -> Arc<ExceptionRouter> {
        Arc::new(
            ExceptionRouter::builder(Settings::default())
                .sink(Arc::new(memory.clone()))
                .build(),
        )
    }

    #[test]
    fn test_route_err_passes_ok_through() {
        let memory = MemorySink::new("mem");
        let router = router(&memory);
        let site = CallSite::new("parse");

        let ok: Result<u8, Fault> = Ok(3);
        assert_eq!(ok.route_err(&router, &site).ok(), Some(3));
        assert!(memory.is_empty());
    }

    #[test]
    fn test_guard_routes_boxed_errors() {
        let memory = MemorySink::new("mem");
        let router = router(&memory);
        let site = CallSite::new("load");

        let result: Result<(), BoxedException> =
            guard(&router, &site, || Err(Fault::new(&TYPE_ERROR, "nope").into()));
        assert!(result.is_err());
        assert_eq!(memory.len(), 1);
        assert_eq!(
            memory.records()[0].function.as_deref(),
            Some("load")
        );
    }

    #[test]
    fn test_wrap_is_idempotent() {
        let memory = MemorySink::new("mem");
        let engine = WrapEngine::new(router(&memory));
        let callable: Callable<(), ()> =
            Callable::new(|()| Err(Fault::new(&TYPE_ERROR, "x").into()));

        let once = engine.wrap("f", &callable);
        let twice = engine.wrap("f", &once);
        assert!(twice.is_wrapped());

        assert!(twice.call(()).is_err());
        assert_eq!(memory.len(), 1);
    }
}
