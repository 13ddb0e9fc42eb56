//! Exception router: turns one caught exception into log records
//!
//! A single `route` call runs context gathering, rule resolution, message
//! composition, primary emission, the optional auxiliary mirror, registered
//! handlers and, in panic mode, termination. It never fails: sink and probe
//! faults are downgraded to warnings and placeholders so the caller can
//! always hand the original error back up the stack.

use crate::context::{CallSite, ContextBuilder, ExceptionContext, SystemProbe};
use crate::exception::Exception;
use crate::handler::ExceptionHandler;
use crate::registry::ExceptionRegistry;
use crate::resolver::{BehaviorResolver, ResolvedAction};
use crate::rules::RuleStore;
use crate::settings::Settings;
use crate::sink::{
    AuxiliarySinkFactory, FileSinkFactory, LogRecord, ScopedSink, Severity, Sink, SinkRegistry,
    TracingSink,
};
use crate::terminate::{ProcessTerminator, Terminator, PANIC_EXIT_CODE};
use faultline_core_types::schema::{CTX_TAGS, EVENT_PANIC};
use faultline_core_types::EventId;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

/// `Exception caught in {function}`, plus the custom message when one resolved
pub fn compose_message(function: &str, custom_message: Option<&str>) -> String {
    match custom_message {
        Some(custom) => format!("Exception caught in {} - Custom Message: {}", function, custom),
        None => format!("Exception caught in {}", function),
    }
}

pub fn panic_message(function: &str) -> String {
    format!(
        "PANIC MODE ENABLED: Exiting after handling exception in {}.",
        function
    )
}

/// Routes caught exceptions to the configured sinks
pub struct ExceptionRouter {
    settings: RwLock<Settings>,
    registry: Arc<ExceptionRegistry>,
    rules: RwLock<Arc<RuleStore>>,
    sinks: SinkRegistry,
    auxiliary: Arc<dyn AuxiliarySinkFactory>,
    terminator: Arc<dyn Terminator>,
    context: ContextBuilder,
    resolver: BehaviorResolver,
    handlers: Vec<Arc<dyn ExceptionHandler>>,
}

impl ExceptionRouter {
    pub fn builder(settings: Settings) -> ExceptionRouterBuilder {
        ExceptionRouterBuilder::new(settings)
    }

    /// Route `exc`, caught in the function identified by `site`.
    ///
    /// Returns the event id shared by every record produced for this call.
    /// In panic mode the configured terminator is invoked before returning.
    pub fn route(&self, site: &CallSite, exc: &dyn Exception) -> EventId {
        let settings = self.settings();
        let function = site.function();
        let event_id = EventId::new();

        let context = self.context.build(settings.context_level, Some(site));
        let rules = self.rules();
        let resolved = self.resolver.resolve(rules.get(function), exc);

        if settings.debug {
            tracing::debug!(
                function,
                event_id = %event_id,
                exc.type = %exc.exception_type(),
                matched = resolved.matched_type.map(|t| t.name()).unwrap_or(""),
                "routing exception"
            );
        }

        let message = compose_message(function, resolved.custom_message.as_deref());
        let context = enrich(context, &resolved);
        let record =
            LogRecord::exception(event_id, message, context, exc).with_function(function);

        if self.sinks.emit(&record) == 0 {
            tracing::warn!(function, event_id = %event_id, "no primary sink accepted the record");
        }

        if let Some(destination) = resolved.behavior.log_to_specific_file.as_deref() {
            self.mirror(&record, function, destination);
        }

        for handler in &self.handlers {
            if handler.can_handle(exc) {
                handler.handle(function, exc, &record.extra);
            }
        }

        if settings.panic_mode {
            self.panic_exit(&event_id, function);
        }

        event_id
    }

    /// Route with no captured locals
    pub fn route_named(&self, function: &str, exc: &dyn Exception) -> EventId {
        self.route(&CallSite::new(function), exc)
    }

    /// Swap in a freshly loaded rule table. Routing calls already in flight
    /// keep the table they started with.
    pub fn replace_rules(&self, rules: RuleStore) {
        *self.rules.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(rules);
    }

    pub fn rules(&self) -> Arc<RuleStore> {
        Arc::clone(&self.rules.read().unwrap_or_else(PoisonError::into_inner))
    }

    pub fn settings(&self) -> Settings {
        self.settings
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Apply a config document's `debug_mode`
    pub fn merge_debug_mode(&self, debug_mode: Option<bool>) {
        self.settings
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .merge_debug_mode(debug_mode);
    }

    pub fn registry(&self) -> Arc<ExceptionRegistry> {
        Arc::clone(&self.registry)
    }

    /// Primary sinks; callers may attach and detach at any time
    pub fn sinks(&self) -> &SinkRegistry {
        &self.sinks
    }

    /// Emit the critical exit record and request termination when panic mode is on
    pub(crate) fn apply_panic_mode(&self, event_id: &EventId, function: &str) {
        if self.settings().panic_mode {
            self.panic_exit(event_id, function);
        }
    }

    fn mirror(&self, record: &LogRecord, function: &str, destination: &str) {
        let mirrored = record.mirrored_to(destination);
        // The scoped sink is released when the closure returns, on success or failure.
        let result = ScopedSink::open(self.auxiliary.as_ref(), destination)
            .and_then(|sink| sink.emit(&mirrored));

        match result {
            Ok(()) => tracing::info!(
                function,
                destination,
                "Logged details for error in {} to {}",
                function,
                destination
            ),
            Err(err) => tracing::warn!(
                function,
                destination,
                error = %err,
                "Failed to log to specific file"
            ),
        }
    }

    fn panic_exit(&self, event_id: &EventId, function: &str) {
        let record = LogRecord::new(*event_id, Severity::Critical, panic_message(function))
            .with_event(EVENT_PANIC)
            .with_function(function);
        self.sinks.emit(&record);
        self.sinks.flush();
        self.terminator.terminate(PANIC_EXIT_CODE);
    }
}

/// Tags under `tags`, then metadata merged flat over everything else
fn enrich(mut context: ExceptionContext, resolved: &ResolvedAction) -> ExceptionContext {
    if let Some(tags) = &resolved.tags {
        context.insert(CTX_TAGS, tags.clone());
    }
    if let Some(metadata) = &resolved.behavior.add_metadata {
        context.merge(metadata);
    }
    context
}

impl fmt::Debug for ExceptionRouter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExceptionRouter")
            .field("settings", &self.settings())
            .field("rules", &self.rules().len())
            .field("sinks", &self.sinks)
            .field("handlers", &self.handlers.len())
            .finish()
    }
}

/// Builder for [`ExceptionRouter`]
///
/// Defaults: built-in exception registry, empty rules, a [`TracingSink`]
/// when no primary sink is added, [`FileSinkFactory`] for auxiliary files,
/// [`ProcessTerminator`] and the host system probe.
pub struct ExceptionRouterBuilder {
    settings: Settings,
    registry: Option<Arc<ExceptionRegistry>>,
    rules: RuleStore,
    sinks: Vec<Arc<dyn Sink>>,
    auxiliary: Option<Arc<dyn AuxiliarySinkFactory>>,
    terminator: Option<Arc<dyn Terminator>>,
    probe: Option<Arc<dyn SystemProbe>>,
    handlers: Vec<Arc<dyn ExceptionHandler>>,
}

impl ExceptionRouterBuilder {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            registry: None,
            rules: RuleStore::new(),
            sinks: Vec::new(),
            auxiliary: None,
            terminator: None,
            probe: None,
            handlers: Vec::new(),
        }
    }

    pub fn registry(mut self, registry: Arc<ExceptionRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn rules(mut self, rules: RuleStore) -> Self {
        self.rules = rules;
        self
    }

    pub fn sink(mut self, sink: Arc<dyn Sink>) -> Self {
        self.sinks.push(sink);
        self
    }

    pub fn auxiliary_factory(mut self, factory: Arc<dyn AuxiliarySinkFactory>) -> Self {
        self.auxiliary = Some(factory);
        self
    }

    pub fn terminator(mut self, terminator: Arc<dyn Terminator>) -> Self {
        self.terminator = Some(terminator);
        self
    }

    pub fn probe(mut self, probe: Arc<dyn SystemProbe>) -> Self {
        self.probe = Some(probe);
        self
    }

    pub fn handler(mut self, handler: Arc<dyn ExceptionHandler>) -> Self {
        self.handlers.push(handler);
        self
    }

    pub fn build(self) -> ExceptionRouter {
        let sinks = SinkRegistry::new();
        if self.sinks.is_empty() {
            sinks.attach(Arc::new(TracingSink::new()));
        }
        for sink in self.sinks {
            sinks.attach(sink);
        }

        let context = match self.probe {
            Some(probe) => ContextBuilder::new(probe),
            None => ContextBuilder::default(),
        };

        ExceptionRouter {
            settings: RwLock::new(self.settings),
            registry: self
                .registry
                .unwrap_or_else(|| Arc::new(ExceptionRegistry::new())),
            rules: RwLock::new(Arc::new(self.rules)),
            sinks,
            auxiliary: self
                .auxiliary
                .unwrap_or_else(|| Arc::new(FileSinkFactory::default())),
            terminator: self
                .terminator
                .unwrap_or_else(|| Arc::new(ProcessTerminator)),
            context,
            resolver: BehaviorResolver,
            handlers: self.handlers,
        }
    }
}
