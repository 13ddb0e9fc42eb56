//! Context gathering for routed exceptions
//!
//! The call site identifies itself and hands over the locals it wants
//! captured; nothing here walks the stack.

use crate::errors::{FaultlineError, Result};
use crate::settings::ContextLevel;
use chrono::{SecondsFormat, Utc};
use faultline_core_types::schema::{
    CTX_CPU_COUNT, CTX_ENV_DETAILS, CTX_ENV_DETAILS_ERROR, CTX_FREE_MEMORY, CTX_LOCAL_VARS,
    CTX_SYSTEM_INFO_ERROR, CTX_TIMESTAMP,
};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use sysinfo::System;

pub const LOCALS_UNAVAILABLE: &str = "Local variables information unavailable";
pub const SYSTEM_INFO_UNAVAILABLE: &str = "Could not retrieve some system info (memory/CPU)";
pub const ENV_UNAVAILABLE: &str = "Could not retrieve environment variables";

/// Identity and local-variable snapshot of the function that caught the exception
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallSite {
    function: String,
    locals: Option<Vec<(String, String)>>,
}

impl CallSite {
    pub fn new(function: impl Into<String>) -> Self {
        Self {
            function: function.into(),
            locals: None,
        }
    }

    /// Capture a local through its `Debug` rendering
    pub fn with_local(self, name: impl Into<String>, value: &dyn fmt::Debug) -> Self {
        self.with_rendered_local(name, format!("{:?}", value))
    }

    pub fn with_rendered_local(mut self, name: impl Into<String>, rendered: String) -> Self {
        self.locals
            .get_or_insert_with(Vec::new)
            .push((name.into(), rendered));
        self
    }

    pub fn function(&self) -> &str {
        &self.function
    }

    pub fn locals(&self) -> Option<&[(String, String)]> {
        self.locals.as_deref()
    }

    /// `{name: value, ...}`, or `None` when nothing was captured
    pub fn render_locals(&self) -> Option<String> {
        let locals = self.locals.as_ref().filter(|l| !l.is_empty())?;
        let body = locals
            .iter()
            .map(|(name, value)| format!("{}: {}", name, value))
            .collect::<Vec<_>>()
            .join(", ");
        Some(format!("{{{}}}", body))
    }
}

/// Context payload of one exception event
///
/// Created and consumed within a single routing call.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ExceptionContext(Map<String, Value>);

impl ExceptionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    /// Flat merge; keys from `other` win
    pub fn merge(&mut self, other: &Map<String, Value>) {
        for (key, value) in other {
            self.0.insert(key.clone(), value.clone());
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }
}

/// Read-only host probes used at the detailed level
pub trait SystemProbe: Send + Sync {
    /// Available memory in bytes
    ///
    /// # Errors
    ///
    /// `ProbeUnavailable` when the platform does not report memory.
    fn free_memory(&self) -> Result<u64>;

    /// Logical CPU count
    ///
    /// # Errors
    ///
    /// `ProbeUnavailable` when the count cannot be determined.
    fn cpu_count(&self) -> Result<usize>;

    /// Environment snapshot
    ///
    /// # Errors
    ///
    /// `ProbeUnavailable` when the environment cannot be read.
    fn environment(&self) -> Result<BTreeMap<String, String>>;
}

/// Probes the current host via sysinfo and the process environment
#[derive(Debug, Clone, Copy, Default)]
pub struct HostProbe;

impl SystemProbe for HostProbe {
    fn free_memory(&self) -> Result<u64> {
        let mut system = System::new();
        system.refresh_memory();
        if system.total_memory() == 0 {
            return Err(FaultlineError::ProbeUnavailable {
                probe: CTX_FREE_MEMORY.to_string(),
                reason: "memory statistics not reported on this platform".to_string(),
            });
        }
        Ok(system.available_memory())
    }

    fn cpu_count(&self) -> Result<usize> {
        std::thread::available_parallelism()
            .map(|n| n.get())
            .map_err(|e| FaultlineError::ProbeUnavailable {
                probe: CTX_CPU_COUNT.to_string(),
                reason: e.to_string(),
            })
    }

    fn environment(&self) -> Result<BTreeMap<String, String>> {
        Ok(std::env::vars_os()
            .map(|(k, v)| {
                (
                    k.to_string_lossy().into_owned(),
                    v.to_string_lossy().into_owned(),
                )
            })
            .collect())
    }
}

/// Builds the context record for a configured level
#[derive(Clone)]
pub struct ContextBuilder {
    probe: Arc<dyn SystemProbe>,
}

impl ContextBuilder {
    pub fn new(probe: Arc<dyn SystemProbe>) -> Self {
        Self { probe }
    }

    /// Build the context. Never fails: unavailable values become placeholders.
    pub fn build(&self, level: ContextLevel, site: Option<&CallSite>) -> ExceptionContext {
        let mut context = ExceptionContext::new();
        context.insert(
            CTX_TIMESTAMP,
            Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
        );

        if level.includes_locals() {
            let rendered = site
                .and_then(CallSite::render_locals)
                .unwrap_or_else(|| LOCALS_UNAVAILABLE.to_string());
            context.insert(CTX_LOCAL_VARS, rendered);
        }

        if level.includes_system() {
            self.add_system_info(&mut context);
        }

        context
    }

    fn add_system_info(&self, context: &mut ExceptionContext) {
        let memory = self.probe.free_memory();
        let cpus = self.probe.cpu_count();

        let mut degraded = false;
        match memory {
            Ok(bytes) => context.insert(CTX_FREE_MEMORY, bytes),
            Err(err) => {
                tracing::debug!(error = %err, "free memory probe failed");
                degraded = true;
            }
        }
        match cpus {
            Ok(count) => context.insert(CTX_CPU_COUNT, count),
            Err(err) => {
                tracing::debug!(error = %err, "cpu count probe failed");
                degraded = true;
            }
        }
        if degraded {
            context.insert(CTX_SYSTEM_INFO_ERROR, SYSTEM_INFO_UNAVAILABLE);
        }

        match self.probe.environment() {
            Ok(vars) => {
                let env: Map<String, Value> = vars
                    .into_iter()
                    .map(|(k, v)| (k, Value::String(v)))
                    .collect();
                context.insert(CTX_ENV_DETAILS, Value::Object(env));
            }
            Err(err) => {
                tracing::debug!(error = %err, "environment probe failed");
                context.insert(CTX_ENV_DETAILS_ERROR, ENV_UNAVAILABLE);
            }
        }
    }
}

impl Default for ContextBuilder {
    fn default() -> Self {
        Self::new(Arc::new(HostProbe))
    }
}

impl fmt::Debug for ContextBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextBuilder").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedProbe;

    impl SystemProbe for FixedProbe {
        fn free_memory(&self) -> Result<u64> {
            Ok(1024)
        }

        fn cpu_count(&self) -> Result<usize> {
            Ok(4)
        }

        fn environment(&self) -> Result<BTreeMap<String, String>> {
            Ok([("HOME".to_string(), "/root".to_string())].into())
        }
    }

    struct BrokenProbe;

    impl SystemProbe for BrokenProbe {
        fn free_memory(&self) -> Result<u64> {
            Err(FaultlineError::ProbeUnavailable {
                probe: "free_memory".to_string(),
                reason: "unsupported".to_string(),
            })
        }

        fn cpu_count(&self) -> Result<usize> {
            Ok(2)
        }

        fn environment(&self) -> Result<BTreeMap<String, String>> {
            Err(FaultlineError::ProbeUnavailable {
                probe: "env".to_string(),
                reason: "sandboxed".to_string(),
            })
        }
    }

    fn site() -> CallSite {
        CallSite::new("parse_order")
            .with_local("id", &42)
            .with_local("name", &"widget")
    }

    #[test]
    fn test_minimal_has_only_timestamp() {
        let builder = ContextBuilder::new(Arc::new(FixedProbe));
        let ctx = builder.build(ContextLevel::Minimal, Some(&site()));
        assert_eq!(ctx.keys().collect::<Vec<_>>(), vec![CTX_TIMESTAMP]);
    }

    #[test]
    fn test_timestamp_is_utc_iso8601() {
        let ctx = ContextBuilder::default().build(ContextLevel::Minimal, None);
        let ts = ctx.get(CTX_TIMESTAMP).and_then(Value::as_str).unwrap();
        assert!(ts.ends_with('Z'));
        assert!(chrono::DateTime::parse_from_rfc3339(ts).is_ok());
    }

    #[test]
    fn test_medium_renders_locals() {
        let builder = ContextBuilder::new(Arc::new(FixedProbe));
        let ctx = builder.build(ContextLevel::Medium, Some(&site()));
        assert_eq!(
            ctx.get(CTX_LOCAL_VARS),
            Some(&Value::String("{id: 42, name: \"widget\"}".to_string()))
        );
        assert!(!ctx.contains_key(CTX_CPU_COUNT));
    }

    #[test]
    fn test_medium_without_locals_uses_placeholder() {
        let builder = ContextBuilder::new(Arc::new(FixedProbe));
        let ctx = builder.build(ContextLevel::Medium, Some(&CallSite::new("f")));
        assert_eq!(
            ctx.get(CTX_LOCAL_VARS).and_then(Value::as_str),
            Some(LOCALS_UNAVAILABLE)
        );
    }

    #[test]
    fn test_detailed_includes_probes() {
        let builder = ContextBuilder::new(Arc::new(FixedProbe));
        let ctx = builder.build(ContextLevel::Detailed, Some(&site()));
        assert!(ctx.contains_key(CTX_LOCAL_VARS));
        assert_eq!(ctx.get(CTX_FREE_MEMORY), Some(&Value::from(1024u64)));
        assert_eq!(ctx.get(CTX_CPU_COUNT), Some(&Value::from(4usize)));
        assert_eq!(
            ctx.get(CTX_ENV_DETAILS).and_then(|v| v.get("HOME")),
            Some(&Value::String("/root".to_string()))
        );
    }

    #[test]
    fn test_failing_probes_degrade_to_placeholders() {
        let builder = ContextBuilder::new(Arc::new(BrokenProbe));
        let ctx = builder.build(ContextLevel::Detailed, None);
        assert!(!ctx.contains_key(CTX_FREE_MEMORY));
        assert_eq!(ctx.get(CTX_CPU_COUNT), Some(&Value::from(2usize)));
        assert_eq!(
            ctx.get(CTX_SYSTEM_INFO_ERROR).and_then(Value::as_str),
            Some(SYSTEM_INFO_UNAVAILABLE)
        );
        assert!(!ctx.contains_key(CTX_ENV_DETAILS));
        assert!(ctx.contains_key(CTX_ENV_DETAILS_ERROR));
    }

    #[test]
    fn test_merge_later_keys_win() {
        let mut ctx = ExceptionContext::new();
        ctx.insert("request", "a");
        let mut extra = Map::new();
        extra.insert("request".to_string(), Value::from("b"));
        ctx.merge(&extra);
        assert_eq!(ctx.get("request"), Some(&Value::from("b")));
    }
}
