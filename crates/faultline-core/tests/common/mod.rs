use faultline_core::context::SystemProbe;
use faultline_core::sink::{MemorySink, MemorySinkFactory};
use faultline_core::{
    ExceptionRouter, FaultlineError, RecordingTerminator, Result, RuleStore, Settings,
};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Probe returning fixed values so detailed contexts are deterministic
#[allow(dead_code)]
pub struct FixedProbe;

impl SystemProbe for FixedProbe {
    fn free_memory(&self) -> Result<u64> {
        Ok(4096)
    }

    fn cpu_count(&self) -> Result<usize> {
        Ok(8)
    }

    fn environment(&self) -> Result<BTreeMap<String, String>> {
        Ok(BTreeMap::from([("APP_ENV".to_string(), "test".to_string())]))
    }
}

/// Probe whose every call fails
#[allow(dead_code)]
pub struct BrokenProbe;

impl SystemProbe for BrokenProbe {
    fn free_memory(&self) -> Result<u64> {
        Err(unavailable("free_memory"))
    }

    fn cpu_count(&self) -> Result<usize> {
        Err(unavailable("cpu_count"))
    }

    fn environment(&self) -> Result<BTreeMap<String, String>> {
        Err(unavailable("env_details"))
    }
}

fn unavailable(probe: &str) -> FaultlineError {
    FaultlineError::ProbeUnavailable {
        probe: probe.to_string(),
        reason: "unsupported".to_string(),
    }
}

/// Router wired to in-memory sinks and a recording terminator
#[allow(dead_code)]
pub struct Harness {
    pub router: Arc<ExceptionRouter>,
    pub primary: MemorySink,
    pub auxiliary: Arc<MemorySinkFactory>,
    pub terminator: RecordingTerminator,
}

#[allow(dead_code)]
pub fn harness(settings: Settings, rules: RuleStore) -> Harness {
    let primary = MemorySink::new("primary");
    let auxiliary = Arc::new(MemorySinkFactory::new());
    let terminator = RecordingTerminator::new();
    let router = ExceptionRouter::builder(settings)
        .rules(rules)
        .sink(Arc::new(primary.clone()))
        .auxiliary_factory(auxiliary.clone())
        .terminator(Arc::new(terminator.clone()))
        .probe(Arc::new(FixedProbe))
        .build();

    Harness {
        router: Arc::new(router),
        primary,
        auxiliary,
        terminator,
    }
}

/// Build a JSON object map from a `json!` literal
#[allow(dead_code)]
pub fn object(value: serde_json::Value) -> serde_json::Map<String, serde_json::Value> {
    value.as_object().cloned().unwrap_or_default()
}
