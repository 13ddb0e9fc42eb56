// Reloading a running router from disk
#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use common::{registry, QUOTA_ERROR};
use faultline_config::{reload_into, ConfigSource};
use faultline_core::exception::Fault;
use faultline_core::sink::{MemorySink, MemorySinkFactory};
use faultline_core::{
    ExceptionRouter, RecordingTerminator, RuleEntry, RuleStore, Settings,
};
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;

fn router(primary: &MemorySink, auxiliary: Arc<MemorySinkFactory>) -> ExceptionRouter {
    ExceptionRouter::builder(Settings::default())
        .registry(Arc::new(registry()))
        .rules(RuleStore::new().with_rule(
            "save",
            RuleEntry::new()
                .with_exception(&QUOTA_ERROR)
                .with_custom_message("old"),
        ))
        .sink(Arc::new(primary.clone()))
        .auxiliary_factory(auxiliary)
        .terminator(Arc::new(RecordingTerminator::new()))
        .build()
}

#[test]
fn test_reload_swaps_rules_and_debug_mode() {
    // GIVEN a router with an old rule and a new document on disk
    let dir = TempDir::new().unwrap();
    let prefix = dir.path().join("faultline_config");
    fs::write(
        prefix.with_extension("yaml"),
        "debug_mode: true\nsave:\n  exceptions: [billing.QuotaError]\n  custom_message: new\n  behaviors:\n    QuotaError:\n      log_to_specific_file: quota.log\n",
    )
    .unwrap();
    let primary = MemorySink::new("primary");
    let auxiliary = Arc::new(MemorySinkFactory::new());
    let router = router(&primary, auxiliary.clone());

    // WHEN reloading
    let warnings = reload_into(&router, &ConfigSource::new(&prefix)).unwrap();

    // THEN the new rule applies to the next routed exception
    assert!(warnings.is_empty());
    assert!(router.settings().debug);
    router.route_named("save", &Fault::new(&QUOTA_ERROR, "over quota"));
    assert_eq!(
        primary.records()[0].message,
        "Exception caught in save - Custom Message: new"
    );
    assert_eq!(auxiliary.records("quota.log").len(), 1);
}

#[test]
fn test_failed_reload_keeps_old_rules() {
    // GIVEN a document that does not decode
    let dir = TempDir::new().unwrap();
    let prefix = dir.path().join("faultline_config");
    fs::write(prefix.with_extension("json"), "{ broken").unwrap();
    let primary = MemorySink::new("primary");
    let router = router(&primary, Arc::new(MemorySinkFactory::new()));

    // WHEN reloading
    let result = reload_into(&router, &ConfigSource::new(&prefix));

    // THEN the error is reported and the old rule still applies
    assert!(result.is_err());
    assert!(!router.settings().debug);
    router.route_named("save", &Fault::new(&QUOTA_ERROR, "over quota"));
    assert_eq!(
        primary.records()[0].message,
        "Exception caught in save - Custom Message: old"
    );
}
