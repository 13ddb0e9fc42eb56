use faultline_core::exception::VALUE_ERROR;
use faultline_core::{exception_type, ExceptionRegistry};
use std::path::PathBuf;

exception_type!(pub static QUOTA_ERROR = "QuotaError" in "billing", extends [VALUE_ERROR]);

/// Path of a file under `tests/fixtures`
#[allow(dead_code)]
pub fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

/// Built-ins plus the application types used by the fixtures
#[allow(dead_code)]
pub fn registry() -> ExceptionRegistry {
    let mut registry = ExceptionRegistry::new();
    registry.register(&QUOTA_ERROR);
    registry
}
