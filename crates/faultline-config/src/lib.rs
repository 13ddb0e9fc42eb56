//! Faultline Config - rule documents from JSON, YAML and TOML
//!
//! Provides:
//! - Config source discovery (`<prefix>.<ext>` in a fixed extension order)
//! - Decoding of the three supported formats into one document model
//! - Validation of the document into a `RuleStore`, with non-fatal warnings
//! - Atomic reload into a running `ExceptionRouter`

pub mod errors;
pub mod loader;
pub mod parser;
pub mod source;
pub mod warnings;

pub use loader::{load, load_from, load_path, parse_str, reload_into, LoadedConfig};
pub use parser::{decode, parse_document, ParsedConfig};
pub use source::{ConfigFormat, ConfigSource, DEFAULT_EXTENSIONS, DEFAULT_PREFIX};
pub use warnings::LoadWarning;
