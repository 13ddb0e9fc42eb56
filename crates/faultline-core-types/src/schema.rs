//! Canonical schema constants for structured logging and exception context
//!
//! These constants keep the tracing fields, the record context keys and the
//! test assertions in agreement.

// Canonical field keys for structured logging
pub const FIELD_COMPONENT: &str = "component";
pub const FIELD_FUNCTION: &str = "function";
pub const FIELD_EVENT: &str = "event";
pub const FIELD_EVENT_ID: &str = "event_id";
pub const FIELD_SEVERITY: &str = "severity";
pub const FIELD_EXTRA: &str = "extra";
pub const FIELD_DESTINATION: &str = "destination";

// Exception fields
pub const FIELD_EXC_TYPE: &str = "exc.type";
pub const FIELD_EXC_MESSAGE: &str = "exc.message";
pub const FIELD_EXC_TRACEBACK: &str = "exc.traceback";

// Canonical event names
pub const EVENT_EXCEPTION: &str = "exception";
pub const EVENT_MIRRORED: &str = "mirrored";
pub const EVENT_PANIC: &str = "panic_exit";
pub const EVENT_UNHANDLED: &str = "unhandled";
pub const EVENT_LOG: &str = "log";

// Context keys
pub const CTX_TIMESTAMP: &str = "timestamp";
pub const CTX_LOCAL_VARS: &str = "local_vars";
pub const CTX_FREE_MEMORY: &str = "free_memory";
pub const CTX_CPU_COUNT: &str = "cpu_count";
pub const CTX_ENV_DETAILS: &str = "env_details";
pub const CTX_SYSTEM_INFO_ERROR: &str = "system_info_error";
pub const CTX_ENV_DETAILS_ERROR: &str = "env_details_error";
pub const CTX_TAGS: &str = "tags";

// Reserved config keys
pub const CONFIG_DEBUG_MODE: &str = "debug_mode";
pub const BEHAVIOR_DEFAULT: &str = "default";
pub const ACTION_ADD_METADATA: &str = "add_metadata";
pub const ACTION_LOG_TO_SPECIFIC_FILE: &str = "log_to_specific_file";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constants_accessibility() {
        assert!(!FIELD_FUNCTION.is_empty());
        assert!(!EVENT_EXCEPTION.is_empty());
        assert!(!CTX_TIMESTAMP.is_empty());
    }

    #[test]
    fn test_event_names_distinct() {
        let names = [
            EVENT_EXCEPTION,
            EVENT_MIRRORED,
            EVENT_PANIC,
            EVENT_UNHANDLED,
            EVENT_LOG,
        ];
        let unique: std::collections::HashSet<_> = names.iter().collect();
        assert_eq!(unique.len(), names.len());
    }
}
