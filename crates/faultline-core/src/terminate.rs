//! Process termination used by panic mode

use std::sync::{Arc, Mutex, PoisonError};

/// Exit status requested after a routed exception in panic mode
pub const PANIC_EXIT_CODE: i32 = 1;

/// Ends the process once an exception has been fully recorded.
///
/// Implementations other than [`ProcessTerminator`] may return; the router
/// then continues as if panic mode were off and the error propagates.
pub trait Terminator: Send + Sync {
    fn terminate(&self, code: i32);
}

/// Calls `std::process::exit`
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessTerminator;

impl Terminator for ProcessTerminator {
    fn terminate(&self, code: i32) {
        std::process::exit(code);
    }
}

/// Records requested exit codes instead of exiting
#[derive(Debug, Clone, Default)]
pub struct RecordingTerminator {
    codes: Arc<Mutex<Vec<i32>>>,
}

impl RecordingTerminator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn codes(&self) -> Vec<i32> {
        self.codes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn was_requested(&self) -> bool {
        !self.codes().is_empty()
    }
}

impl Terminator for RecordingTerminator {
    fn terminate(&self, code: i32) {
        self.codes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(code);
    }
}
