//! Process termination on fatal entries

use parking_lot::Mutex;
use std::sync::Arc;

/// Exit status used after a fatal entry
pub const FATAL_EXIT_CODE: i32 = 1;

/// What a fatal log call does once every sink has fired and flushed
pub trait ExitStrategy: Send + Sync {
    fn exit(&self, code: i32);
}

impl<X: ExitStrategy + ?Sized> ExitStrategy for Arc<X> {
    fn exit(&self, code: i32) {
        (**self).exit(code)
    }
}

/// Terminates the process
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessExit;

impl ExitStrategy for ProcessExit {
    fn exit(&self, code: i32) {
        std::process::exit(code)
    }
}

/// Remembers exit requests instead of acting on them.
///
/// Clones share the same record, so a test can keep one handle and give
/// the other to the logger.
///
/// ```
/// use telemetry_log::{Logger, RecordingExit};
///
/// let exit = RecordingExit::new();
/// let logger = Logger::builder()
///     .exit_strategy(exit.clone())
///     .build()
///     .unwrap();
///
/// logger.fatal("unrecoverable", &[]);
/// assert_eq!(exit.codes(), vec![1]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct RecordingExit {
    codes: Arc<Mutex<Vec<i32>>>,
}

impl RecordingExit {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn codes(&self) -> Vec<i32> {
        self.codes.lock().clone()
    }

    pub fn requested(&self) -> bool {
        !self.codes.lock().is_empty()
    }
}

impl ExitStrategy for RecordingExit {
    fn exit(&self, code: i32) {
        self.codes.lock().push(code);
    }
}
