//! In-memory sink for tests and inspection

use crate::core::{Entry, LogLevel, Result, Sink};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Default)]
struct Captured {
    entries: Mutex<Vec<Entry>>,
    flushes: AtomicUsize,
}

/// Keeps every entry it receives.
///
/// Clones share the captured entries, so one handle can be registered with a
/// logger while another is used to inspect what arrived.
///
/// ```
/// use telemetry_log::{sinks::MemorySink, Logger};
///
/// let sink = MemorySink::new();
/// let logger = Logger::builder()
///     .without_console()
///     .sink(sink.clone())
///     .build()
///     .unwrap();
///
/// logger.info("ready", &[]);
/// assert_eq!(sink.count(), 1);
/// ```
#[derive(Clone)]
pub struct MemorySink {
    captured: Arc<Captured>,
    levels: Arc<[LogLevel]>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::with_levels(LogLevel::ALL)
    }

    /// Only receive the given levels
    pub fn with_levels(levels: &[LogLevel]) -> Self {
        Self {
            captured: Arc::new(Captured::default()),
            levels: levels.into(),
        }
    }

    pub fn entries(&self) -> Vec<Entry> {
        self.captured.entries.lock().clone()
    }

    pub fn last(&self) -> Option<Entry> {
        self.captured.entries.lock().last().cloned()
    }

    pub fn count(&self) -> usize {
        self.captured.entries.lock().len()
    }

    pub fn flush_count(&self) -> usize {
        self.captured.flushes.load(Ordering::SeqCst)
    }

    pub fn clear(&self) {
        self.captured.entries.lock().clear();
    }
}

impl Default for MemorySink {
    fn default() -> Self {
        Self::new()
    }
}

impl Sink for MemorySink {
    fn fire(&self, entry: &Entry) -> Result<()> {
        self.captured.entries.lock().push(entry.clone());
        Ok(())
    }

    fn levels(&self) -> &[LogLevel] {
        &self.levels
    }

    fn flush(&self) -> Result<()> {
        self.captured.flushes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}
