//! Sink trait for log output destinations

use super::{error::Result, log_entry::Entry, log_level::LogLevel};

/// Destination for finished entries.
///
/// Sinks are shared by every logger derived from the same root, so `fire`
/// takes `&self`; a sink that holds mutable state guards it itself.
/// Errors returned here are recorded by the logger and never reach the
/// code that made the log call.
pub trait Sink: Send + Sync {
    fn fire(&self, entry: &Entry) -> Result<()>;

    /// Levels this sink wants to receive
    fn levels(&self) -> &[LogLevel] {
        LogLevel::ALL
    }

    fn flush(&self) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &str;
}
