//! Finished log entry handed to sinks

use super::call_site::{FILE_KEY, FUNC_KEY, LINE_KEY};
use super::field_value::{FieldValue, Fields};
use super::log_level::LogLevel;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::cell::RefCell;

/// Field holding the resolved frames of an error trace
pub const TRACE_KEY: &str = "trace";
/// Field holding the message of a traced error
pub const ERROR_KEY: &str = "error";

// Thread-local cache for the thread label to avoid repeated allocations
thread_local! {
    static THREAD_LABEL_CACHE: RefCell<Option<String>> = const { RefCell::new(None) };
}

/// Thread name if set, otherwise its id
fn thread_label() -> String {
    THREAD_LABEL_CACHE.with(|cache| {
        cache
            .borrow_mut()
            .get_or_insert_with(|| {
                let current = std::thread::current();
                current
                    .name()
                    .map(String::from)
                    .unwrap_or_else(|| format!("{:?}", current.id()))
            })
            .clone()
    })
}

#[derive(Debug, Clone, Serialize)]
pub struct Entry {
    pub level: LogLevel,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub thread: String,
    /// Merged field mapping: base context, call additions, then call site
    pub fields: Fields,
}

impl Entry {
    /// Sanitize log message to prevent log injection attacks
    ///
    /// Replaces newlines, carriage returns, and tabs with escape sequences
    /// to prevent attackers from injecting fake log entries.
    fn sanitize_message(message: &str) -> String {
        message
            .replace('\n', "\\n")
            .replace('\r', "\\r")
            .replace('\t', "\\t")
    }

    pub fn new(level: LogLevel, message: impl AsRef<str>, fields: Fields) -> Self {
        Self {
            level,
            message: Self::sanitize_message(message.as_ref()),
            timestamp: Utc::now(),
            thread: thread_label(),
            fields,
        }
    }

    pub fn field(&self, key: &str) -> Option<&FieldValue> {
        self.fields.get(key)
    }

    /// Function name of the call site
    pub fn func(&self) -> Option<&str> {
        self.field(FUNC_KEY).and_then(FieldValue::as_str)
    }

    /// `file:line` of the call site
    pub fn file_line(&self) -> String {
        let file = self.field(FILE_KEY).map(|v| v.to_string()).unwrap_or_default();
        let line = self.field(LINE_KEY).map(|v| v.to_string()).unwrap_or_default();
        format!("{}:{}", file, line)
    }

    /// Resolved trace frames, when the logger carried an error trace
    pub fn trace(&self) -> Option<&FieldValue> {
        self.field(TRACE_KEY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_is_sanitized() {
        let entry = Entry::new(LogLevel::Info, "line1\nERROR fake\tx", Fields::new());
        assert_eq!(entry.message, "line1\\nERROR fake\\tx");
    }

    #[test]
    fn test_call_site_accessors() {
        let mut fields = Fields::new();
        fields.insert(FILE_KEY.into(), "main.rs".into());
        fields.insert(LINE_KEY.into(), FieldValue::Uint(12));
        fields.insert(FUNC_KEY.into(), "app::main".into());

        let entry = Entry::new(LogLevel::Warn, "x", fields);
        assert_eq!(entry.func(), Some("app::main"));
        assert_eq!(entry.file_line(), "main.rs:12");
        assert!(entry.trace().is_none());
    }

    #[test]
    fn test_thread_label_uses_name() {
        let label = std::thread::Builder::new()
            .name("worker-7".into())
            .spawn(|| Entry::new(LogLevel::Info, "x", Fields::new()).thread)
            .unwrap()
            .join()
            .unwrap();
        assert_eq!(label, "worker-7");
    }
}
