//! Document store port and the sink that persists entries into it

use crate::core::{Entry, LogLevel, Result, Sink, TimestampFormat, TelemetryError};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;

/// Collection receiving error entries with their trace
pub const TRACE_COLLECTION: &str = "application_trace";
/// Collection receiving every other entry
pub const LOG_COLLECTION: &str = "application_log";

/// Insert-only document database
pub trait DocumentStore: Send + Sync {
    fn insert(&self, collection: &str, document: Value) -> Result<()>;

    /// Make previously inserted documents durable
    fn flush(&self) -> Result<()> {
        Ok(())
    }
}

impl<D: DocumentStore + ?Sized> DocumentStore for Arc<D> {
    fn insert(&self, collection: &str, document: Value) -> Result<()> {
        (**self).insert(collection, document)
    }

    fn flush(&self) -> Result<()> {
        (**self).flush()
    }
}

/// Store keeping documents in memory, grouped by collection
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: Mutex<HashMap<String, Vec<Value>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Documents inserted into `collection`, oldest first
    pub fn documents(&self, collection: &str) -> Vec<Value> {
        self.collections
            .lock()
            .get(collection)
            .cloned()
            .unwrap_or_default()
    }

    pub fn collection_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.collections.lock().keys().cloned().collect();
        names.sort();
        names
    }
}

impl DocumentStore for MemoryStore {
    fn insert(&self, collection: &str, document: Value) -> Result<()> {
        if collection.is_empty() {
            return Err(TelemetryError::store(collection, "collection name is empty"));
        }
        self.collections
            .lock()
            .entry(collection.to_string())
            .or_default()
            .push(document);
        Ok(())
    }
}

/// Persists a summary of every entry into a [`DocumentStore`].
///
/// With trace persistence enabled, Error entries go to
/// [`TRACE_COLLECTION`] together with their level and trace frames. Every
/// other entry (and Error entries when it is disabled) goes to
/// [`LOG_COLLECTION`] as `{trace_date, func, file}`.
///
/// ```
/// use std::sync::Arc;
/// use telemetry_log::sinks::{MemoryStore, StoreSink, LOG_COLLECTION};
/// use telemetry_log::Logger;
///
/// let store = Arc::new(MemoryStore::new());
/// let logger = Logger::builder()
///     .without_console()
///     .sink(StoreSink::new(Arc::clone(&store)))
///     .build()
///     .unwrap();
///
/// logger.info("stored", &[]);
/// assert_eq!(store.documents(LOG_COLLECTION).len(), 1);
/// ```
pub struct StoreSink<D> {
    store: D,
    with_trace: bool,
    timestamp_format: TimestampFormat,
}

impl<D: DocumentStore> StoreSink<D> {
    pub fn new(store: D) -> Self {
        Self {
            store,
            with_trace: false,
            timestamp_format: TimestampFormat::Nanos,
        }
    }

    /// Route Error entries and their traces to [`TRACE_COLLECTION`]
    #[must_use]
    pub fn with_trace(mut self, enabled: bool) -> Self {
        self.with_trace = enabled;
        self
    }

    pub fn store(&self) -> &D {
        &self.store
    }

    fn trace_date(&self, entry: &Entry) -> Value {
        self.timestamp_format.to_json_value(&entry.timestamp)
    }

    fn func(entry: &Entry) -> Value {
        entry.func().map(Value::from).unwrap_or(Value::Null)
    }
}

impl<D: DocumentStore> Sink for StoreSink<D> {
    fn fire(&self, entry: &Entry) -> Result<()> {
        if entry.level == LogLevel::Error && self.with_trace {
            let trace = entry
                .trace()
                .map(|t| t.to_json_value())
                .unwrap_or(Value::Null);

            self.store.insert(
                TRACE_COLLECTION,
                json!({
                    "level": entry.level.label(),
                    "trace_date": self.trace_date(entry),
                    "func": Self::func(entry),
                    "file": entry.file_line(),
                    "trace": trace,
                }),
            )
        } else {
            self.store.insert(
                LOG_COLLECTION,
                json!({
                    "trace_date": self.trace_date(entry),
                    "func": Self::func(entry),
                    "file": entry.file_line(),
                }),
            )
        }
    }

    fn flush(&self) -> Result<()> {
        self.store.flush()
    }

    fn name(&self) -> &str {
        "store"
    }
}
