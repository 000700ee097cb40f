//! Structured logging context for key-value fields
//!
//! This module provides:
//! - `FieldRecorder`: the typed target every context builder writes into
//! - `LogContext`: an ordered accumulation of field-sets
//! - `ContextFn`: a shareable builder that appends one field-set

use super::field_value::{FieldValue, Fields};
use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::Arc;

/// Typed target for context builders.
///
/// Every typed method appends exactly one field-set. Implementors only need
/// to provide [`FieldRecorder::field`]; the typed methods forward to it.
pub trait FieldRecorder {
    fn field(&mut self, key: &str, value: FieldValue);

    fn any(&mut self, key: &str, value: serde_json::Value) {
        self.field(key, FieldValue::Any(value));
    }

    fn bool(&mut self, key: &str, value: bool) {
        self.field(key, FieldValue::Bool(value));
    }

    fn bytes(&mut self, key: &str, value: &[u8]) {
        self.field(key, FieldValue::Bytes(value.to_vec()));
    }

    fn string(&mut self, key: &str, value: &str) {
        self.field(key, FieldValue::String(value.to_string()));
    }

    fn f64(&mut self, key: &str, value: f64) {
        self.field(key, FieldValue::Float(value));
    }

    fn i64(&mut self, key: &str, value: i64) {
        self.field(key, FieldValue::Int(value));
    }

    fn u64(&mut self, key: &str, value: u64) {
        self.field(key, FieldValue::Uint(value));
    }

    fn time(&mut self, key: &str, value: DateTime<Utc>) {
        self.field(key, FieldValue::Time(value));
    }

    fn error(&mut self, key: &str, message: &str) {
        self.field(key, FieldValue::Error(message.to_string()));
    }
}

/// Ordered sequence of field-sets.
///
/// Nothing is ever removed or rewritten; [`LogContext::flatten`] resolves
/// key collisions so that the latest field-set wins.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LogContext {
    sets: Vec<(String, FieldValue)>,
}

impl LogContext {
    /// Create a new empty log context
    pub fn new() -> Self {
        Self { sets: Vec::new() }
    }

    /// Run each builder in order against a fresh context
    pub fn from_fns<'a, I>(fns: I) -> Self
    where
        I: IntoIterator<Item = &'a ContextFn>,
    {
        let fns = fns.into_iter();
        let mut ctx = Self {
            sets: Vec::with_capacity(fns.size_hint().0),
        };
        for f in fns {
            f.apply(&mut ctx);
        }
        ctx
    }

    /// Add a field to the context
    pub fn with_field<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<FieldValue>,
    {
        self.sets.push((key.into(), value.into()));
        self
    }

    /// Field-sets in insertion order
    pub fn field_sets(&self) -> &[(String, FieldValue)] {
        &self.sets
    }

    pub fn len(&self) -> usize {
        self.sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    /// Merge all field-sets into one mapping, later sets overriding earlier ones
    pub fn flatten(&self) -> Fields {
        let mut merged = Fields::new();
        for (key, value) in &self.sets {
            merged.insert(key.clone(), value.clone());
        }
        merged
    }
}

impl FieldRecorder for LogContext {
    fn field(&mut self, key: &str, value: FieldValue) {
        self.sets.push((key.to_string(), value));
    }
}

/// A context builder: appends one field-set to whatever recorder it is given.
///
/// Builders are cheap to clone and are only run once an entry has passed
/// the logger's threshold check.
#[derive(Clone)]
pub struct ContextFn(Arc<dyn Fn(&mut dyn FieldRecorder) + Send + Sync>);

impl ContextFn {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&mut dyn FieldRecorder) + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    #[inline]
    pub fn apply(&self, recorder: &mut dyn FieldRecorder) {
        (self.0)(recorder)
    }
}

impl fmt::Debug for ContextFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ContextFn")
    }
}
