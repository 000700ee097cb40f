//! Context builder functions
//!
//! Each function captures one typed value and returns a [`ContextFn`] that
//! appends it as a single field-set. Re-exported at the crate root as `ctx`.
//!
//! ```
//! use telemetry_log::{ctx, LogContext};
//!
//! let fields = LogContext::from_fns(&[
//!     ctx::string("user", "alice"),
//!     ctx::u64("attempt", 3),
//!     ctx::bool("cached", false),
//! ])
//! .flatten();
//!
//! assert_eq!(fields.len(), 3);
//! ```

use super::field_value::{FieldValue, LogValue, Loggable};
use super::log_context::{ContextFn, FieldRecorder};
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Arbitrary value; [`Loggable`] types are stored as their projection.
///
/// Plain serializable data goes through [`Serialized`](super::field_value::Serialized).
pub fn any<T: LogValue + ?Sized>(key: impl Into<String>, value: &T) -> ContextFn {
    let key = key.into();
    let value = value.to_field_value();
    ContextFn::new(move |r| r.field(&key, value.clone()))
}

/// Value exposing its own projection; only the projection is stored.
pub fn loggable<T: Loggable + ?Sized>(key: impl Into<String>, value: &T) -> ContextFn {
    let key = key.into();
    let value = value.as_log();
    ContextFn::new(move |r| r.field(&key, value.clone()))
}

/// Pre-built field value
pub fn value(key: impl Into<String>, value: impl Into<FieldValue>) -> ContextFn {
    let key = key.into();
    let value = value.into();
    ContextFn::new(move |r| r.field(&key, value.clone()))
}

pub fn bool(key: impl Into<String>, value: bool) -> ContextFn {
    let key = key.into();
    ContextFn::new(move |r| r.bool(&key, value))
}

pub fn bytes(key: impl Into<String>, value: impl Into<Vec<u8>>) -> ContextFn {
    let key = key.into();
    let value: Vec<u8> = value.into();
    let value: Arc<[u8]> = value.into();
    ContextFn::new(move |r| r.bytes(&key, &value))
}

pub fn string(key: impl Into<String>, value: impl Into<String>) -> ContextFn {
    let key = key.into();
    let value = value.into();
    ContextFn::new(move |r| r.string(&key, &value))
}

pub fn f64(key: impl Into<String>, value: f64) -> ContextFn {
    let key = key.into();
    ContextFn::new(move |r| r.f64(&key, value))
}

pub fn i64(key: impl Into<String>, value: i64) -> ContextFn {
    let key = key.into();
    ContextFn::new(move |r| r.i64(&key, value))
}

pub fn u64(key: impl Into<String>, value: u64) -> ContextFn {
    let key = key.into();
    ContextFn::new(move |r| r.u64(&key, value))
}

pub fn time(key: impl Into<String>, value: DateTime<Utc>) -> ContextFn {
    let key = key.into();
    ContextFn::new(move |r| r.time(&key, value))
}

/// Error value; the message is rendered when the builder is created.
pub fn error(key: impl Into<String>, err: &(dyn std::error::Error + '_)) -> ContextFn {
    let key = key.into();
    let message = err.to_string();
    ContextFn::new(move |r| r.error(&key, &message))
}

/// Builder from a closure, for fields computed at emission time
pub fn from_fn<F>(f: F) -> ContextFn
where
    F: Fn(&mut dyn FieldRecorder) + Send + Sync + 'static,
{
    ContextFn::new(f)
}
