//! Typed values carried by structured log fields

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// Flattened field mapping attached to a finished entry
pub type Fields = BTreeMap<String, FieldValue>;

/// Value type for structured logging fields
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    String(String),
    Bool(bool),
    Bytes(Vec<u8>),
    Float(f64),
    Int(i64),
    Uint(u64),
    Time(DateTime<Utc>),
    /// Rendered message of an error value
    Error(String),
    /// Arbitrary structured data, already projected to JSON
    Any(serde_json::Value),
}

/// Capability for values that supply their own log-safe projection.
///
/// Types holding secrets or large internal state implement this so that
/// only the projection is ever stored in a log field.
///
/// # Example
///
/// ```
/// use telemetry_log::{FieldValue, Loggable};
///
/// struct Account {
///     id: u64,
///     password: String,
/// }
///
/// impl Loggable for Account {
///     fn as_log(&self) -> FieldValue {
///         FieldValue::Uint(self.id)
///     }
/// }
/// ```
pub trait Loggable {
    fn as_log(&self) -> FieldValue;
}

/// Anything that can be stored as an arbitrary field value.
///
/// Every [`Loggable`] type converts through its projection. Plain
/// serializable data is stored as JSON once wrapped in [`Serialized`], so a
/// type that is both `Serialize` and `Loggable` is never stored raw by
/// accident.
pub trait LogValue {
    fn to_field_value(&self) -> FieldValue;
}

impl<T: Loggable + ?Sized> LogValue for T {
    fn to_field_value(&self) -> FieldValue {
        self.as_log()
    }
}

/// Store a serializable value as JSON, bypassing any projection.
///
/// ```
/// use serde::Serialize;
/// use telemetry_log::{ctx, FieldValue, LogContext, Serialized};
///
/// #[derive(Serialize)]
/// struct Request {
///     method: &'static str,
/// }
///
/// let fields = LogContext::from_fns(&[ctx::any("req", &Serialized(Request { method: "GET" }))])
///     .flatten();
/// assert_eq!(fields["req"], FieldValue::Any(serde_json::json!({"method": "GET"})));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Serialized<T>(pub T);

impl<T: Serialize> LogValue for Serialized<T> {
    fn to_field_value(&self) -> FieldValue {
        match serde_json::to_value(&self.0) {
            Ok(v) => FieldValue::Any(v),
            Err(e) => FieldValue::Error(format!("unserializable value: {}", e)),
        }
    }
}

impl Loggable for serde_json::Value {
    fn as_log(&self) -> FieldValue {
        FieldValue::Any(self.clone())
    }
}

impl Loggable for FieldValue {
    fn as_log(&self) -> FieldValue {
        self.clone()
    }
}

impl FieldValue {
    /// Convert to serde_json::Value for JSON serialization
    #[must_use]
    pub fn to_json_value(&self) -> serde_json::Value {
        match self {
            FieldValue::String(s) => serde_json::Value::String(s.clone()),
            FieldValue::Bool(b) => serde_json::Value::Bool(*b),
            FieldValue::Bytes(b) => {
                serde_json::Value::String(String::from_utf8_lossy(b).into_owned())
            }
            FieldValue::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            FieldValue::Int(i) => serde_json::Value::Number((*i).into()),
            FieldValue::Uint(u) => serde_json::Value::Number((*u).into()),
            FieldValue::Time(t) => {
                serde_json::Value::String(t.to_rfc3339_opts(SecondsFormat::Nanos, true))
            }
            FieldValue::Error(e) => serde_json::Value::String(e.clone()),
            FieldValue::Any(v) => v.clone(),
        }
    }

    /// Borrow the inner string of a `String` value
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::String(s) => Some(s),
            _ => None,
        }
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json_value().serialize(serializer)
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::String(s) => write!(f, "{}", s),
            FieldValue::Bool(b) => write!(f, "{}", b),
            FieldValue::Bytes(b) => write!(f, "{}", String::from_utf8_lossy(b)),
            FieldValue::Float(fl) => write!(f, "{}", fl),
            FieldValue::Int(i) => write!(f, "{}", i),
            FieldValue::Uint(u) => write!(f, "{}", u),
            FieldValue::Time(t) => write!(f, "{}", t.to_rfc3339()),
            FieldValue::Error(e) => write!(f, "{}", e),
            FieldValue::Any(v) => write!(f, "{}", v),
        }
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::String(s)
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::String(s.to_string())
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Bool(b)
    }
}

impl From<Vec<u8>> for FieldValue {
    fn from(b: Vec<u8>) -> Self {
        FieldValue::Bytes(b)
    }
}

impl From<f64> for FieldValue {
    fn from(f: f64) -> Self {
        FieldValue::Float(f)
    }
}

impl From<i64> for FieldValue {
    fn from(i: i64) -> Self {
        FieldValue::Int(i)
    }
}

impl From<i32> for FieldValue {
    fn from(i: i32) -> Self {
        FieldValue::Int(i as i64)
    }
}

impl From<u64> for FieldValue {
    fn from(u: u64) -> Self {
        FieldValue::Uint(u)
    }
}

impl From<u32> for FieldValue {
    fn from(u: u32) -> Self {
        FieldValue::Uint(u as u64)
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(t: DateTime<Utc>) -> Self {
        FieldValue::Time(t)
    }
}

impl From<serde_json::Value> for FieldValue {
    fn from(v: serde_json::Value) -> Self {
        FieldValue::Any(v)
    }
}
