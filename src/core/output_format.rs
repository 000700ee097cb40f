//! Line formats for console output
//!
//! - Text: human-readable, optionally coloured
//! - Json: one JSON object per line
//! - Logfmt: `key=value` pairs for log aggregation tools

use super::log_entry::Entry;
use super::timestamp::TimestampFormat;
use serde::{Deserialize, Serialize};
use std::fmt::Write;

/// Output format for console lines
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// `[2025-01-08T10:30:45.123Z] [INFO ] main - request done func=app::serve line=42`
    #[default]
    Text,

    /// `{"time":"2025-01-08T10:30:45.123Z","level":"info","msg":"request done",...}`
    Json,

    /// `time=2025-01-08T10:30:45.123Z level=info msg="request done" ...`
    Logfmt,
}

impl OutputFormat {
    pub fn format(&self, entry: &Entry, timestamp: &TimestampFormat) -> String {
        match self {
            OutputFormat::Text => format_text(entry, timestamp),
            OutputFormat::Json => format_json(entry, timestamp),
            OutputFormat::Logfmt => format_logfmt(entry, timestamp),
        }
    }
}

fn format_text(entry: &Entry, timestamp: &TimestampFormat) -> String {
    format_text_with(entry, timestamp, &format!("{:5}", entry.level.to_str()))
}

/// Text line with a pre-rendered (padded, possibly coloured) level
pub(crate) fn format_text_with(entry: &Entry, timestamp: &TimestampFormat, level: &str) -> String {
    let mut line = format!(
        "[{}] [{}] {} - {}",
        timestamp.format(&entry.timestamp),
        level,
        entry.thread,
        entry.message
    );

    for (key, value) in &entry.fields {
        line.push(' ');
        line.push_str(&escape_key(key));
        line.push('=');
        line.push_str(&escape_value(&value.to_string()));
    }

    line
}

fn format_json(entry: &Entry, timestamp: &TimestampFormat) -> String {
    let mut object = serde_json::Map::new();

    // Entry fields first so the fixed keys below cannot be shadowed
    for (key, value) in &entry.fields {
        object.insert(key.clone(), value.to_json_value());
    }
    object.insert("time".to_string(), timestamp.to_json_value(&entry.timestamp));
    object.insert("level".to_string(), entry.level.label().into());
    object.insert("msg".to_string(), entry.message.clone().into());

    serde_json::Value::Object(object).to_string()
}

fn format_logfmt(entry: &Entry, timestamp: &TimestampFormat) -> String {
    let mut parts = vec![
        format!("time={}", escape_value(&timestamp.format(&entry.timestamp))),
        format!("level={}", entry.level.label()),
        format!("msg={}", quote(&entry.message)),
    ];

    for (key, value) in &entry.fields {
        parts.push(format!("{}={}", escape_key(key), escape_value(&value.to_string())));
    }

    parts.join(" ")
}

fn escape_key(key: &str) -> String {
    key.chars()
        .filter(|c| c.is_alphanumeric() || *c == '_' || *c == '-' || *c == '.')
        .collect()
}

/// Quote only when the value would otherwise break the key=value grammar
/// or the one-line-per-entry layout
fn escape_value(value: &str) -> String {
    if value.is_empty() || value.contains([' ', '"', '=']) || value.chars().any(char::is_control) {
        quote(value)
    } else {
        value.to_string()
    }
}

/// Double-quoted value with quotes, backslashes and control characters escaped
fn quote(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for c in value.chars() {
        match c {
            '\\' => quoted.push_str("\\\\"),
            '"' => quoted.push_str("\\\""),
            '\n' => quoted.push_str("\\n"),
            '\r' => quoted.push_str("\\r"),
            '\t' => quoted.push_str("\\t"),
            c if c.is_control() => {
                let _ = write!(quoted, "\\u{{{:04x}}}", c as u32);
            }
            c => quoted.push(c),
        }
    }
    quoted.push('"');
    quoted
}
