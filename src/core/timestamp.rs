//! Timestamp rendering for console lines and persisted documents

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// How an entry's timestamp is written
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use telemetry_log::TimestampFormat;
///
/// let at = Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap();
/// assert_eq!(TimestampFormat::Millis.format(&at), "2024-03-01T08:00:00.000Z");
/// assert_eq!(TimestampFormat::Unix.format(&at), "1709280000");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimestampFormat {
    /// RFC 3339 with milliseconds: `2024-03-01T08:00:00.123Z`
    #[default]
    Millis,

    /// RFC 3339 with nanoseconds, as stored in `trace_date`
    Nanos,

    /// Seconds since the epoch
    Unix,

    /// Milliseconds since the epoch
    UnixMillis,

    /// Any strftime pattern
    Custom(String),
}

impl TimestampFormat {
    #[must_use]
    pub fn format(&self, datetime: &DateTime<Utc>) -> String {
        match self {
            TimestampFormat::Millis => datetime.to_rfc3339_opts(SecondsFormat::Millis, true),
            TimestampFormat::Nanos => datetime.to_rfc3339_opts(SecondsFormat::Nanos, true),
            TimestampFormat::Unix => datetime.timestamp().to_string(),
            TimestampFormat::UnixMillis => datetime.timestamp_millis().to_string(),
            TimestampFormat::Custom(pattern) => datetime.format(pattern).to_string(),
        }
    }

    /// JSON form: numbers for epoch formats, strings otherwise
    pub fn to_json_value(&self, datetime: &DateTime<Utc>) -> serde_json::Value {
        match self {
            TimestampFormat::Unix => datetime.timestamp().into(),
            TimestampFormat::UnixMillis => datetime.timestamp_millis().into(),
            _ => self.format(datetime).into(),
        }
    }

    #[must_use]
    pub fn is_numeric(&self) -> bool {
        matches!(self, TimestampFormat::Unix | TimestampFormat::UnixMillis)
    }
}
