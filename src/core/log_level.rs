//! Log level definitions

use super::error::TelemetryError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[derive(Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug = 0,
    #[default]
    Info = 1,
    Warn = 2,
    Error = 3,
    Fatal = 4,
}

impl LogLevel {
    /// Every level, lowest first
    pub const ALL: &'static [LogLevel] = &[
        LogLevel::Debug,
        LogLevel::Info,
        LogLevel::Warn,
        LogLevel::Error,
        LogLevel::Fatal,
    ];

    pub fn to_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
            LogLevel::Fatal => "FATAL",
        }
    }

    /// Lowercase label used in persisted documents
    pub fn label(&self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warning",
            LogLevel::Error => "error",
            LogLevel::Fatal => "fatal",
        }
    }

    /// Error and Fatal entries must survive queue pressure in async sinks
    pub fn is_critical(&self) -> bool {
        *self >= LogLevel::Error
    }

    #[cfg(feature = "console")]
    pub fn color_code(&self) -> colored::Color {
        use colored::Color::*;
        match self {
            LogLevel::Debug => Blue,
            LogLevel::Info => Green,
            LogLevel::Warn => Yellow,
            LogLevel::Error => Red,
            LogLevel::Fatal => BrightRed,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_str())
    }
}

impl FromStr for LogLevel {
    type Err = TelemetryError;

    fn from_str(s: &str) -> Result<Self, TelemetryError> {
        match s.to_lowercase().as_str() {
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            "fatal" => Ok(LogLevel::Fatal),
            _ => Err(TelemetryError::config(
                "LogLevel",
                format!("invalid level name: '{}'", s),
            )),
        }
    }
}

impl TryFrom<u8> for LogLevel {
    type Error = TelemetryError;

    fn try_from(value: u8) -> Result<Self, TelemetryError> {
        LogLevel::ALL.get(value as usize).copied().ok_or_else(|| {
            TelemetryError::config("LogLevel", format!("invalid level: {}", value))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_ordering() {
        assert!(LogLevel::Debug < LogLevel::Info);
        assert!(LogLevel::Info < LogLevel::Warn);
        assert!(LogLevel::Warn < LogLevel::Error);
        assert!(LogLevel::Error < LogLevel::Fatal);
    }

    #[test]
    fn test_parse_case_insensitive() {
        assert_eq!("DEBUG".parse::<LogLevel>().unwrap(), LogLevel::Debug);
        assert_eq!("Warn".parse::<LogLevel>().unwrap(), LogLevel::Warn);
        assert_eq!("fatal".parse::<LogLevel>().unwrap(), LogLevel::Fatal);
    }

    #[test]
    fn test_parse_rejects_unknown_names() {
        assert!("warning".parse::<LogLevel>().is_err());
        assert!("trace".parse::<LogLevel>().is_err());
        assert!("".parse::<LogLevel>().unwrap_err().is_config());
    }

    #[test]
    fn test_numeric_range() {
        assert_eq!(LogLevel::try_from(0).unwrap(), LogLevel::Debug);
        assert_eq!(LogLevel::try_from(4).unwrap(), LogLevel::Fatal);

        let err = LogLevel::try_from(5).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid configuration for LogLevel: invalid level: 5"
        );
    }

    #[test]
    fn test_is_critical() {
        assert!(!LogLevel::Warn.is_critical());
        assert!(LogLevel::Error.is_critical());
        assert!(LogLevel::Fatal.is_critical());
    }
}
