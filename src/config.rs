//! Telemetry configuration loaded from named parameters.
//!
//! # Supported variables
//!
//! | Variable | Type | Default |
//! |----------|------|---------|
//! | `TELEMETRY_LOG_LEVEL` | level name | `debug` |
//! | `TELEMETRY_JSON_FORMAT` | `bool` | `false` |
//! | `TELEMETRY_WITH_HOOK` | `bool` | `false` |
//! | `TELEMETRY_STORE_DIR` | path | `data` |
//! | `TELEMETRY_ASYNC_BUFFER` | `usize` | `1024` |
//!
//! Booleans accept `true|1|yes|on` and `false|0|no|off`, case-insensitive.

use crate::core::{LogLevel, Result, TelemetryError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

pub const ENV_LOG_LEVEL: &str = "TELEMETRY_LOG_LEVEL";
pub const ENV_JSON_FORMAT: &str = "TELEMETRY_JSON_FORMAT";
pub const ENV_WITH_HOOK: &str = "TELEMETRY_WITH_HOOK";
pub const ENV_STORE_DIR: &str = "TELEMETRY_STORE_DIR";
pub const ENV_ASYNC_BUFFER: &str = "TELEMETRY_ASYNC_BUFFER";

/// Where named configuration values come from
pub trait ConfigSource {
    fn get(&self, name: &str) -> Option<String>;
}

/// The process environment
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvSource;

impl ConfigSource for EnvSource {
    fn get(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

/// Fixed set of values, mostly for tests
#[derive(Debug, Clone, Default)]
pub struct MapSource {
    values: HashMap<String, String>,
}

impl MapSource {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for MapSource {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl ConfigSource for MapSource {
    fn get(&self, name: &str) -> Option<String> {
        self.values.get(name).cloned()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Threshold name
    pub level: String,
    /// Console lines as JSON instead of text
    pub json_format: bool,
    /// Persist error entries with their traces
    pub with_hook: bool,
    /// Root directory of the document store
    pub store_dir: PathBuf,
    /// Queue capacity of the asynchronous store writer
    pub async_buffer: usize,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            level: "debug".to_string(),
            json_format: false,
            with_hook: false,
            store_dir: PathBuf::from("data"),
            async_buffer: 1024,
        }
    }
}

impl TelemetryConfig {
    /// Defaults overridden by the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_source(&EnvSource)
    }

    /// Defaults overridden by whatever `source` provides.
    ///
    /// Unset values keep their defaults; a value that is set but does not
    /// parse is an error.
    pub fn from_source(source: &dyn ConfigSource) -> Result<Self> {
        let mut config = Self::default();

        if let Some(val) = source.get(ENV_LOG_LEVEL) {
            config.level = val.trim().to_string();
        }
        if let Some(val) = source.get(ENV_JSON_FORMAT) {
            config.json_format = parse_bool(ENV_JSON_FORMAT, &val)?;
        }
        if let Some(val) = source.get(ENV_WITH_HOOK) {
            config.with_hook = parse_bool(ENV_WITH_HOOK, &val)?;
        }
        if let Some(val) = source.get(ENV_STORE_DIR) {
            config.store_dir = PathBuf::from(val.trim());
        }
        if let Some(val) = source.get(ENV_ASYNC_BUFFER) {
            config.async_buffer = parse_usize(ENV_ASYNC_BUFFER, &val)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Parsed threshold
    pub fn log_level(&self) -> Result<LogLevel> {
        self.level.parse()
    }

    pub fn validate(&self) -> Result<()> {
        self.log_level()?;
        if self.async_buffer == 0 {
            return Err(TelemetryError::config(
                ENV_ASYNC_BUFFER,
                "buffer size must be greater than zero",
            ));
        }
        Ok(())
    }
}

fn parse_usize(var_name: &str, val: &str) -> Result<usize> {
    val.trim().parse::<usize>().map_err(|e| {
        TelemetryError::config(
            var_name,
            format!("expected unsigned integer, got {val:?} ({e})"),
        )
    })
}

fn parse_bool(var_name: &str, val: &str) -> Result<bool> {
    match val.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(TelemetryError::config(
            var_name,
            format!("expected boolean (true/false/1/0/yes/no/on/off), got {val:?}"),
        )),
    }
}
