//! Logging macros with `format!`-style messages.
//!
//! The macros record the call site at compile time (file, line and the
//! enclosing function's path), so no stack walk is needed to fill `func`.
//! Formatting only happens for entries that pass the logger's threshold.
//!
//! # Examples
//!
//! ```
//! use telemetry_log::prelude::*;
//! use telemetry_log::{error, info};
//!
//! let logger = Logger::builder().without_console().build().unwrap();
//!
//! info!(logger, "Server started");
//!
//! let port = 8080;
//! info!(logger, "listening on port {}", port);
//!
//! // Per-call context goes in brackets before the message
//! error!(logger, [ctx::i64("status", 500)], "request failed after {}ms", 12);
//! ```

/// Log at an explicit level.
///
/// ```
/// # use telemetry_log::prelude::*;
/// # let logger = Logger::builder().without_console().build().unwrap();
/// use telemetry_log::log;
/// log!(logger, LogLevel::Info, "Simple message");
/// log!(logger, LogLevel::Warn, [ctx::bool("retry", true)], "attempt {}", 3);
/// ```
#[macro_export]
macro_rules! log {
    ($logger:expr, $level:expr, [$($ctx:expr),* $(,)?], $($arg:tt)+) => {{
        let logger = &$logger;
        let level = $level;
        if logger.enabled(level) {
            logger.log_at(
                level,
                $crate::CallSite::new(file!(), line!(), $crate::__function_name!()),
                format!($($arg)+),
                &[$($ctx),*],
            );
        }
    }};
    ($logger:expr, $level:expr, $($arg:tt)+) => {
        $crate::log!($logger, $level, [], $($arg)+)
    };
}

/// Log a debug-level message.
///
/// ```
/// # use telemetry_log::prelude::*;
/// # let logger = Logger::builder().level(LogLevel::Debug).without_console().build().unwrap();
/// use telemetry_log::debug;
/// debug!(logger, "Counter value: {}", 10);
/// ```
#[macro_export]
macro_rules! debug {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Debug, $($arg)+)
    };
}

/// Log an info-level message.
#[macro_export]
macro_rules! info {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Info, $($arg)+)
    };
}

/// Log a warning-level message.
#[macro_export]
macro_rules! warn {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Warn, $($arg)+)
    };
}

/// Log an error-level message.
#[macro_export]
macro_rules! error {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Error, $($arg)+)
    };
}

/// Log a fatal message, then flush every sink and run the exit strategy.
///
/// With the default strategy the process exits with status 1.
#[macro_export]
macro_rules! fatal {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Fatal, $($arg)+)
    };
}
