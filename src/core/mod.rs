//! Core logger types and traits

pub mod builders;
pub mod call_site;
pub mod error;
pub mod error_trace;
pub mod exit;
pub mod field_value;
pub mod log_context;
pub mod log_entry;
pub mod log_level;
pub mod logger;
pub mod metrics;
pub mod output_format;
pub mod overflow_policy;
pub mod sink;
pub mod timestamp;

pub use call_site::CallSite;
pub use error::{Result, TelemetryError};
pub use error_trace::{ErrorTrace, TraceFrame, MAX_TRACE_DEPTH};
pub use exit::{ExitStrategy, ProcessExit, RecordingExit, FATAL_EXIT_CODE};
pub use field_value::{FieldValue, Fields, LogValue, Loggable, Serialized};
pub use log_context::{ContextFn, FieldRecorder, LogContext};
pub use log_entry::Entry;
pub use log_level::LogLevel;
pub use logger::{Logger, LoggerBuilder, SinkErrorCallback};
pub use metrics::LoggerMetrics;
pub use output_format::OutputFormat;
pub use overflow_policy::{OverflowCallback, OverflowPolicy};
pub use sink::Sink;
pub use timestamp::TimestampFormat;
