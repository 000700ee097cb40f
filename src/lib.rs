//! # Telemetry Log
//!
//! Structured logging with lazily evaluated field context, error stack
//! traces, and pluggable sinks.
//!
//! ## Features
//!
//! - **Immutable loggers**: `with_ctx`, `with_trace` and `with_fields` derive
//!   new loggers; a shared root never changes
//! - **Lazy fields**: context builders only run for entries that pass the
//!   threshold
//! - **Error traces**: stacks are captured cheaply and symbolized on first use
//! - **Sinks**: console, asynchronous mirroring, and document persistence
//!
//! ```
//! use telemetry_log::prelude::*;
//!
//! let sink = MemorySink::new();
//! let logger = Logger::builder()
//!     .level(LogLevel::Debug)
//!     .without_console()
//!     .sink(sink.clone())
//!     .build()
//!     .unwrap();
//!
//! let request = logger.with_ctx(ctx::string("request_id", "r-1"));
//! request.debug("parsing body", &[ctx::u64("bytes", 512)]);
//!
//! let entry = sink.last().unwrap();
//! assert_eq!(entry.field("bytes"), Some(&FieldValue::Uint(512)));
//! ```

pub mod config;
pub mod core;
pub mod macros;
pub mod sinks;
pub mod telemetry;

pub use crate::core::builders as ctx;

pub mod prelude {
    pub use crate::core::builders as ctx;
    pub use crate::core::{
        ContextFn, Entry, ErrorTrace, FieldValue, Loggable, LogLevel, Logger, LoggerBuilder,
        OutputFormat, Result, Serialized, Sink, TelemetryError,
    };
    pub use crate::sinks::{AsyncSink, ConsoleSink, MemorySink, StoreSink};
    pub use crate::telemetry::{Telemetry, TelemetryBuilder};
}

pub use crate::core::{
    CallSite, ContextFn, Entry, ErrorTrace, ExitStrategy, FieldRecorder, FieldValue, Fields,
    LogContext, LogLevel, LogValue, Loggable, Logger, LoggerBuilder, LoggerMetrics, OutputFormat,
    OverflowCallback, OverflowPolicy, ProcessExit, RecordingExit, Result, Serialized, Sink,
    SinkErrorCallback, TelemetryError, TimestampFormat, TraceFrame, FATAL_EXIT_CODE,
    MAX_TRACE_DEPTH,
};
pub use crate::telemetry::{Telemetry, TelemetryBuilder};
