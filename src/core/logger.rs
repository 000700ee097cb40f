//! Main logger implementation

use super::{
    builders,
    call_site::CallSite,
    error::{Result, TelemetryError},
    error_trace::ErrorTrace,
    exit::{ExitStrategy, ProcessExit, FATAL_EXIT_CODE},
    field_value::FieldValue,
    log_context::{ContextFn, LogContext},
    log_entry::{Entry, ERROR_KEY, TRACE_KEY},
    log_level::LogLevel,
    metrics::LoggerMetrics,
    output_format::OutputFormat,
    sink::Sink,
};
use crate::sinks::ConsoleSink;
use std::panic::{catch_unwind, AssertUnwindSafe, Location};
use std::sync::Arc;

/// Callback for sink failures: sink name and the error it produced
pub type SinkErrorCallback = Arc<dyn Fn(&str, &TelemetryError) + Send + Sync>;

/// State shared by a logger and everything derived from it
struct Dispatcher {
    sinks: Vec<Arc<dyn Sink>>,
    metrics: LoggerMetrics,
    exit: Arc<dyn ExitStrategy>,
    on_sink_error: Option<SinkErrorCallback>,
}

impl Dispatcher {
    /// Fire every interested sink with per-sink panic isolation.
    ///
    /// One failing sink never keeps the others from receiving the entry.
    fn dispatch(&self, entry: &Entry) {
        let mut has_error = false;

        for sink in &self.sinks {
            if !sink.levels().contains(&entry.level) {
                continue;
            }

            let result = catch_unwind(AssertUnwindSafe(|| sink.fire(entry)));
            match result {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    self.report(sink.name(), e);
                    has_error = true;
                }
                Err(panic_info) => {
                    let panic_msg = panic_message(panic_info);
                    self.report(
                        sink.name(),
                        TelemetryError::sink(sink.name(), format!("panicked: {}", panic_msg)),
                    );
                    has_error = true;
                }
            }
        }

        if !has_error {
            self.metrics.record_logged();
        }
    }

    fn flush_all(&self) -> Result<()> {
        let mut first_error = None;

        for sink in &self.sinks {
            let result = catch_unwind(AssertUnwindSafe(|| sink.flush()));
            let err = match result {
                Ok(Ok(())) => continue,
                Ok(Err(e)) => e,
                Err(panic_info) => TelemetryError::sink(
                    sink.name(),
                    format!("panicked during flush: {}", panic_message(panic_info)),
                ),
            };
            eprintln!("[TELEMETRY ERROR] Sink '{}' flush failed: {}", sink.name(), err);
            first_error.get_or_insert(err);
        }

        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn report(&self, sink: &str, err: TelemetryError) {
        self.metrics.record_sink_failure();
        match self.on_sink_error {
            Some(ref callback) => callback(sink, &err),
            None => eprintln!("[TELEMETRY ERROR] Sink '{}' failed: {}", sink, err),
        }
    }
}

impl Drop for Dispatcher {
    fn drop(&mut self) {
        let _ = self.flush_all();
    }
}

fn panic_message(panic_info: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = panic_info.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic_info.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}

/// Structured logger value.
///
/// A `Logger` is never mutated after construction. `with_ctx`,
/// `with_trace` and `with_fields` return a new logger that shares the sinks
/// and metrics of its parent but owns an extended copy of the base context,
/// so any number of threads can derive from one shared root without locks.
///
/// # Example
///
/// ```
/// use telemetry_log::{ctx, Logger, LogLevel};
///
/// let root = Logger::builder()
///     .level(LogLevel::Debug)
///     .build()
///     .unwrap();
///
/// let request = root.with_ctx(ctx::string("request_id", "abc-123"));
/// request.info("handling request", &[ctx::u64("attempt", 1)]);
/// ```
#[derive(Clone)]
pub struct Logger {
    threshold: LogLevel,
    contexts: Vec<ContextFn>,
    dispatcher: Arc<Dispatcher>,
}

impl Logger {
    /// Logger with default settings: `Info` threshold, text console output
    #[must_use]
    pub fn new() -> Self {
        LoggerBuilder::new().assemble(LogLevel::default())
    }

    /// Create a builder for Logger
    #[must_use]
    pub fn builder() -> LoggerBuilder {
        LoggerBuilder::new()
    }

    pub fn threshold(&self) -> LogLevel {
        self.threshold
    }

    /// Whether an entry at `level` would be emitted
    #[inline]
    pub fn enabled(&self, level: LogLevel) -> bool {
        self.threshold <= level
    }

    /// Evaluate the base context builders into a fresh context
    pub fn base_context(&self) -> LogContext {
        LogContext::from_fns(&self.contexts)
    }

    pub fn sink_count(&self) -> usize {
        self.dispatcher.sinks.len()
    }

    /// Metrics shared by this logger and every logger derived from the same root
    pub fn metrics(&self) -> &LoggerMetrics {
        &self.dispatcher.metrics
    }

    /// Flush every sink, returning the first error after all were tried
    pub fn flush(&self) -> Result<()> {
        self.dispatcher.flush_all()
    }

    /// Log at `level`, recording the caller's file, line and function
    #[track_caller]
    pub fn log(&self, level: LogLevel, message: impl AsRef<str>, additions: &[ContextFn]) {
        if !self.enabled(level) {
            return;
        }

        let site = CallSite::from_location(Location::caller());
        self.emit(level, site, message.as_ref(), additions);
    }

    /// Log with an explicit call site, as the logging macros do
    pub fn log_at(
        &self,
        level: LogLevel,
        site: CallSite,
        message: impl AsRef<str>,
        additions: &[ContextFn],
    ) {
        if !self.enabled(level) {
            return;
        }

        self.emit(level, site, message.as_ref(), additions);
    }

    fn emit(&self, level: LogLevel, site: CallSite, message: &str, additions: &[ContextFn]) {
        let mut context = LogContext::from_fns(self.contexts.iter().chain(additions));
        site.record(&mut context);

        let entry = Entry::new(level, message, context.flatten());
        self.dispatcher.dispatch(&entry);

        if level == LogLevel::Fatal {
            let _ = self.dispatcher.flush_all();
            self.dispatcher.exit.exit(FATAL_EXIT_CODE);
        }
    }

    #[inline]
    #[track_caller]
    pub fn debug(&self, message: impl AsRef<str>, additions: &[ContextFn]) {
        self.log(LogLevel::Debug, message, additions);
    }

    #[inline]
    #[track_caller]
    pub fn info(&self, message: impl AsRef<str>, additions: &[ContextFn]) {
        self.log(LogLevel::Info, message, additions);
    }

    #[inline]
    #[track_caller]
    pub fn warn(&self, message: impl AsRef<str>, additions: &[ContextFn]) {
        self.log(LogLevel::Warn, message, additions);
    }

    #[inline]
    #[track_caller]
    pub fn error(&self, message: impl AsRef<str>, additions: &[ContextFn]) {
        self.log(LogLevel::Error, message, additions);
    }

    /// Log at `Fatal`, flush every sink, then invoke the exit strategy.
    ///
    /// With the default [`ProcessExit`] strategy this does not return.
    #[inline]
    #[track_caller]
    pub fn fatal(&self, message: impl AsRef<str>, additions: &[ContextFn]) {
        self.log(LogLevel::Fatal, message, additions);
    }

    /// New logger whose base context has one more builder
    #[must_use]
    pub fn with_ctx(&self, f: ContextFn) -> Logger {
        let mut derived = self.clone();
        derived.contexts.push(f);
        derived
    }

    /// New logger carrying a stack trace captured at this call.
    ///
    /// The trace is stored under `trace` and the error's message under
    /// `error`. Frames are symbolized the first time an entry from the
    /// derived logger passes the threshold.
    #[inline(never)]
    #[must_use]
    pub fn with_trace<E>(&self, err: &E) -> Logger
    where
        E: std::error::Error + ?Sized,
    {
        let trace = ErrorTrace::capture_skipping(Some(err.to_string()), 1);
        self.with_error_trace(trace)
    }

    /// Like [`Logger::with_trace`]; `None` yields an unchanged copy
    #[inline(never)]
    #[must_use]
    pub fn with_trace_opt<E>(&self, err: Option<&E>) -> Logger
    where
        E: std::error::Error + ?Sized,
    {
        match err {
            Some(err) => {
                let trace = ErrorTrace::capture_skipping(Some(err.to_string()), 1);
                self.with_error_trace(trace)
            }
            None => self.clone(),
        }
    }

    /// New logger carrying an already captured trace
    #[must_use]
    pub fn with_error_trace(&self, trace: ErrorTrace) -> Logger {
        let trace = Arc::new(trace);
        self.with_ctx(ContextFn::new(move |r| {
            if let Some(message) = trace.message() {
                r.error(ERROR_KEY, message);
            }
            r.any(TRACE_KEY, trace.to_json_value());
        }))
    }

    /// New logger with one field per map entry.
    ///
    /// Fields are appended in the map's iteration order. For a `HashMap`
    /// that order is unspecified, so if two keys of the same map collide
    /// after conversion, which one wins is unspecified too.
    #[must_use]
    pub fn with_fields<I, K, V>(&self, fields: I) -> Logger
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<FieldValue>,
    {
        let mut derived = self.clone();
        derived
            .contexts
            .extend(fields.into_iter().map(|(k, v)| builders::value(k, v)));
        derived
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for constructing Logger with a fluent API.
///
/// Every option is recorded as given and validated once in
/// [`LoggerBuilder::build`]; the first invalid option fails the build.
///
/// # Example
/// ```
/// use telemetry_log::prelude::*;
///
/// let logger = Logger::builder()
///     .level_name("warn")
///     .json()
///     .sink(MemorySink::new())
///     .build()
///     .unwrap();
///
/// assert_eq!(logger.threshold(), LogLevel::Warn);
/// ```
pub struct LoggerBuilder {
    level: LogLevel,
    invalid: Option<TelemetryError>,
    sinks: Vec<Arc<dyn Sink>>,
    console: Option<OutputFormat>,
    contexts: Vec<ContextFn>,
    exit: Arc<dyn ExitStrategy>,
    on_sink_error: Option<SinkErrorCallback>,
}

impl LoggerBuilder {
    /// Create a new builder with default values
    pub fn new() -> Self {
        Self {
            level: LogLevel::default(),
            invalid: None,
            sinks: Vec::new(),
            console: Some(OutputFormat::Text),
            contexts: Vec::new(),
            exit: Arc::new(ProcessExit),
            on_sink_error: None,
        }
    }

    fn reject(&mut self, err: TelemetryError) {
        self.invalid.get_or_insert(err);
    }

    /// Set the threshold
    #[must_use = "builder methods return a new value"]
    pub fn level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    /// Set the threshold from its numeric value (0 = debug … 4 = fatal)
    #[must_use = "builder methods return a new value"]
    pub fn level_value(mut self, value: u8) -> Self {
        match LogLevel::try_from(value) {
            Ok(level) => self.level = level,
            Err(e) => self.reject(e),
        }
        self
    }

    /// Set the threshold from a level name, case-insensitive
    #[must_use = "builder methods return a new value"]
    pub fn level_name(mut self, name: &str) -> Self {
        match name.parse() {
            Ok(level) => self.level = level,
            Err(e) => self.reject(e),
        }
        self
    }

    /// Add a sink
    #[must_use = "builder methods return a new value"]
    pub fn sink<S: Sink + 'static>(mut self, sink: S) -> Self {
        self.sinks.push(Arc::new(sink));
        self
    }

    /// Add a sink that is also held elsewhere
    #[must_use = "builder methods return a new value"]
    pub fn shared_sink(mut self, sink: Arc<dyn Sink>) -> Self {
        self.sinks.push(sink);
        self
    }

    /// Write entries to the console in the given format
    #[must_use = "builder methods return a new value"]
    pub fn console(mut self, format: OutputFormat) -> Self {
        self.console = Some(format);
        self
    }

    /// Write console entries as JSON objects
    #[must_use = "builder methods return a new value"]
    pub fn json(self) -> Self {
        self.console(OutputFormat::Json)
    }

    /// Do not write entries to the console
    #[must_use = "builder methods return a new value"]
    pub fn without_console(mut self) -> Self {
        self.console = None;
        self
    }

    /// Base context carried by the root logger
    #[must_use = "builder methods return a new value"]
    pub fn context(mut self, f: ContextFn) -> Self {
        self.contexts.push(f);
        self
    }

    /// Replace process termination on fatal entries
    #[must_use = "builder methods return a new value"]
    pub fn exit_strategy<X: ExitStrategy + 'static>(mut self, exit: X) -> Self {
        self.exit = Arc::new(exit);
        self
    }

    /// Receive sink failures instead of having them printed to stderr
    #[must_use = "builder methods return a new value"]
    pub fn on_sink_error(mut self, callback: SinkErrorCallback) -> Self {
        self.on_sink_error = Some(callback);
        self
    }

    /// Build the Logger, failing on the first invalid option
    pub fn build(mut self) -> Result<Logger> {
        if let Some(err) = self.invalid.take() {
            return Err(err);
        }
        let level = self.level;
        Ok(self.assemble(level))
    }

    fn assemble(self, level: LogLevel) -> Logger {
        let mut sinks = Vec::with_capacity(self.sinks.len() + 1);
        if let Some(format) = self.console {
            sinks.push(Arc::new(ConsoleSink::new().with_output_format(format)) as Arc<dyn Sink>);
        }
        sinks.extend(self.sinks);

        Logger {
            threshold: level,
            contexts: self.contexts,
            dispatcher: Arc::new(Dispatcher {
                sinks,
                metrics: LoggerMetrics::new(),
                exit: self.exit,
                on_sink_error: self.on_sink_error,
            }),
        }
    }
}

impl Default for LoggerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
