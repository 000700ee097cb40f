//! Integration tests for the telemetry logger
//!
//! These tests verify:
//! - Threshold filtering and lazy field evaluation
//! - Derivation without affecting the parent logger
//! - Error traces on derived loggers
//! - Sink isolation and level filtering
//! - Fatal handling through the exit strategy
//! - Persistence into memory and directory stores

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use telemetry_log::config::{MapSource, ENV_LOG_LEVEL, ENV_STORE_DIR, ENV_WITH_HOOK};
use telemetry_log::sinks::{
    AsyncSink, JsonlStore, MemorySink, MemoryStore, StoreSink, LOG_COLLECTION, TRACE_COLLECTION,
};
use telemetry_log::{
    ctx, Entry, ErrorTrace, FieldValue, LogLevel, Logger, RecordingExit, Result, Sink, Telemetry,
    TelemetryError,
};
use tempfile::TempDir;

#[derive(Debug)]
struct Boom;

impl std::fmt::Display for Boom {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "boom")
    }
}

impl std::error::Error for Boom {}

/// Counts calls without keeping entries
#[derive(Clone, Default)]
struct CountingSink {
    calls: Arc<AtomicUsize>,
}

impl Sink for CountingSink {
    fn fire(&self, _entry: &Entry) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn name(&self) -> &str {
        "counting"
    }
}

fn quiet_logger(level: LogLevel, sink: &MemorySink) -> Logger {
    Logger::builder()
        .level(level)
        .without_console()
        .sink(sink.clone())
        .build()
        .expect("valid logger")
}

#[test]
fn test_threshold_info_filters_debug() {
    let first = CountingSink::default();
    let second = MemorySink::new();
    let logger = Logger::builder()
        .level(LogLevel::Info)
        .without_console()
        .sink(first.clone())
        .sink(second.clone())
        .build()
        .unwrap();

    logger.debug("x", &[]);
    assert_eq!(first.calls.load(Ordering::SeqCst), 0);
    assert_eq!(second.count(), 0);

    logger.info("y", &[]);
    assert_eq!(first.calls.load(Ordering::SeqCst), 1);
    assert_eq!(second.count(), 1);

    let entry = second.last().unwrap();
    assert_eq!(entry.message, "y");
    assert!(entry
        .func()
        .unwrap()
        .contains("test_threshold_info_filters_debug"));
}

#[test]
fn test_builders_skipped_below_threshold() {
    let evaluated = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&evaluated);
    let sink = MemorySink::new();
    let logger = quiet_logger(LogLevel::Warn, &sink).with_ctx(ctx::from_fn(move |r| {
        counter.fetch_add(1, Ordering::SeqCst);
        r.string("expensive", "value");
    }));

    for _ in 0..10 {
        logger.debug("hidden", &[]);
        logger.info("hidden", &[]);
    }
    assert_eq!(evaluated.load(Ordering::SeqCst), 0);

    logger.warn("shown", &[]);
    assert_eq!(evaluated.load(Ordering::SeqCst), 1);
}

#[test]
fn test_derivation_leaves_parent_unchanged() {
    let sink = MemorySink::new();
    let root = quiet_logger(LogLevel::Debug, &sink);
    let child = root
        .with_ctx(ctx::string("service", "billing"))
        .with_ctx(ctx::i64("shard", 3));

    root.info("from root", &[]);
    child.info("from child", &[]);

    let entries = sink.entries();
    assert!(entries[0].field("service").is_none());
    assert_eq!(
        entries[1].field("service"),
        Some(&FieldValue::String("billing".into()))
    );
    assert_eq!(entries[1].field("shard"), Some(&FieldValue::Int(3)));
    assert!(root.base_context().is_empty());
    assert_eq!(child.base_context().len(), 2);
}

#[test]
fn test_last_write_wins_across_layers() {
    let sink = MemorySink::new();
    let logger = quiet_logger(LogLevel::Info, &sink)
        .with_ctx(ctx::i64("a", 1))
        .with_ctx(ctx::i64("a", 2));

    logger.info("base only", &[]);
    logger.info("call override", &[ctx::i64("a", 3)]);

    let entries = sink.entries();
    assert_eq!(entries[0].field("a"), Some(&FieldValue::Int(2)));
    assert_eq!(entries[1].field("a"), Some(&FieldValue::Int(3)));
}

#[test]
fn test_with_trace_adds_ordered_frames() {
    let sink = MemorySink::new();
    let logger = quiet_logger(LogLevel::Info, &sink);

    logger.with_trace(&Boom).error("failed", &[]);
    logger.error("untraced", &[]);

    let entries = sink.entries();
    let frames = match entries[0].trace() {
        Some(FieldValue::Any(serde_json::Value::Array(frames))) => frames.clone(),
        other => panic!("expected trace frames, got {:?}", other),
    };
    assert!(!frames.is_empty());
    assert!(frames[0]["name"]
        .as_str()
        .unwrap()
        .contains("test_with_trace_adds_ordered_frames"));
    assert_eq!(entries[0].field("error"), Some(&FieldValue::Error("boom".into())));
    assert!(entries[1].trace().is_none());
}

#[test]
fn test_with_trace_opt_none() {
    let sink = MemorySink::new();
    let logger = quiet_logger(LogLevel::Info, &sink);

    logger.with_trace_opt(None::<&Boom>).error("no trace", &[]);
    logger.with_trace_opt(Some(&Boom)).error("trace", &[]);

    let entries = sink.entries();
    assert!(entries[0].trace().is_none());
    assert!(entries[1].trace().is_some());
}

#[test]
fn test_with_fields_from_map() {
    let sink = MemorySink::new();
    let mut fields = HashMap::new();
    fields.insert("region".to_string(), serde_json::json!("eu-west-1"));
    fields.insert("replicas".to_string(), serde_json::json!(3));

    let logger = quiet_logger(LogLevel::Info, &sink).with_fields(fields);
    logger.info("deployed", &[]);

    let entry = sink.last().unwrap();
    assert_eq!(
        entry.field("region"),
        Some(&FieldValue::Any(serde_json::json!("eu-west-1")))
    );
    assert_eq!(
        entry.field("replicas").map(FieldValue::to_json_value),
        Some(serde_json::json!(3))
    );
}

#[test]
fn test_error_trace_print_is_stable() {
    let trace = ErrorTrace::wrap(&Boom);
    let first = trace.print();
    let second = trace.print();

    assert_eq!(first, second);
    assert!(!first.is_empty());
    assert!(first.len() <= telemetry_log::MAX_TRACE_DEPTH);
}

#[test]
fn test_level_validation() {
    let err = Logger::builder().level_value(5).build().err().unwrap();
    assert!(matches!(err, TelemetryError::InvalidConfiguration { .. }));

    for name in ["debug", "INFO", "Warn", "error", "fatal"] {
        assert!(Logger::builder().level_name(name).build().is_ok(), "{}", name);
    }
    for name in ["warning", "trace", "critical"] {
        assert!(Logger::builder().level_name(name).build().is_err(), "{}", name);
    }
}

#[test]
fn test_failing_sink_is_isolated() {
    struct Broken;
    impl Sink for Broken {
        fn fire(&self, _entry: &Entry) -> Result<()> {
            Err(TelemetryError::store("application_log", "connection refused"))
        }
        fn name(&self) -> &str {
            "broken"
        }
    }

    let sink = MemorySink::new();
    let logger = Logger::builder()
        .without_console()
        .sink(Broken)
        .sink(sink.clone())
        .on_sink_error(Arc::new(|_, _| {}))
        .build()
        .unwrap();

    logger.info("one", &[]);
    logger.warn("two", &[]);

    assert_eq!(sink.count(), 2);
    assert_eq!(logger.metrics().sink_failures(), 2);
}

#[test]
fn test_fatal_fires_flushes_and_exits() {
    let sink = MemorySink::new();
    let exit = RecordingExit::new();
    let logger = Logger::builder()
        .without_console()
        .sink(sink.clone())
        .exit_strategy(exit.clone())
        .build()
        .unwrap();

    logger.fatal("giving up", &[ctx::string("reason", "corrupt state")]);

    assert_eq!(sink.count(), 1);
    assert!(sink.flush_count() >= 1);
    assert_eq!(exit.codes(), vec![telemetry_log::FATAL_EXIT_CODE]);
}

#[test]
fn test_store_sink_routes_by_level() {
    let store = Arc::new(MemoryStore::new());
    let logger = Logger::builder()
        .without_console()
        .sink(StoreSink::new(Arc::clone(&store)).with_trace(true))
        .build()
        .unwrap();

    logger.info("plain", &[]);
    logger.with_trace(&Boom).error("traced", &[]);

    let logs = store.documents(LOG_COLLECTION);
    let traces = store.documents(TRACE_COLLECTION);
    assert_eq!(logs.len(), 1);
    assert_eq!(traces.len(), 1);
    assert!(logs[0]["file"]
        .as_str()
        .unwrap()
        .starts_with("integration_tests.rs:"));
    assert_eq!(traces[0]["level"], "error");
    assert!(traces[0]["trace"].as_array().map_or(false, |t| !t.is_empty()));
}

#[test]
fn test_async_store_into_directory() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let store = Arc::new(JsonlStore::open(temp_dir.path()).unwrap());

    let logger = Logger::builder()
        .without_console()
        .sink(AsyncSink::new(StoreSink::new(Arc::clone(&store))))
        .build()
        .unwrap();

    for i in 0..25 {
        logger.info(format!("entry {}", i), &[]);
    }
    logger.flush().unwrap();

    assert_eq!(store.read(LOG_COLLECTION).unwrap().len(), 25);
}

#[test]
fn test_telemetry_from_config_source() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let source = MapSource::new()
        .with(ENV_LOG_LEVEL, "info")
        .with(ENV_WITH_HOOK, "true")
        .with(ENV_STORE_DIR, temp_dir.path().to_string_lossy());

    let telemetry = Telemetry::builder()
        .config_source(source)
        .without_console()
        .build()
        .unwrap();

    telemetry.log().debug("below threshold", &[]);
    telemetry.log().info("kept", &[]);
    telemetry
        .log()
        .with_trace(&Boom)
        .error("internal error", &[]);
    telemetry.flush().unwrap();

    let store = JsonlStore::open(temp_dir.path()).unwrap();
    assert_eq!(store.read(LOG_COLLECTION).unwrap().len(), 1);
    assert_eq!(store.read(TRACE_COLLECTION).unwrap().len(), 1);
}

#[test]
fn test_level_filtering_per_sink() {
    let all = MemorySink::new();
    let errors = MemorySink::with_levels(&[LogLevel::Error]);
    let logger = Logger::builder()
        .level(LogLevel::Debug)
        .without_console()
        .sink(all.clone())
        .sink(errors.clone())
        .build()
        .unwrap();

    for level in LogLevel::ALL.iter().copied().filter(|l| *l != LogLevel::Fatal) {
        logger.log(level, level.to_str(), &[]);
    }

    assert_eq!(all.count(), 4);
    assert_eq!(errors.count(), 1);
}
