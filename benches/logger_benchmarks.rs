//! Criterion benchmarks for telemetry_log

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use telemetry_log::prelude::*;
use telemetry_log::{info, CallSite};

/// Sink that discards everything, so only the logger itself is measured
struct NullSink;

impl Sink for NullSink {
    fn fire(&self, entry: &Entry) -> Result<()> {
        black_box(entry);
        Ok(())
    }

    fn name(&self) -> &str {
        "null"
    }
}

fn logger(level: LogLevel) -> Logger {
    Logger::builder()
        .level(level)
        .without_console()
        .sink(NullSink)
        .build()
        .expect("valid logger")
}

// ============================================================================
// Threshold Benchmarks
// ============================================================================

fn bench_suppressed(c: &mut Criterion) {
    let mut group = c.benchmark_group("suppressed");
    group.throughput(Throughput::Elements(1));

    let logger = logger(LogLevel::Error).with_ctx(ctx::string("service", "api"));

    group.bench_function("method", |b| {
        b.iter(|| logger.debug(black_box("hidden"), &[ctx::i64("n", 1)]));
    });

    group.bench_function("macro", |b| {
        b.iter(|| telemetry_log::debug!(logger, "hidden {}", black_box(1)));
    });

    group.finish();
}

// ============================================================================
// Emission Benchmarks
// ============================================================================

fn bench_emitted(c: &mut Criterion) {
    let mut group = c.benchmark_group("emitted");
    group.throughput(Throughput::Elements(1));

    let logger = logger(LogLevel::Debug).with_ctx(ctx::string("service", "api"));

    group.bench_function("macro_call_site", |b| {
        b.iter(|| info!(logger, "request {}", black_box(42)));
    });

    group.bench_function("explicit_call_site", |b| {
        b.iter(|| {
            logger.log_at(
                LogLevel::Info,
                CallSite::new(file!(), line!(), "bench"),
                black_box("request"),
                &[ctx::u64("status", 200)],
            )
        });
    });

    // Function name resolved once per call site, then cached
    group.bench_function("track_caller", |b| {
        b.iter(|| logger.info(black_box("request"), &[]));
    });

    group.finish();
}

// ============================================================================
// Derivation Benchmarks
// ============================================================================

fn bench_derivation(c: &mut Criterion) {
    let mut group = c.benchmark_group("derivation");

    let root = logger(LogLevel::Info);
    let deep = (0..16).fold(root.clone(), |l, i| l.with_ctx(ctx::i64(format!("k{}", i), i)));

    group.bench_function("with_ctx_shallow", |b| {
        b.iter(|| black_box(root.with_ctx(ctx::bool("flag", true))));
    });

    group.bench_function("with_ctx_deep", |b| {
        b.iter(|| black_box(deep.with_ctx(ctx::bool("flag", true))));
    });

    group.bench_function("flatten_deep", |b| {
        b.iter(|| black_box(deep.base_context().flatten()));
    });

    group.finish();
}

// ============================================================================
// Trace Benchmarks
// ============================================================================

#[derive(Debug)]
struct Failure;

impl std::fmt::Display for Failure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "failure")
    }
}

impl std::error::Error for Failure {}

fn bench_trace(c: &mut Criterion) {
    let mut group = c.benchmark_group("trace");

    group.bench_function("capture", |b| {
        b.iter(|| black_box(ErrorTrace::wrap(&Failure)));
    });

    group.bench_function("capture_and_print", |b| {
        b.iter(|| black_box(ErrorTrace::wrap(&Failure).print()));
    });

    let trace = ErrorTrace::wrap(&Failure);
    let _ = trace.print();
    group.bench_function("print_cached", |b| {
        b.iter(|| black_box(trace.print()));
    });

    let root = logger(LogLevel::Error);
    group.bench_function("with_trace_suppressed", |b| {
        b.iter(|| root.with_trace(&Failure).info("hidden", &[]));
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_suppressed,
    bench_emitted,
    bench_derivation,
    bench_trace,
);

criterion_main!(benches);
