//! Asynchronous mirroring sink
//!
//! Entries are queued on a bounded channel and written to the inner sink by
//! a worker thread, so slow destinations (document stores, files) stay off
//! the caller's path.

use crate::core::{
    Entry, LogLevel, LoggerMetrics, OverflowCallback, OverflowPolicy, Result, Sink,
    TelemetryError,
};
use crossbeam_channel::{bounded, Receiver, SendTimeoutError, Sender, TrySendError};
use parking_lot::{Condvar, Mutex};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Default shutdown timeout when the sink is dropped (5 seconds)
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Default queue capacity
pub const DEFAULT_BUFFER_SIZE: usize = 1024;

const BATCH_SIZE: usize = 50;

/// Entries accepted but not yet written by the worker
#[derive(Default)]
struct Pending {
    count: Mutex<usize>,
    drained: Condvar,
}

impl Pending {
    fn add(&self) {
        *self.count.lock() += 1;
    }

    fn done(&self, n: usize) {
        let mut count = self.count.lock();
        *count = count.saturating_sub(n);
        if *count == 0 {
            self.drained.notify_all();
        }
    }

    /// Wait until the queue is drained; false on timeout
    fn wait(&self, timeout: Duration) -> bool {
        let mut count = self.count.lock();
        let deadline = Instant::now() + timeout;
        while *count > 0 {
            if self.drained.wait_until(&mut count, deadline).timed_out() {
                return *count == 0;
            }
        }
        true
    }
}

/// Runs an inner sink on a worker thread behind a bounded queue.
///
/// - Overflow is handled by the configured [`OverflowPolicy`].
/// - Error and Fatal entries are never dropped: when they cannot be queued
///   they are written synchronously.
/// - [`Sink::flush`] waits for the queue to drain, then flushes the inner sink.
/// - Dropping the sink closes the queue and waits up to
///   [`DEFAULT_SHUTDOWN_TIMEOUT`] for the worker.
///
/// ```
/// use telemetry_log::sinks::{AsyncSink, MemorySink};
/// use telemetry_log::{Logger, Sink};
///
/// let inner = MemorySink::new();
/// let logger = Logger::builder()
///     .without_console()
///     .sink(AsyncSink::new(inner.clone()))
///     .build()
///     .unwrap();
///
/// logger.info("queued", &[]);
/// logger.flush().unwrap();
/// assert_eq!(inner.count(), 1);
/// ```
pub struct AsyncSink {
    name: String,
    inner: Arc<dyn Sink>,
    sender: Option<Sender<Entry>>,
    worker: Option<JoinHandle<()>>,
    pending: Arc<Pending>,
    metrics: Arc<LoggerMetrics>,
    overflow_policy: OverflowPolicy,
    on_overflow: Option<OverflowCallback>,
    flush_timeout: Duration,
    /// No worker could be started; entries are written on the caller's thread
    synchronous: bool,
}

impl AsyncSink {
    /// Wrap `inner` with the default buffer size and overflow policy
    pub fn new<S: Sink + 'static>(inner: S) -> Self {
        Self::builder(inner).build()
    }

    pub fn builder<S: Sink + 'static>(inner: S) -> AsyncSinkBuilder {
        AsyncSinkBuilder::new(Arc::new(inner))
    }

    /// Queue metrics: drops, blocking, critical entries written past a full
    /// queue, and the inner sink's failures
    pub fn metrics(&self) -> &LoggerMetrics {
        &self.metrics
    }

    pub fn overflow_policy(&self) -> OverflowPolicy {
        self.overflow_policy
    }

    fn spawn_worker(
        receiver: Receiver<Entry>,
        inner: Arc<dyn Sink>,
        pending: Arc<Pending>,
        metrics: Arc<LoggerMetrics>,
    ) -> std::io::Result<JoinHandle<()>> {
        let thread_name = format!("telemetry-{}", inner.name());
        thread::Builder::new().name(thread_name).spawn(move || {
            let mut batch = Vec::with_capacity(BATCH_SIZE);

            // recv() fails once every sender is gone and the queue is empty
            while let Ok(entry) = receiver.recv() {
                batch.push(entry);
                while batch.len() < BATCH_SIZE {
                    match receiver.try_recv() {
                        Ok(entry) => batch.push(entry),
                        Err(_) => break,
                    }
                }

                for entry in &batch {
                    write_entry(inner.as_ref(), entry, &metrics);
                }
                pending.done(batch.len());
                batch.clear();
            }
        })
    }

    /// Write a critical entry on the caller's thread
    fn force_write_critical(&self, entry: &Entry) -> Result<()> {
        self.metrics.record_critical_preserved();
        self.inner.fire(entry)
    }

    fn handle_overflow(&self, sender: &Sender<Entry>, entry: Entry) -> Result<()> {
        self.metrics.record_queue_full();

        if entry.level.is_critical() {
            self.pending.done(1);
            return self.force_write_critical(&entry);
        }

        match self.overflow_policy {
            OverflowPolicy::DropNewest => {
                self.metrics.record_dropped();
                self.pending.done(1);
            }
            OverflowPolicy::Block => {
                self.metrics.record_block();
                if sender.send(entry).is_err() {
                    self.pending.done(1);
                    return Err(TelemetryError::SinkStopped(self.name.clone()));
                }
            }
            OverflowPolicy::BlockWithTimeout(timeout) => {
                self.metrics.record_block();
                match sender.send_timeout(entry, timeout) {
                    Ok(()) => {}
                    Err(SendTimeoutError::Timeout(_)) => self.alert_and_drop(),
                    Err(SendTimeoutError::Disconnected(_)) => {
                        self.pending.done(1);
                        return Err(TelemetryError::SinkStopped(self.name.clone()));
                    }
                }
            }
            OverflowPolicy::AlertAndDrop => self.alert_and_drop(),
        }
        Ok(())
    }

    fn alert_and_drop(&self) {
        self.pending.done(1);
        let dropped_count = self.metrics.record_dropped();

        // Alert on first drop and periodically thereafter
        let should_alert = dropped_count == 0 || (dropped_count + 1) % 1000 == 0;
        if should_alert {
            eprintln!(
                "[TELEMETRY WARNING] Sink '{}' queue full, {} entries dropped. \
                 Consider increasing the buffer size or using a different overflow policy.",
                self.name,
                dropped_count + 1
            );

            if let Some(ref callback) = self.on_overflow {
                callback(dropped_count + 1);
            }
        }
    }

    /// Close the queue and wait for the worker; false if it did not finish in time
    pub fn shutdown(&mut self, timeout: Duration) -> bool {
        drop(self.sender.take());
        self.synchronous = false;

        let mut finished = true;
        if let Some(handle) = self.worker.take() {
            let start = Instant::now();
            loop {
                if handle.is_finished() {
                    if let Err(e) = handle.join() {
                        eprintln!(
                            "[TELEMETRY ERROR] Sink '{}' worker panicked during shutdown: {:?}",
                            self.name, e
                        );
                        finished = false;
                    }
                    break;
                }

                if start.elapsed() >= timeout {
                    eprintln!(
                        "[TELEMETRY WARNING] Sink '{}' worker did not finish within {:?}. \
                         Some entries may be lost.",
                        self.name, timeout
                    );
                    finished = false;
                    break;
                }

                thread::sleep(Duration::from_millis(10));
            }
        }

        if let Err(e) = self.inner.flush() {
            eprintln!("[TELEMETRY ERROR] Sink '{}' failed to flush during shutdown: {}", self.name, e);
            finished = false;
        }

        finished
    }
}

fn write_entry(inner: &dyn Sink, entry: &Entry, metrics: &LoggerMetrics) {
    match catch_unwind(AssertUnwindSafe(|| inner.fire(entry))) {
        Ok(Ok(())) => {
            metrics.record_logged();
        }
        Ok(Err(e)) => {
            metrics.record_sink_failure();
            eprintln!("[TELEMETRY ERROR] Sink '{}' failed: {}", inner.name(), e);
        }
        Err(_) => {
            metrics.record_sink_failure();
            eprintln!("[TELEMETRY CRITICAL] Sink '{}' panicked", inner.name());
        }
    }
}

impl Sink for AsyncSink {
    fn fire(&self, entry: &Entry) -> Result<()> {
        let sender = match self.sender {
            Some(ref sender) => sender,
            None if self.synchronous => return self.inner.fire(entry),
            None => return Err(TelemetryError::SinkStopped(self.name.clone())),
        };

        self.pending.add();
        match sender.try_send(entry.clone()) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(entry)) => self.handle_overflow(sender, entry),
            Err(TrySendError::Disconnected(_)) => {
                self.pending.done(1);
                Err(TelemetryError::SinkStopped(self.name.clone()))
            }
        }
    }

    fn levels(&self) -> &[LogLevel] {
        self.inner.levels()
    }

    fn flush(&self) -> Result<()> {
        if !self.pending.wait(self.flush_timeout) {
            return Err(TelemetryError::sink(
                self.name.as_str(),
                format!("queue not drained within {:?}", self.flush_timeout),
            ));
        }
        self.inner.flush()
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl Drop for AsyncSink {
    fn drop(&mut self) {
        self.shutdown(DEFAULT_SHUTDOWN_TIMEOUT);

        let dropped = self.metrics.dropped_count();
        if dropped > 0 {
            eprintln!(
                "[TELEMETRY WARNING] Sink '{}' shutting down with {} dropped entries (drop rate: {:.2}%)",
                self.name,
                dropped,
                self.metrics.drop_rate()
            );
        }
    }
}

/// Builder for [`AsyncSink`]
pub struct AsyncSinkBuilder {
    inner: Arc<dyn Sink>,
    buffer_size: usize,
    overflow_policy: OverflowPolicy,
    on_overflow: Option<OverflowCallback>,
    flush_timeout: Duration,
}

impl AsyncSinkBuilder {
    fn new(inner: Arc<dyn Sink>) -> Self {
        Self {
            inner,
            buffer_size: DEFAULT_BUFFER_SIZE,
            overflow_policy: OverflowPolicy::default(),
            on_overflow: None,
            flush_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
        }
    }

    /// Queue capacity; zero is raised to one
    #[must_use = "builder methods return a new value"]
    pub fn buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = size.max(1);
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn overflow_policy(mut self, policy: OverflowPolicy) -> Self {
        self.overflow_policy = policy;
        self
    }

    /// Called with the running drop count when entries are dropped
    #[must_use = "builder methods return a new value"]
    pub fn on_overflow(mut self, callback: OverflowCallback) -> Self {
        self.on_overflow = Some(callback);
        self
    }

    /// Longest time [`Sink::flush`] waits for the queue to drain
    #[must_use = "builder methods return a new value"]
    pub fn flush_timeout(mut self, timeout: Duration) -> Self {
        self.flush_timeout = timeout;
        self
    }

    /// Start the worker thread.
    ///
    /// If the thread cannot be spawned the sink still works, writing every
    /// entry synchronously.
    pub fn build(self) -> AsyncSink {
        let name = format!("async:{}", self.inner.name());
        let pending = Arc::new(Pending::default());
        let metrics = Arc::new(LoggerMetrics::new());
        let (sender, receiver) = bounded(self.buffer_size);

        let spawned = AsyncSink::spawn_worker(
            receiver,
            Arc::clone(&self.inner),
            Arc::clone(&pending),
            Arc::clone(&metrics),
        );

        let (sender, worker) = match spawned {
            Ok(handle) => (Some(sender), Some(handle)),
            Err(e) => {
                eprintln!(
                    "[TELEMETRY ERROR] Sink '{}' could not start its worker, writing synchronously: {}",
                    name, e
                );
                (None, None)
            }
        };
        let synchronous = worker.is_none();

        AsyncSink {
            name,
            inner: self.inner,
            sender,
            worker,
            pending,
            metrics,
            overflow_policy: self.overflow_policy,
            on_overflow: self.on_overflow,
            flush_timeout: self.flush_timeout,
            synchronous,
        }
    }
}
