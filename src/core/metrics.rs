//! Logger metrics for observability
//!
//! Counters for monitoring logger health: dispatched entries, sink
//! failures, and queue pressure in asynchronous sinks.

use std::sync::atomic::{AtomicU64, Ordering};

/// Metrics for logger observability
///
/// A logger and every logger derived from it share one instance; an
/// [`AsyncSink`](crate::sinks::AsyncSink) keeps its own for queue events.
///
/// # Example
///
/// ```
/// use telemetry_log::LoggerMetrics;
///
/// let metrics = LoggerMetrics::new();
///
/// metrics.record_sink_failure();
/// metrics.record_logged();
///
/// assert_eq!(metrics.sink_failures(), 1);
/// assert_eq!(metrics.total_logged(), 1);
/// ```
#[derive(Debug)]
pub struct LoggerMetrics {
    /// Entries delivered to every sink without error
    total_logged: AtomicU64,

    /// Individual sink calls that returned an error or panicked
    sink_failures: AtomicU64,

    /// Entries discarded because a queue was full
    dropped_count: AtomicU64,

    /// Number of times a queue became full
    queue_full_events: AtomicU64,

    /// Number of times blocking occurred while waiting for queue space
    block_events: AtomicU64,

    /// Number of critical entries written past a full queue
    critical_logs_preserved: AtomicU64,
}

impl LoggerMetrics {
    /// Create a new metrics instance with all counters at zero
    pub const fn new() -> Self {
        Self {
            total_logged: AtomicU64::new(0),
            sink_failures: AtomicU64::new(0),
            dropped_count: AtomicU64::new(0),
            queue_full_events: AtomicU64::new(0),
            block_events: AtomicU64::new(0),
            critical_logs_preserved: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn total_logged(&self) -> u64 {
        self.total_logged.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn sink_failures(&self) -> u64 {
        self.sink_failures.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn dropped_count(&self) -> u64 {
        self.dropped_count.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn queue_full_events(&self) -> u64 {
        self.queue_full_events.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn block_events(&self) -> u64 {
        self.block_events.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn critical_logs_preserved(&self) -> u64 {
        self.critical_logs_preserved.load(Ordering::Relaxed)
    }

    /// Record an entry delivered without error; returns the previous count
    #[inline]
    pub fn record_logged(&self) -> u64 {
        self.total_logged.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_sink_failure(&self) -> u64 {
        self.sink_failures.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_dropped(&self) -> u64 {
        self.dropped_count.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_queue_full(&self) -> u64 {
        self.queue_full_events.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_block(&self) -> u64 {
        self.block_events.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_critical_preserved(&self) -> u64 {
        self.critical_logs_preserved.fetch_add(1, Ordering::Relaxed)
    }

    /// Get drop rate as a percentage (0.0 - 100.0)
    ///
    /// Returns 0.0 if nothing has been processed.
    pub fn drop_rate(&self) -> f64 {
        let dropped = self.dropped_count() as f64;
        let total = self.total_logged() as f64 + dropped;
        if total == 0.0 {
            0.0
        } else {
            (dropped / total) * 100.0
        }
    }

    /// Reset all metrics to zero
    pub fn reset(&self) {
        self.total_logged.store(0, Ordering::Relaxed);
        self.sink_failures.store(0, Ordering::Relaxed);
        self.dropped_count.store(0, Ordering::Relaxed);
        self.queue_full_events.store(0, Ordering::Relaxed);
        self.block_events.store(0, Ordering::Relaxed);
        self.critical_logs_preserved.store(0, Ordering::Relaxed);
    }
}

impl Default for LoggerMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for LoggerMetrics {
    /// Create a snapshot of the current metrics values
    fn clone(&self) -> Self {
        Self {
            total_logged: AtomicU64::new(self.total_logged()),
            sink_failures: AtomicU64::new(self.sink_failures()),
            dropped_count: AtomicU64::new(self.dropped_count()),
            queue_full_events: AtomicU64::new(self.queue_full_events()),
            block_events: AtomicU64::new(self.block_events()),
            critical_logs_preserved: AtomicU64::new(self.critical_logs_preserved()),
        }
    }
}
