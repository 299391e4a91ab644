//! Logger metrics for observability
//!
//! Counts what happened to each logging call: delivered, filtered by
//! level, dropped by sampling, rejected after shutdown, or lost to a
//! failing sink.

use std::sync::atomic::{AtomicU64, Ordering};

/// Metrics for logger observability
///
/// # Example
///
/// ```
/// use rust_log_pipeline::LoggerMetrics;
///
/// let metrics = LoggerMetrics::new();
///
/// metrics.record_logged(3);
/// metrics.record_filtered();
///
/// assert_eq!(metrics.total_logged(), 3);
/// assert_eq!(metrics.filtered_count(), 1);
/// ```
#[derive(Debug)]
pub struct LoggerMetrics {
    /// Entries handed to the sink without error
    total_logged: AtomicU64,

    /// Calls rejected by the level filter
    filtered_count: AtomicU64,

    /// Calls rejected by the sampler
    sampled_out_count: AtomicU64,

    /// Failed sink writes (batches or direct writes)
    sink_errors: AtomicU64,

    /// Fatal entries written on the synchronous path
    fatal_writes: AtomicU64,

    /// Calls made after `stop()`
    rejected_after_stop: AtomicU64,
}

impl LoggerMetrics {
    /// Create a new metrics instance with all counters at zero
    pub const fn new() -> Self {
        Self {
            total_logged: AtomicU64::new(0),
            filtered_count: AtomicU64::new(0),
            sampled_out_count: AtomicU64::new(0),
            sink_errors: AtomicU64::new(0),
            fatal_writes: AtomicU64::new(0),
            rejected_after_stop: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn total_logged(&self) -> u64 {
        self.total_logged.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn filtered_count(&self) -> u64 {
        self.filtered_count.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn sampled_out_count(&self) -> u64 {
        self.sampled_out_count.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn sink_errors(&self) -> u64 {
        self.sink_errors.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn fatal_writes(&self) -> u64 {
        self.fatal_writes.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn rejected_after_stop(&self) -> u64 {
        self.rejected_after_stop.load(Ordering::Relaxed)
    }

    /// Record `count` entries delivered to the sink
    #[inline]
    pub fn record_logged(&self, count: u64) -> u64 {
        self.total_logged.fetch_add(count, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_filtered(&self) -> u64 {
        self.filtered_count.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_sampled_out(&self) -> u64 {
        self.sampled_out_count.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_sink_error(&self) -> u64 {
        self.sink_errors.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_fatal(&self) -> u64 {
        self.fatal_writes.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_rejected(&self) -> u64 {
        self.rejected_after_stop.fetch_add(1, Ordering::Relaxed)
    }

    /// Reset all metrics to zero
    pub fn reset(&self) {
        self.total_logged.store(0, Ordering::Relaxed);
        self.filtered_count.store(0, Ordering::Relaxed);
        self.sampled_out_count.store(0, Ordering::Relaxed);
        self.sink_errors.store(0, Ordering::Relaxed);
        self.fatal_writes.store(0, Ordering::Relaxed);
        self.rejected_after_stop.store(0, Ordering::Relaxed);
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
            filtered_count: AtomicU64::new(self.filtered_count()),
            sampled_out_count: AtomicU64::new(self.sampled_out_count()),
            sink_errors: AtomicU64::new(self.sink_errors()),
            fatal_writes: AtomicU64::new(self.fatal_writes()),
            rejected_after_stop: AtomicU64::new(self.rejected_after_stop()),
        }
    }
}
