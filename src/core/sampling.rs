//! Per-key log sampling for high-frequency log sites
//!
//! Sampling is deterministic: each key keeps a counter and every
//! `floor(1 / rate)`-th call is admitted. The pattern is reproducible,
//! which keeps tests exact.
//!
//! # Example
//!
//! ```
//! use rust_log_pipeline::Sampler;
//!
//! let sampler = Sampler::new();
//! sampler.set_sample_rate("db.query", 0.5).unwrap();
//!
//! assert!(!sampler.should_sample("db.query")); // call #1
//! assert!(sampler.should_sample("db.query"));  // call #2
//!
//! // Keys without a rate are always admitted
//! assert!(sampler.should_sample("startup"));
//! ```

use super::error::{LoggerError, Result};
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counters are reset once they reach `threshold * COUNTER_RESET_FACTOR`
pub const COUNTER_RESET_FACTOR: u64 = 100;

/// Metrics for sampling observability
///
/// Only calls for keys with a configured rate are counted.
#[derive(Debug)]
pub struct SamplerMetrics {
    /// Number of calls that were admitted
    sampled_count: AtomicU64,

    /// Number of calls rejected by sampling
    dropped_count: AtomicU64,

    /// Total number of calls evaluated
    total_count: AtomicU64,
}

impl SamplerMetrics {
    /// Create new metrics with all counters at zero
    pub const fn new() -> Self {
        Self {
            sampled_count: AtomicU64::new(0),
            dropped_count: AtomicU64::new(0),
            total_count: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn sampled_count(&self) -> u64 {
        self.sampled_count.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn dropped_count(&self) -> u64 {
        self.dropped_count.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn total_count(&self) -> u64 {
        self.total_count.load(Ordering::Relaxed)
    }

    #[inline]
    pub(crate) fn record_sampled(&self) {
        self.sampled_count.fetch_add(1, Ordering::Relaxed);
        self.total_count.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_dropped(&self) {
        self.dropped_count.fetch_add(1, Ordering::Relaxed);
        self.total_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Fraction of evaluated calls that were admitted, 1.0 before any call
    pub fn effective_sample_rate(&self) -> f64 {
        let sampled = self.sampled_count() as f64;
        let total = self.total_count() as f64;

        if total == 0.0 {
            1.0
        } else {
            sampled / total
        }
    }

    /// Reset all counters to zero
    pub fn reset(&self) {
        self.sampled_count.store(0, Ordering::Relaxed);
        self.dropped_count.store(0, Ordering::Relaxed);
        self.total_count.store(0, Ordering::Relaxed);
    }
}

impl Default for SamplerMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for SamplerMetrics {
    fn clone(&self) -> Self {
        Self {
            sampled_count: AtomicU64::new(self.sampled_count()),
            dropped_count: AtomicU64::new(self.dropped_count()),
            total_count: AtomicU64::new(self.total_count()),
        }
    }
}

/// Snapshot of one key's sampling state
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SamplingStats {
    pub rate: f64,
    pub counter: u64,
}

#[derive(Debug, Clone, Copy)]
struct KeyState {
    rate: f64,
    counter: u64,
}

impl KeyState {
    fn new(rate: f64) -> Self {
        Self { rate, counter: 0 }
    }

    /// `floor(1 / rate)`, saturating for very small rates
    fn threshold(&self) -> u64 {
        ((1.0 / self.rate).floor() as u64).max(1)
    }

    fn admit(&mut self) -> bool {
        if self.rate >= 1.0 {
            return true;
        }
        if self.rate <= 0.0 {
            return false;
        }

        let threshold = self.threshold();
        self.counter += 1;
        let admitted = self.counter % threshold == 0;

        if self.counter >= threshold.saturating_mul(COUNTER_RESET_FACTOR) {
            self.counter = 0;
        }

        admitted
    }
}

/// Deterministic per-key sampler
///
/// # Thread Safety
///
/// All keys live behind a single mutex, so each counter increment and
/// admission decision is atomic with respect to other callers.
#[derive(Debug, Default)]
pub struct Sampler {
    keys: Mutex<HashMap<String, KeyState>>,
    metrics: SamplerMetrics,
}

impl Sampler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate a sampling rate without applying it
    pub fn validate_rate(key: &str, rate: f64) -> Result<()> {
        if rate.is_nan() || !(0.0..=1.0).contains(&rate) {
            return Err(LoggerError::config(
                "Sampler",
                format!("rate {} for key '{}' is outside [0, 1]", rate, key),
            ));
        }
        Ok(())
    }

    /// Configure the rate for `key`, resetting its counter.
    ///
    /// Fails with `InvalidConfiguration` when `rate` is not in `[0, 1]`;
    /// the previous rate (or its absence) is left untouched.
    pub fn set_sample_rate(&self, key: impl Into<String>, rate: f64) -> Result<()> {
        let key = key.into();
        Self::validate_rate(&key, rate)?;
        self.keys.lock().insert(key, KeyState::new(rate));
        Ok(())
    }

    /// Remove the rate for `key`; the key is admitted unconditionally afterwards
    pub fn remove_sample_rate(&self, key: &str) -> Option<f64> {
        self.keys.lock().remove(key).map(|state| state.rate)
    }

    pub fn sample_rate(&self, key: &str) -> Option<f64> {
        self.keys.lock().get(key).map(|state| state.rate)
    }

    /// Configured rates by key
    pub fn rates(&self) -> HashMap<String, f64> {
        self.keys
            .lock()
            .iter()
            .map(|(key, state)| (key.clone(), state.rate))
            .collect()
    }

    /// Whether `key` has a configured rate
    pub fn has_rate(&self, key: &str) -> bool {
        self.keys.lock().contains_key(key)
    }

    /// Decide whether this call for `key` is admitted
    pub fn should_sample(&self, key: &str) -> bool {
        let admitted = {
            let mut keys = self.keys.lock();
            match keys.get_mut(key) {
                Some(state) => state.admit(),
                None => return true,
            }
        };

        if admitted {
            self.metrics.record_sampled();
        } else {
            self.metrics.record_dropped();
        }
        admitted
    }

    /// Snapshot of every configured key
    pub fn stats(&self) -> HashMap<String, SamplingStats> {
        self.keys
            .lock()
            .iter()
            .map(|(key, state)| {
                (
                    key.clone(),
                    SamplingStats {
                        rate: state.rate,
                        counter: state.counter,
                    },
                )
            })
            .collect()
    }

    pub fn metrics(&self) -> &SamplerMetrics {
        &self.metrics
    }
}
