//! Main logger implementation
//!
//! A call flows through the level filter, the sampler (when the call has a
//! label with a configured rate) and the redactor, then either into the
//! buffer or, for fatal entries and unbuffered loggers, straight to the
//! appenders.

use super::{
    appender::Appender,
    buffer::{BufferConfig, BufferStats, FlushHandler, LogBuffer},
    error::{LoggerError, Result},
    level_filter::LevelFilter,
    log_entry::LogEntry,
    log_level::LogLevel,
    metrics::LoggerMetrics,
    redaction::{Redactor, RedactorConfig, SensitiveFields},
    sampling::{Sampler, SamplingStats},
    sink::Sink,
    value::{Array, Object, Value},
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Environment variable read by [`LoggerBuilder::with_env_overrides`]
pub const LOG_LEVEL_ENV: &str = "LOG_LEVEL";

/// Anything that can be logged as a payload
pub trait IntoPayload {
    fn into_payload(self) -> Vec<Value>;
}

impl IntoPayload for Vec<Value> {
    fn into_payload(self) -> Vec<Value> {
        self
    }
}

impl IntoPayload for &[Value] {
    fn into_payload(self) -> Vec<Value> {
        self.to_vec()
    }
}

impl<const N: usize> IntoPayload for [Value; N] {
    fn into_payload(self) -> Vec<Value> {
        self.into()
    }
}

impl IntoPayload for Value {
    fn into_payload(self) -> Vec<Value> {
        vec![self]
    }
}

impl IntoPayload for &str {
    fn into_payload(self) -> Vec<Value> {
        vec![Value::from(self)]
    }
}

impl IntoPayload for String {
    fn into_payload(self) -> Vec<Value> {
        vec![Value::String(self)]
    }
}

impl IntoPayload for &String {
    fn into_payload(self) -> Vec<Value> {
        vec![Value::String(self.clone())]
    }
}

impl IntoPayload for Object {
    fn into_payload(self) -> Vec<Value> {
        vec![Value::Object(self)]
    }
}

impl IntoPayload for Array {
    fn into_payload(self) -> Vec<Value> {
        vec![Value::Array(self)]
    }
}

impl<A: Into<Value>, B: Into<Value>> IntoPayload for (A, B) {
    fn into_payload(self) -> Vec<Value> {
        vec![self.0.into(), self.1.into()]
    }
}

impl<A: Into<Value>, B: Into<Value>, C: Into<Value>> IntoPayload for (A, B, C) {
    fn into_payload(self) -> Vec<Value> {
        vec![self.0.into(), self.1.into(), self.2.into()]
    }
}

/// Point-in-time view of the whole pipeline
#[derive(Debug, Clone)]
pub struct LoggerStats {
    pub buffer: BufferStats,
    pub sampling: HashMap<String, SamplingStats>,
    pub min_level: LogLevel,
    pub metrics: LoggerMetrics,
}

/// Structured logger
///
/// `Logger` is `Send + Sync`; share it across threads with `Arc<Logger>`.
/// Logging calls never return errors: sink failures are reported on stderr
/// and counted in [`LoggerMetrics`].
///
/// # Example
///
/// ```
/// use rust_log_pipeline::prelude::*;
///
/// let logger = Logger::builder()
///     .min_level(LogLevel::Debug)
///     .sampling("heartbeat", 0.1)
///     .build();
///
/// logger.info("service started");
/// logger.log(LogLevel::Debug, Some("heartbeat"), "tick");
/// logger.warning(("login", Object::new().with("user", "ada").with("password", "hunter22")));
///
/// logger.stop().unwrap();
/// ```
pub struct Logger {
    level_filter: LevelFilter,
    sampler: Sampler,
    redactor: Redactor,
    sink: Sink,
    buffer: LogBuffer,
    metrics: Arc<LoggerMetrics>,
    stopped: AtomicBool,
}

impl Logger {
    /// A logger with default settings and no appenders; entries go to stderr
    #[must_use]
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Create a builder for Logger
    ///
    /// # Example
    /// ```
    /// use rust_log_pipeline::prelude::*;
    ///
    /// let logger = Logger::builder()
    ///     .min_level(LogLevel::Debug)
    ///     .buffering(BufferConfig::default().with_max_entries(1000))
    ///     .build();
    /// ```
    #[must_use]
    pub fn builder() -> LoggerBuilder {
        LoggerBuilder::new()
    }

    /// Unbuffered logger writing to the console only.
    ///
    /// Used when a configured logger cannot be built. Construction spawns
    /// no threads and cannot fail.
    #[must_use]
    pub fn degraded() -> Self {
        let sink = Sink::default();
        #[cfg(feature = "console")]
        sink.add_appender(Box::new(crate::appenders::ConsoleAppender::new()));

        let metrics = Arc::new(LoggerMetrics::new());
        let buffer = LogBuffer::unbuffered(Some(flush_handler(sink.clone(), Arc::clone(&metrics))));

        Self {
            level_filter: LevelFilter::default(),
            sampler: Sampler::new(),
            redactor: Redactor::new(SensitiveFields::with_defaults()),
            sink,
            buffer,
            metrics,
            stopped: AtomicBool::new(false),
        }
    }

    /// Add an appender; it receives every entry written from now on
    pub fn add_appender(&self, appender: Box<dyn Appender>) {
        self.sink.add_appender(appender);
    }

    pub fn set_min_level(&self, level: LogLevel) {
        self.level_filter.set_min_level(level);
    }

    pub fn min_level(&self) -> LogLevel {
        self.level_filter.min_level()
    }

    /// Whether a call at `level` would pass the level filter
    #[inline]
    pub fn is_enabled(&self, level: LogLevel) -> bool {
        self.level_filter.should_log(level)
    }

    /// Set the sampling rate for calls labelled `key`
    pub fn configure_sampling(&self, key: impl Into<String>, rate: f64) -> Result<()> {
        self.sampler.set_sample_rate(key, rate)
    }

    /// Stop sampling calls labelled `key`
    pub fn remove_sampling(&self, key: &str) -> Option<f64> {
        self.sampler.remove_sample_rate(key)
    }

    pub fn configure_buffering(&self, config: BufferConfig) -> Result<()> {
        self.buffer.reconfigure(config)
    }

    pub fn buffer_config(&self) -> BufferConfig {
        self.buffer.config()
    }

    /// Replace the set of field names whose values are masked
    pub fn set_sensitive_fields<I, S>(&self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.redactor.fields().replace(names);
    }

    /// Shared handle to the sensitive field set
    pub fn sensitive_fields(&self) -> &SensitiveFields {
        self.redactor.fields()
    }

    pub fn metrics(&self) -> &LoggerMetrics {
        &self.metrics
    }

    pub fn stats(&self) -> LoggerStats {
        LoggerStats {
            buffer: self.buffer.stats(),
            sampling: self.sampler.stats(),
            min_level: self.level_filter.min_level(),
            metrics: (*self.metrics).clone(),
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }

    /// Log `payload` at `level`. The label names the call site and is the
    /// sampling key.
    pub fn log(&self, level: LogLevel, label: Option<&str>, payload: impl IntoPayload) {
        if !self.level_filter.should_log(level) {
            self.metrics.record_filtered();
            return;
        }

        if let Some(key) = label {
            if !self.sampler.should_sample(key) {
                self.metrics.record_sampled_out();
                return;
            }
        }

        if self.is_stopped() {
            self.metrics.record_rejected();
            return;
        }

        let payload = self.redactor.redact_all(&payload.into_payload());
        let mut entry = LogEntry::new(level, payload);
        if let Some(label) = label {
            entry = entry.with_label(label);
        }

        if level == LogLevel::Fatal {
            self.write_fatal(entry);
        } else if !self.buffer.is_enabled() {
            self.write_direct(&[entry]);
        } else if !self.buffer.add_entry(entry) {
            // Lost a race with stop()
            self.metrics.record_rejected();
        }
    }

    /// Log at the level named by `level_or_label`, or at info with it as the
    /// label when it is not a level name
    pub fn log_as(&self, level_or_label: &str, payload: impl IntoPayload) {
        match level_or_label.parse::<LogLevel>() {
            Ok(level) => self.log(level, None, payload),
            Err(_) => self.log(LogLevel::Info, Some(level_or_label), payload),
        }
    }

    #[inline]
    pub fn debug(&self, payload: impl IntoPayload) {
        self.log(LogLevel::Debug, None, payload);
    }

    #[inline]
    pub fn info(&self, payload: impl IntoPayload) {
        self.log(LogLevel::Info, None, payload);
    }

    #[inline]
    pub fn warning(&self, payload: impl IntoPayload) {
        self.log(LogLevel::Warning, None, payload);
    }

    #[inline]
    pub fn error(&self, payload: impl IntoPayload) {
        self.log(LogLevel::Error, None, payload);
    }

    /// Log synchronously, after delivering everything already buffered
    #[inline]
    pub fn fatal(&self, payload: impl IntoPayload) {
        self.log(LogLevel::Fatal, None, payload);
    }

    fn write_fatal(&self, entry: LogEntry) {
        // Older entries reach the sink before the fatal one
        self.buffer.flush();
        self.metrics.record_fatal();
        self.write_direct(std::slice::from_ref(&entry));
    }

    fn write_direct(&self, entries: &[LogEntry]) {
        match self.sink.write_batch(entries) {
            Ok(()) => {
                self.metrics.record_logged(entries.len() as u64);
            }
            Err(e) => {
                self.metrics.record_sink_error();
                eprintln!("[LOGGER ERROR] Direct write failed: {}", e);
            }
        }
    }

    /// Deliver buffered entries and flush every appender
    pub fn flush(&self) -> Result<()> {
        self.buffer.flush();
        self.sink.flush()
    }

    /// Drain the buffer, stop the flush worker and flush every appender.
    ///
    /// Later logging calls are rejected. Calling `stop` again is a no-op.
    pub fn stop(&self) -> Result<()> {
        if self.stopped.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        self.buffer.stop();
        self.sink.flush()
    }
}

#[cfg(feature = "async")]
impl Logger {
    /// [`Logger::flush`] on tokio's blocking pool
    pub async fn flush_async(self: Arc<Self>) -> Result<()> {
        tokio::task::spawn_blocking(move || self.flush())
            .await
            .map_err(|e| LoggerError::other(format!("flush task failed: {}", e)))?
    }

    /// [`Logger::stop`] on tokio's blocking pool
    pub async fn stop_async(self: Arc<Self>) -> Result<()> {
        tokio::task::spawn_blocking(move || self.stop())
            .await
            .map_err(|e| LoggerError::other(format!("stop task failed: {}", e)))?
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Logger {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            eprintln!("[LOGGER ERROR] Failed to flush during shutdown: {}", e);
        }

        let sink_errors = self.metrics.sink_errors();
        if sink_errors > 0 {
            eprintln!(
                "[LOGGER WARNING] Logger shutting down after {} failed sink writes",
                sink_errors
            );
        }
    }
}

impl std::fmt::Debug for Logger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Logger")
            .field("min_level", &self.min_level())
            .field("sink", &self.sink)
            .field("buffer", &self.buffer)
            .field("stopped", &self.is_stopped())
            .finish()
    }
}

fn flush_handler(sink: Sink, metrics: Arc<LoggerMetrics>) -> FlushHandler {
    Arc::new(move |batch: &[LogEntry]| match sink.write_batch(batch) {
        Ok(()) => {
            metrics.record_logged(batch.len() as u64);
            Ok(())
        }
        Err(e) => {
            metrics.record_sink_error();
            Err(e)
        }
    })
}

/// Builder for constructing Logger with a fluent API
///
/// # Example
/// ```
/// use rust_log_pipeline::prelude::*;
///
/// let logger = Logger::builder()
///     .min_level(LogLevel::Debug)
///     .buffering(
///         BufferConfig::default()
///             .with_max_entries(50)
///             .with_immediate_flush_level(LogLevel::Warning),
///     )
///     .sampling("poll", 0.01)
///     .sensitive_fields(["password", "ssn"])
///     .try_build()
///     .unwrap();
/// ```
pub struct LoggerBuilder {
    min_level: LogLevel,
    appenders: Vec<Box<dyn Appender>>,
    buffering: BufferConfig,
    sampling: Vec<(String, f64)>,
    sensitive_fields: Option<Vec<String>>,
    redactor_config: RedactorConfig,
    env_error: Option<LoggerError>,
}

impl LoggerBuilder {
    /// Create a new builder with default values
    pub fn new() -> Self {
        Self {
            min_level: LogLevel::Info,
            appenders: Vec::new(),
            buffering: BufferConfig::default(),
            sampling: Vec::new(),
            sensitive_fields: None,
            redactor_config: RedactorConfig::default(),
            env_error: None,
        }
    }

    /// Set minimum log level
    #[must_use = "builder methods return a new value"]
    pub fn min_level(mut self, level: LogLevel) -> Self {
        self.min_level = level;
        self
    }

    /// Add an appender
    #[must_use = "builder methods return a new value"]
    pub fn appender<A: Appender + 'static>(mut self, appender: A) -> Self {
        self.appenders.push(Box::new(appender));
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn buffering(mut self, config: BufferConfig) -> Self {
        self.buffering = config;
        self
    }

    /// Sample calls labelled `key` at `rate`; validated at build time
    #[must_use = "builder methods return a new value"]
    pub fn sampling(mut self, key: impl Into<String>, rate: f64) -> Self {
        self.sampling.push((key.into(), rate));
        self
    }

    /// Replace the default sensitive field names
    #[must_use = "builder methods return a new value"]
    pub fn sensitive_fields<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sensitive_fields = Some(names.into_iter().map(Into::into).collect());
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn redactor_config(mut self, config: RedactorConfig) -> Self {
        self.redactor_config = config;
        self
    }

    /// Apply `LOG_LEVEL` from the environment, if set
    #[must_use = "builder methods return a new value"]
    pub fn with_env_overrides(self) -> Self {
        let value = std::env::var(LOG_LEVEL_ENV).ok();
        self.apply_level_override(value.as_deref())
    }

    fn apply_level_override(mut self, value: Option<&str>) -> Self {
        if let Some(value) = value.filter(|v| !v.trim().is_empty()) {
            match value.parse::<LogLevel>() {
                Ok(level) => self.min_level = level,
                Err(e) => self.env_error = Some(e),
            }
        }
        self
    }

    /// Build the Logger, reporting invalid configuration and startup failures
    pub fn try_build(self) -> Result<Logger> {
        if let Some(e) = self.env_error {
            return Err(e);
        }

        let sampler = Sampler::new();
        for (key, rate) in self.sampling {
            sampler.set_sample_rate(key, rate)?;
        }

        let fields = match self.sensitive_fields {
            Some(names) => names.into_iter().collect(),
            None => SensitiveFields::with_defaults(),
        };
        let redactor = Redactor::new(fields).with_config(self.redactor_config);

        let sink = Sink::new(self.appenders);
        let metrics = Arc::new(LoggerMetrics::new());
        let buffer = LogBuffer::new(
            self.buffering,
            Some(flush_handler(sink.clone(), Arc::clone(&metrics))),
        )?;

        Ok(Logger {
            level_filter: LevelFilter::new(self.min_level),
            sampler,
            redactor,
            sink,
            buffer,
            metrics,
            stopped: AtomicBool::new(false),
        })
    }

    /// Build the Logger, falling back to [`Logger::degraded`] if the
    /// configuration is rejected
    pub fn build(self) -> Logger {
        self.try_build().unwrap_or_else(|e| {
            eprintln!(
                "[LOGGER CRITICAL] Failed to build logger ({}); falling back to console-only logging",
                e
            );
            Logger::degraded()
        })
    }
}

impl Default for LoggerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
