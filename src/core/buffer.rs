//! Buffered, batched delivery of log entries
//!
//! [`LogBuffer`] accumulates entries and hands them to a flush handler in
//! FIFO batches. A flush is triggered when:
//!
//! - an add finds the buffer already holding `max_entries` (a *forced* flush,
//!   which delivers the full buffer before the new entry is appended),
//! - the periodic timer fires and the buffer is non-empty,
//! - an entry at or above `immediate_flush_level` is added,
//! - [`LogBuffer::flush`] is called,
//! - [`LogBuffer::stop`] drains the buffer.
//!
//! Capacity and severity triggers only seal the live buffer into a pending
//! batch and wake the buffer's flush worker thread, so `add_entry` never
//! waits on a sink. The worker also runs the periodic flush. Only one flush
//! runs at a time; whoever holds the gate delivers every batch sealed while
//! it was in flight before releasing it. Explicit `flush()`/`stop()` calls
//! wait for the running flush and then deliver the remainder on the calling
//! thread.
//!
//! Reaching capacity never discards entries; `forced_flushes` counts early
//! flushes, not losses.

use super::{
    error::{LoggerError, Result},
    log_entry::LogEntry,
    log_level::LogLevel,
    sink::{fallback_write, panic_message},
};
use crossbeam_channel::{bounded, RecvTimeoutError, Sender};
use parking_lot::{Condvar, Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::thread;
use std::time::{Duration, Instant};

/// Callback that receives each flushed batch
pub type FlushHandler = Arc<dyn Fn(&[LogEntry]) -> Result<()> + Send + Sync>;

/// Buffering configuration
///
/// # Example
///
/// ```
/// use rust_log_pipeline::{BufferConfig, LogLevel};
///
/// let config = BufferConfig::default()
///     .with_max_entries(500)
///     .with_flush_interval_ms(250)
///     .with_immediate_flush_level(LogLevel::Warning);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BufferConfig {
    /// Capacity that forces a flush; must be > 0
    pub max_entries: usize,

    /// Period of the flush timer in milliseconds; must be > 0
    pub flush_interval_ms: u64,

    /// Entries at or above this level are flushed immediately
    pub immediate_flush_level: LogLevel,

    /// When false every entry is written straight through
    pub enabled: bool,
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            max_entries: 100,
            flush_interval_ms: 1000,
            immediate_flush_level: LogLevel::Error,
            enabled: true,
        }
    }
}

impl BufferConfig {
    /// A configuration that writes every entry straight through
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = max_entries;
        self
    }

    #[must_use]
    pub fn with_flush_interval_ms(mut self, flush_interval_ms: u64) -> Self {
        self.flush_interval_ms = flush_interval_ms;
        self
    }

    #[must_use]
    pub fn with_immediate_flush_level(mut self, level: LogLevel) -> Self {
        self.immediate_flush_level = level;
        self
    }

    #[must_use]
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn flush_interval(&self) -> Duration {
        Duration::from_millis(self.flush_interval_ms)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_entries == 0 {
            return Err(LoggerError::config(
                "BufferConfig",
                "max_entries must be greater than 0",
            ));
        }
        if self.flush_interval_ms == 0 {
            return Err(LoggerError::config(
                "BufferConfig",
                "flush_interval_ms must be greater than 0",
            ));
        }
        Ok(())
    }
}

/// What caused a flush
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushTrigger {
    Capacity,
    Timer,
    Severity,
    Passthrough,
    Manual,
    Shutdown,
}

/// Snapshot of buffer counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BufferStats {
    /// Entries currently waiting to be flushed
    pub buffer_size: usize,
    /// Entries accepted since construction
    pub total_seen: u64,
    /// Flushes triggered by reaching capacity
    pub forced_flushes: u64,
    /// Batches handed to the flush handler
    pub flushes: u64,
    /// Entries handed to the flush handler
    pub flushed_entries: u64,
    /// Batches whose delivery failed
    pub sink_errors: u64,
}

#[derive(Debug, Default)]
struct BufferCounters {
    total_seen: AtomicU64,
    forced_flushes: AtomicU64,
    flushes: AtomicU64,
    flushed_entries: AtomicU64,
    sink_errors: AtomicU64,
}

#[derive(Debug, Default)]
struct BufferState {
    /// Live buffer that new entries are appended to
    entries: Vec<LogEntry>,
    /// Sealed batches waiting for delivery, oldest first
    pending: VecDeque<(Vec<LogEntry>, FlushTrigger)>,
    /// A flush owns the gate
    flushing: bool,
    stopped: bool,
    /// Wakes the flush worker; `None` while no worker runs
    wake: Option<Sender<()>>,
}

impl BufferState {
    /// Move the live buffer to the back of the pending queue
    fn seal(&mut self, trigger: FlushTrigger) {
        if !self.entries.is_empty() {
            let batch = std::mem::take(&mut self.entries);
            self.pending.push_back((batch, trigger));
        }
    }

    fn queued_len(&self) -> usize {
        self.entries.len() + self.pending.iter().map(|(b, _)| b.len()).sum::<usize>()
    }

    fn wake_worker(&self) {
        if let Some(ref wake) = self.wake {
            // Full means a wake-up is already queued
            let _ = wake.try_send(());
        }
    }
}

struct BufferInner {
    config: RwLock<BufferConfig>,
    state: Mutex<BufferState>,
    idle: Condvar,
    handler: Option<FlushHandler>,
    counters: BufferCounters,
}

impl BufferInner {
    /// Take the gate and every pending batch, sealing the live buffer first
    /// when `live` is given. Returns `None` if another flush holds the gate;
    /// that flusher picks up the pending batches before it releases it.
    fn claim(
        &self,
        state: &mut BufferState,
        live: Option<FlushTrigger>,
    ) -> Option<VecDeque<(Vec<LogEntry>, FlushTrigger)>> {
        if state.flushing {
            return None;
        }
        if let Some(trigger) = live {
            state.seal(trigger);
        }
        if state.pending.is_empty() {
            return None;
        }
        state.flushing = true;
        Some(std::mem::take(&mut state.pending))
    }

    /// Deliver `batches` and any sealed while they were in flight, then
    /// release the gate
    fn run_flush(&self, mut batches: VecDeque<(Vec<LogEntry>, FlushTrigger)>) {
        loop {
            for (batch, trigger) in &batches {
                self.deliver(batch, *trigger);
            }

            let mut state = self.state.lock();
            if !state.pending.is_empty() {
                batches = std::mem::take(&mut state.pending);
                continue;
            }
            state.flushing = false;
            drop(state);
            self.idle.notify_all();
            break;
        }
    }

    fn deliver(&self, batch: &[LogEntry], trigger: FlushTrigger) {
        self.counters.flushes.fetch_add(1, Ordering::Relaxed);
        self.counters
            .flushed_entries
            .fetch_add(batch.len() as u64, Ordering::Relaxed);

        let result = match self.handler {
            Some(ref handler) => catch_unwind(AssertUnwindSafe(|| handler(batch)))
                .unwrap_or_else(|panic_info| {
                    Err(LoggerError::sink_panic(
                        "flush handler",
                        panic_message(&panic_info),
                    ))
                }),
            None => {
                fallback_write(batch);
                Ok(())
            }
        };

        if let Err(e) = result {
            self.counters.sink_errors.fetch_add(1, Ordering::Relaxed);
            eprintln!(
                "[LOGGER ERROR] {:?} flush of {} entries failed: {}",
                trigger,
                batch.len(),
                e
            );
        }
    }

    /// Non-blocking flush run by the worker
    fn try_flush(&self, live: Option<FlushTrigger>) {
        let batches = {
            let mut state = self.state.lock();
            self.claim(&mut state, live)
        };
        if let Some(batches) = batches {
            self.run_flush(batches);
        }
    }

    /// Wait for any running flush, then deliver what remains.
    /// With `close`, later adds are rejected.
    fn flush_blocking(&self, trigger: FlushTrigger, close: bool) {
        let batches = {
            let mut state = self.state.lock();
            while state.flushing {
                self.idle.wait(&mut state);
            }
            if close {
                state.stopped = true;
            }
            self.claim(&mut state, Some(trigger))
        };
        if let Some(batches) = batches {
            self.run_flush(batches);
        }
    }
}

/// Background thread that delivers sealed batches and fires the periodic flush
struct FlushWorker {
    handle: thread::JoinHandle<()>,
}

impl FlushWorker {
    /// Spawn the worker and return it with the sender that wakes it.
    /// Dropping every sender stops the worker.
    fn spawn(inner: Weak<BufferInner>, interval: Duration) -> Result<(Self, Sender<()>)> {
        let (wake_tx, wake_rx) = bounded::<()>(1);

        let handle = thread::Builder::new()
            .name("log-flush-worker".to_string())
            .spawn(move || {
                let mut next_tick = Instant::now() + interval;
                loop {
                    let timeout = next_tick.saturating_duration_since(Instant::now());
                    let live = match wake_rx.recv_timeout(timeout) {
                        // Sealed batches only; the live buffer keeps filling
                        Ok(()) => None,
                        Err(RecvTimeoutError::Timeout) => {
                            next_tick = Instant::now() + interval;
                            Some(FlushTrigger::Timer)
                        }
                        Err(RecvTimeoutError::Disconnected) => break,
                    };
                    match inner.upgrade() {
                        Some(inner) => inner.try_flush(live),
                        None => break,
                    }
                }
            })
            .map_err(|e| LoggerError::TimerSpawn(e.to_string()))?;

        Ok((Self { handle }, wake_tx))
    }

    /// Wait for the worker to exit; its wake sender must already be dropped
    fn join(self) {
        // A flush handler running on the worker thread may end up here
        if self.handle.thread().id() == thread::current().id() {
            return;
        }
        if let Err(e) = self.handle.join() {
            eprintln!("[LOGGER ERROR] Flush worker thread panicked: {:?}", e);
        }
    }
}

/// Entry buffer with size, time and severity flush triggers
///
/// # Example
///
/// ```
/// use rust_log_pipeline::{BufferConfig, FlushHandler, LogBuffer, LogEntry, LogLevel};
/// use std::sync::{Arc, Mutex};
///
/// let delivered = Arc::new(Mutex::new(Vec::new()));
/// let sink = Arc::clone(&delivered);
///
/// let handler: FlushHandler = Arc::new(move |batch: &[LogEntry]| {
///     sink.lock().unwrap().extend(batch.iter().map(|e| e.render_payload()));
///     Ok(())
/// });
/// let buffer = LogBuffer::new(BufferConfig::default().with_max_entries(10), Some(handler)).unwrap();
///
/// buffer.add_entry(LogEntry::message(LogLevel::Info, "queued"));
/// assert_eq!(buffer.stats().buffer_size, 1);
///
/// buffer.flush();
/// assert_eq!(*delivered.lock().unwrap(), vec!["queued"]);
/// ```
pub struct LogBuffer {
    inner: Arc<BufferInner>,
    worker: Mutex<Option<FlushWorker>>,
}

impl LogBuffer {
    /// Create a buffer and start its flush worker.
    ///
    /// `handler` receives every flushed batch; with `None`, batches are
    /// written to stderr.
    pub fn new(config: BufferConfig, handler: Option<FlushHandler>) -> Result<Self> {
        config.validate()?;

        let buffer = Self::construct(config, handler);
        if config.enabled {
            let worker = buffer.start_worker(config)?;
            *buffer.worker.lock() = Some(worker);
        }
        Ok(buffer)
    }

    /// A pass-through buffer with no worker thread; cannot fail
    pub fn unbuffered(handler: Option<FlushHandler>) -> Self {
        Self::construct(BufferConfig::disabled(), handler)
    }

    fn construct(config: BufferConfig, handler: Option<FlushHandler>) -> Self {
        Self {
            inner: Arc::new(BufferInner {
                config: RwLock::new(config),
                state: Mutex::new(BufferState::default()),
                idle: Condvar::new(),
                handler,
                counters: BufferCounters::default(),
            }),
            worker: Mutex::new(None),
        }
    }

    fn start_worker(&self, config: BufferConfig) -> Result<FlushWorker> {
        let (worker, wake) = FlushWorker::spawn(Arc::downgrade(&self.inner), config.flush_interval())?;
        let mut state = self.inner.state.lock();
        state.wake = Some(wake);
        // Batches sealed while no worker was running
        if !state.pending.is_empty() {
            state.wake_worker();
        }
        Ok(worker)
    }

    fn stop_worker(&self, worker: &mut Option<FlushWorker>) {
        if let Some(worker) = worker.take() {
            self.inner.state.lock().wake = None;
            worker.join();
        }
    }

    pub fn config(&self) -> BufferConfig {
        *self.inner.config.read()
    }

    pub fn is_enabled(&self) -> bool {
        self.inner.config.read().enabled
    }

    pub fn is_stopped(&self) -> bool {
        self.inner.state.lock().stopped
    }

    /// Accept an entry. Returns `false` if the buffer has been stopped.
    ///
    /// While buffering is enabled this never waits on the flush handler:
    /// capacity and severity triggers seal the live buffer and wake the
    /// flush worker. A disabled buffer delivers on the calling thread.
    pub fn add_entry(&self, entry: LogEntry) -> bool {
        let inner = &*self.inner;
        let config = *inner.config.read();
        let urgent = entry.level >= config.immediate_flush_level;

        let passthrough = {
            let mut state = inner.state.lock();
            if state.stopped {
                return false;
            }
            inner.counters.total_seen.fetch_add(1, Ordering::Relaxed);

            if !config.enabled {
                state.entries.push(entry);
                inner.claim(&mut state, Some(FlushTrigger::Passthrough))
            } else {
                if state.entries.len() >= config.max_entries {
                    inner.counters.forced_flushes.fetch_add(1, Ordering::Relaxed);
                    state.seal(FlushTrigger::Capacity);
                }
                state.entries.push(entry);
                if urgent {
                    state.seal(FlushTrigger::Severity);
                }
                if !state.pending.is_empty() {
                    state.wake_worker();
                }
                None
            }
        };

        if let Some(batches) = passthrough {
            inner.run_flush(batches);
        }
        true
    }

    /// Deliver everything buffered so far, waiting for a running flush first
    pub fn flush(&self) {
        self.inner.flush_blocking(FlushTrigger::Manual, false);
    }

    /// Stop the worker, deliver the remaining entries and reject later adds.
    /// Idempotent.
    pub fn stop(&self) {
        self.stop_worker(&mut self.worker.lock());
        self.inner.flush_blocking(FlushTrigger::Shutdown, true);
    }

    /// Apply a new configuration and restart the flush worker
    pub fn reconfigure(&self, config: BufferConfig) -> Result<()> {
        config.validate()?;
        if self.is_stopped() {
            return Err(LoggerError::LoggerStopped);
        }

        let mut worker = self.worker.lock();
        self.stop_worker(&mut worker);
        *self.inner.config.write() = config;
        if config.enabled {
            *worker = Some(self.start_worker(config)?);
        }
        drop(worker);

        let over_capacity = self.inner.state.lock().entries.len() >= config.max_entries;
        if !config.enabled || over_capacity {
            self.inner.flush_blocking(FlushTrigger::Manual, false);
        }
        Ok(())
    }

    pub fn stats(&self) -> BufferStats {
        let counters = &self.inner.counters;
        BufferStats {
            buffer_size: self.inner.state.lock().queued_len(),
            total_seen: counters.total_seen.load(Ordering::Relaxed),
            forced_flushes: counters.forced_flushes.load(Ordering::Relaxed),
            flushes: counters.flushes.load(Ordering::Relaxed),
            flushed_entries: counters.flushed_entries.load(Ordering::Relaxed),
            sink_errors: counters.sink_errors.load(Ordering::Relaxed),
        }
    }
}

impl Drop for LogBuffer {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for LogBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogBuffer")
            .field("config", &self.config())
            .field("stats", &self.stats())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::time::Instant;

    type Batches = Arc<Mutex<Vec<Vec<String>>>>;

    fn recording_handler() -> (FlushHandler, Batches) {
        let batches: Batches = Arc::default();
        let sink = Arc::clone(&batches);
        let handler: FlushHandler = Arc::new(move |batch: &[LogEntry]| {
            sink.lock()
                .push(batch.iter().map(LogEntry::render_payload).collect());
            Ok(())
        });
        (handler, batches)
    }

    fn entry(level: LogLevel, message: &str) -> LogEntry {
        LogEntry::message(level, message)
    }

    /// Poll until `done` holds or five seconds pass
    fn wait_for(mut done: impl FnMut() -> bool) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while !done() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(2));
        }
    }

    fn slow_timer(max_entries: usize) -> BufferConfig {
        BufferConfig::default()
            .with_max_entries(max_entries)
            .with_flush_interval_ms(60_000)
    }

    #[test]
    fn test_capacity_forces_flush_before_append() {
        let (handler, batches) = recording_handler();
        let buffer = LogBuffer::new(slow_timer(3), Some(handler)).unwrap();

        for i in 0..3 {
            buffer.add_entry(entry(LogLevel::Info, &format!("m{}", i)));
        }
        assert_eq!(buffer.stats().buffer_size, 3);
        assert!(batches.lock().is_empty());

        buffer.add_entry(entry(LogLevel::Info, "m3"));
        wait_for(|| !batches.lock().is_empty());
        assert_eq!(*batches.lock(), vec![vec!["m0", "m1", "m2"]]);

        let stats = buffer.stats();
        assert_eq!(stats.buffer_size, 1);
        assert_eq!(stats.forced_flushes, 1);
        assert_eq!(stats.total_seen, 4);

        buffer.flush();
        assert_eq!(buffer.stats().buffer_size, 0);
        assert_eq!(batches.lock().len(), 2);
    }

    #[test]
    fn test_severity_trigger_flushes_everything() {
        let (handler, batches) = recording_handler();
        let buffer = LogBuffer::new(
            slow_timer(100).with_immediate_flush_level(LogLevel::Error),
            Some(handler),
        )
        .unwrap();

        buffer.add_entry(entry(LogLevel::Debug, "first"));
        assert!(batches.lock().is_empty());

        buffer.add_entry(entry(LogLevel::Error, "second"));
        wait_for(|| !batches.lock().is_empty());
        assert_eq!(*batches.lock(), vec![vec!["first", "second"]]);
        assert_eq!(buffer.stats().buffer_size, 0);
        assert_eq!(buffer.stats().forced_flushes, 0);
    }

    #[test]
    fn test_capacity_and_severity_on_same_add() {
        let (handler, batches) = recording_handler();
        let buffer = LogBuffer::new(slow_timer(2), Some(handler)).unwrap();

        buffer.add_entry(entry(LogLevel::Info, "a"));
        buffer.add_entry(entry(LogLevel::Info, "b"));
        buffer.add_entry(entry(LogLevel::Fatal, "c"));

        wait_for(|| batches.lock().len() == 2);
        assert_eq!(*batches.lock(), vec![vec!["a", "b"], vec!["c"]]);
        assert_eq!(buffer.stats().buffer_size, 0);
    }

    #[test]
    fn test_disabled_writes_through() {
        let (handler, batches) = recording_handler();
        let buffer = LogBuffer::new(BufferConfig::disabled(), Some(handler)).unwrap();

        buffer.add_entry(entry(LogLevel::Debug, "one"));
        buffer.add_entry(entry(LogLevel::Debug, "two"));

        assert_eq!(*batches.lock(), vec![vec!["one"], vec!["two"]]);
        assert_eq!(buffer.stats().buffer_size, 0);
    }

    #[test]
    fn test_unbuffered_has_no_worker() {
        let (handler, batches) = recording_handler();
        let buffer = LogBuffer::unbuffered(Some(handler));
        assert!(!buffer.is_enabled());
        assert!(buffer.worker.lock().is_none());

        buffer.add_entry(entry(LogLevel::Info, "direct"));
        assert_eq!(batches.lock().len(), 1);
    }

    #[test]
    fn test_timer_flushes_periodically() {
        let (handler, batches) = recording_handler();
        let buffer = LogBuffer::new(
            BufferConfig::default().with_flush_interval_ms(20),
            Some(handler),
        )
        .unwrap();

        buffer.add_entry(entry(LogLevel::Info, "tick"));

        let deadline = Instant::now() + Duration::from_secs(2);
        while batches.lock().is_empty() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(*batches.lock(), vec![vec!["tick"]]);
        assert_eq!(buffer.stats().buffer_size, 0);
    }

    #[test]
    fn test_stop_drains_and_rejects() {
        let (handler, batches) = recording_handler();
        let buffer = LogBuffer::new(slow_timer(100), Some(handler)).unwrap();

        buffer.add_entry(entry(LogLevel::Info, "pending"));
        buffer.stop();

        assert_eq!(*batches.lock(), vec![vec!["pending"]]);
        assert!(buffer.is_stopped());
        assert!(!buffer.add_entry(entry(LogLevel::Info, "late")));
        assert_eq!(buffer.stats().total_seen, 1);

        // Idempotent
        buffer.stop();
        assert_eq!(batches.lock().len(), 1);
    }

    #[test]
    fn test_flush_on_empty_buffer_is_noop() {
        let (handler, batches) = recording_handler();
        let buffer = LogBuffer::new(slow_timer(10), Some(handler)).unwrap();
        buffer.flush();
        assert!(batches.lock().is_empty());
        assert_eq!(buffer.stats().flushes, 0);
    }

    #[test]
    fn test_sink_error_is_contained() {
        let handler: FlushHandler =
            Arc::new(|_batch: &[LogEntry]| Err(LoggerError::writer("disk full")));
        let buffer = LogBuffer::new(slow_timer(10), Some(handler)).unwrap();

        buffer.add_entry(entry(LogLevel::Info, "lost to the sink"));
        buffer.flush();

        let stats = buffer.stats();
        assert_eq!(stats.sink_errors, 1);
        assert_eq!(stats.buffer_size, 0);

        // The pipeline keeps working after the failure
        assert!(buffer.add_entry(entry(LogLevel::Info, "next")));
        assert_eq!(buffer.stats().buffer_size, 1);
    }

    #[test]
    fn test_panicking_handler_is_contained() {
        let handler: FlushHandler = Arc::new(|_batch: &[LogEntry]| panic!("sink bug"));
        let buffer = LogBuffer::new(slow_timer(10), Some(handler)).unwrap();

        buffer.add_entry(entry(LogLevel::Info, "x"));
        buffer.flush();
        assert_eq!(buffer.stats().sink_errors, 1);

        // Gate was released despite the panic
        buffer.add_entry(entry(LogLevel::Info, "y"));
        buffer.flush();
        assert_eq!(buffer.stats().flushes, 2);
    }

    #[test]
    fn test_add_during_flush_goes_to_fresh_buffer() {
        let (release_tx, release_rx) = bounded::<()>(0);
        let (entered_tx, entered_rx) = bounded::<()>(1);
        let delivered: Batches = Arc::default();
        let sink = Arc::clone(&delivered);

        let handler: FlushHandler = Arc::new(move |batch: &[LogEntry]| {
            let _ = entered_tx.try_send(());
            let _ = release_rx.recv_timeout(Duration::from_secs(5));
            sink.lock()
                .push(batch.iter().map(LogEntry::render_payload).collect());
            Ok(())
        });
        let buffer = Arc::new(LogBuffer::new(slow_timer(100), Some(handler)).unwrap());

        buffer.add_entry(entry(LogLevel::Info, "old"));
        let flusher = {
            let buffer = Arc::clone(&buffer);
            thread::spawn(move || buffer.flush())
        };
        entered_rx.recv_timeout(Duration::from_secs(5)).unwrap();

        // The in-flight batch is already swapped out
        buffer.add_entry(entry(LogLevel::Info, "new"));
        assert_eq!(buffer.stats().buffer_size, 1);

        release_tx.send(()).unwrap();
        flusher.join().unwrap();

        assert_eq!(*delivered.lock(), vec![vec!["old"]]);
        assert_eq!(buffer.stats().buffer_size, 1);

        // Lets the drain on drop run without waiting
        drop(release_tx);
    }

    #[test]
    fn test_trigger_during_flush_is_delivered_by_running_flusher() {
        let (release_tx, release_rx) = bounded::<()>(0);
        let (entered_tx, entered_rx) = bounded::<()>(1);
        let delivered: Batches = Arc::default();
        let sink = Arc::clone(&delivered);

        let handler: FlushHandler = Arc::new(move |batch: &[LogEntry]| {
            let _ = entered_tx.try_send(());
            let _ = release_rx.recv_timeout(Duration::from_secs(5));
            sink.lock()
                .push(batch.iter().map(LogEntry::render_payload).collect());
            Ok(())
        });
        let buffer = Arc::new(LogBuffer::new(slow_timer(100), Some(handler)).unwrap());

        buffer.add_entry(entry(LogLevel::Info, "old"));
        let flusher = {
            let buffer = Arc::clone(&buffer);
            thread::spawn(move || buffer.flush())
        };
        entered_rx.recv_timeout(Duration::from_secs(5)).unwrap();

        // Severity trigger while the gate is held: sealed, not delivered
        buffer.add_entry(entry(LogLevel::Error, "urgent"));
        assert_eq!(buffer.stats().buffer_size, 1);

        release_tx.send(()).unwrap();
        release_tx.send(()).unwrap();
        flusher.join().unwrap();

        assert_eq!(*delivered.lock(), vec![vec!["old"], vec!["urgent"]]);
        assert_eq!(buffer.stats().buffer_size, 0);
    }

    #[test]
    fn test_reconfigure_validates_and_applies() {
        let (handler, batches) = recording_handler();
        let buffer = LogBuffer::new(slow_timer(10), Some(handler)).unwrap();

        assert!(buffer
            .reconfigure(slow_timer(0))
            .unwrap_err()
            .is_configuration());
        assert_eq!(buffer.config().max_entries, 10);

        for i in 0..5 {
            buffer.add_entry(entry(LogLevel::Info, &format!("m{}", i)));
        }
        // Shrinking below the current size flushes right away
        buffer.reconfigure(slow_timer(3)).unwrap();
        assert_eq!(batches.lock().len(), 1);
        assert_eq!(buffer.stats().buffer_size, 0);

        buffer.reconfigure(BufferConfig::disabled()).unwrap();
        assert!(!buffer.is_enabled());
        assert!(buffer.worker.lock().is_none());
    }

    #[test]
    fn test_triggers_do_not_wait_for_slow_handler() {
        let delivered: Batches = Arc::default();
        let sink = Arc::clone(&delivered);
        let handler: FlushHandler = Arc::new(move |batch: &[LogEntry]| {
            thread::sleep(Duration::from_millis(300));
            sink.lock()
                .push(batch.iter().map(LogEntry::render_payload).collect());
            Ok(())
        });
        let buffer = LogBuffer::new(slow_timer(2), Some(handler)).unwrap();

        buffer.add_entry(entry(LogLevel::Info, "a"));
        buffer.add_entry(entry(LogLevel::Info, "b"));

        let started = Instant::now();
        buffer.add_entry(entry(LogLevel::Info, "c"));
        assert!(started.elapsed() < Duration::from_millis(150));

        let started = Instant::now();
        buffer.add_entry(entry(LogLevel::Error, "d"));
        assert!(started.elapsed() < Duration::from_millis(150));

        buffer.flush();
        let flat: Vec<String> = delivered.lock().iter().flatten().cloned().collect();
        assert_eq!(flat, vec!["a", "b", "c", "d"]);
        assert_eq!(buffer.stats().forced_flushes, 1);
    }

    #[test]
    fn test_worker_restarts_after_reconfigure() {
        let (handler, batches) = recording_handler();
        let buffer = LogBuffer::new(slow_timer(10), Some(handler)).unwrap();

        buffer.reconfigure(slow_timer(2)).unwrap();
        buffer.add_entry(entry(LogLevel::Info, "x"));
        buffer.add_entry(entry(LogLevel::Info, "y"));
        buffer.add_entry(entry(LogLevel::Info, "z"));

        wait_for(|| !batches.lock().is_empty());
        assert_eq!(*batches.lock(), vec![vec!["x", "y"]]);
    }

    #[test]
    fn test_config_validation() {
        assert!(BufferConfig::default().validate().is_ok());
        assert!(BufferConfig::default()
            .with_flush_interval_ms(0)
            .validate()
            .is_err());
        assert!(LogBuffer::new(slow_timer(0), None).is_err());
    }

    #[test]
    fn test_config_deserialize_with_defaults() {
        let config: BufferConfig =
            serde_json::from_str(r#"{"max_entries": 5, "immediate_flush_level": "warning"}"#)
                .unwrap();
        assert_eq!(config.max_entries, 5);
        assert_eq!(config.flush_interval_ms, 1000);
        assert_eq!(config.immediate_flush_level, LogLevel::Warning);
        assert!(config.enabled);
    }
}
