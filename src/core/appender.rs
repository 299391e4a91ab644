//! Appender trait for log output destinations

use super::{error::Result, log_entry::LogEntry};

/// A sink that persists redacted entries.
///
/// Appenders own formatting (timestamps, colours, layout). The pipeline
/// calls them with entries in FIFO order and never from two threads at once.
pub trait Appender: Send + Sync {
    fn append(&mut self, entry: &LogEntry) -> Result<()>;
    fn flush(&mut self) -> Result<()>;
    fn name(&self) -> &str;
}
