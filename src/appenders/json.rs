//! JSON appender for structured logging

use crate::core::{entry_to_json, Appender, LogEntry, LoggerError, Result, TimestampFormat};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

/// JSON file appender for structured logging
///
/// Writes each log entry as a single-line JSON object (JSONL format)
/// with `timestamp`, `level`, optional `label`, the rendered `message` and
/// the structured `payload` array. Compatible with log aggregation tools
/// like ELK, Loki, etc.
pub struct JsonAppender {
    writer: BufWriter<File>,
    timestamp_format: TimestampFormat,
    pretty: bool,
}

impl JsonAppender {
    /// Create a new JSON appender
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open(path.as_ref(), false)
    }

    /// Create a new JSON appender with pretty printing
    pub fn new_pretty<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open(path.as_ref(), true)
    }

    fn open(path: &Path, pretty: bool) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| {
                LoggerError::io_operation(format!("opening {}", path.display()), e.to_string(), e)
            })?;

        Ok(Self {
            writer: BufWriter::new(file),
            timestamp_format: TimestampFormat::default(),
            pretty,
        })
    }

    /// Use `TimestampFormat::UnixMillis` for numeric timestamps
    #[must_use]
    pub fn with_timestamp_format(mut self, format: TimestampFormat) -> Self {
        self.timestamp_format = format;
        self
    }
}

impl Appender for JsonAppender {
    fn name(&self) -> &str {
        "json"
    }

    fn append(&mut self, entry: &LogEntry) -> Result<()> {
        let value = entry_to_json(entry, &self.timestamp_format);

        let json = if self.pretty {
            serde_json::to_string_pretty(&value)?
        } else {
            value.to_string()
        };

        writeln!(self.writer, "{}", json)?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

impl Drop for JsonAppender {
    fn drop(&mut self) {
        let _ = self.writer.flush();
    }
}
