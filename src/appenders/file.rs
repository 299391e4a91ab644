//! File appender implementation
//!
//! Lines are buffered in memory and reach the file only while an exclusive
//! advisory lock (`fs2`) is held, so cooperating processes appending to the
//! same file never interleave partial batches.

use crate::core::{Appender, LogEntry, LoggerError, OutputFormat, Result, TimestampFormat};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

const DEFAULT_CAPACITY: usize = 64 * 1024;

pub struct FileAppender {
    path: PathBuf,
    writer: BufWriter<File>,
    timestamp_format: TimestampFormat,
    output_format: OutputFormat,
}

impl FileAppender {
    /// Open `path` for appending, creating it if needed
    pub fn new(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| LoggerError::file_appender(path.display().to_string(), e.to_string()))?;

        Ok(Self {
            writer: BufWriter::with_capacity(DEFAULT_CAPACITY, file),
            path,
            timestamp_format: TimestampFormat::default(),
            output_format: OutputFormat::default(),
        })
    }

    /// Set the timestamp format for this appender
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use rust_log_pipeline::appenders::FileAppender;
    /// use rust_log_pipeline::TimestampFormat;
    ///
    /// let appender = FileAppender::new("/var/log/app.log")
    ///     .unwrap()
    ///     .with_timestamp_format(TimestampFormat::Rfc3339);
    /// ```
    #[must_use]
    pub fn with_timestamp_format(mut self, format: TimestampFormat) -> Self {
        self.timestamp_format = format;
        self
    }

    /// Set a custom timestamp format using a strftime-compatible format string
    #[must_use]
    pub fn with_custom_timestamp(mut self, format_str: &str) -> Self {
        self.timestamp_format = TimestampFormat::Custom(format_str.to_string());
        self
    }

    #[must_use]
    pub fn with_output_format(mut self, format: OutputFormat) -> Self {
        self.output_format = format;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Run `op` on the writer while holding the file lock
    fn locked<T>(&mut self, op: impl FnOnce(&mut BufWriter<File>) -> io::Result<T>) -> Result<T> {
        FileExt::lock_exclusive(self.writer.get_ref())
            .map_err(|_| LoggerError::file_lock(self.path.display().to_string()))?;

        let result = op(&mut self.writer);

        if let Err(e) = FileExt::unlock(self.writer.get_ref()) {
            eprintln!(
                "[LOGGER WARNING] Failed to unlock {}: {}",
                self.path.display(),
                e
            );
        }
        Ok(result?)
    }
}

impl Appender for FileAppender {
    fn append(&mut self, entry: &LogEntry) -> Result<()> {
        let mut line = self.output_format.format(entry, &self.timestamp_format);
        line.push('\n');

        if self.writer.buffer().len() + line.len() > self.writer.capacity() {
            self.locked(|writer| writer.flush())?;
        }
        if line.len() >= self.writer.capacity() {
            // Would bypass the buffer; write it under the lock instead
            return self.locked(|writer| writer.get_mut().write_all(line.as_bytes()));
        }

        self.writer.write_all(line.as_bytes())?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        if self.writer.buffer().is_empty() {
            return Ok(());
        }
        self.locked(|writer| writer.flush())
    }

    fn name(&self) -> &str {
        "file"
    }
}

impl Drop for FileAppender {
    fn drop(&mut self) {
        if let Err(e) = self.flush() {
            eprintln!("[LOGGER ERROR] Failed to flush {}: {}", self.path.display(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{LogLevel, Object, Value};
    use std::fs;
    use tempfile::tempdir;

    const FIXED_MS: i64 = 1_736_332_245_123;

    #[test]
    fn test_appends_text_lines() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("app.log");

        let mut appender = FileAppender::new(&path)?;
        appender.append(&LogEntry::message(LogLevel::Info, "first").with_timestamp(FIXED_MS))?;
        appender.append(
            &LogEntry::message(LogLevel::Error, "second")
                .with_label("db")
                .with_timestamp(FIXED_MS),
        )?;

        // Nothing reaches the file before a flush
        assert_eq!(fs::read_to_string(&path)?, "");

        appender.flush()?;
        let content = fs::read_to_string(&path)?;
        assert_eq!(
            content,
            "[2025-01-08T10:30:45.123Z] [INFO   ] first\n\
             [2025-01-08T10:30:45.123Z] [ERROR  ] db - second\n"
        );
        Ok(())
    }

    #[test]
    fn test_reopen_appends() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("app.log");

        for message in ["one", "two"] {
            let mut appender = FileAppender::new(&path)?;
            appender.append(&LogEntry::message(LogLevel::Info, message))?;
            // Dropping flushes
        }

        let content = fs::read_to_string(&path)?;
        assert_eq!(content.lines().count(), 2);
        Ok(())
    }

    #[test]
    fn test_large_line_written_directly() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("big.log");

        let mut appender = FileAppender::new(&path)?;
        appender.append(&LogEntry::message(LogLevel::Info, "small"))?;
        let big = "x".repeat(DEFAULT_CAPACITY + 10);
        appender.append(&LogEntry::message(LogLevel::Info, big.clone()))?;
        appender.flush()?;

        let content = fs::read_to_string(&path)?;
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("small"));
        assert!(lines[1].ends_with(&big));
        Ok(())
    }

    #[test]
    fn test_json_output_format() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("app.jsonl");

        let mut appender = FileAppender::new(&path)?.with_output_format(OutputFormat::Json);
        appender.append(&LogEntry::new(
            LogLevel::Warning,
            vec![Value::from("quota"), Value::from(Object::new().with("used", 95))],
        ))?;
        appender.flush()?;

        let content = fs::read_to_string(&path)?;
        let parsed: serde_json::Value = serde_json::from_str(content.trim())?;
        assert_eq!(parsed["level"], "WARNING");
        assert_eq!(parsed["payload"][1]["used"], 95);
        Ok(())
    }

    #[test]
    fn test_open_failure_names_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing").join("app.log");

        let err = FileAppender::new(&path).err().unwrap();
        assert!(matches!(err, LoggerError::FileAppenderError { .. }));
        assert!(err.to_string().contains("app.log"));
    }
}
