//! Console appender implementation

use crate::core::{Appender, LogEntry, LogLevel, OutputFormat, Result, TimestampFormat};
use colored::Colorize;

/// Writes entries to the terminal; error and fatal go to stderr, the rest to stdout
pub struct ConsoleAppender {
    use_colors: bool,
    timestamp_format: TimestampFormat,
    output_format: OutputFormat,
}

impl ConsoleAppender {
    pub fn new() -> Self {
        Self::with_colors(true)
    }

    pub fn with_colors(use_colors: bool) -> Self {
        Self {
            use_colors,
            timestamp_format: TimestampFormat::default(),
            output_format: OutputFormat::default(),
        }
    }

    /// Set the output format for this appender
    ///
    /// # Example
    ///
    /// ```
    /// use rust_log_pipeline::appenders::ConsoleAppender;
    /// use rust_log_pipeline::OutputFormat;
    ///
    /// let appender = ConsoleAppender::new()
    ///     .with_output_format(OutputFormat::Logfmt);
    /// ```
    #[must_use]
    pub fn with_output_format(mut self, format: OutputFormat) -> Self {
        self.output_format = format;
        self
    }

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

    fn render(&self, entry: &LogEntry) -> String {
        match self.output_format {
            OutputFormat::Text if self.use_colors => self.format_colored(entry),
            _ => self.output_format.format(entry, &self.timestamp_format),
        }
    }

    /// Text layout with a colored level column
    fn format_colored(&self, entry: &LogEntry) -> String {
        let plain = OutputFormat::Text.format(entry, &self.timestamp_format);
        let column = format!("[{:7}]", entry.level.to_str());
        let colored = column.color(entry.level.color_code()).to_string();
        plain.replacen(&column, &colored, 1)
    }
}

impl Default for ConsoleAppender {
    fn default() -> Self {
        Self::new()
    }
}

impl Appender for ConsoleAppender {
    fn append(&mut self, entry: &LogEntry) -> Result<()> {
        let output = self.render(entry);

        match entry.level {
            LogLevel::Error | LogLevel::Fatal => eprintln!("{}", output),
            _ => println!("{}", output),
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        use std::io::Write;
        std::io::stdout().flush()?;
        std::io::stderr().flush()?;
        Ok(())
    }

    fn name(&self) -> &str {
        "console"
    }
}
