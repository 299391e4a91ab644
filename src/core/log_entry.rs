//! Log entry structure

use super::log_level::LogLevel;
use super::value::Value;
use chrono::{DateTime, Utc};

/// A single admitted, redacted log event.
///
/// Entries are created by the logger at call time and are not modified
/// after they are handed to the buffer.
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub level: LogLevel,
    /// Optional log-site name, also used as the sampling key
    pub label: Option<String>,
    /// Milliseconds since the Unix epoch
    pub timestamp: i64,
    pub payload: Vec<Value>,
}

impl LogEntry {
    pub fn new(level: LogLevel, payload: Vec<Value>) -> Self {
        Self {
            level,
            label: None,
            timestamp: Utc::now().timestamp_millis(),
            payload,
        }
    }

    /// Convenience constructor for a single-message entry
    pub fn message(level: LogLevel, message: impl Into<String>) -> Self {
        Self::new(level, vec![Value::String(message.into())])
    }

    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    #[must_use]
    pub fn with_timestamp(mut self, timestamp_ms: i64) -> Self {
        self.timestamp = timestamp_ms;
        self
    }

    /// Timestamp as a `DateTime`, falling back to the epoch when out of range
    pub fn datetime(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(self.timestamp).unwrap_or_default()
    }

    /// Payload values joined by a single space, strings unquoted
    pub fn render_payload(&self) -> String {
        self.payload
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" ")
    }
}
