//! Output format configuration for log entries
//!
//! Provides different output formats for log entries:
//! - Text: Human-readable format (default)
//! - Json: One JSON object per line
//! - Logfmt: Key-value format compatible with log aggregation tools
//!
//! Rendered lines never contain raw newlines, carriage returns or tabs, so
//! a payload cannot forge additional log lines.

use super::log_entry::LogEntry;
use super::timestamp::TimestampFormat;
use serde::{Deserialize, Serialize};

/// Output format for log entries
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputFormat {
    /// `[2025-01-08T10:30:45.123Z] [INFO   ] http - Request processed {"status":200}`
    #[default]
    Text,

    /// `{"timestamp":"2025-01-08T10:30:45.123Z","level":"INFO","message":"...","payload":[...]}`
    Json,

    /// `timestamp=2025-01-08T10:30:45.123Z level=INFO label=http message="Request processed"`
    Logfmt,
}

/// Escape characters that would break a single-line record
pub fn sanitize_line(text: &str) -> String {
    text.replace('\n', "\\n")
        .replace('\r', "\\r")
        .replace('\t', "\\t")
}

/// Structured JSON form of an entry, shared by the JSON output format and
/// the JSON appender
pub fn entry_to_json(entry: &LogEntry, timestamp_format: &TimestampFormat) -> serde_json::Value {
    let mut json_obj = serde_json::Map::new();

    let timestamp = if timestamp_format.is_numeric() {
        serde_json::Value::Number(entry.timestamp.into())
    } else {
        serde_json::Value::String(timestamp_format.format_millis(entry.timestamp))
    };
    json_obj.insert("timestamp".to_string(), timestamp);
    json_obj.insert(
        "level".to_string(),
        serde_json::Value::String(entry.level.to_str().to_string()),
    );
    if let Some(ref label) = entry.label {
        json_obj.insert("label".to_string(), serde_json::Value::String(label.clone()));
    }
    json_obj.insert(
        "message".to_string(),
        serde_json::Value::String(entry.render_payload()),
    );
    json_obj.insert(
        "payload".to_string(),
        serde_json::Value::Array(entry.payload.iter().map(|v| v.to_json()).collect()),
    );

    serde_json::Value::Object(json_obj)
}

impl OutputFormat {
    /// Format a log entry according to this output format
    pub fn format(&self, entry: &LogEntry, timestamp_format: &TimestampFormat) -> String {
        match self {
            OutputFormat::Text => self.format_text(entry, timestamp_format),
            OutputFormat::Json => self.format_json(entry, timestamp_format),
            OutputFormat::Logfmt => self.format_logfmt(entry, timestamp_format),
        }
    }

    fn format_text(&self, entry: &LogEntry, timestamp_format: &TimestampFormat) -> String {
        let timestamp_str = timestamp_format.format_millis(entry.timestamp);
        let message = sanitize_line(&entry.render_payload());

        match entry.label {
            Some(ref label) => format!(
                "[{}] [{:7}] {} - {}",
                timestamp_str,
                entry.level.to_str(),
                sanitize_line(label),
                message
            ),
            None => format!(
                "[{}] [{:7}] {}",
                timestamp_str,
                entry.level.to_str(),
                message
            ),
        }
    }

    fn format_json(&self, entry: &LogEntry, timestamp_format: &TimestampFormat) -> String {
        // serde_json escapes control characters inside strings
        entry_to_json(entry, timestamp_format).to_string()
    }

    fn format_logfmt(&self, entry: &LogEntry, timestamp_format: &TimestampFormat) -> String {
        let mut parts = Vec::with_capacity(4);

        parts.push(format!(
            "timestamp={}",
            escape_logfmt_value(&timestamp_format.format_millis(entry.timestamp))
        ));
        parts.push(format!("level={}", entry.level.to_str()));
        if let Some(ref label) = entry.label {
            parts.push(format!("label={}", escape_logfmt_value(label)));
        }
        parts.push(format!(
            "message={}",
            quote_logfmt_value(&entry.render_payload())
        ));

        parts.join(" ")
    }
}

/// Quote a logfmt value if it contains separators
fn escape_logfmt_value(value: &str) -> String {
    if value.contains(' ') || value.contains('"') || value.contains('=') {
        quote_logfmt_value(value)
    } else {
        sanitize_line(value)
    }
}

fn quote_logfmt_value(value: &str) -> String {
    format!(
        "\"{}\"",
        sanitize_line(&value.replace('\\', "\\\\").replace('"', "\\\""))
    )
}
