//! Timestamp formatting for appenders
//!
//! Entries carry milliseconds since the Unix epoch; appenders choose how
//! to render them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Timestamp rendering options
///
/// ```
/// use rust_log_pipeline::TimestampFormat;
///
/// let ts = TimestampFormat::Iso8601.format_millis(1_736_332_245_123);
/// assert_eq!(ts, "2025-01-08T10:30:45.123Z");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimestampFormat {
    /// `2025-01-08T10:30:45.123Z`
    #[default]
    Iso8601,

    /// `2025-01-08T10:30:45.123+00:00`
    Rfc3339,

    /// `1736332245123`
    UnixMillis,

    /// Any strftime-compatible format string
    Custom(String),
}

impl TimestampFormat {
    #[must_use]
    pub fn format(&self, datetime: &DateTime<Utc>) -> String {
        match self {
            TimestampFormat::Iso8601 => datetime.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string(),
            TimestampFormat::Rfc3339 => {
                datetime.to_rfc3339_opts(chrono::SecondsFormat::Millis, false)
            }
            TimestampFormat::UnixMillis => datetime.timestamp_millis().to_string(),
            TimestampFormat::Custom(format_str) => datetime.format(format_str).to_string(),
        }
    }

    /// Format milliseconds since the epoch
    #[must_use]
    pub fn format_millis(&self, timestamp_ms: i64) -> String {
        match self {
            TimestampFormat::UnixMillis => timestamp_ms.to_string(),
            _ => self.format(&DateTime::from_timestamp_millis(timestamp_ms).unwrap_or_default()),
        }
    }

    #[must_use]
    pub fn is_numeric(&self) -> bool {
        matches!(self, TimestampFormat::UnixMillis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXED_MS: i64 = 1_736_332_245_123; // 2025-01-08 10:30:45.123 UTC

    #[test]
    fn test_iso8601() {
        assert_eq!(
            TimestampFormat::Iso8601.format_millis(FIXED_MS),
            "2025-01-08T10:30:45.123Z"
        );
    }

    #[test]
    fn test_rfc3339() {
        assert_eq!(
            TimestampFormat::Rfc3339.format_millis(FIXED_MS),
            "2025-01-08T10:30:45.123+00:00"
        );
    }

    #[test]
    fn test_unix_millis() {
        let format = TimestampFormat::UnixMillis;
        assert_eq!(format.format_millis(FIXED_MS), "1736332245123");
        assert!(format.is_numeric());
    }

    #[test]
    fn test_custom() {
        let format = TimestampFormat::Custom("%d/%b/%Y:%H:%M:%S".to_string());
        assert_eq!(format.format_millis(FIXED_MS), "08/Jan/2025:10:30:45");
        assert!(!format.is_numeric());
    }
}
