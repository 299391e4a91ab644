//! Core pipeline types and traits

pub mod appender;
pub mod buffer;
pub mod error;
pub mod global;
pub mod level_filter;
pub mod log_entry;
pub mod log_level;
pub mod logger;
pub mod metrics;
pub mod output_format;
pub mod redaction;
pub mod sampling;
pub mod sink;
pub mod timestamp;
pub mod value;

pub use appender::Appender;
pub use buffer::{BufferConfig, BufferStats, FlushHandler, FlushTrigger, LogBuffer};
pub use error::{LoggerError, Result};
pub use level_filter::LevelFilter;
pub use log_entry::LogEntry;
pub use log_level::LogLevel;
pub use logger::{IntoPayload, Logger, LoggerBuilder, LoggerStats, LOG_LEVEL_ENV};
pub use metrics::LoggerMetrics;
pub use output_format::{entry_to_json, sanitize_line, OutputFormat};
pub use redaction::{
    mask, MaskResult, Redactor, RedactorConfig, SensitiveFields, DEFAULT_MAX_DEPTH,
    DEFAULT_SENSITIVE_FIELDS,
};
pub use sampling::{Sampler, SamplerMetrics, SamplingStats};
pub use sink::Sink;
pub use timestamp::TimestampFormat;
pub use value::{Array, Object, Value, CIRCULAR_MARKER, MAX_RENDER_DEPTH, TOO_DEEP_MARKER};
