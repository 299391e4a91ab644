//! # Rust Log Pipeline
//!
//! A structured logging front-end that sits between call sites and the
//! appenders that persist entries.
//!
//! Every call passes through:
//!
//! 1. a **level filter** (`debug < info < warning < error < fatal`),
//! 2. a deterministic per-label **sampler**,
//! 3. a cycle-safe **redactor** that masks values of sensitive fields,
//! 4. a **buffer** that delivers batches on size, time and severity
//!    triggers. Fatal entries bypass it and are written synchronously after
//!    everything buffered before them.
//!
//! ```
//! use rust_log_pipeline::prelude::*;
//!
//! let logger = Logger::builder()
//!     .min_level(LogLevel::Debug)
//!     .buffering(BufferConfig::default().with_max_entries(200))
//!     .build();
//!
//! logger.info(("user signed in", object! { "user" => "ada", "token" => "f00dfeed" }));
//! logger.error("payment declined");
//! logger.stop().unwrap();
//! ```
//!
//! ## Features
//!
//! - `console` (default): colored [`ConsoleAppender`](appenders::ConsoleAppender)
//! - `file` (default): [`FileAppender`](appenders::FileAppender) with advisory locking
//! - `async`: `Logger::flush_async` / `Logger::stop_async` on tokio's blocking pool

pub mod appenders;
pub mod core;
pub mod macros;

pub use crate::core::global;

pub mod prelude {
    #[cfg(feature = "console")]
    pub use crate::appenders::ConsoleAppender;
    #[cfg(feature = "file")]
    pub use crate::appenders::FileAppender;
    pub use crate::appenders::JsonAppender;
    pub use crate::core::{
        Appender, Array, BufferConfig, IntoPayload, LogEntry, LogLevel, Logger, LoggerBuilder,
        LoggerError, Object, OutputFormat, RedactorConfig, Result, SensitiveFields,
        TimestampFormat, Value,
    };
    pub use crate::object;
}

pub use crate::core::{
    mask, sanitize_line, Appender, Array, BufferConfig, BufferStats, FlushHandler, FlushTrigger,
    IntoPayload, LevelFilter, LogBuffer, LogEntry, LogLevel, Logger, LoggerBuilder, LoggerError,
    LoggerMetrics, LoggerStats, MaskResult, Object, OutputFormat, Redactor, RedactorConfig, Result,
    Sampler, SamplerMetrics, SamplingStats, SensitiveFields, Sink, TimestampFormat, Value,
    CIRCULAR_MARKER, DEFAULT_MAX_DEPTH, DEFAULT_SENSITIVE_FIELDS, LOG_LEVEL_ENV, MAX_RENDER_DEPTH,
    TOO_DEEP_MARKER,
};
