//! Logging macros for ergonomic log message formatting.
//!
//! The level macros format their arguments like `format!` and log the result
//! as a single string payload. Formatting happens only when the level passes
//! the logger's filter.
//!
//! # Examples
//!
//! ```
//! use rust_log_pipeline::prelude::*;
//! use rust_log_pipeline::{info, object};
//!
//! let logger = Logger::new();
//!
//! info!(logger, "Server started");
//!
//! let port = 8080;
//! info!(logger, "Server listening on port {}", port);
//!
//! // Structured payloads go through the methods directly
//! logger.info(object! { "port" => port, "token" => "abcd1234" });
//! ```

/// Log a formatted message at the given level.
///
/// # Examples
///
/// ```
/// # use rust_log_pipeline::prelude::*;
/// # let logger = Logger::new();
/// use rust_log_pipeline::log;
/// log!(logger, LogLevel::Info, "Simple message");
/// log!(logger, LogLevel::Error, "Error code: {}", 500);
/// ```
#[macro_export]
macro_rules! log {
    ($logger:expr, $level:expr, $($arg:tt)+) => {{
        let level = $level;
        if $logger.is_enabled(level) {
            $logger.log(level, None, format!($($arg)+));
        }
    }};
}

/// Log a debug-level message.
///
/// ```
/// # use rust_log_pipeline::prelude::*;
/// # let logger = Logger::new();
/// use rust_log_pipeline::debug;
/// debug!(logger, "Counter value: {}", 10);
/// ```
#[macro_export]
macro_rules! debug {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Debug, $($arg)+)
    };
}

/// Log an info-level message.
#[macro_export]
macro_rules! info {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Info, $($arg)+)
    };
}

/// Log a warning-level message.
///
/// ```
/// # use rust_log_pipeline::prelude::*;
/// # let logger = Logger::new();
/// use rust_log_pipeline::warning;
/// warning!(logger, "Retry attempt {} of {}", 3, 5);
/// ```
#[macro_export]
macro_rules! warning {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Warning, $($arg)+)
    };
}

/// Log an error-level message.
#[macro_export]
macro_rules! error {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Error, $($arg)+)
    };
}

/// Log a fatal message synchronously.
#[macro_export]
macro_rules! fatal {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Fatal, $($arg)+)
    };
}

/// Build an [`Object`](crate::Object) from `key => value` pairs.
///
/// ```
/// use rust_log_pipeline::object;
///
/// let user = object! { "id" => 7, "name" => "ada", "admin" => false };
/// assert_eq!(user.len(), 3);
/// assert_eq!(user.get("id").unwrap().as_i64(), Some(7));
/// ```
#[macro_export]
macro_rules! object {
    () => {
        $crate::Object::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let object = $crate::Object::new();
        $(object.insert($key, $value);)+
        object
    }};
}
