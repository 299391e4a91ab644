//! Process-wide default logger
//!
//! Code that cannot thread a `Logger` through its call graph can use the
//! default binding. Install one early with [`set_default`]; otherwise the
//! first call to [`default_logger`] builds one from the environment.
//!
//! The default lives in a static and is never dropped, so its `Drop` drain
//! does not run at process exit. Entries still buffered when `main` returns
//! are lost unless [`shutdown`] (or `stop()` on the logger) is called first.
//!
//! ```
//! use rust_log_pipeline::global;
//!
//! let logger = global::default_logger();
//! logger.info("using the process-wide logger");
//!
//! // Before exiting
//! global::shutdown().unwrap();
//! ```

use super::{
    error::{LoggerError, Result},
    logger::Logger,
};
use std::sync::{Arc, OnceLock};

static DEFAULT_LOGGER: OnceLock<Arc<Logger>> = OnceLock::new();

/// Install `logger` as the process-wide default.
///
/// Fails if a default is already bound, including one created lazily by
/// [`default_logger`].
pub fn set_default(logger: Logger) -> Result<Arc<Logger>> {
    let logger = Arc::new(logger);
    DEFAULT_LOGGER
        .set(Arc::clone(&logger))
        .map_err(|_| LoggerError::config("global", "a default logger is already installed"))?;
    Ok(logger)
}

/// The process-wide default, built on first use.
///
/// The lazily built logger writes to the console (when the `console`
/// feature is enabled) and honours `LOG_LEVEL`.
pub fn default_logger() -> Arc<Logger> {
    Arc::clone(DEFAULT_LOGGER.get_or_init(|| Arc::new(build_from_env())))
}

/// The process-wide default, if one is bound
pub fn try_default_logger() -> Option<Arc<Logger>> {
    DEFAULT_LOGGER.get().cloned()
}

/// Stop the default logger, draining its buffer. No-op if none is bound.
///
/// The binding stays in place; later calls through it are rejected.
pub fn shutdown() -> Result<()> {
    match DEFAULT_LOGGER.get() {
        Some(logger) => logger.stop(),
        None => Ok(()),
    }
}

fn build_from_env() -> Logger {
    let builder = Logger::builder();
    #[cfg(feature = "console")]
    let builder = builder.appender(crate::appenders::ConsoleAppender::new());
    builder.with_env_overrides().build()
}
