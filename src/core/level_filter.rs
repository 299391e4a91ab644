//! Severity threshold check

use super::log_level::LogLevel;
use std::sync::atomic::{AtomicU8, Ordering};

/// Admits entries whose level is at or above a configurable minimum.
///
/// The threshold is a single atomic, so `set_min_level` is visible to
/// every thread without locking.
#[derive(Debug)]
pub struct LevelFilter {
    min_level: AtomicU8,
}

impl LevelFilter {
    pub const fn new(min_level: LogLevel) -> Self {
        Self {
            min_level: AtomicU8::new(min_level.ordinal()),
        }
    }

    #[inline]
    pub fn should_log(&self, level: LogLevel) -> bool {
        level.ordinal() >= self.min_level.load(Ordering::Relaxed)
    }

    pub fn set_min_level(&self, level: LogLevel) {
        self.min_level.store(level.ordinal(), Ordering::Relaxed);
    }

    pub fn min_level(&self) -> LogLevel {
        LogLevel::from_ordinal(self.min_level.load(Ordering::Relaxed)).unwrap_or_default()
    }
}

impl Default for LevelFilter {
    fn default() -> Self {
        Self::new(LogLevel::Info)
    }
}
