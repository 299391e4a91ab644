//! Delivery of entries to the configured appenders
//!
//! Every appender call is isolated with `catch_unwind`, so a panicking or
//! failing appender cannot stop the others from receiving entries. When no
//! appender is configured, entries go to stderr so nothing is silently lost.

use super::{
    appender::Appender,
    error::{LoggerError, Result},
    log_entry::LogEntry,
    output_format::OutputFormat,
    timestamp::TimestampFormat,
};
use parking_lot::Mutex;
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

/// Extract a readable message from a panic payload
pub(crate) fn panic_message(panic_info: &Box<dyn Any + Send>) -> String {
    if let Some(s) = panic_info.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic_info.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}

/// Best-effort writer used when no sink is available
pub(crate) fn fallback_write(entries: &[LogEntry]) {
    let timestamp_format = TimestampFormat::default();
    for entry in entries {
        eprintln!("{}", OutputFormat::Text.format(entry, &timestamp_format));
    }
}

/// Shared group of appenders
///
/// Cloning shares the group. All appenders sit behind one mutex, so a batch
/// is written without interleaving with other batches or direct writes.
#[derive(Clone, Default)]
pub struct Sink {
    appenders: Arc<Mutex<Vec<Box<dyn Appender>>>>,
}

impl Sink {
    pub fn new(appenders: Vec<Box<dyn Appender>>) -> Self {
        Self {
            appenders: Arc::new(Mutex::new(appenders)),
        }
    }

    pub fn add_appender(&self, appender: Box<dyn Appender>) {
        self.appenders.lock().push(appender);
    }

    pub fn len(&self) -> usize {
        self.appenders.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.appenders.lock().is_empty()
    }

    /// Names of the configured appenders, in order
    pub fn names(&self) -> Vec<String> {
        self.appenders
            .lock()
            .iter()
            .map(|appender| appender.name().to_string())
            .collect()
    }

    /// Write a batch in order to every appender, then flush them.
    ///
    /// Every entry is offered to every appender even after failures; the
    /// returned error names each failing appender with its first error and
    /// how many entries it did not accept.
    pub fn write_batch(&self, entries: &[LogEntry]) -> Result<()> {
        let mut appenders = self.appenders.lock();
        if appenders.is_empty() {
            fallback_write(entries);
            return Ok(());
        }

        let mut failures = Vec::new();

        for appender in appenders.iter_mut() {
            let mut failed = 0usize;
            let mut first_error = None;

            for entry in entries {
                let append_result =
                    catch_unwind(AssertUnwindSafe(|| appender.append(entry)));

                let error = match append_result {
                    Ok(Ok(())) => continue,
                    Ok(Err(e)) => e,
                    Err(panic_info) => {
                        LoggerError::sink_panic(appender.name(), panic_message(&panic_info))
                    }
                };
                failed += 1;
                first_error.get_or_insert(error);
            }

            if let Some(error) = first_error {
                failures.push(format!(
                    "appender '{}' failed on {} of {} entries: {}",
                    appender.name(),
                    failed,
                    entries.len(),
                    error
                ));
            }
        }

        if let Err(e) = Self::flush_all(&mut appenders) {
            failures.push(e.to_string());
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(LoggerError::writer(failures.join("; ")))
        }
    }

    /// Flush every appender
    pub fn flush(&self) -> Result<()> {
        let mut appenders = self.appenders.lock();
        Self::flush_all(&mut appenders)
    }

    fn flush_all(appenders: &mut [Box<dyn Appender>]) -> Result<()> {
        let mut failures = Vec::new();

        for appender in appenders.iter_mut() {
            let flush_result = catch_unwind(AssertUnwindSafe(|| appender.flush()));

            match flush_result {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    failures.push(format!("appender '{}' flush failed: {}", appender.name(), e));
                }
                Err(panic_info) => {
                    failures.push(format!(
                        "appender '{}' panicked during flush: {}",
                        appender.name(),
                        panic_message(&panic_info)
                    ));
                }
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(LoggerError::writer(failures.join("; ")))
        }
    }
}

impl std::fmt::Debug for Sink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sink")
            .field("appenders", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::LogLevel;

    struct Recording {
        name: &'static str,
        seen: Arc<Mutex<Vec<String>>>,
    }

    impl Appender for Recording {
        fn append(&mut self, entry: &LogEntry) -> Result<()> {
            self.seen.lock().push(entry.render_payload());
            Ok(())
        }

        fn flush(&mut self) -> Result<()> {
            Ok(())
        }

        fn name(&self) -> &str {
            self.name
        }
    }

    struct Panicking;

    impl Appender for Panicking {
        fn append(&mut self, _entry: &LogEntry) -> Result<()> {
            panic!("appender exploded");
        }

        fn flush(&mut self) -> Result<()> {
            Ok(())
        }

        fn name(&self) -> &str {
            "panicking"
        }
    }

    #[test]
    fn test_batch_written_in_order() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Sink::new(vec![Box::new(Recording {
            name: "rec",
            seen: Arc::clone(&seen),
        })]);

        let batch: Vec<LogEntry> = (0..3)
            .map(|i| LogEntry::message(LogLevel::Info, format!("m{}", i)))
            .collect();
        sink.write_batch(&batch).unwrap();

        assert_eq!(*seen.lock(), vec!["m0", "m1", "m2"]);
    }

    #[test]
    fn test_panicking_appender_is_isolated() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Sink::new(vec![
            Box::new(Panicking),
            Box::new(Recording {
                name: "rec",
                seen: Arc::clone(&seen),
            }),
        ]);

        let err = sink
            .write_batch(&[LogEntry::message(LogLevel::Error, "still delivered")])
            .unwrap_err();

        assert!(err.to_string().contains("appender exploded"));
        assert_eq!(*seen.lock(), vec!["still delivered"]);
    }

    /// Rejects every other entry
    struct Flaky {
        calls: usize,
        accepted: Arc<Mutex<Vec<String>>>,
    }

    impl Appender for Flaky {
        fn append(&mut self, entry: &LogEntry) -> Result<()> {
            self.calls += 1;
            if self.calls % 2 == 1 {
                return Err(LoggerError::writer(format!("rejected call {}", self.calls)));
            }
            self.accepted.lock().push(entry.render_payload());
            Ok(())
        }

        fn flush(&mut self) -> Result<()> {
            Ok(())
        }

        fn name(&self) -> &str {
            "flaky"
        }
    }

    #[test]
    fn test_failure_does_not_skip_rest_of_batch() {
        let accepted = Arc::new(Mutex::new(Vec::new()));
        let sink = Sink::new(vec![Box::new(Flaky {
            calls: 0,
            accepted: Arc::clone(&accepted),
        })]);

        let batch: Vec<LogEntry> = (0..4)
            .map(|i| LogEntry::message(LogLevel::Info, format!("m{}", i)))
            .collect();
        let err = sink.write_batch(&batch).unwrap_err().to_string();

        assert_eq!(*accepted.lock(), vec!["m1", "m3"]);
        assert!(err.contains("failed on 2 of 4 entries"), "{}", err);
        assert!(err.contains("rejected call 1"), "{}", err);
    }

    #[test]
    fn test_names() {
        let sink = Sink::default();
        assert!(sink.is_empty());
        sink.add_appender(Box::new(Recording {
            name: "first",
            seen: Arc::default(),
        }));
        assert_eq!(sink.names(), vec!["first"]);
        assert_eq!(sink.len(), 1);
    }
}
