//! Injected logging capability.
//!
//! Library code never logs through a global: every scanner receives a
//! [`Logger`] and formats its own lines, so the exact text of each line is
//! stable and can be asserted on. [`TracingLogger`] is the production sink.

use std::fmt;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Severity of a log line, most verbose last.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Display,
    EnumString,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Verbose,
    Debug,
    Silly,
}

/// A sink for pre-formatted log lines.
pub trait Logger: Send + Sync {
    /// Emit one line at the given level.
    fn log(&self, level: LogLevel, message: &str);

    fn error(&self, message: &str) {
        self.log(LogLevel::Error, message);
    }

    fn warn(&self, message: &str) {
        self.log(LogLevel::Warn, message);
    }

    fn info(&self, message: &str) {
        self.log(LogLevel::Info, message);
    }

    fn verbose(&self, message: &str) {
        self.log(LogLevel::Verbose, message);
    }

    fn debug(&self, message: &str) {
        self.log(LogLevel::Debug, message);
    }

    fn silly(&self, message: &str) {
        self.log(LogLevel::Silly, message);
    }
}

impl<L: Logger + ?Sized> Logger for &L {
    fn log(&self, level: LogLevel, message: &str) {
        (**self).log(level, message);
    }
}

impl<L: Logger + ?Sized> Logger for std::sync::Arc<L> {
    fn log(&self, level: LogLevel, message: &str) {
        (**self).log(level, message);
    }
}

/// Forwards every line to `tracing`.
///
/// `verbose` maps to `DEBUG` and `silly` to `TRACE`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl TracingLogger {
    /// Create a new tracing-backed logger.
    pub fn new() -> Self {
        Self
    }
}

impl Logger for TracingLogger {
    fn log(&self, level: LogLevel, message: &str) {
        match level {
            LogLevel::Error => tracing::error!(target: "trawl", "{}", message),
            LogLevel::Warn => tracing::warn!(target: "trawl", "{}", message),
            LogLevel::Info => tracing::info!(target: "trawl", "{}", message),
            LogLevel::Verbose | LogLevel::Debug => {
                tracing::debug!(target: "trawl", severity = %level, "{}", message)
            }
            LogLevel::Silly => tracing::trace!(target: "trawl", "{}", message),
        }
    }
}

/// Decorates another logger with a `[name] ` prefix on every line.
pub struct PrefixedLogger<L> {
    prefix: String,
    inner: L,
}

impl<L: Logger> PrefixedLogger<L> {
    /// Wrap `inner`, prefixing lines with `[name] `.
    pub fn new(name: impl fmt::Display, inner: L) -> Self {
        Self {
            prefix: format!("[{name}] "),
            inner,
        }
    }
}

impl<L: Logger> Logger for PrefixedLogger<L> {
    fn log(&self, level: LogLevel, message: &str) {
        self.inner.log(level, &format!("{}{}", self.prefix, message));
    }
}

impl<L> fmt::Debug for PrefixedLogger<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrefixedLogger")
            .field("prefix", &self.prefix)
            .finish_non_exhaustive()
    }
}

/// One captured line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub level: LogLevel,
    pub message: String,
}

/// Keeps every line in memory, for assertions.
#[derive(Debug, Default)]
pub struct RecordingLogger {
    entries: Mutex<Vec<LogEntry>>,
}

impl RecordingLogger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all captured lines in emission order.
    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries
            .lock()
            .map(|entries| entries.clone())
            .unwrap_or_default()
    }

    /// Messages captured at `level`.
    pub fn messages(&self, level: LogLevel) -> Vec<String> {
        self.entries()
            .into_iter()
            .filter(|entry| entry.level == level)
            .map(|entry| entry.message)
            .collect()
    }

    /// Whether a line with exactly this level and text was captured.
    pub fn contains(&self, level: LogLevel, message: &str) -> bool {
        self.entries()
            .iter()
            .any(|entry| entry.level == level && entry.message == message)
    }
}

impl Logger for RecordingLogger {
    fn log(&self, level: LogLevel, message: &str) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.push(LogEntry {
                level,
                message: message.to_string(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_logger_levels() {
        let logger = RecordingLogger::new();
        logger.debug("one");
        logger.info("two");
        logger.silly("three");

        assert_eq!(logger.entries().len(), 3);
        assert_eq!(logger.messages(LogLevel::Info), vec!["two".to_string()]);
        assert!(logger.contains(LogLevel::Silly, "three"));
        assert!(!logger.contains(LogLevel::Debug, "two"));
    }

    #[test]
    fn test_prefixed_logger() {
        let recorder = RecordingLogger::new();
        let logger = PrefixedLogger::new("trawl", &recorder);

        logger.warn("test message");
        logger.verbose("second");

        assert!(recorder.contains(LogLevel::Warn, "[trawl] test message"));
        assert!(recorder.contains(LogLevel::Verbose, "[trawl] second"));
    }

    #[test]
    fn test_level_order() {
        assert!(LogLevel::Error < LogLevel::Debug);
        assert_eq!(LogLevel::Verbose.to_string(), "verbose");
    }
}
