//! Internal logging system for the viewport renderer
//!
//! - Customizable sink via the `Logger` trait
//! - Severity levels (Trace, Debug, Info, Warn, Error)
//! - Colored console output with a severity floor by default
//! - In-memory capture for hosts and tests
//! - File and line information for ERROR logs

use colored::*;
use std::sync::{Arc, Mutex};
use std::time::SystemTime;
use chrono::{DateTime, Local};

/// Logger trait for custom logging implementations
///
/// Installed process-wide with `Engine::set_logger`. Every component logs
/// through the `render_*!` macros, which route here.
///
/// # Example
///
/// ```ignore
/// use viewport_render::viewport::log::{Logger, LogEntry};
///
/// struct StatusBarLogger;
///
/// impl Logger for StatusBarLogger {
///     fn log(&self, entry: &LogEntry) {
///         // Forward to the host application's status bar...
///     }
/// }
/// ```
pub trait Logger: Send + Sync {
    /// Log an entry
    fn log(&self, entry: &LogEntry);
}

/// Log entry containing all information about a log message
#[derive(Debug, Clone)]
pub struct LogEntry {
    /// Severity level
    pub severity: LogSeverity,

    /// Timestamp when the log was created
    pub timestamp: SystemTime,

    /// Source component (e.g. "viewport::InstanceManager")
    pub source: String,

    /// Log message
    pub message: String,

    /// Source file (only for ERROR logs)
    pub file: Option<&'static str>,

    /// Source line (only for ERROR logs)
    pub line: Option<u32>,
}

/// Log severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LogSeverity {
    /// Per-request chatter (queue calls, post passes)
    Trace,

    /// Per-pass summaries (budget resolution, retirement)
    Debug,

    /// Lifecycle messages (logger or config swapped)
    Info,

    /// Recoverable contract violations and budget overflow
    Warn,

    /// Failures returned as `Err`
    Error,
}

impl LogSeverity {
    /// Fixed-width label used by `DefaultLogger`
    pub fn label(&self) -> &'static str {
        match self {
            LogSeverity::Trace => "TRACE",
            LogSeverity::Debug => "DEBUG",
            LogSeverity::Info => "INFO ",
            LogSeverity::Warn => "WARN ",
            LogSeverity::Error => "ERROR",
        }
    }
}

/// Default logger: colored console output
///
/// Format:
/// - Normal: `[timestamp] [SEVERITY] [source] message`
/// - Error: `[timestamp] [ERROR] [source] message (file:line)`
///
/// Entries below `min_severity` are dropped. Per-frame trace output is
/// noisy, so the default floor is `Info`.
#[derive(Debug, Clone, Copy)]
pub struct DefaultLogger {
    min_severity: LogSeverity,
}

impl DefaultLogger {
    /// Create a console logger with the given severity floor
    pub fn new(min_severity: LogSeverity) -> Self {
        Self { min_severity }
    }

    /// Severity floor of this logger
    pub fn min_severity(&self) -> LogSeverity {
        self.min_severity
    }

    /// Whether an entry of this severity would be printed
    pub fn accepts(&self, severity: LogSeverity) -> bool {
        severity >= self.min_severity
    }
}

impl Default for DefaultLogger {
    fn default() -> Self {
        Self::new(LogSeverity::Info)
    }
}

impl Logger for DefaultLogger {
    fn log(&self, entry: &LogEntry) {
        if !self.accepts(entry.severity) {
            return;
        }

        let datetime: DateTime<Local> = entry.timestamp.into();
        let timestamp = datetime.format("%Y-%m-%d %H:%M:%S%.3f").to_string();

        let label = entry.severity.label();
        let severity_str = match entry.severity {
            LogSeverity::Trace => label.bright_black(),
            LogSeverity::Debug => label.cyan(),
            LogSeverity::Info => label.green(),
            LogSeverity::Warn => label.yellow(),
            LogSeverity::Error => label.red().bold(),
        };
        let source = entry.source.bright_blue();

        match (entry.file, entry.line) {
            (Some(file), Some(line)) => println!(
                "[{}] [{}] [{}] {} ({}:{})",
                timestamp, severity_str, source, entry.message, file, line
            ),
            _ => println!(
                "[{}] [{}] [{}] {}",
                timestamp, severity_str, source, entry.message
            ),
        }
    }
}

/// Logger that keeps every entry in memory.
///
/// Cloning shares the same storage, so one clone can be installed with
/// `Engine::set_logger` while another is kept to inspect the entries.
#[derive(Debug, Clone, Default)]
pub struct CaptureLogger {
    entries: Arc<Mutex<Vec<LogEntry>>>,
}

impl CaptureLogger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all captured entries
    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries.lock().map(|e| e.clone()).unwrap_or_default()
    }

    /// Captured entries at or above a severity
    pub fn entries_at_least(&self, severity: LogSeverity) -> Vec<LogEntry> {
        self.entries()
            .into_iter()
            .filter(|e| e.severity >= severity)
            .collect()
    }

    /// Captured entries logged under `source`
    pub fn entries_from(&self, source: &str) -> Vec<LogEntry> {
        self.entries()
            .into_iter()
            .filter(|e| e.source == source)
            .collect()
    }

    /// Whether any captured message from `source` contains `needle`
    pub fn contains(&self, source: &str, needle: &str) -> bool {
        self.entries()
            .iter()
            .any(|e| e.source == source && e.message.contains(needle))
    }

    /// Drop all captured entries
    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.clear();
        }
    }
}

impl Logger for CaptureLogger {
    fn log(&self, entry: &LogEntry) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.push(entry.clone());
        }
    }
}

// ===== LOGGING MACROS =====

/// Log a TRACE message
///
/// ```ignore
/// render_trace!("viewport::InstanceManager", "queued request {}", id);
/// ```
#[macro_export]
macro_rules! render_trace {
    ($source:expr, $($arg:tt)*) => {
        $crate::viewport::Engine::log(
            $crate::viewport::log::LogSeverity::Trace,
            $source,
            format!($($arg)*)
        )
    };
}

/// Log a DEBUG message
#[macro_export]
macro_rules! render_debug {
    ($source:expr, $($arg:tt)*) => {
        $crate::viewport::Engine::log(
            $crate::viewport::log::LogSeverity::Debug,
            $source,
            format!($($arg)*)
        )
    };
}

/// Log an INFO message
#[macro_export]
macro_rules! render_info {
    ($source:expr, $($arg:tt)*) => {
        $crate::viewport::Engine::log(
            $crate::viewport::log::LogSeverity::Info,
            $source,
            format!($($arg)*)
        )
    };
}

/// Log a WARN message
#[macro_export]
macro_rules! render_warn {
    ($source:expr, $($arg:tt)*) => {
        $crate::viewport::Engine::log(
            $crate::viewport::log::LogSeverity::Warn,
            $source,
            format!($($arg)*)
        )
    };
}

/// Log an ERROR message with file:line information
#[macro_export]
macro_rules! render_error {
    ($source:expr, $($arg:tt)*) => {
        $crate::viewport::Engine::log_detailed(
            $crate::viewport::log::LogSeverity::Error,
            $source,
            format!($($arg)*),
            file!(),
            line!()
        )
    };
}

/// Log an ERROR message and build an `Error::InvalidState` carrying it
///
/// ```ignore
/// return Err(render_err!("viewport::Primitive", "'{}' drawn before update", name));
/// ```
#[macro_export]
macro_rules! render_err {
    ($source:expr, $($arg:tt)*) => {{
        let message = format!($($arg)*);
        $crate::viewport::Engine::log_detailed(
            $crate::viewport::log::LogSeverity::Error,
            $source,
            message.clone(),
            file!(),
            line!()
        );
        $crate::viewport::Error::InvalidState(message)
    }};
}

/// Log an ERROR message and return `Err(Error::InvalidState)` from the
/// enclosing function
#[macro_export]
macro_rules! render_bail {
    ($source:expr, $($arg:tt)*) => {
        return Err($crate::render_err!($source, $($arg)*))
    };
}

#[cfg(test)]
#[path = "log_tests.rs"]
mod tests;
