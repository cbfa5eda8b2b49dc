/// Engine - process-wide facilities of the viewport renderer
///
/// Holds the things that are genuinely process-wide: the logger sink and the
/// default instancing configuration used when a walker is created without an
/// explicit one. The instance manager itself is NOT stored here; each walker
/// owns its own and passes it into primitives explicitly.

use std::sync::{OnceLock, RwLock};
use std::time::SystemTime;
use crate::config::InstancingConfig;
use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger};

// ===== INTERNAL STATE =====

/// Global logger (initialized with DefaultLogger)
static LOGGER: OnceLock<RwLock<Box<dyn Logger>>> = OnceLock::new();

/// Process-wide default instancing configuration
static INSTANCING_CONFIG: OnceLock<RwLock<InstancingConfig>> = OnceLock::new();

fn logger_lock() -> &'static RwLock<Box<dyn Logger>> {
    LOGGER.get_or_init(|| RwLock::new(Box::new(DefaultLogger::default())))
}

fn config_lock() -> &'static RwLock<InstancingConfig> {
    INSTANCING_CONFIG.get_or_init(|| RwLock::new(InstancingConfig::default()))
}

// ===== PUBLIC API =====

/// Process-wide logging and default configuration.
///
/// # Example
///
/// ```no_run
/// use viewport_render::viewport::{Engine, InstancingConfig};
/// use viewport_render::viewport::log::CaptureLogger;
///
/// let capture = CaptureLogger::new();
/// Engine::set_logger(capture.clone());
/// Engine::set_instancing_config(InstancingConfig::default().with_budget(250_000));
/// ```
pub struct Engine;

impl Engine {
    // ===== LOGGING API =====

    /// Replace the process-wide logger
    pub fn set_logger<L: Logger + 'static>(logger: L) {
        if let Ok(mut lock) = logger_lock().write() {
            *lock = Box::new(logger);
        }
    }

    /// Reset logger to `DefaultLogger`
    pub fn reset_logger() {
        if let Ok(mut lock) = logger_lock().write() {
            *lock = Box::new(DefaultLogger::default());
        }
    }

    /// Log without file:line (used by `render_trace!` .. `render_warn!`)
    pub fn log(severity: LogSeverity, source: &str, message: String) {
        if let Ok(lock) = logger_lock().read() {
            lock.log(&LogEntry {
                severity,
                timestamp: SystemTime::now(),
                source: source.to_string(),
                message,
                file: None,
                line: None,
            });
        }
    }

    /// Log with file:line (used by `render_error!`, `render_err!`)
    pub fn log_detailed(
        severity: LogSeverity,
        source: &str,
        message: String,
        file: &'static str,
        line: u32,
    ) {
        if let Ok(lock) = logger_lock().read() {
            lock.log(&LogEntry {
                severity,
                timestamp: SystemTime::now(),
                source: source.to_string(),
                message,
                file: Some(file),
                line: Some(line),
            });
        }
    }

    // ===== CONFIGURATION API =====

    /// Set the default instancing configuration for walkers created afterwards
    pub fn set_instancing_config(config: InstancingConfig) {
        if let Ok(mut lock) = config_lock().write() {
            *lock = config;
        }
        crate::render_info!("viewport::Engine",
            "Instancing budget set to {} GL primitives", config.gl_primitive_budget);
    }

    /// Current default instancing configuration
    pub fn instancing_config() -> InstancingConfig {
        config_lock()
            .read()
            .map(|config| *config)
            .unwrap_or_default()
    }

    /// Restore `InstancingConfig::default()`
    pub fn reset_instancing_config() {
        if let Ok(mut lock) = config_lock().write() {
            *lock = InstancingConfig::default();
        }
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
