//! Bridge from the `log` facade to a host-provided sink.
//!
//! Companion computers usually already own a logging pipeline (a flight
//! controller console, a ground-station link). Installing a [`Logger`] with
//! [`set_logger`] routes every record the engine emits into that pipeline.
//! Hosts that already install a `log` implementation of their own (the CLI
//! does, through `tracing-log`) should skip this.

use std::sync::{Arc, OnceLock};

/// Receiver for log records emitted by this crate.
///
/// # Examples
///
/// ```rust
/// use hcs_auth_core::logger::{LogLevel, Logger};
///
/// struct Console;
///
/// impl Logger for Console {
///     fn log(&self, level: LogLevel, message: String) {
///         println!("[{level:?}] {message}");
///     }
/// }
/// ```
#[cfg_attr(feature = "ffi", uniffi::export(with_foreign))]
pub trait Logger: Sync + Send {
    /// Records `message` at `level`.
    fn log(&self, level: LogLevel, message: String);
}

/// Severity of a forwarded record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "ffi", derive(uniffi::Enum))]
pub enum LogLevel {
    /// Very detailed tracing.
    Trace,
    /// Debugging detail.
    Debug,
    /// Normal progress, such as state transitions.
    Info,
    /// Rejected scans that are not attacks.
    Warn,
    /// Security events and internal faults.
    Error,
}

impl From<log::Level> for LogLevel {
    fn from(level: log::Level) -> Self {
        match level {
            log::Level::Error => Self::Error,
            log::Level::Warn => Self::Warn,
            log::Level::Info => Self::Info,
            log::Level::Debug => Self::Debug,
            log::Level::Trace => Self::Trace,
        }
    }
}

struct ForeignLogger;

impl log::Log for ForeignLogger {
    fn enabled(&self, _metadata: &log::Metadata) -> bool {
        true
    }

    fn log(&self, record: &log::Record) {
        if !should_forward(record.module_path(), record.level()) {
            return;
        }
        if let Some(logger) = LOGGER_INSTANCE.get() {
            logger.log(record.level().into(), format!("{}", record.args()));
        } else {
            eprintln!("Logger not set: {}", record.args());
        }
    }

    fn flush(&self) {}
}

/// Debug and trace records from dependencies are noise on the host side.
fn should_forward(module_path: Option<&str>, level: log::Level) -> bool {
    let is_own_record = module_path.is_some_and(|path| path.starts_with("hcs_auth"));
    let is_verbose = matches!(level, log::Level::Debug | log::Level::Trace);
    is_own_record || !is_verbose
}

static LOGGER_INSTANCE: OnceLock<Arc<dyn Logger>> = OnceLock::new();

/// Installs `logger` as the process-wide sink.
///
/// Only the first call takes effect; later calls are reported on stderr and
/// otherwise ignored.
#[cfg_attr(feature = "ffi", uniffi::export)]
pub fn set_logger(logger: Arc<dyn Logger>) {
    if LOGGER_INSTANCE.set(logger).is_err() {
        eprintln!("Logger already set");
        return;
    }
    if let Err(e) = init_logger() {
        eprintln!("Failed to set logger: {e}");
    }
}

fn init_logger() -> Result<(), log::SetLoggerError> {
    static LOGGER: ForeignLogger = ForeignLogger;
    log::set_logger(&LOGGER)?;
    log::set_max_level(log::LevelFilter::Trace);
    Ok(())
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    #[test_case(Some("hcs_auth_core::engine"), log::Level::Trace, true ; "own trace")]
    #[test_case(Some("hcs_auth_core::engine"), log::Level::Error, true ; "own error")]
    #[test_case(Some("aes_gcm"), log::Level::Debug, false ; "dependency debug")]
    #[test_case(Some("aes_gcm"), log::Level::Warn, true ; "dependency warn")]
    #[test_case(None, log::Level::Trace, false ; "unknown trace")]
    fn test_forwarding_filter(module: Option<&str>, level: log::Level, expected: bool) {
        assert_eq!(should_forward(module, level), expected);
    }

    #[test]
    fn test_level_mapping() {
        assert_eq!(LogLevel::from(log::Level::Warn), LogLevel::Warn);
        assert_eq!(LogLevel::from(log::Level::Trace), LogLevel::Trace);
    }
}
