//! Logging initialisation built on flexi_logger
//!
//! Provides a process-wide logger with a compact console format. Only the
//! log level can be changed after startup; format and colour choices are
//! fixed at initialisation time.

use flexi_logger::{DeferredNow, Logger, LoggerHandle};
use std::sync::{Mutex, OnceLock};

static LOGGER_HANDLE: OnceLock<Mutex<LoggerHandle>> = OnceLock::new();

/// Initialise the global logger
///
/// `level` accepts a flexi_logger level spec ("info", "debug", ...). The
/// environment variable `RUST_LOG` takes precedence when set.
pub fn init_logging(
    level: Option<&str>,
    color_enabled: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut logger = Logger::try_with_env_or_str(level.unwrap_or("info"))?;

    if color_enabled {
        logger = logger.format(simple_color_format);
    } else {
        logger = logger.format(simple_format);
    }

    let handle = logger.start()?;
    let _ = LOGGER_HANDLE.set(Mutex::new(handle));

    Ok(())
}

/// Change the log level at runtime
///
/// Returns an error if `init_logging` has not been called yet.
pub fn set_log_level(level: &str) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(handle_mutex) = LOGGER_HANDLE.get() {
        if let Ok(mut handle) = handle_mutex.lock() {
            let _ = handle.parse_and_push_temp_spec(level);
            Ok(())
        } else {
            Err("Could not acquire logger handle lock".into())
        }
    } else {
        Err("Logger not initialised. Call init_logging first.".into())
    }
}

// Format: "YYYY-MM-DD HH:mm:ss.fff INF message"
fn simple_format(
    w: &mut dyn std::io::Write,
    now: &mut DeferredNow,
    record: &log::Record,
) -> Result<(), std::io::Error> {
    write!(
        w,
        "{} {} {}",
        now.format("%Y-%m-%d %H:%M:%S%.3f"),
        level_abbr(record.level()),
        record.args()
    )
}

// Same layout as simple_format with the level colourised
fn simple_color_format(
    w: &mut dyn std::io::Write,
    now: &mut DeferredNow,
    record: &log::Record,
) -> Result<(), std::io::Error> {
    use colored::*;

    let level_colored = match record.level() {
        log::Level::Error => "ERR".red().bold(),
        log::Level::Warn => "WRN".yellow(),
        log::Level::Info => "INF".green(),
        log::Level::Debug => "DBG".blue(),
        log::Level::Trace => "TRC".magenta(),
    };

    write!(
        w,
        "{} {} {}",
        now.format("%Y-%m-%d %H:%M:%S%.3f").to_string().dimmed(),
        level_colored,
        record.args()
    )
}

fn level_abbr(level: log::Level) -> &'static str {
    match level {
        log::Level::Error => "ERR",
        log::Level::Warn => "WRN",
        log::Level::Info => "INF",
        log::Level::Debug => "DBG",
        log::Level::Trace => "TRC",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_format_layout() {
        let mut buffer = Vec::new();
        let mut now = DeferredNow::new();

        let record = log::Record::builder()
            .level(log::Level::Info)
            .target("test_target")
            .args(format_args!("Test message"))
            .build();

        simple_format(&mut buffer, &mut now, &record).expect("format should succeed");

        let output = String::from_utf8(buffer).expect("output should be valid UTF-8");
        assert!(output.contains("INF Test message"), "got: {}", output);
    }

    #[test]
    fn test_level_abbreviations() {
        assert_eq!(level_abbr(log::Level::Error), "ERR");
        assert_eq!(level_abbr(log::Level::Warn), "WRN");
        assert_eq!(level_abbr(log::Level::Info), "INF");
        assert_eq!(level_abbr(log::Level::Debug), "DBG");
        assert_eq!(level_abbr(log::Level::Trace), "TRC");
    }

    #[test]
    fn test_set_log_level_before_init_fails() {
        // The global logger is not initialised in unit tests
        if LOGGER_HANDLE.get().is_none() {
            assert!(set_log_level("debug").is_err());
        }
    }
}
