//! Logging Infrastructure
//!
//! Structured logging for development (pretty, stdout) and production
//! (JSON, daily-rolled files). `RUST_LOG` always wins over the configured level.

use std::path::Path;

use tracing_subscriber::EnvFilter;

const LOG_FILE_PREFIX: &str = "dine-server";

/// Initialize the logger with stdout output at `info`
pub fn init_logger() {
    init_logger_with_file(None, false, None);
}

/// Initialize the logger with optional JSON format and file output
///
/// When `log_dir` exists, output goes to `<log_dir>/dine-server.<date>`.
/// Calling this twice is harmless: the second subscriber is ignored.
pub fn init_logger_with_file(log_level: Option<&str>, json: bool, log_dir: Option<&str>) {
    let level = log_level.unwrap_or("info");
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_file(false)
        .with_line_number(false)
        .with_thread_ids(false)
        .with_target(false);

    let file_appender = log_dir
        .map(Path::new)
        .filter(|dir| dir.exists())
        .map(|dir| tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX));

    let result = match (file_appender, json) {
        (Some(appender), true) => builder
            .json()
            .with_ansi(false)
            .with_writer(appender)
            .try_init(),
        (Some(appender), false) => builder.with_ansi(false).with_writer(appender).try_init(),
        (None, true) => builder.json().try_init(),
        (None, false) => builder.try_init(),
    };

    if result.is_err() {
        tracing::debug!("Global logger already installed");
    }
}
