//! File logging for the terminal UI.
//!
//! The terminal is owned by ratatui, so events go to a file in the log
//! directory instead of stderr.

use std::fs;
use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use crate::error::LoggingError;

const LOG_FILE_NAME: &str = "edutask.log";

/// Builds the filter from `level`, falling back to `info` when it does not
/// parse. The second value carries the parse error for reporting.
pub fn build_filter(level: &str) -> (EnvFilter, Option<String>) {
    match level.parse::<EnvFilter>() {
        Ok(filter) => (filter, None),
        Err(err) => (EnvFilter::new("info"), Some(err.to_string())),
    }
}

/// Installs the global subscriber. Keep the returned guard alive until exit
/// or buffered events are lost.
pub fn init(level: &str, log_dir: &Path) -> Result<WorkerGuard, LoggingError> {
    fs::create_dir_all(log_dir).map_err(|source| LoggingError::CreateDir {
        path: log_dir.to_path_buf(),
        source,
    })?;

    let (filter, invalid) = build_filter(level);
    if let Some(err) = &invalid {
        eprintln!(
            "WARN: EDUTASK_LOG='{}' is not a valid tracing filter ({}); falling back to 'info'",
            level, err
        );
    }

    let appender = tracing_appender::rolling::never(log_dir, LOG_FILE_NAME);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .with_target(true)
        .try_init()
        .map_err(|err| LoggingError::Init(err.to_string()))?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        log_dir = %log_dir.display(),
        "logging initialized"
    );
    Ok(guard)
}
