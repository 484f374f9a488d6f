//! Log output
//!
//! Everything goes through `tracing`. The console always gets a formatted
//! layer; with `Logging=true` a second, uncolored layer appends the same
//! lines to the log file.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::warn;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

/// Log file used when `RECUPDATER_LOG_FILE` is not set
pub const DEFAULT_LOG_FILE: &str = "/var/log/recUpdater.log";

/// Environment variable overriding the log file location
pub const LOG_FILE_ENV: &str = "RECUPDATER_LOG_FILE";

/// Environment variable selecting the log level
pub const LOG_LEVEL_ENV: &str = "RECUPDATER_LOG_LEVEL";

/// Location of the log file
pub fn log_file_path() -> PathBuf {
    std::env::var_os(LOG_FILE_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_FILE))
}

/// Level from `RECUPDATER_LOG_LEVEL`, `info` when unset
pub fn level_from_env() -> anyhow::Result<LevelFilter> {
    match std::env::var(LOG_LEVEL_ENV) {
        Ok(level) => parse_level(&level),
        Err(_) => Ok(LevelFilter::INFO),
    }
}

pub fn parse_level(level: &str) -> anyhow::Result<LevelFilter> {
    match level.to_lowercase().as_str() {
        "trace" => Ok(LevelFilter::TRACE),
        "debug" => Ok(LevelFilter::DEBUG),
        "info" => Ok(LevelFilter::INFO),
        "warn" => Ok(LevelFilter::WARN),
        "error" => Ok(LevelFilter::ERROR),
        _ => anyhow::bail!(
            "{} '{}' is not valid. Valid levels: trace, debug, info, warn, error",
            LOG_LEVEL_ENV,
            level
        ),
    }
}

/// Open the log file for appending, creating it if needed
pub fn open_log_file(path: &Path) -> std::io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

/// Install the global subscriber
///
/// A log file that cannot be opened is reported as a warning and the
/// process continues with console output only.
///
/// # Returns
///
/// The path actually being written to, if any.
pub fn init(level: LevelFilter, log_file: Option<&Path>) -> anyhow::Result<Option<PathBuf>> {
    let mut file_layer = None;
    let mut opened = None;
    let mut open_error = None;

    if let Some(path) = log_file {
        match open_log_file(path) {
            Ok(file) => {
                file_layer = Some(
                    fmt::layer()
                        .with_ansi(false)
                        .with_target(false)
                        .with_writer(Mutex::new(file)),
                );
                opened = Some(path.to_path_buf());
            }
            Err(e) => open_error = Some((path, e)),
        }
    }

    tracing_subscriber::registry()
        .with(level)
        .with(fmt::layer().with_target(false))
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to set tracing subscriber: {}", e))?;

    if let Some((path, e)) = open_error {
        warn!("Cannot open log file '{}': {}. Logging disabled.", path.display(), e);
    }

    Ok(opened)
}
