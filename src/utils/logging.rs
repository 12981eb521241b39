//! Tracing setup
//!
//! Human-facing logs go to stderr so stdout stays clean for tables and JSON.
//! Once the config is known, everything at debug level is also appended to
//! `speedy_iqa.log` in the configured log directory.

use std::fs::{self, File, OpenOptions};
use std::path::Path;
use std::sync::Mutex;

use tracing::Dispatch;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, fmt};

use crate::consts::{LOG_ENV, LOG_FILE_NAME};
use crate::error::AppError;

fn stderr_filter(quiet: bool, verbose: bool) -> EnvFilter {
    let level = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "warn"
    };
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(level))
}

/// Stderr-only dispatch for the startup phase, before the log directory is
/// known. Use it with `tracing::dispatcher::with_default`.
pub(crate) fn bootstrap_dispatch(quiet: bool, verbose: bool) -> Dispatch {
    let subscriber = fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .with_env_filter(stderr_filter(quiet, verbose))
        .finish();
    Dispatch::new(subscriber)
}

fn open_log_file(log_dir: &Path) -> std::io::Result<File> {
    fs::create_dir_all(log_dir)?;
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_dir.join(LOG_FILE_NAME))
}

/// Install the global subscriber. A log file that cannot be opened only
/// costs the file layer.
pub(crate) fn init_tracing(quiet: bool, verbose: bool, log_dir: &Path) -> Result<(), AppError> {
    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .with_filter(stderr_filter(quiet, verbose));

    let (file_layer, file_error) = match open_log_file(log_dir) {
        Ok(file) => (
            Some(
                fmt::layer()
                    .with_writer(Mutex::new(file))
                    .with_ansi(false)
                    .with_filter(LevelFilter::DEBUG),
            ),
            None,
        ),
        Err(e) => (None, Some(e)),
    };

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| AppError::Logging(e.to_string()))?;

    if let Some(e) = file_error {
        tracing::warn!("Logging to file disabled, cannot open {}: {}", log_dir.display(), e);
    } else {
        tracing::debug!("Logging to {}", log_dir.join(LOG_FILE_NAME).display());
    }
    Ok(())
}
