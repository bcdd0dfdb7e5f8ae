//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber once per process
//! - Human-readable console logs on stderr (stdout carries the report)
//! - JSON log file for unattended cron runs, on by default
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - `RUST_LOG` wins over the configured level
//! - Log file is appended to; rotation is left to the host (logrotate)

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use crate::config::ObservabilityConfig;

pub const LOG_FILE_NAME: &str = "checkfallbacks.log";

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("unable to create log directory {path}: {source}")]
    Directory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unable to open log file {path}: {source}")]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("logging already initialized: {0}")]
    Init(#[from] tracing_subscriber::util::TryInitError),
}

/// Create `dir` if needed and open the log file inside it for appending.
pub fn open_log_file(dir: &Path) -> Result<(PathBuf, File), LoggingError> {
    fs::create_dir_all(dir).map_err(|source| LoggingError::Directory {
        path: dir.to_path_buf(),
        source,
    })?;

    let path = dir.join(LOG_FILE_NAME);
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .map_err(|source| LoggingError::File {
            path: path.clone(),
            source,
        })?;
    Ok((path, file))
}

/// Install the global subscriber.
///
/// An unusable log directory disables the file layer with a warning rather
/// than failing the run.
pub fn init_logging(config: &ObservabilityConfig) -> Result<(), LoggingError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("checkfallbacks={}", config.log_level)));

    let opened = if config.log_file {
        Some(open_log_file(&config.log_dir))
    } else {
        None
    };
    let (file_layer, file_status) = match opened {
        Some(Ok((path, file))) => (
            Some(fmt::layer().json().with_writer(Mutex::new(file))),
            Some(Ok(path)),
        ),
        Some(Err(e)) => (None, Some(Err(e))),
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .try_init()?;

    match file_status {
        Some(Ok(path)) => tracing::debug!(path = %path.display(), "Logging to file"),
        Some(Err(e)) => tracing::warn!(error = %e, "File logging disabled"),
        None => {}
    }
    Ok(())
}
