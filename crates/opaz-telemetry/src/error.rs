//! Telemetry errors.

use std::path::PathBuf;

/// Errors from logging setup.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    /// A level or directive is not a valid filter.
    #[error("invalid log filter: {0}")]
    InvalidFilter(String),

    /// Not one of `pretty`, `compact`, `json`, `full`.
    #[error("unknown log format '{0}'")]
    UnknownFormat(String),

    /// The log file's directory could not be created.
    #[error("cannot create log directory {path}: {source}")]
    LogFile {
        /// Directory that was being created.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A global subscriber is already installed in this process.
    #[error("logging already initialized: {0}")]
    AlreadyInitialized(String),
}

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
