//! Configuration errors.

use std::path::PathBuf;

/// Errors from loading or validating a [`Config`](crate::Config).
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// `opaz.toml` exists but could not be read.
    #[error("cannot read {path}: {source}")]
    Read {
        /// Config file path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A layer is not valid TOML, or the merged tree does not fit [`Config`](crate::Config).
    #[error("malformed configuration ({layer}): {source}")]
    Parse {
        /// Which layer failed: a file path, `defaults` or `merged`.
        layer: String,
        /// TOML error.
        #[source]
        source: toml::de::Error,
    },

    /// A value is out of range or malformed.
    #[error("invalid {field}: {message}")]
    Invalid {
        /// Dotted field path, e.g. `descriptor.key`.
        field: String,
        /// What is wrong.
        message: String,
    },

    /// An `OPAZ_*` variable holds an unusable value.
    #[error("environment variable {var}: {message}")]
    Env {
        /// Variable name.
        var: String,
        /// What is wrong.
        message: String,
    },
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;
