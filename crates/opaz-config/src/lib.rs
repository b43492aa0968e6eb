//! Configuration for the opaz script plugin bridge.
//!
//! Each plugin resource folder may carry an `opaz.toml`. It is layered over
//! the embedded defaults; `OPAZ_*` environment variables only fill fields
//! the file leaves unset.
//!
//! ```rust,no_run
//! use opaz_config::Config;
//!
//! # fn main() -> Result<(), opaz_config::ConfigError> {
//! let config = Config::load(Some(std::path::Path::new("/plugins/echo")))?;
//! println!("descriptor key: {}", config.descriptor.key);
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

/// Environment variable fallback resolution.
pub mod env;
/// Configuration error types.
pub mod error;
/// Configuration file discovery and loading.
pub mod loader;
/// Layered configuration merging.
pub mod merge;
/// Configuration struct definitions.
pub mod types;
/// Configuration validation rules.
pub mod validate;

use std::collections::HashMap;
use std::path::Path;

pub use error::{ConfigError, ConfigResult};
pub use loader::CONFIG_FILE_NAME;
pub use types::*;

impl Config {
    /// Load configuration for a plugin resource folder.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the folder's `opaz.toml` is malformed or
    /// the merged configuration is invalid.
    pub fn load(folder: Option<&Path>) -> ConfigResult<Self> {
        loader::load(folder)
    }

    /// Load configuration with an explicit environment map instead of the
    /// process environment.
    ///
    /// # Errors
    ///
    /// See [`Config::load`].
    pub fn load_with_env<S: ::std::hash::BuildHasher>(
        folder: Option<&Path>,
        env_vars: &HashMap<String, String, S>,
    ) -> ConfigResult<Self> {
        loader::load_with_env(folder, env_vars)
    }
}
