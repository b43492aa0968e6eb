//! Bridge error types.
//!
//! Every variant is construction-fatal: it is returned from
//! [`ProxyLoader::instantiate`](crate::ProxyLoader::instantiate) and no proxy
//! exists afterwards. Errors raised by a capability call once the proxy is
//! running are [`CallError`](opaz_core::CallError)s instead.

use std::path::PathBuf;

use opaz_core::NativeHandle;

/// Errors from bridge setup and plugin construction.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    /// The interpreter session could not be prepared for a resource folder.
    #[error("interpreter bootstrap failed for {path}: {message}")]
    Bootstrap {
        /// Resource folder being bootstrapped.
        path: PathBuf,
        /// Failure reason.
        message: String,
    },

    /// The descriptor file could not be read.
    #[error("cannot read plugin descriptor {path}: {source}")]
    DescriptorRead {
        /// Path of the descriptor file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The descriptor has no usable plugin identity line.
    #[error("no '{key}=' line naming the plugin class in {path}")]
    PluginIdentityNotFound {
        /// Path of the descriptor file.
        path: PathBuf,
        /// Manifest key that was searched for.
        key: String,
    },

    /// No factory is registered for the plugin class.
    #[error("no plugin factory registered for '{0}'")]
    FactoryNotFound(String),

    /// A script module failed to compile.
    #[error("script error in {path}: {message}")]
    Script {
        /// Script file.
        path: PathBuf,
        /// Compiler message.
        message: String,
    },

    /// The plugin constructor raised an error.
    #[error("constructor of '{plugin}' failed: {message}")]
    ConstructorFailed {
        /// Plugin class identifier.
        plugin: String,
        /// Failure reason.
        message: String,
    },

    /// The plugin module lacks capabilities every plugin must provide.
    #[error("plugin '{plugin}' is missing required capabilities: {}", capabilities.join(", "))]
    MissingCapability {
        /// Plugin class identifier.
        plugin: String,
        /// Missing capability names with their arity, e.g. `getParameter/1`.
        capabilities: Vec<String>,
    },

    /// A value could not be converted across the script boundary.
    #[error("conversion error for '{plugin}': {message}")]
    Conversion {
        /// Plugin class identifier.
        plugin: String,
        /// Failure reason.
        message: String,
    },

    /// A live plugin instance already uses this native handle.
    #[error("native handle {0} is already in use")]
    HandleInUse(NativeHandle),

    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] opaz_config::ConfigError),
}

/// Result type for bridge operations.
pub type BridgeResult<T> = Result<T, BridgeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_capability_lists_all_names() {
        let err = BridgeError::MissingCapability {
            plugin: "Echo".into(),
            capabilities: vec!["getParameter/1".into(), "setProgram/1".into()],
        };
        assert_eq!(
            err.to_string(),
            "plugin 'Echo' is missing required capabilities: getParameter/1, setProgram/1"
        );
    }

    #[test]
    fn identity_not_found_names_key_and_path() {
        let err = BridgeError::PluginIdentityNotFound {
            path: PathBuf::from("/plugins/echo/Echo.ini"),
            key: "RubyPlugin".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("RubyPlugin="));
        assert!(msg.contains("/plugins/echo/Echo.ini"));
    }
}
