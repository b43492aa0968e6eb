//! Configuration types for the opaz bridge.
//!
//! Every struct implements [`Default`] so that a bare `[section]` header in
//! TOML, or a missing file, produces a working configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root configuration for one plugin folder.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// How the descriptor file is located and read.
    pub descriptor: DescriptorSection,
    /// Embedded interpreter settings.
    pub interpreter: InterpreterSection,
    /// Logging level, format and destination.
    pub logging: LoggingSection,
}

/// Descriptor (manifest) lookup settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DescriptorSection {
    /// Manifest key whose value names the plugin class.
    pub key: String,
    /// Suffix stripped from the native log file name to get the base name.
    pub log_suffix: String,
    /// Extension of the native library, inserted before `.ini`.
    /// `None` (or empty) adds nothing.
    pub platform_extension: Option<String>,
    /// Resource folder relative to the log base path.
    /// `None` (or empty) uses the log base path itself.
    pub resources_subdir: Option<String>,
}

impl Default for DescriptorSection {
    fn default() -> Self {
        let macos = cfg!(target_os = "macos");
        Self {
            key: "RubyPlugin".to_owned(),
            log_suffix: "_stdout.txt".to_owned(),
            platform_extension: macos.then(|| ".dylib".to_owned()),
            resources_subdir: macos.then(|| "../Resources".to_owned()),
        }
    }
}

/// Embedded interpreter settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InterpreterSection {
    /// Use the process-wide shared session instead of a fresh one.
    pub shared_session: bool,
    /// Extension of script plugin files (without the dot).
    pub script_extension: String,
    /// Maximum operations per call, 0 for unlimited.
    pub max_operations: u64,
    /// Maximum function call nesting.
    pub max_call_levels: usize,
    /// Maximum expression nesting at global level.
    pub max_expr_depth: usize,
    /// Maximum expression nesting inside functions.
    pub max_expr_depth_functions: usize,
    /// Extra module search paths, searched before plugin folders.
    pub search_paths: Vec<PathBuf>,
}

impl Default for InterpreterSection {
    fn default() -> Self {
        Self {
            shared_session: false,
            script_extension: "rhai".to_owned(),
            max_operations: 0,
            max_call_levels: 64,
            max_expr_depth: 64,
            max_expr_depth_functions: 32,
            search_paths: Vec::new(),
        }
    }
}

/// `[logging]`: level, format and destination of plugin logs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Base level: `trace`, `debug`, `info`, `warn` or `error`.
    pub level: String,
    /// Output format: `"pretty"`, `"compact"`, `"json"` or `"full"`.
    pub format: String,
    /// Write to the native wrapper's log file instead of stderr.
    pub to_file: bool,
    /// Per-crate tracing directives (e.g. `["opaz_bridge=debug"]`).
    pub directives: Vec<String>,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            format: "compact".to_owned(),
            to_file: false,
            directives: Vec::new(),
        }
    }
}
