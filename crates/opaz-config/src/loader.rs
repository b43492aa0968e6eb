//! Layered loading.
//!
//! Embedded defaults, then the resource folder's `opaz.toml`, then `OPAZ_*`
//! variables for whatever the file left unset. The merged tree is
//! deserialized once and validated.

use std::collections::HashMap;
use std::hash::BuildHasher;
use std::path::Path;

use tracing::{debug, info};

use crate::env::{apply_env_fallbacks, collect_env_vars};
use crate::error::{ConfigError, ConfigResult};
use crate::merge::{FileFields, deep_merge};
use crate::types::Config;
use crate::validate;

const DEFAULTS_TOML: &str = include_str!("defaults.toml");

/// Name of the per-folder configuration file.
pub const CONFIG_FILE_NAME: &str = "opaz.toml";

/// Folder config files larger than this are rejected.
const MAX_FILE_BYTES: usize = 65_536;

/// Load configuration for a resource folder using the process environment.
///
/// # Errors
///
/// See [`load_with_env`].
pub fn load(folder: Option<&Path>) -> ConfigResult<Config> {
    load_with_env(folder, &collect_env_vars())
}

/// Load configuration for a resource folder with an explicit environment.
///
/// # Errors
///
/// - [`ConfigError::Read`] if `opaz.toml` exists but cannot be read
/// - [`ConfigError::Parse`] if a layer is malformed
/// - [`ConfigError::Env`] for an unusable `OPAZ_*` value
/// - [`ConfigError::Invalid`] if the result fails validation
pub fn load_with_env<S: BuildHasher>(
    folder: Option<&Path>,
    env_vars: &HashMap<String, String, S>,
) -> ConfigResult<Config> {
    let mut tree = parse(DEFAULTS_TOML, "defaults")?;
    let mut from_file = FileFields::new();

    if let Some(path) = folder.map(|f| f.join(CONFIG_FILE_NAME))
        && let Some(text) = read_optional(&path)?
    {
        let overlay = parse(&text, &path.display().to_string())?;
        deep_merge(&mut tree, &overlay, "", &mut from_file);
        info!(path = %path.display(), fields = from_file.len(), "Merged folder config");
    }

    let applied = apply_env_fallbacks(&mut tree, &from_file, env_vars)?;
    if applied > 0 {
        debug!(count = applied, "Applied environment fallbacks");
    }

    let config: Config = tree.try_into().map_err(|source| ConfigError::Parse {
        layer: "merged".to_owned(),
        source,
    })?;
    validate::validate(&config)?;
    Ok(config)
}

fn parse(text: &str, layer: &str) -> ConfigResult<toml::Value> {
    toml::from_str(text).map_err(|source| ConfigError::Parse {
        layer: layer.to_owned(),
        source,
    })
}

/// Contents of `path`, or `None` when there is no such file.
fn read_optional(path: &Path) -> ConfigResult<Option<String>> {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            });
        },
    };
    if text.len() > MAX_FILE_BYTES {
        return Err(ConfigError::Invalid {
            field: CONFIG_FILE_NAME.to_owned(),
            message: format!("{} bytes, limit is {MAX_FILE_BYTES}", text.len()),
        });
    }
    Ok(Some(text))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_env() -> HashMap<String, String> {
        HashMap::new()
    }

    fn folder_with(contents: &str) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE_NAME), contents).unwrap();
        dir
    }

    #[test]
    fn embedded_defaults_match_default_impl() {
        let config = load_with_env(None, &no_env()).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.descriptor.key, "RubyPlugin");
        assert_eq!(config.descriptor.log_suffix, "_stdout.txt");
        assert_eq!(config.interpreter.script_extension, "rhai");
        assert!(!config.interpreter.shared_session);
    }

    #[test]
    fn folder_file_overrides_defaults() {
        let dir = folder_with("[descriptor]\nkey = \"ScriptPlugin\"\n\n[logging]\nlevel = \"debug\"\n");
        let config = load_with_env(Some(dir.path()), &no_env()).unwrap();
        assert_eq!(config.descriptor.key, "ScriptPlugin");
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, "compact");
    }

    #[test]
    fn env_only_fills_unset_fields() {
        let dir = folder_with("[logging]\nlevel = \"warn\"\n");
        let env: HashMap<String, String> = [
            ("OPAZ_LOG_LEVEL".to_owned(), "trace".to_owned()),
            ("OPAZ_LOG_FORMAT".to_owned(), "json".to_owned()),
        ]
        .into_iter()
        .collect();

        let config = load_with_env(Some(dir.path()), &env).unwrap();
        assert_eq!(config.logging.level, "warn");
        assert_eq!(config.logging.format, "json");
    }

    #[test]
    fn folder_without_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(load_with_env(Some(dir.path()), &no_env()).unwrap(), Config::default());
    }

    #[test]
    fn malformed_file_names_its_path() {
        let dir = folder_with("[descriptor\n");
        let err = load_with_env(Some(dir.path()), &no_env()).unwrap_err();
        let ConfigError::Parse { layer, .. } = err else {
            panic!("expected a parse error, got {err:?}");
        };
        assert!(layer.ends_with(CONFIG_FILE_NAME));
    }

    #[test]
    fn wrongly_typed_field_fails_deserialization() {
        let dir = folder_with("[interpreter]\nshared_session = \"yes\"\n");
        let err = load_with_env(Some(dir.path()), &no_env()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { ref layer, .. } if layer == "merged"));
    }

    #[test]
    fn invalid_value_fails_validation() {
        let dir = folder_with("[logging]\nformat = \"xml\"\n");
        let err = load_with_env(Some(dir.path()), &no_env()).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref field, .. } if field == "logging.format"));
    }

    #[test]
    fn oversized_file_is_rejected() {
        let dir = folder_with(&format!("# {}\n", "x".repeat(MAX_FILE_BYTES)));
        assert!(matches!(
            load_with_env(Some(dir.path()), &no_env()),
            Err(ConfigError::Invalid { .. })
        ));
    }
}
