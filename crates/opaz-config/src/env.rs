//! `OPAZ_*` environment fallbacks.
//!
//! A variable only takes effect when no config file set its field.

use std::collections::HashMap;
use std::hash::BuildHasher;

use tracing::debug;

use crate::error::{ConfigError, ConfigResult};
use crate::merge::FileFields;

#[derive(Clone, Copy)]
enum Kind {
    Text,
    Flag,
}

/// Variable, dotted field path, value kind.
const VARIABLES: &[(&str, &str, Kind)] = &[
    ("OPAZ_LOG_LEVEL", "logging.level", Kind::Text),
    ("OPAZ_LOG_FORMAT", "logging.format", Kind::Text),
    ("OPAZ_DESCRIPTOR_KEY", "descriptor.key", Kind::Text),
    ("OPAZ_SHARED_SESSION", "interpreter.shared_session", Kind::Flag),
];

/// Write `OPAZ_*` values into `tree` for fields missing from `from_file`.
///
/// Returns how many variables were applied.
///
/// # Errors
///
/// [`ConfigError::Env`] when a flag variable is not `true`/`false`/`1`/`0`.
pub fn apply_env_fallbacks<S: BuildHasher>(
    tree: &mut toml::Value,
    from_file: &FileFields,
    env_vars: &HashMap<String, String, S>,
) -> ConfigResult<usize> {
    let mut applied = 0usize;
    for &(var, field, kind) in VARIABLES {
        if from_file.contains(field) {
            continue;
        }
        let Some(raw) = env_vars.get(var) else {
            continue;
        };
        let value = match kind {
            Kind::Text => toml::Value::String(raw.clone()),
            Kind::Flag => toml::Value::Boolean(flag(var, raw)?),
        };
        debug!(var, field, "Environment fallback");
        insert_path(tree, field, value);
        applied = applied.saturating_add(1);
    }
    Ok(applied)
}

fn flag(var: &str, raw: &str) -> ConfigResult<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" => Ok(true),
        "0" | "false" => Ok(false),
        other => Err(ConfigError::Env {
            var: var.to_owned(),
            message: format!("'{other}' is not a boolean"),
        }),
    }
}

/// Insert `value` at a dotted path, creating tables on the way.
fn insert_path(tree: &mut toml::Value, path: &str, value: toml::Value) {
    let (parents, leaf) = path.rsplit_once('.').unwrap_or(("", path));
    let mut node = tree;
    for part in parents.split('.').filter(|p| !p.is_empty()) {
        let toml::Value::Table(table) = node else {
            return;
        };
        node = table
            .entry(part)
            .or_insert_with(|| toml::Value::Table(toml::Table::new()));
    }
    if let toml::Value::Table(table) = node {
        table.insert(leaf.to_owned(), value);
    }
}

/// The process environment as a map.
#[must_use]
pub fn collect_env_vars() -> HashMap<String, String> {
    std::env::vars().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|&(k, v)| (k.to_owned(), v.to_owned()))
            .collect()
    }

    #[test]
    fn unset_fields_take_the_variable() {
        let mut tree: toml::Value = toml::from_str("[logging]\nlevel = \"info\"").unwrap();
        let vars = env(&[("OPAZ_LOG_LEVEL", "debug"), ("OPAZ_SHARED_SESSION", "True")]);

        let applied = apply_env_fallbacks(&mut tree, &FileFields::new(), &vars).unwrap();

        assert_eq!(applied, 2);
        assert_eq!(tree["logging"]["level"].as_str(), Some("debug"));
        assert_eq!(tree["interpreter"]["shared_session"].as_bool(), Some(true));
    }

    #[test]
    fn file_values_are_kept() {
        let mut tree: toml::Value = toml::from_str("[descriptor]\nkey = \"FromFile\"").unwrap();
        let from_file: FileFields = ["descriptor.key".to_owned()].into_iter().collect();
        let vars = env(&[("OPAZ_DESCRIPTOR_KEY", "FromEnv")]);

        let applied = apply_env_fallbacks(&mut tree, &from_file, &vars).unwrap();

        assert_eq!(applied, 0);
        assert_eq!(tree["descriptor"]["key"].as_str(), Some("FromFile"));
    }

    #[test]
    fn flags_must_be_boolean() {
        let mut tree: toml::Value = toml::from_str("").unwrap();
        let vars = env(&[("OPAZ_SHARED_SESSION", "sometimes")]);

        let err = apply_env_fallbacks(&mut tree, &FileFields::new(), &vars).unwrap_err();
        assert!(matches!(err, ConfigError::Env { ref var, .. } if var == "OPAZ_SHARED_SESSION"));
    }
}
