//! Layered merging of TOML trees.

use std::collections::HashSet;

/// Dotted paths of leaf fields set by a config file.
pub type FileFields = HashSet<String>;

/// Deep-merge `overlay` into `base`, recording every leaf path the overlay
/// sets.
///
/// - Tables merge recursively per-field.
/// - Scalars and arrays from the overlay **replace** the base value.
pub fn deep_merge(base: &mut toml::Value, overlay: &toml::Value, prefix: &str, set: &mut FileFields) {
    match (base, overlay) {
        (toml::Value::Table(base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let path = join(prefix, key);
                if let Some(base_val) = base_table.get_mut(key) {
                    deep_merge(base_val, overlay_val, &path, set);
                } else {
                    base_table.insert(key.clone(), overlay_val.clone());
                    record_leaves(overlay_val, &path, set);
                }
            }
        },
        (base, overlay) => {
            *base = overlay.clone();
            set.insert(prefix.to_owned());
        },
    }
}

fn record_leaves(val: &toml::Value, prefix: &str, set: &mut FileFields) {
    if let toml::Value::Table(table) = val {
        for (key, child) in table {
            record_leaves(child, &join(prefix, key), set);
        }
    } else {
        set.insert(prefix.to_owned());
    }
}

fn join(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_owned()
    } else {
        format!("{prefix}.{key}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlay_replaces_scalars_and_keeps_siblings() {
        let mut base: toml::Value =
            toml::from_str("[logging]\nlevel = \"info\"\nformat = \"compact\"").unwrap();
        let overlay: toml::Value = toml::from_str("[logging]\nlevel = \"debug\"").unwrap();
        let mut set = FileFields::new();

        deep_merge(&mut base, &overlay, "", &mut set);

        assert_eq!(base["logging"]["level"].as_str(), Some("debug"));
        assert_eq!(base["logging"]["format"].as_str(), Some("compact"));
        assert!(set.contains("logging.level"));
        assert!(!set.contains("logging.format"));
    }

    #[test]
    fn new_tables_record_all_leaves() {
        let mut base: toml::Value = toml::from_str("").unwrap();
        let overlay: toml::Value =
            toml::from_str("[descriptor]\nkey = \"Plug\"\nlog_suffix = \".log\"").unwrap();
        let mut set = FileFields::new();

        deep_merge(&mut base, &overlay, "", &mut set);

        assert!(set.contains("descriptor.key"));
        assert!(set.contains("descriptor.log_suffix"));
    }

    #[test]
    fn arrays_are_replaced_not_appended() {
        let mut base: toml::Value =
            toml::from_str("[logging]\ndirectives = [\"a=info\"]").unwrap();
        let overlay: toml::Value =
            toml::from_str("[logging]\ndirectives = [\"b=debug\"]").unwrap();
        let mut set = FileFields::new();

        deep_merge(&mut base, &overlay, "", &mut set);

        let dirs = base["logging"]["directives"].as_array().unwrap();
        assert_eq!(dirs.len(), 1);
        assert_eq!(dirs[0].as_str(), Some("b=debug"));
    }
}
