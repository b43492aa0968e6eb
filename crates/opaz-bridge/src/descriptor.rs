//! Plugin descriptor resolution.
//!
//! The native wrapper only knows where its log file lives. From that
//! location the resolver derives the resource folder and the descriptor
//! (`.ini`) path, then reads the plugin class identifier out of the
//! descriptor.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use opaz_config::DescriptorSection;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{BridgeError, BridgeResult};

/// Where the native wrapper placed a plugin instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginLocation {
    /// Directory of the instance's log file.
    pub log_base_path: PathBuf,
    /// File name of the instance's log file, e.g. `Echo_stdout.txt`.
    pub log_file_name: String,
}

impl PluginLocation {
    /// Create a location.
    #[must_use]
    pub fn new(log_base_path: impl Into<PathBuf>, log_file_name: impl Into<String>) -> Self {
        Self {
            log_base_path: log_base_path.into(),
            log_file_name: log_file_name.into(),
        }
    }
}

/// Everything read from a plugin descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginDescriptor {
    /// Identifier of the plugin class to instantiate.
    pub plugin_class_name: String,
    /// Folder holding the plugin's scripts and descriptor.
    pub resource_folder: PathBuf,
    /// Path of the descriptor file that was read.
    pub descriptor_path: PathBuf,
    /// Every other `key=value` line of the descriptor, first occurrence wins.
    pub properties: BTreeMap<String, String>,
}

/// Turns a [`PluginLocation`] into a [`PluginDescriptor`].
pub trait DescriptorResolver: Send + Sync {
    /// Resolve the descriptor for a plugin instance.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::DescriptorRead`] when the descriptor cannot be
    /// read and [`BridgeError::PluginIdentityNotFound`] when it does not name
    /// a plugin class.
    fn resolve(&self, location: &PluginLocation) -> BridgeResult<PluginDescriptor>;
}

/// Reads `key=value` descriptors next to the native library.
#[derive(Debug, Clone, Default)]
pub struct IniDescriptorResolver {
    section: DescriptorSection,
}

impl IniDescriptorResolver {
    /// Create a resolver from the `[descriptor]` config section.
    #[must_use]
    pub fn new(section: DescriptorSection) -> Self {
        Self { section }
    }

    /// Resource folder of a plugin instance.
    #[must_use]
    pub fn resource_folder(&self, location: &PluginLocation) -> PathBuf {
        resource_folder_for(&self.section, location)
    }

    /// Full path of the descriptor file of a plugin instance.
    #[must_use]
    pub fn descriptor_path(&self, location: &PluginLocation) -> PathBuf {
        let base = location
            .log_file_name
            .strip_suffix(self.section.log_suffix.as_str())
            .unwrap_or(&location.log_file_name);
        let ext = self.section.platform_extension.as_deref().unwrap_or("");
        self.resource_folder(location)
            .join(format!("{base}{ext}.ini"))
    }
}

/// Resource folder for `location` under the given descriptor settings.
///
/// Needed before the folder's own configuration can be read.
#[must_use]
pub fn resource_folder_for(section: &DescriptorSection, location: &PluginLocation) -> PathBuf {
    match section.resources_subdir.as_deref() {
        Some(sub) if !sub.is_empty() => location.log_base_path.join(sub),
        _ => location.log_base_path.clone(),
    }
}

impl DescriptorResolver for IniDescriptorResolver {
    fn resolve(&self, location: &PluginLocation) -> BridgeResult<PluginDescriptor> {
        let descriptor_path = self.descriptor_path(location);
        let text = std::fs::read_to_string(&descriptor_path).map_err(|source| {
            BridgeError::DescriptorRead {
                path: descriptor_path.clone(),
                source,
            }
        })?;

        let manifest = Manifest::parse(&text, &self.section.key);
        if !manifest.ignored.is_empty() {
            warn!(
                path = %descriptor_path.display(),
                key = %self.section.key,
                ignored = ?manifest.ignored,
                "Descriptor names the plugin class more than once, using the first"
            );
        }

        let plugin_class_name = manifest
            .identity
            .filter(|v| !v.is_empty())
            .ok_or_else(|| BridgeError::PluginIdentityNotFound {
                path: descriptor_path.clone(),
                key: self.section.key.clone(),
            })?;

        debug!(
            path = %descriptor_path.display(),
            plugin = %plugin_class_name,
            "Resolved plugin descriptor"
        );

        Ok(PluginDescriptor {
            plugin_class_name,
            resource_folder: self.resource_folder(location),
            descriptor_path,
            properties: manifest.properties,
        })
    }
}

/// Parsed descriptor text.
#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct Manifest {
    /// Value of the first identity line.
    pub(crate) identity: Option<String>,
    /// Values of later identity lines.
    pub(crate) ignored: Vec<String>,
    /// Other keys.
    pub(crate) properties: BTreeMap<String, String>,
}

impl Manifest {
    pub(crate) fn parse(text: &str, key: &str) -> Self {
        let mut manifest = Self::default();
        for line in text.lines().map(str::trim) {
            if line.is_empty() || line.starts_with(['#', ';', '[']) {
                continue;
            }
            let Some((k, v)) = line.split_once('=') else {
                continue;
            };
            let (k, v) = (k.trim(), v.trim());
            if k == key {
                if manifest.identity.is_none() {
                    manifest.identity = Some(v.to_owned());
                } else {
                    manifest.ignored.push(v.to_owned());
                }
            } else {
                manifest
                    .properties
                    .entry(k.to_owned())
                    .or_insert_with(|| v.to_owned());
            }
        }
        manifest
    }
}

/// Whether `path` looks like a descriptor file.
#[must_use]
pub fn is_descriptor(path: &Path) -> bool {
    path.extension().is_some_and(|e| e == "ini")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn section() -> DescriptorSection {
        DescriptorSection {
            key: "RubyPlugin".into(),
            log_suffix: "_stdout.txt".into(),
            platform_extension: None,
            resources_subdir: None,
        }
    }

    #[test]
    fn derives_descriptor_path() {
        let resolver = IniDescriptorResolver::new(section());
        let loc = PluginLocation::new("/plugins/echo", "Echo_stdout.txt");
        assert_eq!(
            resolver.descriptor_path(&loc),
            PathBuf::from("/plugins/echo/Echo.ini")
        );
    }

    #[test]
    fn derives_macos_bundle_layout() {
        let resolver = IniDescriptorResolver::new(DescriptorSection {
            platform_extension: Some(".dylib".into()),
            resources_subdir: Some("../Resources".into()),
            ..section()
        });
        let loc = PluginLocation::new("/Echo.vst/Contents/MacOS", "Echo_stdout.txt");
        assert_eq!(
            resolver.resource_folder(&loc),
            PathBuf::from("/Echo.vst/Contents/MacOS/../Resources")
        );
        assert_eq!(
            resolver.descriptor_path(&loc),
            PathBuf::from("/Echo.vst/Contents/MacOS/../Resources/Echo.dylib.ini")
        );
    }

    #[test]
    fn log_name_without_suffix_is_used_as_is() {
        let resolver = IniDescriptorResolver::new(section());
        let loc = PluginLocation::new("/p", "Echo");
        assert_eq!(resolver.descriptor_path(&loc), PathBuf::from("/p/Echo.ini"));
    }

    #[test]
    fn first_identity_wins() {
        let m = Manifest::parse("RubyPlugin=First\nRubyPlugin=Second\n", "RubyPlugin");
        assert_eq!(m.identity.as_deref(), Some("First"));
        assert_eq!(m.ignored, vec!["Second".to_owned()]);
    }

    #[test]
    fn comments_sections_and_crlf_are_ignored() {
        let text = "[plugin]\r\n# RubyPlugin=Commented\r\n; RubyPlugin=AlsoCommented\r\n  RubyPlugin = Echo \r\nAuthor=Acme\r\n";
        let m = Manifest::parse(text, "RubyPlugin");
        assert_eq!(m.identity.as_deref(), Some("Echo"));
        assert!(m.ignored.is_empty());
        assert_eq!(m.properties.get("Author").map(String::as_str), Some("Acme"));
    }

    #[test]
    fn key_must_match_exactly() {
        let m = Manifest::parse("RubyPluginName=Nope\nMyRubyPlugin=Nope\n", "RubyPlugin");
        assert_eq!(m.identity, None);
        assert_eq!(m.properties.len(), 2);
    }

    #[test]
    fn missing_file_is_read_error() {
        let resolver = IniDescriptorResolver::new(section());
        let loc = PluginLocation::new("/nonexistent/opaz", "Echo_stdout.txt");
        assert!(matches!(
            resolver.resolve(&loc),
            Err(BridgeError::DescriptorRead { .. })
        ));
    }

    #[test]
    fn empty_value_is_identity_not_found() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("Echo.ini"), "RubyPlugin=\n").unwrap();
        let resolver = IniDescriptorResolver::new(section());
        let loc = PluginLocation::new(dir.path(), "Echo_stdout.txt");
        assert!(matches!(
            resolver.resolve(&loc),
            Err(BridgeError::PluginIdentityNotFound { .. })
        ));
    }

    #[test]
    fn resolves_properties() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("Echo.ini"),
            "RubyPlugin=EchoPlug\nPluginID=ECHO\n",
        )
        .unwrap();
        let resolver = IniDescriptorResolver::new(section());
        let desc = resolver
            .resolve(&PluginLocation::new(dir.path(), "Echo_stdout.txt"))
            .unwrap();
        assert_eq!(desc.plugin_class_name, "EchoPlug");
        assert_eq!(desc.resource_folder, dir.path());
        assert_eq!(desc.properties.get("PluginID").map(String::as_str), Some("ECHO"));
        assert!(is_descriptor(&desc.descriptor_path));
    }
}
