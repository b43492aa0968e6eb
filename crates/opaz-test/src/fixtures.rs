//! Plugin folder fixtures.

use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// Suffix the native wrapper appends to a plugin's log file name.
pub const LOG_SUFFIX: &str = "_stdout.txt";

/// A temporary plugin resource folder.
///
/// Holds descriptors and script modules the way a plugin bundle does on
/// Windows and Linux: everything next to the native library. The folder is
/// deleted when the fixture is dropped.
#[derive(Debug)]
pub struct PluginFolder {
    dir: TempDir,
}

impl PluginFolder {
    /// Create an empty folder.
    ///
    /// # Panics
    ///
    /// Panics if the temporary directory cannot be created.
    #[must_use]
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("create plugin folder"),
        }
    }

    /// Folder path.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write `<base>.ini` naming `class_name` as the plugin class.
    #[must_use]
    pub fn with_descriptor(self, base: &str, class_name: &str) -> Self {
        self.write(&format!("{base}.ini"), &format!("RubyPlugin={class_name}\n"))
    }

    /// Write `<base>.ini` with arbitrary contents.
    #[must_use]
    pub fn with_raw_descriptor(self, base: &str, contents: &str) -> Self {
        self.write(&format!("{base}.ini"), contents)
    }

    /// Write `<name>.rhai`.
    #[must_use]
    pub fn with_script(self, name: &str, source: &str) -> Self {
        self.write(&format!("{name}.rhai"), source)
    }

    /// Write any file into the folder.
    ///
    /// # Panics
    ///
    /// Panics if the file cannot be written.
    #[must_use]
    pub fn write(self, file_name: &str, contents: &str) -> Self {
        std::fs::write(self.dir.path().join(file_name), contents).expect("write fixture file");
        self
    }

    /// Log file name the native wrapper would use for `base`.
    #[must_use]
    pub fn log_file_name(base: &str) -> String {
        format!("{base}{LOG_SUFFIX}")
    }

    /// Path of a file in the folder.
    #[must_use]
    pub fn file(&self, file_name: &str) -> PathBuf {
        self.dir.path().join(file_name)
    }
}

impl Default for PluginFolder {
    fn default() -> Self {
        Self::new()
    }
}

/// A mono test signal of `frames` samples: a ramp from -1 to just below 1.
#[must_use]
pub fn ramp(frames: usize) -> Vec<f32> {
    let mut value = -1.0_f32;
    let step = if frames == 0 {
        0.0
    } else {
        2.0 / f32::from(u16::try_from(frames).unwrap_or(u16::MAX))
    };
    let mut out = Vec::with_capacity(frames);
    for _ in 0..frames {
        out.push(value);
        value += step;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folder_holds_descriptor_and_scripts() {
        let folder = PluginFolder::new()
            .with_descriptor("Echo", "EchoPlug")
            .with_script("EchoPlug", "fn create(h) { h }");

        let ini = std::fs::read_to_string(folder.file("Echo.ini")).unwrap();
        assert_eq!(ini, "RubyPlugin=EchoPlug\n");
        assert!(folder.file("EchoPlug.rhai").exists());
        assert_eq!(PluginFolder::log_file_name("Echo"), "Echo_stdout.txt");
    }

    #[test]
    fn ramp_is_bounded() {
        let r = ramp(8);
        assert_eq!(r.len(), 8);
        assert!((r[0] + 1.0).abs() < f32::EPSILON);
        assert!(r.iter().all(|s| (-1.0..1.0).contains(s)));
        assert!(ramp(0).is_empty());
    }
}
