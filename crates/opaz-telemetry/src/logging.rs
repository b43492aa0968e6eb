//! Subscriber setup for plugin processes.
//!
//! A host process may load many plugin instances. The first instance to
//! call [`setup_logging`] installs the global subscriber; every later call
//! reports [`TelemetryError::AlreadyInitialized`] and changes nothing.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use tracing_subscriber::{
    EnvFilter, Layer, Registry,
    fmt::{self, MakeWriter},
    layer::{Layered, SubscriberExt},
    util::SubscriberInitExt,
};

use crate::error::{TelemetryError, TelemetryResult};

type FmtLayer = Box<dyn Layer<Layered<EnvFilter, Registry>> + Send + Sync + 'static>;

/// Line format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Multi-line, human oriented.
    Pretty,
    /// One line per event.
    #[default]
    Compact,
    /// One JSON object per event.
    Json,
    /// One line per event with span context.
    Full,
}

impl FromStr for LogFormat {
    type Err = TelemetryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "compact" => Ok(Self::Compact),
            "json" => Ok(Self::Json),
            "full" => Ok(Self::Full),
            _ => Err(TelemetryError::UnknownFormat(s.to_owned())),
        }
    }
}

/// Where log lines go.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum LogTarget {
    /// Standard error.
    #[default]
    Stderr,
    /// Standard output.
    Stdout,
    /// The log file the native wrapper assigns to a plugin instance.
    /// Appended to, never rotated.
    File {
        /// Directory holding the file (the instance's log base path).
        directory: PathBuf,
        /// File name, e.g. `Echo_stdout.txt`.
        file_name: String,
    },
}

impl LogTarget {
    /// Full path of a file target.
    #[must_use]
    pub fn file_path(&self) -> Option<PathBuf> {
        match self {
            Self::File {
                directory,
                file_name,
            } => Some(directory.join(file_name)),
            Self::Stderr | Self::Stdout => None,
        }
    }

    fn is_terminal(&self) -> bool {
        !matches!(self, Self::File { .. })
    }
}

/// Subscriber settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// Base level filter, e.g. `info`.
    pub level: String,
    /// Line format.
    pub format: LogFormat,
    /// Output.
    pub target: LogTarget,
    /// Extra filter directives, e.g. `opaz_bridge=debug`.
    pub directives: Vec<String>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self::new("info")
    }
}

impl LogConfig {
    /// Compact stderr logging at `level`.
    #[must_use]
    pub fn new(level: impl Into<String>) -> Self {
        Self {
            level: level.into(),
            format: LogFormat::default(),
            target: LogTarget::default(),
            directives: Vec::new(),
        }
    }

    /// Set the line format.
    #[must_use]
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// Log to standard output instead of standard error.
    #[must_use]
    pub fn to_stdout(mut self) -> Self {
        self.target = LogTarget::Stdout;
        self
    }

    /// Append to `directory/file_name`.
    #[must_use]
    pub fn with_file(mut self, directory: impl AsRef<Path>, file_name: impl Into<String>) -> Self {
        self.target = LogTarget::File {
            directory: directory.as_ref().to_path_buf(),
            file_name: file_name.into(),
        };
        self
    }

    /// Add a filter directive.
    #[must_use]
    pub fn with_directive(mut self, directive: impl Into<String>) -> Self {
        self.directives.push(directive.into());
        self
    }

    fn filter(&self) -> TelemetryResult<EnvFilter> {
        let invalid = |e: &dyn std::fmt::Display| TelemetryError::InvalidFilter(e.to_string());
        let mut filter = EnvFilter::try_new(&self.level).map_err(|e| invalid(&e))?;
        for directive in &self.directives {
            filter = filter.add_directive(directive.parse().map_err(|e| invalid(&e))?);
        }
        Ok(filter)
    }

    fn layer<W>(&self, writer: W) -> FmtLayer
    where
        W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
    {
        let layer = fmt::layer()
            .with_writer(writer)
            .with_ansi(self.target.is_terminal());
        match self.format {
            LogFormat::Pretty => layer.pretty().boxed(),
            LogFormat::Compact => layer.compact().boxed(),
            LogFormat::Json => layer.json().boxed(),
            LogFormat::Full => layer.boxed(),
        }
    }
}

#[cfg(feature = "config")]
impl From<&opaz_config::LoggingSection> for LogConfig {
    /// Level, format and directives of the `[logging]` section. The file
    /// target depends on the instance and is added with
    /// [`LogConfig::with_file`].
    fn from(section: &opaz_config::LoggingSection) -> Self {
        let mut config = Self::new(section.level.as_str());
        config.format = section.format.parse().unwrap_or_default();
        config.directives.clone_from(&section.directives);
        config
    }
}

/// Install the global subscriber.
///
/// # Errors
///
/// - [`TelemetryError::InvalidFilter`] for a bad level or directive
/// - [`TelemetryError::LogFile`] if the log directory cannot be created
/// - [`TelemetryError::AlreadyInitialized`] if a subscriber is installed
pub fn setup_logging(config: &LogConfig) -> TelemetryResult<()> {
    let filter = config.filter()?;
    let layer = match &config.target {
        LogTarget::Stderr => config.layer(std::io::stderr),
        LogTarget::Stdout => config.layer(std::io::stdout),
        LogTarget::File {
            directory,
            file_name,
        } => {
            std::fs::create_dir_all(directory).map_err(|source| TelemetryError::LogFile {
                path: directory.clone(),
                source,
            })?;
            config.layer(tracing_appender::rolling::never(directory, file_name))
        },
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(layer)
        .try_init()
        .map_err(|e| TelemetryError::AlreadyInitialized(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_compact_stderr() {
        let config = LogConfig::default();
        assert_eq!(config.level, "info");
        assert_eq!(config.format, LogFormat::Compact);
        assert_eq!(config.target, LogTarget::Stderr);
        assert!(config.target.is_terminal());
    }

    #[test]
    fn file_target_is_the_instance_log() {
        let config = LogConfig::new("debug").with_file("/plugins/echo", "Echo_stdout.txt");
        assert_eq!(
            config.target.file_path(),
            Some(PathBuf::from("/plugins/echo/Echo_stdout.txt"))
        );
        assert!(!config.target.is_terminal());
        assert_eq!(LogTarget::Stdout.file_path(), None);
    }

    #[test]
    fn formats_parse_case_insensitively() {
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("full".parse::<LogFormat>().unwrap(), LogFormat::Full);
        assert!(matches!(
            "yaml".parse::<LogFormat>(),
            Err(TelemetryError::UnknownFormat(f)) if f == "yaml"
        ));
    }

    #[test]
    fn directives_are_validated() {
        assert!(LogConfig::new("warn").with_directive("opaz_bridge=trace").filter().is_ok());
        assert!(matches!(
            LogConfig::new("warn").with_directive("[bad=syntax").filter(),
            Err(TelemetryError::InvalidFilter(_))
        ));
    }

    #[test]
    fn uncreatable_log_directory_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, "").unwrap();
        let config = LogConfig::new("info").with_file(blocker.join("sub"), "x.txt");
        assert!(matches!(
            setup_logging(&config),
            Err(TelemetryError::LogFile { .. })
        ));
    }

    #[cfg(feature = "config")]
    #[test]
    fn built_from_logging_section() {
        let section = opaz_config::LoggingSection {
            level: "debug".to_owned(),
            format: "json".to_owned(),
            to_file: true,
            directives: vec!["opaz_bridge=trace".to_owned()],
        };
        let config = LogConfig::from(&section);
        assert_eq!(config.level, "debug");
        assert_eq!(config.format, LogFormat::Json);
        assert_eq!(config.target, LogTarget::Stderr);
        assert_eq!(config.directives, section.directives);
    }
}
