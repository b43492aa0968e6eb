//! Checks run on the merged configuration.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::{ConfigError, ConfigResult};
use crate::types::{Config, DescriptorSection, InterpreterSection, LoggingSection};

static IDENTIFIER: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").ok());

const LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];
const FORMATS: &[&str] = &["pretty", "compact", "json", "full"];

/// Reject configurations the bridge cannot work with.
///
/// # Errors
///
/// [`ConfigError::Invalid`] naming the first offending field.
pub fn validate(config: &Config) -> ConfigResult<()> {
    descriptor(&config.descriptor)?;
    interpreter(&config.interpreter)?;
    logging(&config.logging)
}

fn invalid(field: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field: field.to_owned(),
        message: message.into(),
    }
}

fn identifier(field: &str, value: &str) -> ConfigResult<()> {
    if IDENTIFIER.as_ref().is_some_and(|re| re.is_match(value)) {
        Ok(())
    } else {
        Err(invalid(field, format!("'{value}' is not an identifier")))
    }
}

fn one_of(field: &str, value: &str, allowed: &[&str]) -> ConfigResult<()> {
    if allowed.contains(&value) {
        Ok(())
    } else {
        Err(invalid(
            field,
            format!("'{value}' is not one of {}", allowed.join("|")),
        ))
    }
}

fn descriptor(d: &DescriptorSection) -> ConfigResult<()> {
    identifier("descriptor.key", &d.key)?;
    if d.log_suffix.is_empty() {
        return Err(invalid("descriptor.log_suffix", "must not be empty"));
    }
    match d.platform_extension.as_deref() {
        Some(ext) if !ext.is_empty() && !ext.starts_with('.') => Err(invalid(
            "descriptor.platform_extension",
            format!("'{ext}' must start with '.'"),
        )),
        _ => Ok(()),
    }
}

fn interpreter(i: &InterpreterSection) -> ConfigResult<()> {
    // Given without the dot: `rhai`, not `.rhai`.
    identifier("interpreter.script_extension", &i.script_extension)?;
    if i.max_call_levels == 0 {
        return Err(invalid("interpreter.max_call_levels", "must be at least 1"));
    }
    Ok(())
}

fn logging(l: &LoggingSection) -> ConfigResult<()> {
    one_of("logging.level", &l.level, LEVELS)?;
    one_of("logging.format", &l.format, FORMATS)
}
