//! Errors raised inside a capability call.

/// An error raised by a plugin object while serving a capability.
///
/// Values are `Clone + PartialEq` so that callers (and tests) can compare the
/// error returned through a proxy with the one returned by the underlying
/// object.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CallError {
    /// The capability body failed (script runtime error, native failure).
    #[error("capability '{capability}' failed: {message}")]
    Failed {
        /// Protocol name of the capability.
        capability: String,
        /// Failure description.
        message: String,
    },

    /// The capability returned a value of the wrong shape.
    #[error("capability '{capability}' returned {found}, expected {expected}")]
    BadReturn {
        /// Protocol name of the capability.
        capability: String,
        /// Expected return type.
        expected: String,
        /// Type actually returned.
        found: String,
    },

    /// An argument could not be handed to the plugin object.
    #[error("invalid argument for '{capability}': {message}")]
    InvalidArgument {
        /// Protocol name of the capability.
        capability: String,
        /// What was wrong with the argument.
        message: String,
    },
}

impl CallError {
    /// Construct a [`CallError::Failed`].
    pub fn failed(capability: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Failed {
            capability: capability.into(),
            message: message.into(),
        }
    }

    /// Construct a [`CallError::BadReturn`].
    pub fn bad_return(
        capability: impl Into<String>,
        expected: impl Into<String>,
        found: impl Into<String>,
    ) -> Self {
        Self::BadReturn {
            capability: capability.into(),
            expected: expected.into(),
            found: found.into(),
        }
    }

    /// Construct a [`CallError::InvalidArgument`].
    pub fn invalid_argument(capability: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            capability: capability.into(),
            message: message.into(),
        }
    }

    /// Protocol name of the capability this error was raised by.
    #[must_use]
    pub fn capability(&self) -> &str {
        match self {
            Self::Failed { capability, .. }
            | Self::BadReturn { capability, .. }
            | Self::InvalidArgument { capability, .. } => capability,
        }
    }
}

/// Result type for capability calls.
pub type CallResult<T> = Result<T, CallError>;
