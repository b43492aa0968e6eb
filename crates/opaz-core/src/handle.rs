//! Native instance handle.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque token identifying one native plugin instance inside the host.
///
/// Supplied by the native wrapper at construction time and immutable for the
/// lifetime of the instance. The bridge never interprets the value; it only
/// hands it to the plugin object (so the object can call back into the host)
/// and uses it as a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NativeHandle(i64);

impl NativeHandle {
    /// Wrap a raw handle value.
    #[must_use]
    pub const fn new(raw: i64) -> Self {
        Self(raw)
    }

    /// The raw handle value.
    #[must_use]
    pub const fn raw(self) -> i64 {
        self.0
    }
}

impl From<i64> for NativeHandle {
    fn from(raw: i64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for NativeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:x}", self.0)
    }
}
