//! Opaz Telemetry - Logging and tracing for the script plugin bridge.
//!
//! Plugin instances live inside someone else's process, so logging goes
//! either to stderr or to the log file the native wrapper assigns to the
//! instance. [`LoadGuard`] wraps one plugin construction in a span and logs
//! how it ended. The `config` feature builds a [`LogConfig`] from the
//! `[logging]` config section.
//!
//! # Example
//!
//! ```rust,no_run
//! use opaz_telemetry::{LoadContext, LoadGuard, LogConfig, LogFormat, setup_logging};
//!
//! # fn main() -> Result<(), opaz_telemetry::TelemetryError> {
//! let config = LogConfig::new("debug")
//!     .with_format(LogFormat::Pretty)
//!     .with_directive("opaz_bridge=trace");
//!
//! setup_logging(&config)?;
//!
//! let mut guard = LoadGuard::new(LoadContext::new(1));
//! guard.resolved("EchoPlug", std::path::Path::new("/plugins/echo"));
//! guard.succeed();
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod context;
mod error;
mod logging;

pub use context::{LoadContext, LoadGuard};
pub use error::{TelemetryError, TelemetryResult};
pub use logging::{LogConfig, LogFormat, LogTarget, setup_logging};
