//! Commonly used telemetry types.

pub use crate::{
    LoadContext, LoadGuard, LogConfig, LogFormat, LogTarget, TelemetryError, TelemetryResult,
    setup_logging,
};
