//! Opaz Core - capability surface and protocol types for the script plugin bridge.
//!
//! This crate provides:
//!
//! - [`VstPlugin`]: the full native plugin callback surface (protocol revisions
//!   1.0 through 2.4), with the optional operations defaulted the way the
//!   native wrapper defaults them
//! - [`NativeHandle`]: the opaque token identifying one native plugin instance
//! - [`HostCallbacks`]: services a plugin object may call back into
//! - [`CallError`] / [`CallResult`]: errors raised inside a capability call
//! - Protocol value objects ([`PinProperties`], [`SpeakerArrangement`],
//!   [`MidiProgramName`], [`Events`], ...)
//!
//! This crate has no knowledge of the embedded interpreter. The bridge crate
//! adapts script modules into [`VstPlugin`] implementations.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod constants;
pub mod defaults;
pub mod error;
pub mod handle;
pub mod host;
pub mod plugin;
pub mod prelude;
pub mod types;

pub use error::{CallError, CallResult};
pub use handle::NativeHandle;
pub use host::{HostCallbacks, LoggingHost};
pub use plugin::{MANDATORY_CAPABILITIES, VstPlugin};
pub use types::{
    Event, Events, MidiEvent, MidiKeyName, MidiProgramCategory, MidiProgramName,
    ParameterProperties, PinProperties, SpeakerArrangement, SpeakerProperties, SysexEvent,
    VariableIo,
};
