//! Commonly used types for implementing and hosting plugins.
//!
//! ```
//! use opaz_core::prelude::*;
//! ```

pub use crate::constants::{can_do, pin_flags, plug_category, precision};
pub use crate::error::{CallError, CallResult};
pub use crate::handle::NativeHandle;
pub use crate::host::{HostCallbacks, LoggingHost};
pub use crate::plugin::{MANDATORY_CAPABILITIES, VstPlugin};
pub use crate::types::{
    Event, Events, MidiEvent, MidiKeyName, MidiProgramCategory, MidiProgramName,
    ParameterProperties, PinProperties, SpeakerArrangement, SpeakerProperties, SysexEvent,
    VariableIo,
};
