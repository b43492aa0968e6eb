//! Protocol value objects.
//!
//! These mirror the structures exchanged through the native callback surface.
//! All of them derive `Serialize`/`Deserialize` with `#[serde(default)]` so
//! that a plugin written in a scripting language can fill them from a partial
//! object map.

use serde::{Deserialize, Serialize};

/// Properties of an audio input or output pin.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PinProperties {
    /// Pin name.
    pub label: String,
    /// Short pin name (8 characters in the native protocol).
    pub short_label: String,
    /// Combination of [`pin_flags`](crate::constants::pin_flags).
    pub flags: i32,
    /// Speaker arrangement type, valid with `USE_SPEAKER`.
    pub arrangement_type: i32,
}

/// Extended parameter description.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParameterProperties {
    /// Float step.
    pub step_float: f32,
    /// Small float step.
    pub small_step_float: f32,
    /// Large float step.
    pub large_step_float: f32,
    /// Parameter label.
    pub label: String,
    /// Parameter flags.
    pub flags: i32,
    /// Integer minimum.
    pub min_integer: i32,
    /// Integer maximum.
    pub max_integer: i32,
    /// Integer step.
    pub step_integer: i32,
    /// Large integer step.
    pub large_step_integer: i32,
    /// Short label.
    pub short_label: String,
    /// Index where the parameter should be displayed.
    pub display_index: i32,
    /// Category index (0 = no category).
    pub category: i32,
    /// Number of parameters in the category.
    pub num_parameters_in_category: i32,
    /// Category label.
    pub category_label: String,
}

/// One speaker of a [`SpeakerArrangement`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeakerProperties {
    /// Azimuth in radians.
    pub azimuth: f32,
    /// Elevation in radians.
    pub elevation: f32,
    /// Radius in meters.
    pub radius: f32,
    /// Reserved, zero.
    pub reserved: f32,
    /// Speaker name.
    pub name: String,
    /// Speaker type.
    pub speaker_type: i32,
}

/// Speaker arrangement of the plugin's inputs or outputs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeakerArrangement {
    /// Arrangement type.
    pub arrangement_type: i32,
    /// Number of channels.
    pub num_channels: i32,
    /// Per-speaker properties.
    pub speakers: Vec<SpeakerProperties>,
}

/// MIDI program description.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MidiProgramName {
    /// Program index, set by the host when querying.
    pub this_program_index: i32,
    /// Program name.
    pub name: String,
    /// MIDI program number, -1 if off.
    pub midi_program: i32,
    /// Bank select MSB, -1 if off.
    pub midi_bank_msb: i32,
    /// Bank select LSB, -1 if off.
    pub midi_bank_lsb: i32,
    /// Parent category, -1 if none.
    pub parent_category_index: i32,
    /// Program flags.
    pub flags: i32,
}

/// MIDI program category description.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MidiProgramCategory {
    /// Category index, set by the host when querying.
    pub this_category_index: i32,
    /// Category name.
    pub name: String,
    /// Parent category, -1 if none.
    pub parent_category_index: i32,
    /// Category flags.
    pub flags: i32,
}

/// MIDI key name description.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MidiKeyName {
    /// Program index, set by the host when querying.
    pub this_program_index: i32,
    /// Key number, set by the host when querying.
    pub this_key_number: i32,
    /// Key name, empty if none.
    pub key_name: String,
    /// Reserved.
    pub flags: i32,
}

/// A MIDI channel event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MidiEvent {
    /// Sample offset within the current block.
    pub delta_frames: i32,
    /// Event flags.
    pub flags: i32,
    /// Note length in samples, 0 if unknown.
    pub note_length: i32,
    /// Offset into the note from its start.
    pub note_offset: i32,
    /// Status byte and two data bytes.
    pub data: [u8; 3],
    /// Detune in cents.
    pub detune: i8,
    /// Note-off velocity.
    pub note_off_velocity: u8,
}

/// A system exclusive event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SysexEvent {
    /// Sample offset within the current block.
    pub delta_frames: i32,
    /// Event flags.
    pub flags: i32,
    /// Raw sysex bytes.
    pub data: Vec<u8>,
}

/// An event delivered through `processEvents`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Event {
    /// MIDI channel event.
    Midi(MidiEvent),
    /// System exclusive event.
    Sysex(SysexEvent),
}

/// A batch of events for the next processing block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Events {
    /// Events in delivery order.
    pub events: Vec<Event>,
}

impl Events {
    /// Create an event batch.
    #[must_use]
    pub fn new(events: Vec<Event>) -> Self {
        Self { events }
    }

    /// Number of events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether the batch is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// Variable I/O processing request (offline processing).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VariableIo {
    /// Input channel buffers.
    pub inputs: Vec<Vec<f32>>,
    /// Output channel buffers.
    pub outputs: Vec<Vec<f32>>,
    /// Number of input samples.
    pub num_samples_input: i32,
    /// Number of output samples, written by the plugin.
    pub num_samples_output: i32,
    /// Input offset, written by the plugin.
    pub offset_input: i32,
    /// Output offset, written by the plugin.
    pub offset_output: i32,
}
