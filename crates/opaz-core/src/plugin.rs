//! The native plugin capability surface.

use crate::defaults;
use crate::error::CallResult;
use crate::types::{
    Events, MidiKeyName, MidiProgramCategory, MidiProgramName, ParameterProperties,
    PinProperties, SpeakerArrangement, VariableIo,
};

/// Capabilities every plugin object must provide, by protocol name, with the
/// number of arguments each takes.
///
/// Script plugins are checked against this list once, at load time.
pub const MANDATORY_CAPABILITIES: &[(&str, usize)] = &[
    ("canDo", 1),
    ("getPlugCategory", 0),
    ("getProductString", 0),
    ("getProgramNameIndexed", 2),
    ("getVendorString", 0),
    ("setBypass", 1),
    ("string2Parameter", 2),
    ("getNumParams", 0),
    ("getNumPrograms", 0),
    ("getParameter", 1),
    ("getParameterDisplay", 1),
    ("getParameterLabel", 1),
    ("getParameterName", 1),
    ("getProgram", 0),
    ("getProgramName", 0),
    ("processReplacing", 1),
    ("setParameter", 2),
    ("setProgram", 1),
    ("setProgramName", 1),
];

/// The full callback surface a native plugin host invokes.
///
/// Methods without a body are mandatory. Every other method has the answer
/// the native wrapper gives when a plugin does not implement it, so an
/// implementation only overrides what it supports.
///
/// All methods take `&mut self`: the host drives one instance from one
/// thread at a time and the object is exclusively owned by its adapter.
pub trait VstPlugin: Send {
    // ---- mandatory ----

    /// Ask whether the plugin supports a named feature.
    /// Answers with [`can_do`](crate::constants::can_do).
    fn can_do(&mut self, feature: &str) -> CallResult<i32>;

    /// Plugin category, see [`plug_category`](crate::constants::plug_category).
    fn get_plug_category(&mut self) -> CallResult<i32>;

    /// Product name.
    fn get_product_string(&mut self) -> CallResult<String>;

    /// Name of program `index` in `category`.
    fn get_program_name_indexed(&mut self, category: i32, index: i32) -> CallResult<String>;

    /// Vendor name.
    fn get_vendor_string(&mut self) -> CallResult<String>;

    /// Enable or disable soft bypass. Returns whether bypass is supported.
    fn set_bypass(&mut self, bypass: bool) -> CallResult<bool>;

    /// Set a parameter from its textual representation.
    fn string_to_parameter(&mut self, index: i32, value: &str) -> CallResult<bool>;

    /// Number of parameters.
    fn get_num_params(&mut self) -> CallResult<i32>;

    /// Number of programs.
    fn get_num_programs(&mut self) -> CallResult<i32>;

    /// Normalized value of a parameter.
    fn get_parameter(&mut self, index: i32) -> CallResult<f32>;

    /// Display value of a parameter.
    fn get_parameter_display(&mut self, index: i32) -> CallResult<String>;

    /// Unit label of a parameter.
    fn get_parameter_label(&mut self, index: i32) -> CallResult<String>;

    /// Name of a parameter.
    fn get_parameter_name(&mut self, index: i32) -> CallResult<String>;

    /// Current program index.
    fn get_program(&mut self) -> CallResult<i32>;

    /// Current program name.
    fn get_program_name(&mut self) -> CallResult<String>;

    /// Process one block of single precision audio, replacing `outputs`.
    ///
    /// Called on the audio thread.
    fn process_replacing(
        &mut self,
        inputs: &[&[f32]],
        outputs: &mut [&mut [f32]],
        sample_frames: i32,
    ) -> CallResult<()>;

    /// Set the normalized value of a parameter.
    fn set_parameter(&mut self, index: i32, value: f32) -> CallResult<()>;

    /// Switch to a program.
    fn set_program(&mut self, index: i32) -> CallResult<()>;

    /// Rename the current program.
    fn set_program_name(&mut self, name: &str) -> CallResult<()>;

    // ---- 1.0 ----

    /// Called once after construction.
    fn open(&mut self) -> CallResult<()> {
        Ok(())
    }

    /// Called once before destruction.
    fn close(&mut self) -> CallResult<()> {
        Ok(())
    }

    /// Processing is about to stop.
    fn suspend(&mut self) -> CallResult<()> {
        Ok(())
    }

    /// Processing is about to start.
    fn resume(&mut self) -> CallResult<()> {
        Ok(())
    }

    /// Current output level.
    fn get_vu(&mut self) -> CallResult<f32> {
        Ok(0.0)
    }

    /// Serialize the bank (or the current program when `is_preset`).
    fn get_chunk(&mut self, _is_preset: bool) -> CallResult<Vec<u8>> {
        Ok(Vec::new())
    }

    /// Restore state from a chunk.
    fn set_chunk(&mut self, _data: &[u8], _is_preset: bool) -> CallResult<i32> {
        Ok(0)
    }

    /// Maximum block size for the next processing calls.
    fn set_block_size(&mut self, _block_size: i32) -> CallResult<()> {
        Ok(())
    }

    /// Sample rate for the next processing calls.
    fn set_sample_rate(&mut self, _sample_rate: f32) -> CallResult<()> {
        Ok(())
    }

    // ---- 2.0 ----

    /// Effect name.
    fn get_effect_name(&mut self) -> CallResult<String> {
        Ok(String::new())
    }

    /// Vendor specific version.
    fn get_vendor_version(&mut self) -> CallResult<i32> {
        Ok(0)
    }

    /// Whether a parameter may be automated.
    fn can_parameter_be_automated(&mut self, _index: i32) -> CallResult<bool> {
        Ok(defaults::CAN_PARAMETER_BE_AUTOMATED)
    }

    /// Copy the current program to `destination`.
    fn copy_program(&mut self, _destination: i32) -> CallResult<bool> {
        Ok(false)
    }

    /// Idle call from the host's user interface thread.
    fn fx_idle(&mut self) -> CallResult<i32> {
        Ok(0)
    }

    /// Parameter value for a specific channel.
    fn get_channel_parameter(&mut self, _channel: i32, _index: i32) -> CallResult<f32> {
        Ok(0.0)
    }

    /// Number of program categories.
    fn get_num_categories(&mut self) -> CallResult<i32> {
        Ok(defaults::NUM_CATEGORIES)
    }

    /// Properties of an input pin, `None` when not provided.
    fn get_input_properties(&mut self, _index: i32) -> CallResult<Option<PinProperties>> {
        Ok(None)
    }

    /// Properties of an output pin, `None` when not provided.
    fn get_output_properties(&mut self, _index: i32) -> CallResult<Option<PinProperties>> {
        Ok(None)
    }

    /// Text of the last error.
    fn get_error_text(&mut self) -> CallResult<String> {
        Ok(String::new())
    }

    /// Tail size in samples, 0 for the host default.
    fn get_get_tail_size(&mut self) -> CallResult<i32> {
        Ok(0)
    }

    /// Extended parameter description, `None` when not provided.
    fn get_parameter_properties(
        &mut self,
        _index: i32,
    ) -> CallResult<Option<ParameterProperties>> {
        Ok(None)
    }

    /// Protocol version the plugin implements.
    fn get_vst_version(&mut self) -> CallResult<i32> {
        Ok(defaults::VST_VERSION)
    }

    /// An input was connected or disconnected.
    fn input_connected(&mut self, _index: i32, _state: bool) -> CallResult<()> {
        Ok(())
    }

    /// An output was connected or disconnected.
    fn output_connected(&mut self, _index: i32, _state: bool) -> CallResult<()> {
        Ok(())
    }

    /// Whether the plugin needs keyboard input.
    fn keys_required(&mut self) -> CallResult<bool> {
        Ok(false)
    }

    /// Events for the next processing block.
    fn process_events(&mut self, _events: &Events) -> CallResult<i32> {
        Ok(0)
    }

    /// Offline processing with a variable number of samples.
    fn process_variable_io(&mut self, _io: &mut VariableIo) -> CallResult<bool> {
        Ok(false)
    }

    /// Current offline processing position.
    fn report_current_position(&mut self) -> CallResult<i32> {
        Ok(0)
    }

    /// Offline processing destination buffer.
    fn report_destination_buffer(&mut self) -> CallResult<Vec<f32>> {
        Ok(Vec::new())
    }

    /// Block size and sample rate in one call.
    fn set_block_size_and_sample_rate(
        &mut self,
        _block_size: i32,
        _sample_rate: f32,
    ) -> CallResult<()> {
        Ok(())
    }

    /// Host proposes a speaker arrangement. Returns whether it is accepted.
    fn set_speaker_arrangement(
        &mut self,
        _input: &SpeakerArrangement,
        _output: &SpeakerArrangement,
    ) -> CallResult<bool> {
        Ok(false)
    }

    /// Fill in the plugin's speaker arrangement.
    fn get_speaker_arrangement(
        &mut self,
        _input: &mut SpeakerArrangement,
        _output: &mut SpeakerArrangement,
    ) -> CallResult<bool> {
        Ok(false)
    }

    // ---- 2.1 ----

    /// Fill in a MIDI program name. Returns the number of programs.
    fn get_midi_program_name(
        &mut self,
        _channel: i32,
        _program: &mut MidiProgramName,
    ) -> CallResult<i32> {
        Ok(0)
    }

    /// Fill in the current MIDI program. Returns its index.
    fn get_current_midi_program(
        &mut self,
        _channel: i32,
        _program: &mut MidiProgramName,
    ) -> CallResult<i32> {
        Ok(0)
    }

    /// Fill in a MIDI program category. Returns the number of categories.
    fn get_midi_program_category(
        &mut self,
        _channel: i32,
        _category: &mut MidiProgramCategory,
    ) -> CallResult<i32> {
        Ok(0)
    }

    /// Whether the MIDI program list changed.
    fn has_midi_programs_changed(&mut self, _channel: i32) -> CallResult<bool> {
        Ok(false)
    }

    /// Fill in a MIDI key name. Returns whether a name was provided.
    fn get_midi_key_name(&mut self, _channel: i32, _key: &mut MidiKeyName) -> CallResult<bool> {
        Ok(false)
    }

    /// A program is about to be loaded.
    fn begin_set_program(&mut self) -> CallResult<bool> {
        Ok(false)
    }

    /// A program has been loaded.
    fn end_set_program(&mut self) -> CallResult<bool> {
        Ok(false)
    }

    // ---- 2.3 ----

    /// Number of samples the host will process offline.
    fn set_total_sample_to_process(&mut self, value: i32) -> CallResult<i32> {
        Ok(defaults::total_sample_to_process(value))
    }

    /// Next plugin of a shell, writing its name. Returns its unique id, 0 when done.
    fn get_next_shell_plugin(&mut self, _name: &mut String) -> CallResult<i32> {
        Ok(0)
    }

    /// Realtime processing is about to start.
    fn start_process(&mut self) -> CallResult<i32> {
        Ok(0)
    }

    /// Realtime processing has stopped.
    fn stop_process(&mut self) -> CallResult<i32> {
        Ok(0)
    }

    // ---- 2.4 ----

    /// Process one block of double precision audio, replacing `outputs`.
    fn process_double_replacing(
        &mut self,
        _inputs: &[&[f64]],
        _outputs: &mut [&mut [f64]],
        _sample_frames: i32,
    ) -> CallResult<()> {
        Ok(())
    }

    /// Select the precision of the next processing calls.
    fn set_process_precision(&mut self, _precision: i32) -> CallResult<bool> {
        Ok(false)
    }

    /// Number of MIDI input channels used.
    fn get_num_midi_input_channels(&mut self) -> CallResult<i32> {
        Ok(0)
    }

    /// Number of MIDI output channels used.
    fn get_num_midi_output_channels(&mut self) -> CallResult<i32> {
        Ok(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CallError;

    struct Minimal;

    impl VstPlugin for Minimal {
        fn can_do(&mut self, _feature: &str) -> CallResult<i32> {
            Ok(crate::constants::can_do::NO)
        }
        fn get_plug_category(&mut self) -> CallResult<i32> {
            Ok(crate::constants::plug_category::EFFECT)
        }
        fn get_product_string(&mut self) -> CallResult<String> {
            Ok("Minimal".into())
        }
        fn get_program_name_indexed(&mut self, _category: i32, index: i32) -> CallResult<String> {
            Ok(format!("Program {index}"))
        }
        fn get_vendor_string(&mut self) -> CallResult<String> {
            Ok("Nobody".into())
        }
        fn set_bypass(&mut self, _bypass: bool) -> CallResult<bool> {
            Ok(false)
        }
        fn string_to_parameter(&mut self, _index: i32, _value: &str) -> CallResult<bool> {
            Err(CallError::failed("string2Parameter", "unsupported"))
        }
        fn get_num_params(&mut self) -> CallResult<i32> {
            Ok(0)
        }
        fn get_num_programs(&mut self) -> CallResult<i32> {
            Ok(1)
        }
        fn get_parameter(&mut self, _index: i32) -> CallResult<f32> {
            Ok(0.0)
        }
        fn get_parameter_display(&mut self, _index: i32) -> CallResult<String> {
            Ok(String::new())
        }
        fn get_parameter_label(&mut self, _index: i32) -> CallResult<String> {
            Ok(String::new())
        }
        fn get_parameter_name(&mut self, _index: i32) -> CallResult<String> {
            Ok(String::new())
        }
        fn get_program(&mut self) -> CallResult<i32> {
            Ok(0)
        }
        fn get_program_name(&mut self) -> CallResult<String> {
            Ok("Default".into())
        }
        fn process_replacing(
            &mut self,
            _inputs: &[&[f32]],
            _outputs: &mut [&mut [f32]],
            _sample_frames: i32,
        ) -> CallResult<()> {
            Ok(())
        }
        fn set_parameter(&mut self, _index: i32, _value: f32) -> CallResult<()> {
            Ok(())
        }
        fn set_program(&mut self, _index: i32) -> CallResult<()> {
            Ok(())
        }
        fn set_program_name(&mut self, _name: &str) -> CallResult<()> {
            Ok(())
        }
    }

    #[test]
    fn optional_capabilities_use_wrapper_defaults() {
        let mut plugin = Minimal;
        assert_eq!(plugin.get_vst_version().unwrap(), 2400);
        assert!(plugin.can_parameter_be_automated(3).unwrap());
        assert_eq!(plugin.get_num_categories().unwrap(), 1);
        assert_eq!(plugin.set_total_sample_to_process(4096).unwrap(), 4096);
        assert_eq!(plugin.get_input_properties(0).unwrap(), None);
        assert!(plugin.get_chunk(true).unwrap().is_empty());
        assert!(!plugin.set_process_precision(1).unwrap());

        let mut name = String::from("untouched");
        assert_eq!(plugin.get_next_shell_plugin(&mut name).unwrap(), 0);
        assert_eq!(name, "untouched");
    }

    #[test]
    fn trait_is_object_safe() {
        let mut boxed: Box<dyn VstPlugin> = Box::new(Minimal);
        assert_eq!(boxed.get_product_string().unwrap(), "Minimal");
        assert!(boxed.string_to_parameter(0, "x").is_err());
    }

    #[test]
    fn mandatory_list_has_no_duplicates() {
        let mut names: Vec<&str> = MANDATORY_CAPABILITIES.iter().map(|(n, _)| *n).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), MANDATORY_CAPABILITIES.len());
    }
}
