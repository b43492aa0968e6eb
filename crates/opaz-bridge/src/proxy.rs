//! The capability adapter handed to the native host.
//!
//! [`ScriptPluginProxy`] owns exactly one plugin object and forwards every
//! capability to it unchanged. It adds nothing on the call path: no logging,
//! no locking, no conversion and no error handling. Its only other job is
//! to unregister the instance from its session when dropped.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use opaz_core::{
    CallResult, Events, MidiKeyName, MidiProgramCategory, MidiProgramName, NativeHandle,
    ParameterProperties, PinProperties, SpeakerArrangement, VariableIo, VstPlugin,
};

use crate::instances::InstanceRecord;
use crate::session::InterpreterSession;

/// A constructed plugin instance, ready to serve the host.
pub struct ScriptPluginProxy {
    plugin: Box<dyn VstPlugin>,
    record: Arc<InstanceRecord>,
    session: Arc<InterpreterSession>,
}

impl fmt::Debug for ScriptPluginProxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptPluginProxy")
            .field("record", &self.record)
            .finish_non_exhaustive()
    }
}

impl ScriptPluginProxy {
    pub(crate) fn new(
        plugin: Box<dyn VstPlugin>,
        record: Arc<InstanceRecord>,
        session: Arc<InterpreterSession>,
    ) -> Self {
        Self {
            plugin,
            record,
            session,
        }
    }

    /// Native handle of this instance.
    #[must_use]
    pub fn handle(&self) -> NativeHandle {
        self.record.handle
    }

    /// Plugin class this instance was built from.
    #[must_use]
    pub fn plugin_class_name(&self) -> &str {
        &self.record.plugin_class_name
    }

    /// Resource folder the class was loaded from.
    #[must_use]
    pub fn resource_folder(&self) -> &Path {
        &self.record.resource_folder
    }

    /// Live-instance record of this proxy.
    #[must_use]
    pub fn record(&self) -> &Arc<InstanceRecord> {
        &self.record
    }

    /// Session the instance lives in.
    #[must_use]
    pub fn session(&self) -> &Arc<InterpreterSession> {
        &self.session
    }
}

impl Drop for ScriptPluginProxy {
    fn drop(&mut self) {
        self.session.release(self.record.handle);
    }
}

impl VstPlugin for ScriptPluginProxy {
    fn can_do(&mut self, feature: &str) -> CallResult<i32> {
        self.plugin.can_do(feature)
    }

    fn get_plug_category(&mut self) -> CallResult<i32> {
        self.plugin.get_plug_category()
    }

    fn get_product_string(&mut self) -> CallResult<String> {
        self.plugin.get_product_string()
    }

    fn get_program_name_indexed(&mut self, category: i32, index: i32) -> CallResult<String> {
        self.plugin.get_program_name_indexed(category, index)
    }

    fn get_vendor_string(&mut self) -> CallResult<String> {
        self.plugin.get_vendor_string()
    }

    fn set_bypass(&mut self, bypass: bool) -> CallResult<bool> {
        self.plugin.set_bypass(bypass)
    }

    fn string_to_parameter(&mut self, index: i32, value: &str) -> CallResult<bool> {
        self.plugin.string_to_parameter(index, value)
    }

    fn get_num_params(&mut self) -> CallResult<i32> {
        self.plugin.get_num_params()
    }

    fn get_num_programs(&mut self) -> CallResult<i32> {
        self.plugin.get_num_programs()
    }

    fn get_parameter(&mut self, index: i32) -> CallResult<f32> {
        self.plugin.get_parameter(index)
    }

    fn get_parameter_display(&mut self, index: i32) -> CallResult<String> {
        self.plugin.get_parameter_display(index)
    }

    fn get_parameter_label(&mut self, index: i32) -> CallResult<String> {
        self.plugin.get_parameter_label(index)
    }

    fn get_parameter_name(&mut self, index: i32) -> CallResult<String> {
        self.plugin.get_parameter_name(index)
    }

    fn get_program(&mut self) -> CallResult<i32> {
        self.plugin.get_program()
    }

    fn get_program_name(&mut self) -> CallResult<String> {
        self.plugin.get_program_name()
    }

    #[inline]
    fn process_replacing(
        &mut self,
        inputs: &[&[f32]],
        outputs: &mut [&mut [f32]],
        sample_frames: i32,
    ) -> CallResult<()> {
        self.plugin.process_replacing(inputs, outputs, sample_frames)
    }

    fn set_parameter(&mut self, index: i32, value: f32) -> CallResult<()> {
        self.plugin.set_parameter(index, value)
    }

    fn set_program(&mut self, index: i32) -> CallResult<()> {
        self.plugin.set_program(index)
    }

    fn set_program_name(&mut self, name: &str) -> CallResult<()> {
        self.plugin.set_program_name(name)
    }

    fn open(&mut self) -> CallResult<()> {
        self.plugin.open()
    }

    fn close(&mut self) -> CallResult<()> {
        self.plugin.close()
    }

    fn suspend(&mut self) -> CallResult<()> {
        self.plugin.suspend()
    }

    fn resume(&mut self) -> CallResult<()> {
        self.plugin.resume()
    }

    fn get_vu(&mut self) -> CallResult<f32> {
        self.plugin.get_vu()
    }

    fn get_chunk(&mut self, is_preset: bool) -> CallResult<Vec<u8>> {
        self.plugin.get_chunk(is_preset)
    }

    fn set_chunk(&mut self, data: &[u8], is_preset: bool) -> CallResult<i32> {
        self.plugin.set_chunk(data, is_preset)
    }

    fn set_block_size(&mut self, block_size: i32) -> CallResult<()> {
        self.plugin.set_block_size(block_size)
    }

    fn set_sample_rate(&mut self, sample_rate: f32) -> CallResult<()> {
        self.plugin.set_sample_rate(sample_rate)
    }

    fn get_effect_name(&mut self) -> CallResult<String> {
        self.plugin.get_effect_name()
    }

    fn get_vendor_version(&mut self) -> CallResult<i32> {
        self.plugin.get_vendor_version()
    }

    fn can_parameter_be_automated(&mut self, index: i32) -> CallResult<bool> {
        self.plugin.can_parameter_be_automated(index)
    }

    fn copy_program(&mut self, destination: i32) -> CallResult<bool> {
        self.plugin.copy_program(destination)
    }

    fn fx_idle(&mut self) -> CallResult<i32> {
        self.plugin.fx_idle()
    }

    fn get_channel_parameter(&mut self, channel: i32, index: i32) -> CallResult<f32> {
        self.plugin.get_channel_parameter(channel, index)
    }

    fn get_num_categories(&mut self) -> CallResult<i32> {
        self.plugin.get_num_categories()
    }

    fn get_input_properties(&mut self, index: i32) -> CallResult<Option<PinProperties>> {
        self.plugin.get_input_properties(index)
    }

    fn get_output_properties(&mut self, index: i32) -> CallResult<Option<PinProperties>> {
        self.plugin.get_output_properties(index)
    }

    fn get_error_text(&mut self) -> CallResult<String> {
        self.plugin.get_error_text()
    }

    fn get_get_tail_size(&mut self) -> CallResult<i32> {
        self.plugin.get_get_tail_size()
    }

    fn get_parameter_properties(
        &mut self,
        index: i32,
    ) -> CallResult<Option<ParameterProperties>> {
        self.plugin.get_parameter_properties(index)
    }

    fn get_vst_version(&mut self) -> CallResult<i32> {
        self.plugin.get_vst_version()
    }

    fn input_connected(&mut self, index: i32, state: bool) -> CallResult<()> {
        self.plugin.input_connected(index, state)
    }

    fn output_connected(&mut self, index: i32, state: bool) -> CallResult<()> {
        self.plugin.output_connected(index, state)
    }

    fn keys_required(&mut self) -> CallResult<bool> {
        self.plugin.keys_required()
    }

    fn process_events(&mut self, events: &Events) -> CallResult<i32> {
        self.plugin.process_events(events)
    }

    fn process_variable_io(&mut self, io: &mut VariableIo) -> CallResult<bool> {
        self.plugin.process_variable_io(io)
    }

    fn report_current_position(&mut self) -> CallResult<i32> {
        self.plugin.report_current_position()
    }

    fn report_destination_buffer(&mut self) -> CallResult<Vec<f32>> {
        self.plugin.report_destination_buffer()
    }

    fn set_block_size_and_sample_rate(
        &mut self,
        block_size: i32,
        sample_rate: f32,
    ) -> CallResult<()> {
        self.plugin
            .set_block_size_and_sample_rate(block_size, sample_rate)
    }

    fn set_speaker_arrangement(
        &mut self,
        input: &SpeakerArrangement,
        output: &SpeakerArrangement,
    ) -> CallResult<bool> {
        self.plugin.set_speaker_arrangement(input, output)
    }

    fn get_speaker_arrangement(
        &mut self,
        input: &mut SpeakerArrangement,
        output: &mut SpeakerArrangement,
    ) -> CallResult<bool> {
        self.plugin.get_speaker_arrangement(input, output)
    }

    fn get_midi_program_name(
        &mut self,
        channel: i32,
        program: &mut MidiProgramName,
    ) -> CallResult<i32> {
        self.plugin.get_midi_program_name(channel, program)
    }

    fn get_current_midi_program(
        &mut self,
        channel: i32,
        program: &mut MidiProgramName,
    ) -> CallResult<i32> {
        self.plugin.get_current_midi_program(channel, program)
    }

    fn get_midi_program_category(
        &mut self,
        channel: i32,
        category: &mut MidiProgramCategory,
    ) -> CallResult<i32> {
        self.plugin.get_midi_program_category(channel, category)
    }

    fn has_midi_programs_changed(&mut self, channel: i32) -> CallResult<bool> {
        self.plugin.has_midi_programs_changed(channel)
    }

    fn get_midi_key_name(&mut self, channel: i32, key: &mut MidiKeyName) -> CallResult<bool> {
        self.plugin.get_midi_key_name(channel, key)
    }

    fn begin_set_program(&mut self) -> CallResult<bool> {
        self.plugin.begin_set_program()
    }

    fn end_set_program(&mut self) -> CallResult<bool> {
        self.plugin.end_set_program()
    }

    fn set_total_sample_to_process(&mut self, value: i32) -> CallResult<i32> {
        self.plugin.set_total_sample_to_process(value)
    }

    fn get_next_shell_plugin(&mut self, name: &mut String) -> CallResult<i32> {
        self.plugin.get_next_shell_plugin(name)
    }

    fn start_process(&mut self) -> CallResult<i32> {
        self.plugin.start_process()
    }

    fn stop_process(&mut self) -> CallResult<i32> {
        self.plugin.stop_process()
    }

    #[inline]
    fn process_double_replacing(
        &mut self,
        inputs: &[&[f64]],
        outputs: &mut [&mut [f64]],
        sample_frames: i32,
    ) -> CallResult<()> {
        self.plugin
            .process_double_replacing(inputs, outputs, sample_frames)
    }

    fn set_process_precision(&mut self, precision: i32) -> CallResult<bool> {
        self.plugin.set_process_precision(precision)
    }

    fn get_num_midi_input_channels(&mut self) -> CallResult<i32> {
        self.plugin.get_num_midi_input_channels()
    }

    fn get_num_midi_output_channels(&mut self) -> CallResult<i32> {
        self.plugin.get_num_midi_output_channels()
    }
}
