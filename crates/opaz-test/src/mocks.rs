//! Mock implementations for testing.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use opaz_core::{
    CallError, CallResult, Events, HostCallbacks, MidiKeyName, MidiProgramCategory,
    MidiProgramName, NativeHandle, ParameterProperties, PinProperties, SpeakerArrangement,
    VariableIo, VstPlugin, constants,
};

/// Number of parameters a [`RecordingPlugin`] exposes.
pub const RECORDING_NUM_PARAMS: i32 = 4;

const PARAMS: usize = 4;

#[derive(Debug)]
struct RecordingState {
    calls: Vec<String>,
    failing: HashSet<String>,
    parameters: Vec<f32>,
    program: i32,
    program_name: String,
    bypass: bool,
    chunk: Vec<u8>,
    sample_rate: f32,
}

impl Default for RecordingState {
    fn default() -> Self {
        Self {
            calls: Vec::new(),
            failing: HashSet::new(),
            parameters: vec![0.5; PARAMS],
            program: 0,
            program_name: "Init".to_string(),
            bypass: false,
            chunk: vec![1, 2, 3],
            sample_rate: 44_100.0,
        }
    }
}

/// A native plugin object that records every capability call.
///
/// Clones share their state, so a test can keep one clone while a factory
/// hands another to the bridge. Every capability answers with a distinctive
/// non-default value so forwarding can be told apart from defaulting.
#[derive(Debug, Clone, Default)]
pub struct RecordingPlugin {
    state: Arc<Mutex<RecordingState>>,
}

impl RecordingPlugin {
    /// Create a new recording plugin.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `capability` (protocol name, e.g. `getParameter`) fail.
    #[must_use]
    pub fn with_failure(self, capability: impl Into<String>) -> Self {
        self.lock().failing.insert(capability.into());
        self
    }

    /// Protocol names of the calls received so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<String> {
        self.lock().calls.clone()
    }

    /// Forget recorded calls.
    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    /// The error a failing capability returns.
    #[must_use]
    pub fn injected_error(capability: &str) -> CallError {
        CallError::failed(capability, "injected failure")
    }

    fn lock(&self) -> MutexGuard<'_, RecordingState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record a call and return the state, or the injected error.
    fn hit(&self, capability: &str) -> CallResult<MutexGuard<'_, RecordingState>> {
        let mut state = self.lock();
        state.calls.push(capability.to_string());
        if state.failing.contains(capability) {
            return Err(Self::injected_error(capability));
        }
        Ok(state)
    }

    /// Record a call that does not touch the state.
    fn record(&self, capability: &str) -> CallResult<()> {
        self.hit(capability).map(drop)
    }
}

fn param_index(index: i32) -> Option<usize> {
    usize::try_from(index)
        .ok()
        .filter(|i| *i < PARAMS)
}

impl VstPlugin for RecordingPlugin {
    fn can_do(&mut self, feature: &str) -> CallResult<i32> {
        self.record("canDo")?;
        Ok(match feature {
            "bypass" | "receiveVstEvents" => constants::can_do::YES,
            "sendVstEvents" => constants::can_do::MAYBE,
            _ => constants::can_do::NO,
        })
    }

    fn get_plug_category(&mut self) -> CallResult<i32> {
        self.record("getPlugCategory")?;
        Ok(constants::plug_category::ANALYSIS)
    }

    fn get_product_string(&mut self) -> CallResult<String> {
        self.record("getProductString")?;
        Ok("Recorder".to_string())
    }

    fn get_program_name_indexed(&mut self, category: i32, index: i32) -> CallResult<String> {
        self.record("getProgramNameIndexed")?;
        Ok(format!("Category {category} Program {index}"))
    }

    fn get_vendor_string(&mut self) -> CallResult<String> {
        self.record("getVendorString")?;
        Ok("Recording Vendor".to_string())
    }

    fn set_bypass(&mut self, bypass: bool) -> CallResult<bool> {
        self.hit("setBypass")?.bypass = bypass;
        Ok(true)
    }

    fn string_to_parameter(&mut self, index: i32, value: &str) -> CallResult<bool> {
        let mut state = self.hit("string2Parameter")?;
        match (param_index(index), value.trim().parse::<f32>()) {
            (Some(i), Ok(v)) => {
                state.parameters[i] = v;
                Ok(true)
            },
            _ => Ok(false),
        }
    }

    fn get_num_params(&mut self) -> CallResult<i32> {
        self.record("getNumParams")?;
        Ok(RECORDING_NUM_PARAMS)
    }

    fn get_num_programs(&mut self) -> CallResult<i32> {
        self.record("getNumPrograms")?;
        Ok(16)
    }

    fn get_parameter(&mut self, index: i32) -> CallResult<f32> {
        let state = self.hit("getParameter")?;
        param_index(index)
            .map(|i| state.parameters[i])
            .ok_or_else(|| CallError::invalid_argument("getParameter", format!("index {index}")))
    }

    fn get_parameter_display(&mut self, index: i32) -> CallResult<String> {
        let state = self.hit("getParameterDisplay")?;
        Ok(param_index(index)
            .map(|i| format!("{:.2}", state.parameters[i]))
            .unwrap_or_default())
    }

    fn get_parameter_label(&mut self, _index: i32) -> CallResult<String> {
        self.record("getParameterLabel")?;
        Ok("dB".to_string())
    }

    fn get_parameter_name(&mut self, index: i32) -> CallResult<String> {
        self.record("getParameterName")?;
        Ok(format!("Param {index}"))
    }

    fn get_program(&mut self) -> CallResult<i32> {
        Ok(self.hit("getProgram")?.program)
    }

    fn get_program_name(&mut self) -> CallResult<String> {
        Ok(self.hit("getProgramName")?.program_name.clone())
    }

    fn process_replacing(
        &mut self,
        inputs: &[&[f32]],
        outputs: &mut [&mut [f32]],
        sample_frames: i32,
    ) -> CallResult<()> {
        self.record("processReplacing")?;
        let frames = usize::try_from(sample_frames).unwrap_or(0);
        for (ch, out) in outputs.iter_mut().enumerate() {
            for (i, sample) in out.iter_mut().take(frames).enumerate() {
                *sample = inputs.get(ch).and_then(|c| c.get(i)).copied().unwrap_or(0.0);
            }
        }
        Ok(())
    }

    fn set_parameter(&mut self, index: i32, value: f32) -> CallResult<()> {
        let mut state = self.hit("setParameter")?;
        if let Some(i) = param_index(index) {
            state.parameters[i] = value;
        }
        Ok(())
    }

    fn set_program(&mut self, index: i32) -> CallResult<()> {
        self.hit("setProgram")?.program = index;
        Ok(())
    }

    fn set_program_name(&mut self, name: &str) -> CallResult<()> {
        self.hit("setProgramName")?.program_name = name.to_string();
        Ok(())
    }

    fn open(&mut self) -> CallResult<()> {
        self.record("open")
    }

    fn close(&mut self) -> CallResult<()> {
        self.record("close")
    }

    fn suspend(&mut self) -> CallResult<()> {
        self.record("suspend")
    }

    fn resume(&mut self) -> CallResult<()> {
        self.record("resume")
    }

    fn get_vu(&mut self) -> CallResult<f32> {
        self.record("getVu")?;
        Ok(0.75)
    }

    fn get_chunk(&mut self, is_preset: bool) -> CallResult<Vec<u8>> {
        let state = self.hit("getChunk")?;
        let mut chunk = state.chunk.clone();
        chunk.push(u8::from(is_preset));
        Ok(chunk)
    }

    fn set_chunk(&mut self, data: &[u8], _is_preset: bool) -> CallResult<i32> {
        self.hit("setChunk")?.chunk = data.to_vec();
        Ok(i32::try_from(data.len()).unwrap_or(i32::MAX))
    }

    fn set_block_size(&mut self, _block_size: i32) -> CallResult<()> {
        self.record("setBlockSize")
    }

    fn set_sample_rate(&mut self, sample_rate: f32) -> CallResult<()> {
        self.hit("setSampleRate")?.sample_rate = sample_rate;
        Ok(())
    }

    fn get_effect_name(&mut self) -> CallResult<String> {
        self.record("getEffectName")?;
        Ok("Recorder Effect".to_string())
    }

    fn get_vendor_version(&mut self) -> CallResult<i32> {
        self.record("getVendorVersion")?;
        Ok(1001)
    }

    fn can_parameter_be_automated(&mut self, index: i32) -> CallResult<bool> {
        self.record("canParameterBeAutomated")?;
        Ok(index & 1 == 0)
    }

    fn copy_program(&mut self, destination: i32) -> CallResult<bool> {
        self.record("copyProgram")?;
        Ok(destination >= 0)
    }

    fn fx_idle(&mut self) -> CallResult<i32> {
        self.record("fxIdle")?;
        Ok(1)
    }

    fn get_channel_parameter(&mut self, channel: i32, index: i32) -> CallResult<f32> {
        self.record("getChannelParameter")?;
        Ok(f32::from(i16::try_from(channel.saturating_add(index)).unwrap_or(0)) / 10.0)
    }

    fn get_num_categories(&mut self) -> CallResult<i32> {
        self.record("getNumCategories")?;
        Ok(3)
    }

    fn get_input_properties(&mut self, index: i32) -> CallResult<Option<PinProperties>> {
        self.record("getInputProperties")?;
        Ok((index < 2).then(|| PinProperties {
            label: format!("Input {index}"),
            short_label: format!("In{index}"),
            flags: constants::pin_flags::IS_ACTIVE | constants::pin_flags::IS_STEREO,
            arrangement_type: 0,
        }))
    }

    fn get_output_properties(&mut self, index: i32) -> CallResult<Option<PinProperties>> {
        self.record("getOutputProperties")?;
        Ok((index < 2).then(|| PinProperties {
            label: format!("Output {index}"),
            short_label: format!("Out{index}"),
            flags: constants::pin_flags::IS_ACTIVE,
            arrangement_type: 0,
        }))
    }

    fn get_error_text(&mut self) -> CallResult<String> {
        self.record("getErrorText")?;
        Ok("no error".to_string())
    }

    fn get_get_tail_size(&mut self) -> CallResult<i32> {
        self.record("getGetTailSize")?;
        Ok(256)
    }

    fn get_parameter_properties(
        &mut self,
        index: i32,
    ) -> CallResult<Option<ParameterProperties>> {
        self.record("getParameterProperties")?;
        Ok(param_index(index).map(|_| ParameterProperties {
            label: format!("Param {index}"),
            min_integer: 0,
            max_integer: 100,
            step_integer: 1,
            ..ParameterProperties::default()
        }))
    }

    fn get_vst_version(&mut self) -> CallResult<i32> {
        self.record("getVstVersion")?;
        Ok(2300)
    }

    fn input_connected(&mut self, _index: i32, _state: bool) -> CallResult<()> {
        self.record("inputConnected")
    }

    fn output_connected(&mut self, _index: i32, _state: bool) -> CallResult<()> {
        self.record("outputConnected")
    }

    fn keys_required(&mut self) -> CallResult<bool> {
        self.record("keysRequired")?;
        Ok(true)
    }

    fn process_events(&mut self, events: &Events) -> CallResult<i32> {
        self.record("processEvents")?;
        Ok(i32::try_from(events.len()).unwrap_or(i32::MAX))
    }

    fn process_variable_io(&mut self, io: &mut VariableIo) -> CallResult<bool> {
        self.record("processVariableIo")?;
        io.outputs.clone_from(&io.inputs);
        io.num_samples_output = io.num_samples_input;
        Ok(true)
    }

    fn report_current_position(&mut self) -> CallResult<i32> {
        self.record("reportCurrentPosition")?;
        Ok(4096)
    }

    fn report_destination_buffer(&mut self) -> CallResult<Vec<f32>> {
        self.record("reportDestinationBuffer")?;
        Ok(vec![0.1, 0.2, 0.3])
    }

    fn set_block_size_and_sample_rate(
        &mut self,
        _block_size: i32,
        sample_rate: f32,
    ) -> CallResult<()> {
        self.hit("setBlockSizeAndSampleRate")?.sample_rate = sample_rate;
        Ok(())
    }

    fn set_speaker_arrangement(
        &mut self,
        input: &SpeakerArrangement,
        output: &SpeakerArrangement,
    ) -> CallResult<bool> {
        self.record("setSpeakerArrangement")?;
        Ok(input.num_channels == output.num_channels)
    }

    fn get_speaker_arrangement(
        &mut self,
        input: &mut SpeakerArrangement,
        output: &mut SpeakerArrangement,
    ) -> CallResult<bool> {
        self.record("getSpeakerArrangement")?;
        input.num_channels = 2;
        output.num_channels = 2;
        Ok(true)
    }

    fn get_midi_program_name(
        &mut self,
        channel: i32,
        program: &mut MidiProgramName,
    ) -> CallResult<i32> {
        self.record("getMidiProgramName")?;
        program.name = format!("Channel {channel} Program {}", program.this_program_index);
        program.midi_program = program.this_program_index;
        Ok(128)
    }

    fn get_current_midi_program(
        &mut self,
        _channel: i32,
        program: &mut MidiProgramName,
    ) -> CallResult<i32> {
        let state = self.hit("getCurrentMidiProgram")?;
        program.this_program_index = state.program;
        program.name.clone_from(&state.program_name);
        Ok(state.program)
    }

    fn get_midi_program_category(
        &mut self,
        _channel: i32,
        category: &mut MidiProgramCategory,
    ) -> CallResult<i32> {
        self.record("getMidiProgramCategory")?;
        category.name = "Leads".to_string();
        Ok(2)
    }

    fn has_midi_programs_changed(&mut self, _channel: i32) -> CallResult<bool> {
        self.record("hasMidiProgramsChanged")?;
        Ok(true)
    }

    fn get_midi_key_name(&mut self, _channel: i32, key: &mut MidiKeyName) -> CallResult<bool> {
        self.record("getMidiKeyName")?;
        key.key_name = format!("Key {}", key.this_key_number);
        Ok(true)
    }

    fn begin_set_program(&mut self) -> CallResult<bool> {
        self.record("beginSetProgram")?;
        Ok(true)
    }

    fn end_set_program(&mut self) -> CallResult<bool> {
        self.record("endSetProgram")?;
        Ok(true)
    }

    fn set_total_sample_to_process(&mut self, value: i32) -> CallResult<i32> {
        self.record("setTotalSampleToProcess")?;
        Ok(value.saturating_sub(1))
    }

    fn get_next_shell_plugin(&mut self, name: &mut String) -> CallResult<i32> {
        self.record("getNextShellPlugin")?;
        "Shell Child".clone_into(name);
        Ok(0x5348_454C)
    }

    fn start_process(&mut self) -> CallResult<i32> {
        self.record("startProcess")?;
        Ok(1)
    }

    fn stop_process(&mut self) -> CallResult<i32> {
        self.record("stopProcess")?;
        Ok(1)
    }

    fn process_double_replacing(
        &mut self,
        inputs: &[&[f64]],
        outputs: &mut [&mut [f64]],
        sample_frames: i32,
    ) -> CallResult<()> {
        self.record("processDoubleReplacing")?;
        let frames = usize::try_from(sample_frames).unwrap_or(0);
        for (ch, out) in outputs.iter_mut().enumerate() {
            for (i, sample) in out.iter_mut().take(frames).enumerate() {
                *sample = inputs.get(ch).and_then(|c| c.get(i)).copied().unwrap_or(0.0);
            }
        }
        Ok(())
    }

    fn set_process_precision(&mut self, precision: i32) -> CallResult<bool> {
        self.record("setProcessPrecision")?;
        Ok(precision == constants::precision::DOUBLE)
    }

    fn get_num_midi_input_channels(&mut self) -> CallResult<i32> {
        self.record("getNumMidiInputChannels")?;
        Ok(16)
    }

    fn get_num_midi_output_channels(&mut self) -> CallResult<i32> {
        self.record("getNumMidiOutputChannels")?;
        Ok(1)
    }
}

/// Something a plugin asked of a [`RecordingHost`].
#[derive(Debug, Clone, PartialEq)]
pub enum HostEvent {
    /// `log`.
    Log {
        /// Calling instance.
        handle: NativeHandle,
        /// Message text.
        message: String,
    },
    /// `set_parameter_automated`.
    Automated {
        /// Calling instance.
        handle: NativeHandle,
        /// Parameter index.
        index: i32,
        /// New value.
        value: f32,
    },
    /// `io_changed`.
    IoChanged(NativeHandle),
    /// `update_display`.
    UpdateDisplay(NativeHandle),
}

/// Host callbacks that record what plugins ask for.
#[derive(Debug, Clone)]
pub struct RecordingHost {
    events: Arc<Mutex<Vec<HostEvent>>>,
    sample_rate: f32,
    block_size: i32,
}

impl Default for RecordingHost {
    fn default() -> Self {
        Self {
            events: Arc::default(),
            sample_rate: 48_000.0,
            block_size: 256,
        }
    }
}

impl RecordingHost {
    /// Create a new recording host (48 kHz, 256 frames).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Report this sample rate.
    #[must_use]
    pub fn with_sample_rate(mut self, sample_rate: f32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    /// Report this block size.
    #[must_use]
    pub fn with_block_size(mut self, block_size: i32) -> Self {
        self.block_size = block_size;
        self
    }

    /// Everything recorded so far.
    #[must_use]
    pub fn events(&self) -> Vec<HostEvent> {
        self.lock().clone()
    }

    /// Logged messages, in order.
    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        self.lock()
            .iter()
            .filter_map(|e| match e {
                HostEvent::Log { message, .. } => Some(message.clone()),
                _ => None,
            })
            .collect()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<HostEvent>> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn push(&self, event: HostEvent) {
        tracing::debug!(?event, "Host callback");
        self.lock().push(event);
    }
}

impl HostCallbacks for RecordingHost {
    fn log(&self, handle: NativeHandle, message: &str) {
        self.push(HostEvent::Log {
            handle,
            message: message.to_string(),
        });
    }

    fn set_parameter_automated(&self, handle: NativeHandle, index: i32, value: f32) {
        self.push(HostEvent::Automated {
            handle,
            index,
            value,
        });
    }

    fn sample_rate(&self, _handle: NativeHandle) -> f32 {
        self.sample_rate
    }

    fn block_size(&self, _handle: NativeHandle) -> i32 {
        self.block_size
    }

    fn io_changed(&self, handle: NativeHandle) -> bool {
        self.push(HostEvent::IoChanged(handle));
        true
    }

    fn update_display(&self, handle: NativeHandle) -> bool {
        self.push(HostEvent::UpdateDisplay(handle));
        true
    }
}
