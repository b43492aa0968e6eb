//! Script modules adapted to the native capability surface.
//!
//! A script plugin is a Rhai file defining `create(handle)` plus one function
//! per capability, named with the protocol's camelCase names. `create`
//! returns the instance value (usually an object map) which is bound as
//! `this` in every later call.
//!
//! Optional capabilities the script does not define answer with the native
//! wrapper defaults without entering the interpreter. Capabilities with
//! out-parameters return `[result, value...]`, or `()` when not handled.
//!
//! Top-level statements of the module run before every call so that
//! top-level `import`s are in scope for each capability. Keep them to
//! imports and constants.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use opaz_core::{
    CallError, CallResult, Events, MANDATORY_CAPABILITIES, MidiKeyName, MidiProgramCategory,
    MidiProgramName, NativeHandle, ParameterProperties, PinProperties, SpeakerArrangement,
    VariableIo, VstPlugin, defaults,
};
use rhai::serde::{from_dynamic, to_dynamic};
use rhai::{AST, Array, Blob, CallFnOptions, Dynamic, Engine, FLOAT, FuncArgs, INT, Scope};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::audio::AudioBlock;
use crate::error::{BridgeError, BridgeResult};

/// Name of the function that constructs the instance value.
pub const CONSTRUCTOR: &str = "create";

/// A compiled script module bound to one instance value.
pub struct ScriptPlugin {
    class_name: String,
    engine: Arc<Engine>,
    ast: AST,
    defined: HashMap<String, Vec<usize>>,
    instance: Dynamic,
    scope: Scope<'static>,
    block: AudioBlock,
}

impl fmt::Debug for ScriptPlugin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptPlugin")
            .field("class_name", &self.class_name)
            .field("instance", &self.instance.type_name())
            .finish_non_exhaustive()
    }
}

impl ScriptPlugin {
    /// Compile `path` and construct an instance for `handle`.
    ///
    /// # Errors
    ///
    /// - [`BridgeError::Script`] if the file does not compile
    /// - [`BridgeError::MissingCapability`] if mandatory functions are absent
    /// - [`BridgeError::ConstructorFailed`] if `create` raises an error
    /// - [`BridgeError::Conversion`] if `create` returns nothing
    pub fn load(
        engine: Arc<Engine>,
        class_name: &str,
        path: &Path,
        handle: NativeHandle,
    ) -> BridgeResult<Self> {
        let ast = engine
            .compile_file(path.to_path_buf())
            .map_err(|e| BridgeError::Script {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
        Self::from_ast(engine, class_name, ast, handle)
    }

    /// Compile `source` and construct an instance for `handle`.
    ///
    /// # Errors
    ///
    /// Same as [`ScriptPlugin::load`].
    pub fn from_source(
        engine: Arc<Engine>,
        class_name: &str,
        source: &str,
        handle: NativeHandle,
    ) -> BridgeResult<Self> {
        let ast = engine.compile(source).map_err(|e| BridgeError::Script {
            path: Path::new(class_name).to_path_buf(),
            message: e.to_string(),
        })?;
        Self::from_ast(engine, class_name, ast, handle)
    }

    fn from_ast(
        engine: Arc<Engine>,
        class_name: &str,
        ast: AST,
        handle: NativeHandle,
    ) -> BridgeResult<Self> {
        let mut defined: HashMap<String, Vec<usize>> = HashMap::new();
        for f in ast.iter_functions() {
            defined
                .entry(f.name.to_owned())
                .or_default()
                .push(f.params.len());
        }
        let has = |name: &str, arity: usize| defined.get(name).is_some_and(|a| a.contains(&arity));

        let missing: Vec<String> = std::iter::once((CONSTRUCTOR, 1))
            .chain(MANDATORY_CAPABILITIES.iter().copied())
            .filter(|(name, arity)| !has(name, *arity))
            .map(|(name, arity)| format!("{name}/{arity}"))
            .collect();
        if !missing.is_empty() {
            return Err(BridgeError::MissingCapability {
                plugin: class_name.to_owned(),
                capabilities: missing,
            });
        }

        let mut scope = Scope::new();
        let options = CallFnOptions::new().eval_ast(true).rewind_scope(true);
        let instance = engine
            .call_fn_with_options::<Dynamic>(options, &mut scope, &ast, CONSTRUCTOR, (handle.raw(),))
            .map_err(|e| BridgeError::ConstructorFailed {
                plugin: class_name.to_owned(),
                message: e.to_string(),
            })?;
        if instance.is_unit() {
            return Err(BridgeError::Conversion {
                plugin: class_name.to_owned(),
                message: format!("{CONSTRUCTOR}() returned no instance"),
            });
        }

        debug!(
            plugin = %class_name,
            handle = %handle,
            instance = instance.type_name(),
            functions = defined.len(),
            "Script plugin constructed"
        );

        Ok(Self {
            class_name: class_name.to_owned(),
            engine,
            ast,
            defined,
            instance,
            scope,
            block: AudioBlock::new(),
        })
    }

    /// Plugin class identifier.
    #[must_use]
    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    /// The instance value returned by `create`.
    #[must_use]
    pub fn instance(&self) -> &Dynamic {
        &self.instance
    }

    /// Whether the script defines `name` with `arity` parameters.
    #[must_use]
    pub fn defines(&self, name: &str, arity: usize) -> bool {
        self.defined.get(name).is_some_and(|a| a.contains(&arity))
    }

    fn call(&mut self, name: &'static str, args: impl FuncArgs) -> CallResult<Dynamic> {
        let options = CallFnOptions::new()
            .eval_ast(true)
            .rewind_scope(true)
            .bind_this_ptr(&mut self.instance);
        self.engine
            .call_fn_with_options::<Dynamic>(options, &mut self.scope, &self.ast, name, args)
            .map_err(|e| CallError::failed(name, e.to_string()))
    }

    /// Call an optional capability, `None` when the script lacks it.
    fn call_optional(
        &mut self,
        name: &'static str,
        arity: usize,
        args: impl FuncArgs,
    ) -> CallResult<Option<Dynamic>> {
        if self.defines(name, arity) {
            self.call(name, args).map(Some)
        } else {
            Ok(None)
        }
    }

    fn process(&mut self, name: &'static str) -> CallResult<()> {
        let block = Dynamic::from(self.block.clone());
        self.call(name, (block,)).map(drop)
    }
}

fn to_int(capability: &'static str, value: &Dynamic) -> CallResult<i32> {
    let n = value
        .as_int()
        .map_err(|found| CallError::bad_return(capability, "int", found))?;
    i32::try_from(n).map_err(|_| CallError::bad_return(capability, "32-bit int", n.to_string()))
}

#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn to_f32(capability: &'static str, value: &Dynamic) -> CallResult<f32> {
    value
        .as_float()
        .map(|f| f as f32)
        .or_else(|_| value.as_int().map(|n| n as f32))
        .map_err(|found| CallError::bad_return(capability, "float", found))
}

fn to_bool(capability: &'static str, value: &Dynamic) -> CallResult<bool> {
    value
        .as_bool()
        .or_else(|_| value.as_int().map(|n| n != 0))
        .map_err(|found| CallError::bad_return(capability, "bool", found))
}

fn to_text(capability: &'static str, value: Dynamic) -> CallResult<String> {
    value
        .into_string()
        .map_err(|found| CallError::bad_return(capability, "string", found))
}

fn to_object<T: DeserializeOwned>(capability: &'static str, value: &Dynamic) -> CallResult<T> {
    from_dynamic(value).map_err(|e| CallError::bad_return(capability, "object map", e.to_string()))
}

fn arg<T: Serialize>(capability: &'static str, value: &T) -> CallResult<Dynamic> {
    to_dynamic(value).map_err(|e| CallError::invalid_argument(capability, e.to_string()))
}

/// Split an out-parameter answer into its parts.
///
/// `()` means not handled. Anything else must be an array of exactly
/// `parts` values.
fn out_params(capability: &'static str, value: Dynamic, parts: usize) -> CallResult<Option<Array>> {
    if value.is_unit() {
        return Ok(None);
    }
    let found = value.type_name();
    match value.into_array() {
        Ok(array) if array.len() == parts => Ok(Some(array)),
        Ok(array) => Err(CallError::bad_return(
            capability,
            format!("array of {parts}"),
            format!("array of {}", array.len()),
        )),
        Err(_) => Err(CallError::bad_return(capability, "array", found)),
    }
}

/// Checked frame count of a processing call.
///
/// Must not be negative and must fit every input and output channel.
fn frames<T>(
    capability: &'static str,
    sample_frames: i32,
    inputs: &[&[T]],
    outputs: &[&mut [T]],
) -> CallResult<usize> {
    let n = usize::try_from(sample_frames)
        .map_err(|_| CallError::invalid_argument(capability, format!("{sample_frames} frames")))?;
    let available = inputs
        .iter()
        .map(|c| c.len())
        .chain(outputs.iter().map(|c| c.len()))
        .min();
    match available {
        Some(len) if n > len => Err(CallError::invalid_argument(
            capability,
            format!("{n} frames, buffers hold {len}"),
        )),
        _ => Ok(n),
    }
}

impl VstPlugin for ScriptPlugin {
    fn can_do(&mut self, feature: &str) -> CallResult<i32> {
        let v = self.call("canDo", (feature.to_owned(),))?;
        to_int("canDo", &v)
    }

    fn get_plug_category(&mut self) -> CallResult<i32> {
        let v = self.call("getPlugCategory", ())?;
        to_int("getPlugCategory", &v)
    }

    fn get_product_string(&mut self) -> CallResult<String> {
        let v = self.call("getProductString", ())?;
        to_text("getProductString", v)
    }

    fn get_program_name_indexed(&mut self, category: i32, index: i32) -> CallResult<String> {
        let v = self.call(
            "getProgramNameIndexed",
            (INT::from(category), INT::from(index)),
        )?;
        to_text("getProgramNameIndexed", v)
    }

    fn get_vendor_string(&mut self) -> CallResult<String> {
        let v = self.call("getVendorString", ())?;
        to_text("getVendorString", v)
    }

    fn set_bypass(&mut self, bypass: bool) -> CallResult<bool> {
        let v = self.call("setBypass", (bypass,))?;
        to_bool("setBypass", &v)
    }

    fn string_to_parameter(&mut self, index: i32, value: &str) -> CallResult<bool> {
        let v = self.call("string2Parameter", (INT::from(index), value.to_owned()))?;
        to_bool("string2Parameter", &v)
    }

    fn get_num_params(&mut self) -> CallResult<i32> {
        let v = self.call("getNumParams", ())?;
        to_int("getNumParams", &v)
    }

    fn get_num_programs(&mut self) -> CallResult<i32> {
        let v = self.call("getNumPrograms", ())?;
        to_int("getNumPrograms", &v)
    }

    fn get_parameter(&mut self, index: i32) -> CallResult<f32> {
        let v = self.call("getParameter", (INT::from(index),))?;
        to_f32("getParameter", &v)
    }

    fn get_parameter_display(&mut self, index: i32) -> CallResult<String> {
        let v = self.call("getParameterDisplay", (INT::from(index),))?;
        to_text("getParameterDisplay", v)
    }

    fn get_parameter_label(&mut self, index: i32) -> CallResult<String> {
        let v = self.call("getParameterLabel", (INT::from(index),))?;
        to_text("getParameterLabel", v)
    }

    fn get_parameter_name(&mut self, index: i32) -> CallResult<String> {
        let v = self.call("getParameterName", (INT::from(index),))?;
        to_text("getParameterName", v)
    }

    fn get_program(&mut self) -> CallResult<i32> {
        let v = self.call("getProgram", ())?;
        to_int("getProgram", &v)
    }

    fn get_program_name(&mut self) -> CallResult<String> {
        let v = self.call("getProgramName", ())?;
        to_text("getProgramName", v)
    }

    fn process_replacing(
        &mut self,
        inputs: &[&[f32]],
        outputs: &mut [&mut [f32]],
        sample_frames: i32,
    ) -> CallResult<()> {
        let n = frames("processReplacing", sample_frames, inputs, outputs)?;
        self.block.load_f32(inputs, outputs.len(), n);
        self.process("processReplacing")?;
        self.block.store_f32(outputs);
        Ok(())
    }

    fn set_parameter(&mut self, index: i32, value: f32) -> CallResult<()> {
        self.call("setParameter", (INT::from(index), FLOAT::from(value)))
            .map(drop)
    }

    fn set_program(&mut self, index: i32) -> CallResult<()> {
        self.call("setProgram", (INT::from(index),)).map(drop)
    }

    fn set_program_name(&mut self, name: &str) -> CallResult<()> {
        self.call("setProgramName", (name.to_owned(),)).map(drop)
    }

    fn open(&mut self) -> CallResult<()> {
        self.call_optional("open", 0, ()).map(drop)
    }

    fn close(&mut self) -> CallResult<()> {
        self.call_optional("close", 0, ()).map(drop)
    }

    fn suspend(&mut self) -> CallResult<()> {
        self.call_optional("suspend", 0, ()).map(drop)
    }

    fn resume(&mut self) -> CallResult<()> {
        self.call_optional("resume", 0, ()).map(drop)
    }

    fn get_vu(&mut self) -> CallResult<f32> {
        match self.call_optional("getVu", 0, ())? {
            Some(v) => to_f32("getVu", &v),
            None => Ok(0.0),
        }
    }

    fn get_chunk(&mut self, is_preset: bool) -> CallResult<Vec<u8>> {
        let Some(v) = self.call_optional("getChunk", 1, (is_preset,))? else {
            return Ok(Vec::new());
        };
        let found = v.type_name();
        if v.is_string() {
            return to_text("getChunk", v).map(String::into_bytes);
        }
        v.try_cast::<Blob>()
            .ok_or_else(|| CallError::bad_return("getChunk", "blob", found))
    }

    fn set_chunk(&mut self, data: &[u8], is_preset: bool) -> CallResult<i32> {
        let blob: Blob = data.to_vec();
        match self.call_optional("setChunk", 2, (Dynamic::from(blob), is_preset))? {
            Some(v) => to_int("setChunk", &v),
            None => Ok(0),
        }
    }

    fn set_block_size(&mut self, block_size: i32) -> CallResult<()> {
        self.call_optional("setBlockSize", 1, (INT::from(block_size),))
            .map(drop)
    }

    fn set_sample_rate(&mut self, sample_rate: f32) -> CallResult<()> {
        self.call_optional("setSampleRate", 1, (FLOAT::from(sample_rate),))
            .map(drop)
    }

    fn get_effect_name(&mut self) -> CallResult<String> {
        match self.call_optional("getEffectName", 0, ())? {
            Some(v) => to_text("getEffectName", v),
            None => Ok(String::new()),
        }
    }

    fn get_vendor_version(&mut self) -> CallResult<i32> {
        match self.call_optional("getVendorVersion", 0, ())? {
            Some(v) => to_int("getVendorVersion", &v),
            None => Ok(0),
        }
    }

    fn can_parameter_be_automated(&mut self, index: i32) -> CallResult<bool> {
        match self.call_optional("canParameterBeAutomated", 1, (INT::from(index),))? {
            Some(v) => to_bool("canParameterBeAutomated", &v),
            None => Ok(defaults::CAN_PARAMETER_BE_AUTOMATED),
        }
    }

    fn copy_program(&mut self, destination: i32) -> CallResult<bool> {
        match self.call_optional("copyProgram", 1, (INT::from(destination),))? {
            Some(v) => to_bool("copyProgram", &v),
            None => Ok(false),
        }
    }

    fn fx_idle(&mut self) -> CallResult<i32> {
        match self.call_optional("fxIdle", 0, ())? {
            Some(v) => to_int("fxIdle", &v),
            None => Ok(0),
        }
    }

    fn get_channel_parameter(&mut self, channel: i32, index: i32) -> CallResult<f32> {
        match self.call_optional(
            "getChannelParameter",
            2,
            (INT::from(channel), INT::from(index)),
        )? {
            Some(v) => to_f32("getChannelParameter", &v),
            None => Ok(0.0),
        }
    }

    fn get_num_categories(&mut self) -> CallResult<i32> {
        match self.call_optional("getNumCategories", 0, ())? {
            Some(v) => to_int("getNumCategories", &v),
            None => Ok(defaults::NUM_CATEGORIES),
        }
    }

    fn get_input_properties(&mut self, index: i32) -> CallResult<Option<PinProperties>> {
        match self.call_optional("getInputProperties", 1, (INT::from(index),))? {
            Some(v) if !v.is_unit() => to_object("getInputProperties", &v).map(Some),
            _ => Ok(None),
        }
    }

    fn get_output_properties(&mut self, index: i32) -> CallResult<Option<PinProperties>> {
        match self.call_optional("getOutputProperties", 1, (INT::from(index),))? {
            Some(v) if !v.is_unit() => to_object("getOutputProperties", &v).map(Some),
            _ => Ok(None),
        }
    }

    fn get_error_text(&mut self) -> CallResult<String> {
        match self.call_optional("getErrorText", 0, ())? {
            Some(v) => to_text("getErrorText", v),
            None => Ok(String::new()),
        }
    }

    fn get_get_tail_size(&mut self) -> CallResult<i32> {
        match self.call_optional("getGetTailSize", 0, ())? {
            Some(v) => to_int("getGetTailSize", &v),
            None => Ok(0),
        }
    }

    fn get_parameter_properties(
        &mut self,
        index: i32,
    ) -> CallResult<Option<ParameterProperties>> {
        match self.call_optional("getParameterProperties", 1, (INT::from(index),))? {
            Some(v) if !v.is_unit() => to_object("getParameterProperties", &v).map(Some),
            _ => Ok(None),
        }
    }

    fn get_vst_version(&mut self) -> CallResult<i32> {
        match self.call_optional("getVstVersion", 0, ())? {
            Some(v) => to_int("getVstVersion", &v),
            None => Ok(defaults::VST_VERSION),
        }
    }

    fn input_connected(&mut self, index: i32, state: bool) -> CallResult<()> {
        self.call_optional("inputConnected", 2, (INT::from(index), state))
            .map(drop)
    }

    fn output_connected(&mut self, index: i32, state: bool) -> CallResult<()> {
        self.call_optional("outputConnected", 2, (INT::from(index), state))
            .map(drop)
    }

    fn keys_required(&mut self) -> CallResult<bool> {
        match self.call_optional("keysRequired", 0, ())? {
            Some(v) => to_bool("keysRequired", &v),
            None => Ok(false),
        }
    }

    fn process_events(&mut self, events: &Events) -> CallResult<i32> {
        if !self.defines("processEvents", 1) {
            return Ok(0);
        }
        let events = arg("processEvents", events)?;
        let v = self.call("processEvents", (events,))?;
        to_int("processEvents", &v)
    }

    fn process_variable_io(&mut self, io: &mut VariableIo) -> CallResult<bool> {
        if !self.defines("processVariableIo", 1) {
            return Ok(false);
        }
        let request = arg("processVariableIo", &*io)?;
        let v = self.call("processVariableIo", (request,))?;
        let Some(parts) = out_params("processVariableIo", v, 2)? else {
            return Ok(false);
        };
        let handled = to_bool("processVariableIo", &parts[0])?;
        *io = to_object("processVariableIo", &parts[1])?;
        Ok(handled)
    }

    fn report_current_position(&mut self) -> CallResult<i32> {
        match self.call_optional("reportCurrentPosition", 0, ())? {
            Some(v) => to_int("reportCurrentPosition", &v),
            None => Ok(0),
        }
    }

    fn report_destination_buffer(&mut self) -> CallResult<Vec<f32>> {
        let Some(v) = self.call_optional("reportDestinationBuffer", 0, ())? else {
            return Ok(Vec::new());
        };
        let found = v.type_name();
        v.into_array()
            .map_err(|_| CallError::bad_return("reportDestinationBuffer", "array", found))?
            .iter()
            .map(|s| to_f32("reportDestinationBuffer", s))
            .collect()
    }

    fn set_block_size_and_sample_rate(
        &mut self,
        block_size: i32,
        sample_rate: f32,
    ) -> CallResult<()> {
        self.call_optional(
            "setBlockSizeAndSampleRate",
            2,
            (INT::from(block_size), FLOAT::from(sample_rate)),
        )
        .map(drop)
    }

    fn set_speaker_arrangement(
        &mut self,
        input: &SpeakerArrangement,
        output: &SpeakerArrangement,
    ) -> CallResult<bool> {
        if !self.defines("setSpeakerArrangement", 2) {
            return Ok(false);
        }
        let args = (
            arg("setSpeakerArrangement", input)?,
            arg("setSpeakerArrangement", output)?,
        );
        let v = self.call("setSpeakerArrangement", args)?;
        to_bool("setSpeakerArrangement", &v)
    }

    fn get_speaker_arrangement(
        &mut self,
        input: &mut SpeakerArrangement,
        output: &mut SpeakerArrangement,
    ) -> CallResult<bool> {
        let Some(v) = self.call_optional("getSpeakerArrangement", 0, ())? else {
            return Ok(false);
        };
        let Some(parts) = out_params("getSpeakerArrangement", v, 3)? else {
            return Ok(false);
        };
        let accepted = to_bool("getSpeakerArrangement", &parts[0])?;
        *input = to_object("getSpeakerArrangement", &parts[1])?;
        *output = to_object("getSpeakerArrangement", &parts[2])?;
        Ok(accepted)
    }

    fn get_midi_program_name(
        &mut self,
        channel: i32,
        program: &mut MidiProgramName,
    ) -> CallResult<i32> {
        if !self.defines("getMidiProgramName", 2) {
            return Ok(0);
        }
        let query = arg("getMidiProgramName", &*program)?;
        let v = self.call("getMidiProgramName", (INT::from(channel), query))?;
        let Some(parts) = out_params("getMidiProgramName", v, 2)? else {
            return Ok(0);
        };
        let count = to_int("getMidiProgramName", &parts[0])?;
        *program = to_object("getMidiProgramName", &parts[1])?;
        Ok(count)
    }

    fn get_current_midi_program(
        &mut self,
        channel: i32,
        program: &mut MidiProgramName,
    ) -> CallResult<i32> {
        if !self.defines("getCurrentMidiProgram", 2) {
            return Ok(0);
        }
        let query = arg("getCurrentMidiProgram", &*program)?;
        let v = self.call("getCurrentMidiProgram", (INT::from(channel), query))?;
        let Some(parts) = out_params("getCurrentMidiProgram", v, 2)? else {
            return Ok(0);
        };
        let current = to_int("getCurrentMidiProgram", &parts[0])?;
        *program = to_object("getCurrentMidiProgram", &parts[1])?;
        Ok(current)
    }

    fn get_midi_program_category(
        &mut self,
        channel: i32,
        category: &mut MidiProgramCategory,
    ) -> CallResult<i32> {
        if !self.defines("getMidiProgramCategory", 2) {
            return Ok(0);
        }
        let query = arg("getMidiProgramCategory", &*category)?;
        let v = self.call("getMidiProgramCategory", (INT::from(channel), query))?;
        let Some(parts) = out_params("getMidiProgramCategory", v, 2)? else {
            return Ok(0);
        };
        let count = to_int("getMidiProgramCategory", &parts[0])?;
        *category = to_object("getMidiProgramCategory", &parts[1])?;
        Ok(count)
    }

    fn has_midi_programs_changed(&mut self, channel: i32) -> CallResult<bool> {
        match self.call_optional("hasMidiProgramsChanged", 1, (INT::from(channel),))? {
            Some(v) => to_bool("hasMidiProgramsChanged", &v),
            None => Ok(false),
        }
    }

    fn get_midi_key_name(&mut self, channel: i32, key: &mut MidiKeyName) -> CallResult<bool> {
        if !self.defines("getMidiKeyName", 2) {
            return Ok(false);
        }
        let query = arg("getMidiKeyName", &*key)?;
        let v = self.call("getMidiKeyName", (INT::from(channel), query))?;
        let Some(parts) = out_params("getMidiKeyName", v, 2)? else {
            return Ok(false);
        };
        let named = to_bool("getMidiKeyName", &parts[0])?;
        *key = to_object("getMidiKeyName", &parts[1])?;
        Ok(named)
    }

    fn begin_set_program(&mut self) -> CallResult<bool> {
        match self.call_optional("beginSetProgram", 0, ())? {
            Some(v) => to_bool("beginSetProgram", &v),
            None => Ok(false),
        }
    }

    fn end_set_program(&mut self) -> CallResult<bool> {
        match self.call_optional("endSetProgram", 0, ())? {
            Some(v) => to_bool("endSetProgram", &v),
            None => Ok(false),
        }
    }

    fn set_total_sample_to_process(&mut self, value: i32) -> CallResult<i32> {
        match self.call_optional("setTotalSampleToProcess", 1, (INT::from(value),))? {
            Some(v) => to_int("setTotalSampleToProcess", &v),
            None => Ok(defaults::total_sample_to_process(value)),
        }
    }

    fn get_next_shell_plugin(&mut self, name: &mut String) -> CallResult<i32> {
        let Some(v) = self.call_optional("getNextShellPlugin", 0, ())? else {
            return Ok(0);
        };
        let Some(mut parts) = out_params("getNextShellPlugin", v, 2)? else {
            return Ok(0);
        };
        let id = to_int("getNextShellPlugin", &parts[0])?;
        *name = to_text("getNextShellPlugin", std::mem::take(&mut parts[1]))?;
        Ok(id)
    }

    fn start_process(&mut self) -> CallResult<i32> {
        match self.call_optional("startProcess", 0, ())? {
            Some(v) => to_int("startProcess", &v),
            None => Ok(0),
        }
    }

    fn stop_process(&mut self) -> CallResult<i32> {
        match self.call_optional("stopProcess", 0, ())? {
            Some(v) => to_int("stopProcess", &v),
            None => Ok(0),
        }
    }

    fn process_double_replacing(
        &mut self,
        inputs: &[&[f64]],
        outputs: &mut [&mut [f64]],
        sample_frames: i32,
    ) -> CallResult<()> {
        if !self.defines("processDoubleReplacing", 1) {
            return Ok(());
        }
        let n = frames("processDoubleReplacing", sample_frames, inputs, outputs)?;
        self.block.load_f64(inputs, outputs.len(), n);
        self.process("processDoubleReplacing")?;
        self.block.store_f64(outputs);
        Ok(())
    }

    fn set_process_precision(&mut self, precision: i32) -> CallResult<bool> {
        match self.call_optional("setProcessPrecision", 1, (INT::from(precision),))? {
            Some(v) => to_bool("setProcessPrecision", &v),
            None => Ok(false),
        }
    }

    fn get_num_midi_input_channels(&mut self) -> CallResult<i32> {
        match self.call_optional("getNumMidiInputChannels", 0, ())? {
            Some(v) => to_int("getNumMidiInputChannels", &v),
            None => Ok(0),
        }
    }

    fn get_num_midi_output_channels(&mut self) -> CallResult<i32> {
        match self.call_optional("getNumMidiOutputChannels", 0, ())? {
            Some(v) => to_int("getNumMidiOutputChannels", &v),
            None => Ok(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = r#"
        fn create(handle) { #{ handle: handle, gain: 0.5, program: 0, name: "Init" } }
        fn canDo(feature) { if feature == "bypass" { 1 } else { -1 } }
        fn getPlugCategory() { 1 }
        fn getProductString() { "Gain" }
        fn getProgramNameIndexed(category, index) { `Program ${index}` }
        fn getVendorString() { "Acme" }
        fn setBypass(bypass) { true }
        fn string2Parameter(index, text) { this.gain = parse_float(text); true }
        fn getNumParams() { 1 }
        fn getNumPrograms() { 4 }
        fn getParameter(index) { this.gain }
        fn getParameterDisplay(index) { `${this.gain}` }
        fn getParameterLabel(index) { "x" }
        fn getParameterName(index) { "Gain" }
        fn getProgram() { this.program }
        fn getProgramName() { this.name }
        fn processReplacing(block) {
            block.copy_through();
            for ch in 0..block.num_outputs { block.scale_output(ch, this.gain); }
        }
        fn setParameter(index, value) { this.gain = value; }
        fn setProgram(index) { this.program = index; }
        fn setProgramName(name) { this.name = name; }
    "#;

    fn load(extra: &str) -> ScriptPlugin {
        let source = format!("{BASE}\n{extra}");
        ScriptPlugin::from_source(Arc::new(test_engine()), "Gain", &source, NativeHandle::new(42))
            .unwrap()
    }

    fn test_engine() -> Engine {
        let mut engine = Engine::new();
        crate::audio::register(&mut engine);
        engine
    }

    #[test]
    fn instance_state_is_bound_to_this() {
        let mut plugin = load("");
        assert_eq!(plugin.instance().type_name(), "map");
        plugin.set_parameter(0, 0.25).unwrap();
        assert!((plugin.get_parameter(0).unwrap() - 0.25).abs() < f32::EPSILON);
        plugin.set_program_name("Loud").unwrap();
        assert_eq!(plugin.get_program_name().unwrap(), "Loud");
        assert!(plugin.string_to_parameter(0, "0.75").unwrap());
        assert!((plugin.get_parameter(0).unwrap() - 0.75).abs() < f32::EPSILON);
        assert_eq!(plugin.get_program_name_indexed(0, 3).unwrap(), "Program 3");
        assert_eq!(plugin.can_do("bypass").unwrap(), 1);
    }

    #[test]
    fn constructor_receives_handle() {
        let plugin = load("");
        let map = plugin.instance().clone_cast::<rhai::Map>();
        assert_eq!(map.get("handle").unwrap().as_int().unwrap(), 42);
    }

    #[test]
    fn missing_capabilities_are_listed() {
        let err = ScriptPlugin::from_source(
            Arc::new(test_engine()),
            "Broken",
            "fn getVendorString() { \"Acme\" }",
            NativeHandle::new(1),
        )
        .unwrap_err();
        let BridgeError::MissingCapability { plugin, capabilities } = err else {
            panic!("expected MissingCapability, got {err:?}");
        };
        assert_eq!(plugin, "Broken");
        assert!(capabilities.contains(&"create/1".to_owned()));
        assert!(capabilities.contains(&"processReplacing/1".to_owned()));
        assert!(!capabilities.iter().any(|c| c.starts_with("getVendorString")));
    }

    #[test]
    fn wrong_arity_counts_as_missing() {
        let source = BASE.replace("fn getParameter(index)", "fn getParameter()");
        let err = ScriptPlugin::from_source(
            Arc::new(test_engine()),
            "Gain",
            &source,
            NativeHandle::new(1),
        )
        .unwrap_err();
        assert!(
            matches!(err, BridgeError::MissingCapability { capabilities, .. } if capabilities == vec!["getParameter/1".to_owned()])
        );
    }

    #[test]
    fn constructor_errors_and_unit_instances_are_rejected() {
        let failing = BASE.replace(
            "fn create(handle) {",
            "fn create(handle) { throw \"no license\";",
        );
        let err = ScriptPlugin::from_source(Arc::new(test_engine()), "Gain", &failing, NativeHandle::new(1))
            .unwrap_err();
        assert!(matches!(err, BridgeError::ConstructorFailed { message, .. } if message.contains("no license")));

        let unit = BASE.replace(
            r#"fn create(handle) { #{ handle: handle, gain: 0.5, program: 0, name: "Init" } }"#,
            "fn create(handle) { }",
        );
        let err = ScriptPlugin::from_source(Arc::new(test_engine()), "Gain", &unit, NativeHandle::new(1))
            .unwrap_err();
        assert!(matches!(err, BridgeError::Conversion { .. }));
    }

    #[test]
    fn syntax_errors_are_script_errors() {
        let err = ScriptPlugin::from_source(
            Arc::new(test_engine()),
            "Bad",
            "fn create(handle) {",
            NativeHandle::new(1),
        )
        .unwrap_err();
        assert!(matches!(err, BridgeError::Script { .. }));
    }

    #[test]
    fn runtime_errors_become_call_errors() {
        let source = BASE.replace(r#"fn getVendorString() { "Acme" }"#, r#"fn getVendorString() { throw "boom" }"#);
        let mut broken =
            ScriptPlugin::from_source(Arc::new(test_engine()), "Gain", &source, NativeHandle::new(1))
                .unwrap();
        let err = broken.get_vendor_string().unwrap_err();
        assert_eq!(err.capability(), "getVendorString");
        assert!(matches!(err, CallError::Failed { message, .. } if message.contains("boom")));
    }

    #[test]
    fn wrong_return_type_is_bad_return() {
        let source = BASE.replace("fn getNumParams() { 1 }", "fn getNumParams() { \"one\" }");
        let mut plugin =
            ScriptPlugin::from_source(Arc::new(test_engine()), "Gain", &source, NativeHandle::new(1))
                .unwrap();
        assert!(matches!(
            plugin.get_num_params().unwrap_err(),
            CallError::BadReturn { .. }
        ));
    }

    #[test]
    fn undefined_optionals_use_wrapper_defaults() {
        let mut plugin = load("");
        assert_eq!(plugin.get_vst_version().unwrap(), 2400);
        assert!(plugin.can_parameter_be_automated(0).unwrap());
        assert_eq!(plugin.get_num_categories().unwrap(), 1);
        assert_eq!(plugin.set_total_sample_to_process(512).unwrap(), 512);
        assert_eq!(plugin.get_input_properties(0).unwrap(), None);
        assert!(plugin.get_chunk(false).unwrap().is_empty());
        plugin.open().unwrap();
        plugin.set_sample_rate(48_000.0).unwrap();
    }

    #[test]
    fn defined_optionals_are_called() {
        let mut plugin = load(
            r#"
            fn getVstVersion() { 2300 }
            fn getEffectName() { "Gain Effect" }
            fn getInputProperties(index) {
                if index < 2 { #{ label: `In ${index}`, flags: 3 } } else { () }
            }
            fn getChunk(is_preset) { let b = blob(); b.push(7); b.push(9); b }
            fn setChunk(data, is_preset) { data.len() }
            fn getNextShellPlugin() { [1234, "Inner"] }
            fn getMidiKeyName(channel, key) {
                key.key_name = `Key ${key.this_key_number}`;
                [true, key]
            }
            fn processEvents(events) { events.events.len() }
            "#,
        );
        assert_eq!(plugin.get_vst_version().unwrap(), 2300);
        assert_eq!(plugin.get_effect_name().unwrap(), "Gain Effect");

        let pin = plugin.get_input_properties(1).unwrap().unwrap();
        assert_eq!(pin.label, "In 1");
        assert_eq!(pin.flags, 3);
        assert_eq!(plugin.get_input_properties(2).unwrap(), None);

        assert_eq!(plugin.get_chunk(true).unwrap(), vec![7, 9]);
        assert_eq!(plugin.set_chunk(&[1, 2, 3], false).unwrap(), 3);

        let mut name = String::new();
        assert_eq!(plugin.get_next_shell_plugin(&mut name).unwrap(), 1234);
        assert_eq!(name, "Inner");

        let mut key = MidiKeyName {
            this_key_number: 60,
            ..MidiKeyName::default()
        };
        assert!(plugin.get_midi_key_name(0, &mut key).unwrap());
        assert_eq!(key.key_name, "Key 60");
        assert_eq!(key.this_key_number, 60);

        let events = Events::new(vec![opaz_core::Event::Midi(opaz_core::MidiEvent::default())]);
        assert_eq!(plugin.process_events(&events).unwrap(), 1);
    }

    #[test]
    fn unhandled_out_params_keep_values() {
        let mut plugin = load("fn getMidiKeyName(channel, key) { () }");
        let mut key = MidiKeyName {
            key_name: "kept".into(),
            ..MidiKeyName::default()
        };
        assert!(!plugin.get_midi_key_name(0, &mut key).unwrap());
        assert_eq!(key.key_name, "kept");
    }

    #[test]
    fn process_replacing_runs_script_dsp() {
        let mut plugin = load("");
        let left = [1.0_f32, -1.0, 0.5];
        let right = [0.25_f32, 0.0, -0.5];
        let mut out_l = [0.0_f32; 3];
        let mut out_r = [0.0_f32; 3];
        plugin
            .process_replacing(
                &[&left[..], &right[..]],
                &mut [&mut out_l[..], &mut out_r[..]],
                3,
            )
            .unwrap();
        assert_eq!(out_l, [0.5, -0.5, 0.25]);
        assert_eq!(out_r, [0.125, 0.0, -0.25]);
    }

    #[test]
    fn negative_frame_count_is_invalid_argument() {
        let mut plugin = load("");
        let err = plugin.process_replacing(&[], &mut [], -1).unwrap_err();
        assert!(matches!(err, CallError::InvalidArgument { .. }));
    }

    #[test]
    fn frame_count_beyond_buffers_is_invalid_argument() {
        let mut plugin = load("");
        let input = [0.5_f32; 4];
        let mut out = [9.0_f32; 4];
        let err = plugin
            .process_replacing(&[&input[..]], &mut [&mut out[..]], 1 << 28)
            .unwrap_err();
        assert!(matches!(err, CallError::InvalidArgument { .. }));
        assert_eq!(out, [9.0; 4]);

        let mut short = [0.0_f32; 2];
        let err = plugin
            .process_replacing(&[&input[..]], &mut [&mut short[..]], 4)
            .unwrap_err();
        assert!(matches!(err, CallError::InvalidArgument { .. }));
    }

    #[test]
    fn double_precision_is_optional() {
        let mut plugin = load("");
        let input = [0.5_f64; 2];
        let mut out = [9.0_f64; 2];
        plugin
            .process_double_replacing(&[&input[..]], &mut [&mut out[..]], 2)
            .unwrap();
        assert_eq!(out, [9.0; 2]);

        let mut plugin = load("fn processDoubleReplacing(block) { block.copy_through(); }");
        plugin
            .process_double_replacing(&[&input[..]], &mut [&mut out[..]], 2)
            .unwrap();
        assert_eq!(out, input);
    }
}
