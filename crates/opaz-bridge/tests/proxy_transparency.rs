//! The proxy forwards every capability unchanged.
//!
//! A native `RecordingPlugin` is loaded through the bridge; a second,
//! independent `RecordingPlugin` receives the same calls directly. Both must
//! answer identically, values and errors alike, and see the same calls.

use std::sync::Arc;

use opaz_bridge::{
    FactoryContext, InterpreterSession, PluginFactory, PluginLocation, ProxyLoader,
    ScriptPluginProxy,
};
use opaz_config::Config;
use opaz_core::{
    Event, Events, MidiEvent, MidiKeyName, MidiProgramCategory, MidiProgramName, NativeHandle,
    SpeakerArrangement, VariableIo, VstPlugin,
};
use opaz_test::{PluginFolder, RecordingPlugin, init_test_logging, ramp};

fn test_config() -> Config {
    let mut config = Config::default();
    config.descriptor.platform_extension = None;
    config.descriptor.resources_subdir = None;
    config
}

fn recording_factory(plugin: RecordingPlugin) -> PluginFactory {
    Arc::new(move |_ctx: &FactoryContext<'_>| Ok(Box::new(plugin.clone()) as Box<dyn VstPlugin>))
}

fn load(folder: &PluginFolder, plugin: RecordingPlugin) -> ScriptPluginProxy {
    init_test_logging();
    ProxyLoader::new()
        .with_config(test_config())
        .with_session(Arc::new(InterpreterSession::new(Default::default())))
        .with_factory("Recorder", recording_factory(plugin))
        .instantiate(
            NativeHandle::new(0x10),
            &PluginLocation::new(folder.path(), PluginFolder::log_file_name("Rec")),
        )
        .unwrap()
}

macro_rules! same {
    ($proxy:ident, $direct:ident, $($call:tt)+) => {
        assert_eq!($proxy.$($call)+, $direct.$($call)+, "{}", stringify!($($call)+));
    };
}

#[test]
fn every_capability_forwards_values() {
    let folder = PluginFolder::new().with_descriptor("Rec", "Recorder");
    let behind_proxy = RecordingPlugin::new();
    let mut proxy = load(&folder, behind_proxy.clone());
    let mut direct = RecordingPlugin::new();

    // mandatory
    same!(proxy, direct, can_do("bypass"));
    same!(proxy, direct, can_do("sendVstEvents"));
    same!(proxy, direct, get_plug_category());
    same!(proxy, direct, get_product_string());
    same!(proxy, direct, get_program_name_indexed(2, 5));
    same!(proxy, direct, get_vendor_string());
    same!(proxy, direct, set_bypass(true));
    same!(proxy, direct, string_to_parameter(1, "0.125"));
    same!(proxy, direct, string_to_parameter(9, "x"));
    same!(proxy, direct, get_num_params());
    same!(proxy, direct, get_num_programs());
    same!(proxy, direct, get_parameter(1));
    same!(proxy, direct, get_parameter_display(1));
    same!(proxy, direct, get_parameter_label(1));
    same!(proxy, direct, get_parameter_name(3));
    same!(proxy, direct, set_parameter(2, 0.9));
    same!(proxy, direct, get_parameter(2));
    same!(proxy, direct, set_program(7));
    same!(proxy, direct, get_program());
    same!(proxy, direct, set_program_name("Lead"));
    same!(proxy, direct, get_program_name());

    // 1.0
    same!(proxy, direct, open());
    same!(proxy, direct, suspend());
    same!(proxy, direct, resume());
    same!(proxy, direct, get_vu());
    same!(proxy, direct, set_chunk(&[9, 8, 7, 6], false));
    same!(proxy, direct, get_chunk(true));
    same!(proxy, direct, set_block_size(128));
    same!(proxy, direct, set_sample_rate(96_000.0));

    // 2.0
    same!(proxy, direct, get_effect_name());
    same!(proxy, direct, get_vendor_version());
    same!(proxy, direct, can_parameter_be_automated(1));
    same!(proxy, direct, copy_program(3));
    same!(proxy, direct, fx_idle());
    same!(proxy, direct, get_channel_parameter(1, 2));
    same!(proxy, direct, get_num_categories());
    same!(proxy, direct, get_input_properties(0));
    same!(proxy, direct, get_input_properties(5));
    same!(proxy, direct, get_output_properties(1));
    same!(proxy, direct, get_error_text());
    same!(proxy, direct, get_get_tail_size());
    same!(proxy, direct, get_parameter_properties(0));
    same!(proxy, direct, get_vst_version());
    same!(proxy, direct, input_connected(0, true));
    same!(proxy, direct, output_connected(1, false));
    same!(proxy, direct, keys_required());
    same!(proxy, direct, report_current_position());
    same!(proxy, direct, report_destination_buffer());
    same!(proxy, direct, set_block_size_and_sample_rate(64, 22_050.0));

    let events = Events::new(vec![
        Event::Midi(MidiEvent {
            data: [0x90, 64, 127],
            ..MidiEvent::default()
        }),
        Event::Midi(MidiEvent {
            data: [0x80, 64, 0],
            delta_frames: 32,
            ..MidiEvent::default()
        }),
    ]);
    same!(proxy, direct, process_events(&events));

    let stereo = SpeakerArrangement {
        num_channels: 2,
        ..SpeakerArrangement::default()
    };
    same!(proxy, direct, set_speaker_arrangement(&stereo, &stereo));

    // 2.1
    same!(proxy, direct, has_midi_programs_changed(0));
    same!(proxy, direct, begin_set_program());
    same!(proxy, direct, end_set_program());

    // 2.3
    same!(proxy, direct, set_total_sample_to_process(1000));
    same!(proxy, direct, start_process());
    same!(proxy, direct, stop_process());

    // 2.4
    same!(proxy, direct, set_process_precision(1));
    same!(proxy, direct, get_num_midi_input_channels());
    same!(proxy, direct, get_num_midi_output_channels());

    same!(proxy, direct, close());

    assert_eq!(behind_proxy.calls(), direct.calls());
}

#[test]
fn out_parameters_are_forwarded() {
    let folder = PluginFolder::new().with_descriptor("Rec", "Recorder");
    let mut proxy = load(&folder, RecordingPlugin::new());
    let mut direct = RecordingPlugin::new();

    let (mut pi, mut po) = (SpeakerArrangement::default(), SpeakerArrangement::default());
    let (mut di, mut d_out) = (SpeakerArrangement::default(), SpeakerArrangement::default());
    assert_eq!(
        proxy.get_speaker_arrangement(&mut pi, &mut po),
        direct.get_speaker_arrangement(&mut di, &mut d_out)
    );
    assert_eq!((pi, po), (di, d_out));

    let mut p_prog = MidiProgramName {
        this_program_index: 12,
        ..MidiProgramName::default()
    };
    let mut d_prog = p_prog.clone();
    assert_eq!(
        proxy.get_midi_program_name(3, &mut p_prog),
        direct.get_midi_program_name(3, &mut d_prog)
    );
    assert_eq!(p_prog, d_prog);
    assert_eq!(p_prog.name, "Channel 3 Program 12");

    let (mut p_cur, mut d_cur) = (MidiProgramName::default(), MidiProgramName::default());
    assert_eq!(
        proxy.get_current_midi_program(0, &mut p_cur),
        direct.get_current_midi_program(0, &mut d_cur)
    );
    assert_eq!(p_cur, d_cur);

    let (mut p_cat, mut d_cat) = (MidiProgramCategory::default(), MidiProgramCategory::default());
    assert_eq!(
        proxy.get_midi_program_category(0, &mut p_cat),
        direct.get_midi_program_category(0, &mut d_cat)
    );
    assert_eq!(p_cat, d_cat);

    let mut p_key = MidiKeyName {
        this_key_number: 61,
        ..MidiKeyName::default()
    };
    let mut d_key = p_key.clone();
    assert_eq!(
        proxy.get_midi_key_name(0, &mut p_key),
        direct.get_midi_key_name(0, &mut d_key)
    );
    assert_eq!(p_key, d_key);

    let (mut p_name, mut d_name) = (String::new(), String::new());
    assert_eq!(
        proxy.get_next_shell_plugin(&mut p_name),
        direct.get_next_shell_plugin(&mut d_name)
    );
    assert_eq!(p_name, "Shell Child");
    assert_eq!(p_name, d_name);

    let mut p_io = VariableIo {
        inputs: vec![vec![0.5, 0.25]],
        num_samples_input: 2,
        ..VariableIo::default()
    };
    let mut d_io = p_io.clone();
    assert_eq!(
        proxy.process_variable_io(&mut p_io),
        direct.process_variable_io(&mut d_io)
    );
    assert_eq!(p_io, d_io);
    assert_eq!(p_io.outputs, p_io.inputs);
}

#[test]
fn audio_is_forwarded_in_both_precisions() {
    let folder = PluginFolder::new().with_descriptor("Rec", "Recorder");
    let mut proxy = load(&folder, RecordingPlugin::new());

    let left = ramp(32);
    let right: Vec<f32> = left.iter().map(|s| -s).collect();
    let mut out_l = vec![0.0_f32; 32];
    let mut out_r = vec![0.0_f32; 32];
    proxy
        .process_replacing(
            &[left.as_slice(), right.as_slice()],
            &mut [out_l.as_mut_slice(), out_r.as_mut_slice()],
            32,
        )
        .unwrap();
    assert_eq!(out_l, left);
    assert_eq!(out_r, right);

    let input: Vec<f64> = left.iter().map(|s| f64::from(*s)).collect();
    let mut out = vec![0.0_f64; 32];
    proxy
        .process_double_replacing(&[input.as_slice()], &mut [out.as_mut_slice()], 32)
        .unwrap();
    assert_eq!(out, input);
}

#[test]
fn errors_pass_through_unchanged() {
    let failing = [
        "canDo",
        "getVendorString",
        "getParameter",
        "processReplacing",
        "setProgramName",
        "getChunk",
        "getMidiKeyName",
        "processDoubleReplacing",
    ];
    let mut plugin = RecordingPlugin::new();
    for name in failing {
        plugin = plugin.with_failure(name);
    }
    let folder = PluginFolder::new().with_descriptor("Rec", "Recorder");
    let mut proxy = load(&folder, plugin);

    let expect = RecordingPlugin::injected_error;
    assert_eq!(proxy.can_do("x").unwrap_err(), expect("canDo"));
    assert_eq!(proxy.get_vendor_string().unwrap_err(), expect("getVendorString"));
    assert_eq!(proxy.get_parameter(0).unwrap_err(), expect("getParameter"));
    assert_eq!(
        proxy.process_replacing(&[], &mut [], 0).unwrap_err(),
        expect("processReplacing")
    );
    assert_eq!(proxy.set_program_name("x").unwrap_err(), expect("setProgramName"));
    assert_eq!(proxy.get_chunk(false).unwrap_err(), expect("getChunk"));
    let mut key = MidiKeyName::default();
    assert_eq!(
        proxy.get_midi_key_name(0, &mut key).unwrap_err(),
        expect("getMidiKeyName")
    );
    assert_eq!(
        proxy.process_double_replacing(&[], &mut [], 0).unwrap_err(),
        expect("processDoubleReplacing")
    );

    // Non-failing capabilities keep working after an error.
    assert_eq!(proxy.get_product_string().unwrap(), "Recorder");
}

#[test]
fn proxy_reports_its_identity() {
    let folder = PluginFolder::new().with_descriptor("Rec", "Recorder");
    let proxy = load(&folder, RecordingPlugin::new());
    assert_eq!(proxy.handle(), NativeHandle::new(0x10));
    assert_eq!(proxy.plugin_class_name(), "Recorder");
    assert_eq!(proxy.resource_folder(), folder.path());
    assert!(proxy.session().instances().get(proxy.handle()).is_some());
}
