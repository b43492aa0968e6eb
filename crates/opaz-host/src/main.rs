//! Opaz host - drives a script plugin folder the way a native host would.
//!
//! Resolves the folder's descriptor, constructs the plugin through the
//! bridge, prints its identification and renders a sine test signal through
//! it, reporting output peaks. Useful for checking a plugin before loading it
//! into a real host.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::Parser;
use opaz_bridge::{PluginLocation, ProxyLoader, ScriptPluginProxy, is_descriptor};
use opaz_config::Config;
use opaz_core::constants::precision;
use opaz_core::{NativeHandle, VstPlugin};
use opaz_telemetry::{LogConfig, setup_logging};
use tracing::debug;

mod host;
mod signal;

use host::CliHost;
use signal::{PeakMeter, Sine, to_db};

/// Opaz - run a script plugin outside a host
#[derive(Parser)]
#[command(name = "opaz-host")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Plugin resource folder (holds the descriptor and script modules)
    folder: PathBuf,

    /// Descriptor base name; defaults to the first `.ini` in the folder
    #[arg(short, long)]
    name: Option<String>,

    /// Number of blocks to render
    #[arg(long, default_value_t = 16)]
    blocks: u32,

    /// Frames per block
    #[arg(long, default_value_t = 512)]
    block_size: u16,

    /// Input and output channels
    #[arg(long, default_value_t = 2)]
    channels: u8,

    /// Sample rate in Hz
    #[arg(long, default_value_t = 44_100.0)]
    sample_rate: f32,

    /// Test tone frequency in Hz
    #[arg(long, default_value_t = 440.0)]
    frequency: f64,

    /// Render in double precision
    #[arg(long)]
    double: bool,

    /// Native instance handle handed to the plugin
    #[arg(long, default_value_t = 1, env = "OPAZ_HANDLE")]
    handle: i64,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        },
    }
}

fn run(cli: &Cli) -> Result<()> {
    let mut config = Config::load(Some(&cli.folder))
        .with_context(|| format!("loading configuration from {}", cli.folder.display()))?;
    // The folder given on the command line is the resource folder itself.
    config.descriptor.platform_extension = None;
    config.descriptor.resources_subdir = None;

    let mut log = LogConfig::from(&config.logging);
    if cli.verbose {
        "debug".clone_into(&mut log.level);
    }
    if let Err(e) = setup_logging(&log) {
        eprintln!("Failed to initialize logging: {e}");
    }

    let base = match &cli.name {
        Some(name) => name.clone(),
        None => find_descriptor(&cli.folder)?,
    };
    let location = PluginLocation::new(
        cli.folder.as_path(),
        format!("{base}{}", config.descriptor.log_suffix),
    );
    debug!(descriptor = %base, folder = %cli.folder.display(), "Loading plugin");

    let block_size = i32::from(cli.block_size);
    let mut proxy = ProxyLoader::new()
        .with_config(config)
        .with_host(Arc::new(CliHost::new(cli.sample_rate, block_size)))
        .instantiate(NativeHandle::new(cli.handle), &location)
        .with_context(|| format!("constructing plugin '{base}'"))?;

    identify(&mut proxy)?;
    render(&mut proxy, cli)?;
    Ok(())
}

/// Base name of the first descriptor in `folder`, in name order.
fn find_descriptor(folder: &Path) -> Result<String> {
    let mut names: Vec<String> = std::fs::read_dir(folder)
        .with_context(|| format!("reading {}", folder.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file() && is_descriptor(path))
        .filter_map(|path| path.file_stem().and_then(|s| s.to_str()).map(str::to_owned))
        .collect();
    names.sort();
    match names.into_iter().next() {
        Some(name) => Ok(name),
        None => bail!("no descriptor (.ini) found in {}", folder.display()),
    }
}

fn identify(proxy: &mut ScriptPluginProxy) -> Result<()> {
    println!("plugin:   {}", proxy.plugin_class_name());
    println!("product:  {}", proxy.get_product_string()?);
    println!("vendor:   {}", proxy.get_vendor_string()?);
    println!("effect:   {}", proxy.get_effect_name()?);
    println!("category: {}", proxy.get_plug_category()?);

    let params = proxy.get_num_params()?;
    println!("parameters: {params}");
    for index in 0..params {
        println!(
            "  {index:>3} {:<24} {} {}",
            proxy.get_parameter_name(index)?,
            proxy.get_parameter_display(index)?,
            proxy.get_parameter_label(index)?,
        );
    }
    println!(
        "program:  {} ({} of {})",
        proxy.get_program_name()?,
        proxy.get_program()?,
        proxy.get_num_programs()?
    );
    Ok(())
}

fn render(proxy: &mut ScriptPluginProxy, cli: &Cli) -> Result<()> {
    let frames = usize::from(cli.block_size);
    let channels = usize::from(cli.channels);
    let sample_frames = i32::from(cli.block_size);

    proxy.set_sample_rate(cli.sample_rate)?;
    proxy.set_block_size(sample_frames)?;
    proxy.open()?;
    proxy.resume()?;
    proxy.start_process()?;

    let mut sine = Sine::new(cli.frequency, f64::from(cli.sample_rate), 0.5);
    let mut meter = PeakMeter::new(channels);

    if cli.double {
        if !proxy.set_process_precision(precision::DOUBLE)? {
            bail!("plugin does not support double precision");
        }
        let mut inputs = vec![vec![0.0_f64; frames]; channels];
        let mut outputs = vec![vec![0.0_f64; frames]; channels];
        for _ in 0..cli.blocks {
            sine.fill_f64(&mut inputs);
            let ins: Vec<&[f64]> = inputs.iter().map(Vec::as_slice).collect();
            let mut outs: Vec<&mut [f64]> = outputs.iter_mut().map(Vec::as_mut_slice).collect();
            proxy.process_double_replacing(&ins, &mut outs, sample_frames)?;
            meter.measure(&outputs);
        }
    } else {
        let mut inputs = vec![vec![0.0_f32; frames]; channels];
        let mut outputs = vec![vec![0.0_f32; frames]; channels];
        for _ in 0..cli.blocks {
            sine.fill_f32(&mut inputs);
            let ins: Vec<&[f32]> = inputs.iter().map(Vec::as_slice).collect();
            let mut outs: Vec<&mut [f32]> = outputs.iter_mut().map(Vec::as_mut_slice).collect();
            proxy.process_replacing(&ins, &mut outs, sample_frames)?;
            meter.measure(&outputs);
        }
    }

    proxy.stop_process()?;
    proxy.suspend()?;
    proxy.close()?;

    println!(
        "rendered {} blocks of {frames} frames ({})",
        cli.blocks,
        if cli.double { "double" } else { "single" }
    );
    for (ch, peak) in meter.peaks().iter().enumerate() {
        println!("  out {ch}: peak {peak:.4} ({:.1} dB)", to_db(*peak));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use opaz_test::PluginFolder;

    #[test]
    fn first_descriptor_in_name_order() {
        let folder = PluginFolder::new()
            .with_descriptor("Zeta", "Z")
            .with_descriptor("Alpha", "A")
            .write("notes.txt", "not a descriptor");
        assert_eq!(find_descriptor(folder.path()).unwrap(), "Alpha");
    }

    #[test]
    fn empty_folder_has_no_descriptor() {
        let folder = PluginFolder::new();
        assert!(find_descriptor(folder.path()).is_err());
    }

    #[test]
    fn cli_defaults() {
        let cli = Cli::try_parse_from(["opaz-host", "/plugins/echo"]).unwrap();
        assert_eq!(cli.folder, PathBuf::from("/plugins/echo"));
        assert_eq!(cli.blocks, 16);
        assert_eq!(cli.block_size, 512);
        assert_eq!(cli.channels, 2);
        assert!(!cli.double);
    }
}
