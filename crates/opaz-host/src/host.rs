//! Host callbacks backed by the command line settings.

use opaz_core::{HostCallbacks, NativeHandle};
use tracing::info;

/// Answers plugin queries with the rendering settings and prints plugin log
/// lines to stdout.
#[derive(Debug, Clone, Copy)]
pub(crate) struct CliHost {
    sample_rate: f32,
    block_size: i32,
}

impl CliHost {
    pub(crate) fn new(sample_rate: f32, block_size: i32) -> Self {
        Self {
            sample_rate,
            block_size,
        }
    }
}

impl HostCallbacks for CliHost {
    fn log(&self, handle: NativeHandle, message: &str) {
        println!("[{handle}] {message}");
    }

    fn set_parameter_automated(&self, handle: NativeHandle, index: i32, value: f32) {
        info!(handle = %handle, index, value, "Parameter automated");
    }

    fn sample_rate(&self, _handle: NativeHandle) -> f32 {
        self.sample_rate
    }

    fn block_size(&self, _handle: NativeHandle) -> i32 {
        self.block_size
    }
}
