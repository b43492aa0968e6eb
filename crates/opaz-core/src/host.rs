//! Host services reachable from a plugin object.

use tracing::info;

use crate::handle::NativeHandle;

/// Services the native host offers to a plugin instance.
///
/// The native wrapper supplies one implementation per instance. A plugin
/// object reaches it through the [`NativeHandle`] it received at
/// construction. Every method has a benign default so hosts only implement
/// what they actually support.
pub trait HostCallbacks: Send + Sync {
    /// Write a line to the instance log.
    fn log(&self, handle: NativeHandle, message: &str) {
        info!(handle = %handle, "{message}");
    }

    /// Report a parameter change made by the plugin (automation).
    fn set_parameter_automated(&self, _handle: NativeHandle, _index: i32, _value: f32) {}

    /// Current host sample rate.
    fn sample_rate(&self, _handle: NativeHandle) -> f32 {
        44_100.0
    }

    /// Current host block size.
    fn block_size(&self, _handle: NativeHandle) -> i32 {
        512
    }

    /// Tell the host the plugin's I/O configuration changed.
    fn io_changed(&self, _handle: NativeHandle) -> bool {
        false
    }

    /// Ask the host to refresh its display of the plugin.
    fn update_display(&self, _handle: NativeHandle) -> bool {
        false
    }

    /// Host protocol version.
    fn host_version(&self, _handle: NativeHandle) -> i32 {
        crate::constants::VST_VERSION
    }
}

/// Host that only logs. Used when the native wrapper supplies no callbacks.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingHost;

impl HostCallbacks for LoggingHost {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn logging_host_defaults() {
        let host = LoggingHost;
        let handle = NativeHandle::new(1);
        host.log(handle, "hello");
        assert!((host.sample_rate(handle) - 44_100.0).abs() < f32::EPSILON);
        assert_eq!(host.block_size(handle), 512);
        assert!(!host.io_changed(handle));
        assert_eq!(host.host_version(handle), 2400);
    }
}
