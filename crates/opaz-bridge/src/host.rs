//! Host callbacks reachable from scripts.
//!
//! Scripts only know their instance's native handle. The functions
//! registered here look the handle up in the session's host table and
//! forward to the [`HostCallbacks`] the loader registered for it.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use opaz_core::{HostCallbacks, LoggingHost, NativeHandle};
use rhai::{Engine, EvalAltResult, FLOAT, INT};

/// Host callbacks per live instance.
pub(crate) type HostTable = Arc<RwLock<HashMap<NativeHandle, Arc<dyn HostCallbacks>>>>;

/// Callbacks registered for `handle`, or a logging-only host.
pub(crate) fn host_for(table: &HostTable, handle: INT) -> Arc<dyn HostCallbacks> {
    table
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(&NativeHandle::new(handle))
        .cloned()
        .unwrap_or_else(|| Arc::new(LoggingHost))
}

fn to_i32(name: &str, value: INT) -> Result<i32, Box<EvalAltResult>> {
    i32::try_from(value).map_err(|_| format!("{name}: {value} is out of range").into())
}

/// Register `host_*` functions on `engine`.
pub(crate) fn register(engine: &mut Engine, table: &HostTable) {
    let t = Arc::clone(table);
    engine.register_fn("host_log", move |handle: INT, message: &str| {
        host_for(&t, handle).log(NativeHandle::new(handle), message);
    });

    let t = Arc::clone(table);
    engine.register_fn(
        "host_automate",
        move |handle: INT, index: INT, value: FLOAT| -> Result<(), Box<EvalAltResult>> {
            let index = to_i32("host_automate", index)?;
            #[allow(clippy::cast_possible_truncation)]
            let value = value as f32;
            host_for(&t, handle).set_parameter_automated(NativeHandle::new(handle), index, value);
            Ok(())
        },
    );

    let t = Arc::clone(table);
    engine.register_fn("host_sample_rate", move |handle: INT| -> FLOAT {
        FLOAT::from(host_for(&t, handle).sample_rate(NativeHandle::new(handle)))
    });

    let t = Arc::clone(table);
    engine.register_fn("host_block_size", move |handle: INT| -> INT {
        INT::from(host_for(&t, handle).block_size(NativeHandle::new(handle)))
    });

    let t = Arc::clone(table);
    engine.register_fn("host_io_changed", move |handle: INT| -> bool {
        host_for(&t, handle).io_changed(NativeHandle::new(handle))
    });

    let t = Arc::clone(table);
    engine.register_fn("host_update_display", move |handle: INT| -> bool {
        host_for(&t, handle).update_display(NativeHandle::new(handle))
    });

    let t = Arc::clone(table);
    engine.register_fn("host_version", move |handle: INT| -> INT {
        INT::from(host_for(&t, handle).host_version(NativeHandle::new(handle)))
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_handle_falls_back_to_logging_host() {
        let table: HostTable = Arc::default();
        let host = host_for(&table, 99);
        assert_eq!(host.block_size(NativeHandle::new(99)), 512);
    }

    #[test]
    fn scripts_reach_registered_host() {
        struct Fixed;
        impl HostCallbacks for Fixed {
            fn block_size(&self, _handle: NativeHandle) -> i32 {
                64
            }
        }

        let table: HostTable = Arc::default();
        table
            .write()
            .unwrap()
            .insert(NativeHandle::new(5), Arc::new(Fixed));

        let mut engine = Engine::new();
        register(&mut engine, &table);

        assert_eq!(engine.eval::<INT>("host_block_size(5)").unwrap(), 64);
        assert_eq!(engine.eval::<INT>("host_block_size(6)").unwrap(), 512);
        assert_eq!(engine.eval::<INT>("host_version(5)").unwrap(), 2400);
        assert!(engine.eval::<()>("host_automate(5, 1 << 40, 0.5)").is_err());
    }
}
