//! Table of live plugin instances.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError, Weak};

use chrono::{DateTime, Utc};
use opaz_core::NativeHandle;
use tracing::debug;

use crate::error::{BridgeError, BridgeResult};

/// Identity of one live plugin instance.
///
/// Strongly owned by its proxy; the session's [`LiveInstances`] table only
/// holds a weak reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceRecord {
    /// Native handle of the instance.
    pub handle: NativeHandle,
    /// Plugin class the instance was built from.
    pub plugin_class_name: String,
    /// Resource folder the class was loaded from.
    pub resource_folder: PathBuf,
    /// When the instance was constructed.
    pub created_at: DateTime<Utc>,
}

impl InstanceRecord {
    /// Create a record stamped with the current time.
    #[must_use]
    pub fn new(
        handle: NativeHandle,
        plugin_class_name: impl Into<String>,
        resource_folder: impl Into<PathBuf>,
    ) -> Self {
        Self {
            handle,
            plugin_class_name: plugin_class_name.into(),
            resource_folder: resource_folder.into(),
            created_at: Utc::now(),
        }
    }
}

/// Weak table of live instances keyed by native handle.
#[derive(Debug, Default)]
pub struct LiveInstances {
    entries: Mutex<HashMap<NativeHandle, Weak<InstanceRecord>>>,
}

impl LiveInstances {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<NativeHandle, Weak<InstanceRecord>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record a live instance.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::HandleInUse`] if another live record has the
    /// same handle. A stale entry whose record was dropped is replaced.
    pub fn insert(&self, record: &Arc<InstanceRecord>) -> BridgeResult<()> {
        let mut entries = self.lock();
        if entries
            .get(&record.handle)
            .is_some_and(|w| w.strong_count() > 0)
        {
            return Err(BridgeError::HandleInUse(record.handle));
        }
        entries.insert(record.handle, Arc::downgrade(record));
        debug!(handle = %record.handle, plugin = %record.plugin_class_name, "Instance registered");
        Ok(())
    }

    /// Remove an instance, returning how many entries remain.
    pub fn remove(&self, handle: NativeHandle) -> usize {
        let mut entries = self.lock();
        if entries.remove(&handle).is_some() {
            debug!(handle = %handle, "Instance removed");
        }
        entries.retain(|_, w| w.strong_count() > 0);
        entries.len()
    }

    /// Look up a live instance.
    #[must_use]
    pub fn get(&self, handle: NativeHandle) -> Option<Arc<InstanceRecord>> {
        self.lock().get(&handle).and_then(Weak::upgrade)
    }

    /// Handles of live instances, sorted.
    #[must_use]
    pub fn handles(&self) -> Vec<NativeHandle> {
        let mut handles: Vec<NativeHandle> = self
            .lock()
            .iter()
            .filter(|(_, w)| w.strong_count() > 0)
            .map(|(h, _)| *h)
            .collect();
        handles.sort_unstable();
        handles
    }

    /// Number of live instances.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().values().filter(|w| w.strong_count() > 0).count()
    }

    /// Whether no instance is live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
