//! Plugin factories keyed by class identifier.
//!
//! The descriptor names a plugin class; the registry maps that name to a
//! constructor. Natively registered factories always take precedence over
//! script modules discovered in a resource folder.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use opaz_core::{NativeHandle, VstPlugin};
use rhai::Engine;
use tracing::{debug, info};

use crate::error::BridgeResult;
use crate::session::InterpreterSession;

/// Everything a factory needs to build one plugin object.
///
/// Factories run while the session's construction lock is held, so the
/// session itself is only reachable through methods that do not take it.
pub struct FactoryContext<'a> {
    /// Native handle of the instance under construction.
    pub handle: NativeHandle,
    /// Resource folder the plugin was loaded from.
    pub resource_folder: &'a Path,
    session: &'a InterpreterSession,
}

impl<'a> FactoryContext<'a> {
    pub(crate) fn new(
        handle: NativeHandle,
        resource_folder: &'a Path,
        session: &'a InterpreterSession,
    ) -> Self {
        Self {
            handle,
            resource_folder,
            session,
        }
    }

    /// Engine snapshot of the session.
    #[must_use]
    pub fn engine(&self) -> Arc<Engine> {
        self.session.engine()
    }

    /// Construct another registered class for the same handle and folder.
    ///
    /// Lets a native factory wrap a script module.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::FactoryNotFound`](crate::BridgeError::FactoryNotFound)
    /// for an unknown class, or whatever its factory fails with.
    pub fn instantiate(&self, class_name: &str) -> BridgeResult<Box<dyn VstPlugin>> {
        self.session
            .instantiate_unlocked(class_name, self.handle, self.resource_folder)
    }
}

impl fmt::Debug for FactoryContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FactoryContext")
            .field("handle", &self.handle)
            .field("resource_folder", &self.resource_folder)
            .finish_non_exhaustive()
    }
}

/// Constructor of plugin objects.
pub type PluginFactory =
    Arc<dyn Fn(&FactoryContext<'_>) -> BridgeResult<Box<dyn VstPlugin>> + Send + Sync>;

/// Where a factory came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FactoryOrigin {
    /// Registered from Rust code.
    Native,
    /// Discovered as a script module in a resource folder.
    Script,
}

struct Entry {
    origin: FactoryOrigin,
    factory: PluginFactory,
}

/// Registry of plugin factories.
#[derive(Default)]
pub struct PluginFactoryRegistry {
    entries: HashMap<String, Entry>,
}

impl fmt::Debug for PluginFactoryRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<(&String, FactoryOrigin)> =
            self.entries.iter().map(|(k, e)| (k, e.origin)).collect();
        names.sort_by(|a, b| a.0.cmp(b.0));
        f.debug_struct("PluginFactoryRegistry")
            .field("entries", &names)
            .finish()
    }
}

impl PluginFactoryRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a native factory, replacing any factory of the same name.
    pub fn register_native(&mut self, class_name: impl Into<String>, factory: PluginFactory) {
        let class_name = class_name.into();
        info!(plugin = %class_name, "Registered native plugin factory");
        self.entries.insert(
            class_name,
            Entry {
                origin: FactoryOrigin::Native,
                factory,
            },
        );
    }

    /// Register a script factory unless the name is already taken.
    ///
    /// Returns whether the factory was registered.
    pub fn register_script(&mut self, class_name: impl Into<String>, factory: PluginFactory) -> bool {
        let class_name = class_name.into();
        if let Some(existing) = self.entries.get(&class_name) {
            debug!(
                plugin = %class_name,
                origin = ?existing.origin,
                "Script module not registered, name already taken"
            );
            return false;
        }
        debug!(plugin = %class_name, "Registered script plugin factory");
        self.entries.insert(
            class_name,
            Entry {
                origin: FactoryOrigin::Script,
                factory,
            },
        );
        true
    }

    /// Look up a factory.
    #[must_use]
    pub fn get(&self, class_name: &str) -> Option<PluginFactory> {
        self.entries.get(class_name).map(|e| Arc::clone(&e.factory))
    }

    /// Origin of a registered factory.
    #[must_use]
    pub fn origin(&self, class_name: &str) -> Option<FactoryOrigin> {
        self.entries.get(class_name).map(|e| e.origin)
    }

    /// Remove every script factory, keeping native ones.
    ///
    /// Returns the number removed.
    pub fn clear_scripts(&mut self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, e| e.origin == FactoryOrigin::Native);
        before.saturating_sub(self.entries.len())
    }

    /// Registered class names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.entries.keys().cloned().collect();
        names.sort();
        names
    }

    /// Number of registered factories.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no factory is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BridgeError;

    fn failing(name: &'static str) -> PluginFactory {
        Arc::new(move |_ctx: &FactoryContext<'_>| Err(BridgeError::FactoryNotFound(name.into())))
    }

    #[test]
    fn scripts_never_shadow_native_factories() {
        let mut reg = PluginFactoryRegistry::new();
        reg.register_native("Echo", failing("native"));
        assert!(!reg.register_script("Echo", failing("script")));
        assert_eq!(reg.origin("Echo"), Some(FactoryOrigin::Native));
    }

    #[test]
    fn first_script_wins() {
        let mut reg = PluginFactoryRegistry::new();
        assert!(reg.register_script("Echo", failing("a")));
        assert!(!reg.register_script("Echo", failing("b")));
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn native_replaces_script() {
        let mut reg = PluginFactoryRegistry::new();
        reg.register_script("Echo", failing("script"));
        reg.register_native("Echo", failing("native"));
        assert_eq!(reg.origin("Echo"), Some(FactoryOrigin::Native));
    }

    #[test]
    fn clear_scripts_keeps_native() {
        let mut reg = PluginFactoryRegistry::new();
        reg.register_native("Native", failing("n"));
        reg.register_script("A", failing("a"));
        reg.register_script("B", failing("b"));

        assert_eq!(reg.clear_scripts(), 2);
        assert_eq!(reg.names(), vec!["Native".to_owned()]);
        assert!(reg.get("A").is_none());
    }
}
