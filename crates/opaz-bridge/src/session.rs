//! Embedded interpreter session.
//!
//! A session owns one Rhai engine snapshot together with everything that
//! accumulates while plugins are loaded into it: module search paths, the
//! compiled `opaz` support module, the factory registry, host callbacks and
//! the live-instance table.
//!
//! Sessions are injected explicitly through
//! [`ProxyLoader::with_session`](crate::ProxyLoader::with_session). The
//! process-wide default returned by [`InterpreterSession::shared`] is only
//! used when configuration asks for it.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError, RwLock, Weak};

use opaz_config::InterpreterSection;
use opaz_core::{HostCallbacks, NativeHandle, VstPlugin};
use rhai::module_resolvers::{FileModuleResolver, ModuleResolversCollection};
use rhai::{Engine, Module, Scope};
use tracing::{debug, info, warn};

use crate::audio;
use crate::descriptor::PluginDescriptor;
use crate::error::{BridgeError, BridgeResult};
use crate::factory::{FactoryContext, FactoryOrigin, PluginFactory, PluginFactoryRegistry};
use crate::host::{self, HostTable};
use crate::instances::{InstanceRecord, LiveInstances};
use crate::script::ScriptPlugin;

/// Name scripts use to reach the support module.
pub const SUPPORT_MODULE: &str = "opaz";

const SUPPORT_SOURCE: &str = include_str!("support/opaz_plug.rhai");

static SHARED: Mutex<Weak<InterpreterSession>> = Mutex::new(Weak::new());

struct SessionState {
    search_paths: Vec<PathBuf>,
    support: Option<Arc<Module>>,
    engine: Arc<Engine>,
}

/// One embedded interpreter and the plugins loaded into it.
pub struct InterpreterSession {
    config: InterpreterSection,
    state: RwLock<SessionState>,
    factories: RwLock<PluginFactoryRegistry>,
    hosts: HostTable,
    instances: LiveInstances,
    construction: Mutex<()>,
}

impl fmt::Debug for InterpreterSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterpreterSession")
            .field("search_paths", &self.search_paths())
            .field("factories", &self.factory_names())
            .field("instances", &self.instances.handles())
            .finish_non_exhaustive()
    }
}

impl InterpreterSession {
    /// Create a fresh session.
    #[must_use]
    pub fn new(config: InterpreterSection) -> Self {
        let hosts = HostTable::default();
        let engine = Arc::new(build_engine(&config, &[], None, &hosts));
        Self {
            config,
            state: RwLock::new(SessionState {
                search_paths: Vec::new(),
                support: None,
                engine,
            }),
            factories: RwLock::new(PluginFactoryRegistry::new()),
            hosts,
            instances: LiveInstances::new(),
            construction: Mutex::new(()),
        }
    }

    /// The process-wide default session.
    ///
    /// Held weakly: once every proxy using it is gone, the next call starts
    /// a new one. When a default session is already alive its configuration
    /// wins over `config`.
    #[must_use]
    pub fn shared(config: &InterpreterSection) -> Arc<Self> {
        let mut shared = SHARED.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(session) = shared.upgrade() {
            if session.config != *config {
                debug!("Shared interpreter session already running, ignoring new settings");
            }
            return session;
        }
        let session = Arc::new(Self::new(config.clone()));
        *shared = Arc::downgrade(&session);
        info!("Started shared interpreter session");
        session
    }

    /// Interpreter settings of this session.
    #[must_use]
    pub fn config(&self) -> &InterpreterSection {
        &self.config
    }

    /// Current engine snapshot.
    ///
    /// Plugins keep the snapshot they were compiled with; later bootstraps
    /// build a new one.
    #[must_use]
    pub fn engine(&self) -> Arc<Engine> {
        Arc::clone(&self.read_state().engine)
    }

    /// Resource folders bootstrapped so far, in order.
    #[must_use]
    pub fn search_paths(&self) -> Vec<PathBuf> {
        self.read_state().search_paths.clone()
    }

    /// Whether the support module is currently compiled.
    #[must_use]
    pub fn has_support_module(&self) -> bool {
        self.read_state().support.is_some()
    }

    /// Prepare the session for plugins from `resource_folder`.
    ///
    /// Appends the folder to the module search path (once), compiles the
    /// support module if needed and registers one script factory per script
    /// file in the folder.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Bootstrap`] if the folder cannot be listed or
    /// the support module fails to compile.
    pub fn bootstrap(&self, resource_folder: &Path) -> BridgeResult<()> {
        let _construction = self.lock_construction();
        self.bootstrap_unlocked(resource_folder)
    }

    /// Register a native plugin factory. Native factories take precedence
    /// over scripts of the same name and survive teardown.
    pub fn register_factory(&self, class_name: impl Into<String>, factory: PluginFactory) {
        self.factories
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .register_native(class_name, factory);
    }

    /// Registered class names, sorted.
    #[must_use]
    pub fn factory_names(&self) -> Vec<String> {
        self.factories
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .names()
    }

    /// Origin of a registered factory.
    #[must_use]
    pub fn factory_origin(&self, class_name: &str) -> Option<FactoryOrigin> {
        self.factories
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .origin(class_name)
    }

    /// Construct one plugin object without registering it as live.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::FactoryNotFound`] for an unknown class, or
    /// whatever the factory fails with.
    pub fn instantiate(
        &self,
        class_name: &str,
        handle: NativeHandle,
        resource_folder: &Path,
    ) -> BridgeResult<Box<dyn VstPlugin>> {
        let _construction = self.lock_construction();
        self.instantiate_unlocked(class_name, handle, resource_folder)
    }

    /// Live-instance table.
    #[must_use]
    pub fn instances(&self) -> &LiveInstances {
        &self.instances
    }

    /// Register host callbacks for a handle, replacing earlier ones.
    pub fn register_host(&self, handle: NativeHandle, host: Arc<dyn HostCallbacks>) {
        self.hosts
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(handle, host);
    }

    /// Whether host callbacks are registered for a handle.
    #[must_use]
    pub fn has_host(&self, handle: NativeHandle) -> bool {
        self.hosts
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&handle)
    }

    /// Bootstrap, register and construct one live instance.
    ///
    /// Everything happens under the construction lock. On failure the
    /// instance is unregistered again and no object survives.
    pub(crate) fn create_instance(
        &self,
        descriptor: &PluginDescriptor,
        handle: NativeHandle,
        host: Option<Arc<dyn HostCallbacks>>,
    ) -> BridgeResult<(Box<dyn VstPlugin>, Arc<InstanceRecord>)> {
        let _construction = self.lock_construction();
        self.bootstrap_unlocked(&descriptor.resource_folder)?;

        let record = Arc::new(InstanceRecord::new(
            handle,
            descriptor.plugin_class_name.as_str(),
            descriptor.resource_folder.as_path(),
        ));
        self.instances.insert(&record)?;
        if let Some(host) = host {
            self.register_host(handle, host);
        }

        match self.instantiate_unlocked(
            &descriptor.plugin_class_name,
            handle,
            &descriptor.resource_folder,
        ) {
            Ok(plugin) => Ok((plugin, record)),
            Err(e) => {
                drop(record);
                self.release_unlocked(handle);
                Err(e)
            },
        }
    }

    /// Forget a live instance. Tears the session down when it was the last.
    ///
    /// Returns the number of instances still live.
    pub(crate) fn release(&self, handle: NativeHandle) -> usize {
        let _construction = self.lock_construction();
        self.release_unlocked(handle)
    }

    fn release_unlocked(&self, handle: NativeHandle) -> usize {
        self.hosts
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&handle);
        let remaining = self.instances.remove(handle);
        if remaining == 0 {
            self.teardown();
        }
        remaining
    }

    fn teardown(&self) {
        let removed = self
            .factories
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear_scripts();
        let mut state = self.write_state();
        state.search_paths.clear();
        state.support = None;
        state.engine = Arc::new(build_engine(&self.config, &[], None, &self.hosts));
        info!(script_factories = removed, "Interpreter session torn down");
    }

    fn bootstrap_unlocked(&self, folder: &Path) -> BridgeResult<()> {
        let bootstrap_error = |message: String| BridgeError::Bootstrap {
            path: folder.to_path_buf(),
            message,
        };

        let scripts = self
            .script_modules(folder)
            .map_err(|e| bootstrap_error(e.to_string()))?;

        {
            let mut state = self.write_state();
            let mut changed = false;
            if state.support.is_none() {
                state.support = Some(compile_support(&self.config).map_err(bootstrap_error)?);
                changed = true;
            }
            if !state.search_paths.iter().any(|p| p == folder) {
                state.search_paths.push(folder.to_path_buf());
                changed = true;
            }
            if changed {
                let engine = build_engine(
                    &self.config,
                    &state.search_paths,
                    state.support.as_ref(),
                    &self.hosts,
                );
                state.engine = Arc::new(engine);
            }
        }

        let mut factories = self.factories.write().unwrap_or_else(PoisonError::into_inner);
        let mut registered = 0usize;
        for (class_name, path) in scripts {
            if factories.register_script(class_name.as_str(), script_factory(class_name.clone(), path)) {
                registered = registered.saturating_add(1);
            }
        }
        info!(
            path = %folder.display(),
            scripts = registered,
            "Bootstrapped resource folder"
        );
        Ok(())
    }

    fn script_modules(&self, folder: &Path) -> std::io::Result<Vec<(String, PathBuf)>> {
        let mut scripts = Vec::new();
        for entry in std::fs::read_dir(folder)? {
            let path = entry?.path();
            if !path.is_file()
                || !path
                    .extension()
                    .is_some_and(|e| e == self.config.script_extension.as_str())
            {
                continue;
            }
            match path.file_stem().and_then(|s| s.to_str()) {
                Some(stem) => scripts.push((stem.to_owned(), path.clone())),
                None => warn!(path = %path.display(), "Skipping script with non UTF-8 name"),
            }
        }
        scripts.sort();
        Ok(scripts)
    }

    pub(crate) fn instantiate_unlocked(
        &self,
        class_name: &str,
        handle: NativeHandle,
        resource_folder: &Path,
    ) -> BridgeResult<Box<dyn VstPlugin>> {
        let factory = self
            .factories
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(class_name)
            .ok_or_else(|| BridgeError::FactoryNotFound(class_name.to_owned()))?;

        let ctx = FactoryContext::new(handle, resource_folder, self);
        let plugin = factory(&ctx)?;
        debug!(plugin = %class_name, handle = %handle, "Plugin object constructed");
        Ok(plugin)
    }

    fn lock_construction(&self) -> std::sync::MutexGuard<'_, ()> {
        self.construction
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn read_state(&self) -> std::sync::RwLockReadGuard<'_, SessionState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> std::sync::RwLockWriteGuard<'_, SessionState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

fn script_factory(class_name: String, path: PathBuf) -> PluginFactory {
    Arc::new(move |ctx: &FactoryContext<'_>| {
        let plugin = ScriptPlugin::load(ctx.engine(), &class_name, &path, ctx.handle)?;
        Ok(Box::new(plugin) as Box<dyn VstPlugin>)
    })
}

fn apply_limits(engine: &mut Engine, config: &InterpreterSection) {
    engine.set_max_operations(config.max_operations);
    engine.set_max_call_levels(config.max_call_levels);
    engine.set_max_expr_depths(config.max_expr_depth, config.max_expr_depth_functions);
}

fn compile_support(config: &InterpreterSection) -> Result<Arc<Module>, String> {
    let mut engine = Engine::new();
    apply_limits(&mut engine, config);
    let ast = engine
        .compile(SUPPORT_SOURCE)
        .map_err(|e| format!("support module: {e}"))?;
    let module = Module::eval_ast_as_new(Scope::new(), &ast, &engine)
        .map_err(|e| format!("support module: {e}"))?;
    Ok(Arc::new(module))
}

fn build_engine(
    config: &InterpreterSection,
    search_paths: &[PathBuf],
    support: Option<&Arc<Module>>,
    hosts: &HostTable,
) -> Engine {
    let mut engine = Engine::new();
    apply_limits(&mut engine, config);

    engine.on_print(|text| info!(target: "opaz_bridge::script", "{text}"));
    engine.on_debug(|text, source, pos| {
        debug!(
            target: "opaz_bridge::script",
            source = source.unwrap_or_default(),
            position = %pos,
            "{text}"
        );
    });

    let mut resolvers = ModuleResolversCollection::new();
    for path in config.search_paths.iter().chain(search_paths) {
        resolvers.push(FileModuleResolver::new_with_path_and_extension(
            path.clone(),
            config.script_extension.as_str(),
        ));
    }
    engine.set_module_resolver(resolvers);

    host::register(&mut engine, hosts);
    audio::register(&mut engine);
    if let Some(support) = support {
        engine.register_static_module(SUPPORT_MODULE, Arc::clone(support));
    }
    engine
}
