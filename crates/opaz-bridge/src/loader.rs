//! Construction of capability proxies.
//!
//! [`ProxyLoader`] is the uninitialized side of an adapter: it collects the
//! collaborators (session, resolver, host callbacks, native factories) and
//! turns a native handle plus location into a ready [`ScriptPluginProxy`].
//! Construction either succeeds completely or fails with a [`BridgeError`];
//! no partially built proxy is ever returned.

use std::fmt;
use std::sync::Arc;

use opaz_config::{Config, DescriptorSection};
use opaz_core::{HostCallbacks, NativeHandle};
use opaz_telemetry::{LoadContext, LoadGuard, LogConfig, TelemetryError, setup_logging};
use tracing::{debug, info, warn};

use crate::descriptor::{
    DescriptorResolver, IniDescriptorResolver, PluginLocation, resource_folder_for,
};
use crate::error::BridgeResult;
use crate::factory::PluginFactory;
use crate::proxy::ScriptPluginProxy;
use crate::session::InterpreterSession;

/// Builder for [`ScriptPluginProxy`] instances.
///
/// # Example
///
/// ```rust,no_run
/// use std::sync::Arc;
///
/// use opaz_bridge::{InterpreterSession, PluginLocation, ProxyLoader};
/// use opaz_core::{NativeHandle, VstPlugin};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let session = Arc::new(InterpreterSession::new(Default::default()));
/// let loader = ProxyLoader::new().with_session(session);
///
/// let location = PluginLocation::new("/plugins/echo", "Echo_stdout.txt");
/// let mut proxy = loader.instantiate(NativeHandle::new(1), &location)?;
/// println!("{}", proxy.get_vendor_string()?);
/// # Ok(())
/// # }
/// ```
#[derive(Default)]
pub struct ProxyLoader {
    session: Option<Arc<InterpreterSession>>,
    resolver: Option<Arc<dyn DescriptorResolver>>,
    config: Option<Config>,
    host: Option<Arc<dyn HostCallbacks>>,
    factories: Vec<(String, PluginFactory)>,
    logging: bool,
}

impl fmt::Debug for ProxyLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let factories: Vec<&str> = self.factories.iter().map(|(n, _)| n.as_str()).collect();
        f.debug_struct("ProxyLoader")
            .field("session", &self.session.is_some())
            .field("resolver", &self.resolver.is_some())
            .field("config", &self.config)
            .field("host", &self.host.is_some())
            .field("factories", &factories)
            .field("logging", &self.logging)
            .finish()
    }
}

impl ProxyLoader {
    /// Create a loader with default collaborators.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every plugin into `session`.
    ///
    /// Without a session the loader uses the process-wide default when
    /// `interpreter.shared_session` is set, and a fresh session otherwise.
    #[must_use]
    pub fn with_session(mut self, session: Arc<InterpreterSession>) -> Self {
        self.session = Some(session);
        self
    }

    /// Use a custom descriptor resolver.
    #[must_use]
    pub fn with_resolver(mut self, resolver: Arc<dyn DescriptorResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// Use this configuration instead of loading the resource folder's.
    #[must_use]
    pub fn with_config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    /// Host callbacks for the instances this loader creates.
    #[must_use]
    pub fn with_host(mut self, host: Arc<dyn HostCallbacks>) -> Self {
        self.host = Some(host);
        self
    }

    /// Register a native factory in the session before construction.
    #[must_use]
    pub fn with_factory(mut self, class_name: impl Into<String>, factory: PluginFactory) -> Self {
        self.factories.push((class_name.into(), factory));
        self
    }

    /// Install a tracing subscriber from the `[logging]` section on first use.
    #[must_use]
    pub fn with_logging(mut self) -> Self {
        self.logging = true;
        self
    }

    /// Construct a proxy for the native instance `handle` at `location`.
    ///
    /// # Errors
    ///
    /// Any [`BridgeError`](crate::BridgeError): configuration, descriptor,
    /// bootstrap, factory lookup, script, constructor or handle conflicts.
    pub fn instantiate(
        &self,
        handle: NativeHandle,
        location: &PluginLocation,
    ) -> BridgeResult<ScriptPluginProxy> {
        let config = match &self.config {
            Some(config) => config.clone(),
            None => {
                let folder = resource_folder_for(&DescriptorSection::default(), location);
                Config::load(Some(&folder))?
            },
        };
        if self.logging {
            init_logging(&config, location);
        }

        let mut guard = LoadGuard::new(LoadContext::new(handle.raw()));

        let descriptor = match &self.resolver {
            Some(resolver) => resolver.resolve(location)?,
            None => IniDescriptorResolver::new(config.descriptor.clone()).resolve(location)?,
        };
        guard.resolved(&descriptor.plugin_class_name, &descriptor.resource_folder);
        info!(
            plugin = %descriptor.plugin_class_name,
            path = %descriptor.resource_folder.display(),
            "Loading plugin"
        );

        let session = match &self.session {
            Some(session) => Arc::clone(session),
            None if config.interpreter.shared_session => {
                InterpreterSession::shared(&config.interpreter)
            },
            None => Arc::new(InterpreterSession::new(config.interpreter.clone())),
        };
        for (name, factory) in &self.factories {
            session.register_factory(name.as_str(), Arc::clone(factory));
        }

        let (plugin, record) =
            session.create_instance(&descriptor, handle, self.host.clone())?;
        guard.succeed();
        Ok(ScriptPluginProxy::new(plugin, record, session))
    }
}

fn init_logging(config: &Config, location: &PluginLocation) {
    let mut log = LogConfig::from(&config.logging);
    if config.logging.to_file {
        log = log.with_file(
            location.log_base_path.as_path(),
            location.log_file_name.as_str(),
        );
    }
    match setup_logging(&log) {
        Ok(()) => debug!("Logging initialized"),
        Err(TelemetryError::AlreadyInitialized(_)) => {},
        Err(e) => warn!(error = %e, "Logging setup failed"),
    }
}
