//! Opaz Bridge - run script plugins inside native plugin hosts.
//!
//! This crate provides:
//! - [`ProxyLoader`]: turns a native handle and log location into a ready
//!   [`ScriptPluginProxy`]
//! - [`InterpreterSession`]: one embedded Rhai engine with its search paths,
//!   support module, plugin factories and live instances
//! - [`IniDescriptorResolver`]: finds the plugin class named by the
//!   descriptor next to the native library
//! - [`ScriptPlugin`]: a script module adapted to [`VstPlugin`](opaz_core::VstPlugin)
//!
//! # Setup flow
//!
//! config → descriptor → session bootstrap → factory lookup → construction
//! → live-instance registration → proxy.
//!
//! # Script plugins
//!
//! A plugin class `EchoPlug` is the file `EchoPlug.rhai` in the resource
//! folder:
//!
//! ```text
//! fn create(handle) { #{ handle: handle, gain: 1.0 } }
//! fn getVendorString() { "Acme" }
//! fn getPlugCategory() { opaz::EFFECT }
//! fn processReplacing(block) { block.copy_through(); }
//! // ... every other mandatory capability
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod audio;
pub mod descriptor;
pub mod error;
pub mod factory;
pub mod instances;
pub mod loader;
pub mod prelude;
pub mod proxy;
pub mod script;
pub mod session;

mod host;

pub use audio::AudioBlock;
pub use descriptor::{
    DescriptorResolver, IniDescriptorResolver, PluginDescriptor, PluginLocation, is_descriptor,
    resource_folder_for,
};
pub use error::{BridgeError, BridgeResult};
pub use factory::{FactoryContext, FactoryOrigin, PluginFactory, PluginFactoryRegistry};
pub use instances::{InstanceRecord, LiveInstances};
pub use loader::ProxyLoader;
pub use proxy::ScriptPluginProxy;
pub use script::ScriptPlugin;
pub use session::InterpreterSession;
