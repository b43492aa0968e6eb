//! Prelude module - commonly used types for convenient import.
//!
//! Use `use opaz_bridge::prelude::*;` to import all essential types.

// Loading
pub use crate::{PluginLocation, ProxyLoader, ScriptPluginProxy};

// Sessions and factories
pub use crate::{FactoryContext, InterpreterSession, PluginFactory};

// Errors
pub use crate::{BridgeError, BridgeResult};

// Capability surface
pub use opaz_core::prelude::*;
