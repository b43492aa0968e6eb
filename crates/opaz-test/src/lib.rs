//! Opaz Test - Shared test utilities for the script plugin bridge.
//!
//! This crate provides mock implementations and fixtures that can be used
//! across the opaz crates as a dev-dependency.
//!
//! # Usage
//!
//! Add to your crate's `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! opaz-test.workspace = true
//! ```
//!
//! Then use in your tests:
//!
//! ```rust,ignore
//! use opaz_test::{ECHO_PLUG, PluginFolder};
//!
//! #[test]
//! fn loads_echo() {
//!     let folder = PluginFolder::new()
//!         .with_script("EchoPlug", ECHO_PLUG)
//!         .with_descriptor("Echo", "EchoPlug");
//!     // build a PluginLocation from folder.path() and folder.log_file_name("Echo")
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod fixtures;
pub mod harness;
pub mod mocks;
pub mod scripts;

pub use fixtures::*;
pub use harness::*;
pub use mocks::*;
pub use scripts::*;
