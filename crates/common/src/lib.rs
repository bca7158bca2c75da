//! Shared types for the bridgemeta workspace.
//!
//! This crate holds the pieces used by both the metadata pipeline and the
//! command-line front end: platform versions and the generator configuration.

pub mod config;
pub mod version;

pub use config::{ConfigError, GeneratorConfig};
pub use version::Version;

/// Default configuration filename looked up next to the translation unit.
pub const CONFIG_FILENAME: &str = "bridgemeta.toml";
