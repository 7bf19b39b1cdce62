//! Configuration module for nodefix
//!
//! Provides types, discovery and loading for `nodefix.toml`.

pub mod loader;
pub mod schema;

pub use loader::{load_config, merge_cli_overrides, CliOverrides, ConfigError};
pub use schema::*;
