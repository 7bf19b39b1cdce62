//! Configuration loading and discovery for `nodefix.toml`
//!
//! Provides functions to find, load, and merge configuration.

use super::schema::NodefixConfig;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the configuration file looked up on disk
pub const CONFIG_FILE: &str = "nodefix.toml";

/// Configuration loading error
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// File I/O error
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error
    #[error("Failed to parse nodefix.toml: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error
    #[error("Config validation failed:\n{}", .0.iter().map(|e| format!("  - {}", e)).collect::<Vec<_>>().join("\n"))]
    Validation(Vec<String>),
}

/// CLI arguments that can override config values
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    /// Replace the workflow document roots
    pub document_roots: Vec<PathBuf>,
    /// Replace the registry installation roots
    pub registry_roots: Vec<PathBuf>,
    /// Prepend entries to the module search path
    pub module_paths: Vec<PathBuf>,
}

/// Find nodefix.toml by walking up from the current working directory.
///
/// Search order:
/// 1. Walk up from current directory looking for nodefix.toml
/// 2. Check XDG_CONFIG_HOME/nodefix/nodefix.toml (or ~/.config/nodefix/nodefix.toml)
pub fn find_config() -> Option<PathBuf> {
    if let Ok(cwd) = env::current_dir() {
        if let Some(path) = find_config_from(cwd) {
            return Some(path);
        }
    }

    find_xdg_config()
}

/// Find nodefix.toml in the XDG config directory.
pub fn find_xdg_config() -> Option<PathBuf> {
    let xdg_config = env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|_| env::var("HOME").map(|h| PathBuf::from(h).join(".config")))
        .ok()?;

    let config_path = xdg_config.join("nodefix").join(CONFIG_FILE);
    if config_path.exists() {
        Some(config_path)
    } else {
        None
    }
}

/// Find nodefix.toml by walking up from a specific directory.
pub fn find_config_from(start: PathBuf) -> Option<PathBuf> {
    let mut current = start;

    loop {
        let config_path = current.join(CONFIG_FILE);
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            return None;
        }
    }
}

/// Load configuration from a nodefix.toml file.
///
/// If a path is provided, loads from that file (a missing file is an error).
/// Otherwise uses [`find_config`]; when nothing is found the built-in
/// defaults are returned.
///
/// # Example
/// ```ignore
/// let config = load_config(None)?;
/// let config = load_config(Some(Path::new("ops/nodefix.toml")))?;
/// ```
pub fn load_config(path: Option<&Path>) -> Result<NodefixConfig, ConfigError> {
    let config_path = match path {
        Some(p) => Some(p.to_path_buf()),
        None => find_config(),
    };

    match config_path {
        Some(p) => load_config_file(&p),
        None => Ok(NodefixConfig::default()),
    }
}

fn load_config_file(path: &Path) -> Result<NodefixConfig, ConfigError> {
    let contents = fs::read_to_string(path)?;
    let config: NodefixConfig = toml::from_str(&contents)?;

    let errors = config.validate();
    if !errors.is_empty() {
        return Err(ConfigError::Validation(errors.into_iter().map(|e| e.to_string()).collect()));
    }

    Ok(config)
}

/// Merge CLI overrides into a configuration.
///
/// Root lists given on the command line replace the configured ones; module
/// paths are searched before the configured ones.
pub fn merge_cli_overrides(config: &mut NodefixConfig, overrides: &CliOverrides) {
    if !overrides.document_roots.is_empty() {
        config.documents.roots = overrides.document_roots.clone();
    }

    if !overrides.registry_roots.is_empty() {
        config.registry.roots = overrides.registry_roots.clone();
    }

    if !overrides.module_paths.is_empty() {
        let mut paths = overrides.module_paths.clone();
        paths.append(&mut config.registry.module_paths);
        config.registry.module_paths = paths;
    }
}
