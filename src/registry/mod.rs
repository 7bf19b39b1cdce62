//! Registry of valid node class identifiers.
//!
//! This module provides:
//! - `Registry`, the authoritative identifier → implementation mapping for a run
//! - `RegistrySource` implementations that know where a registry may live
//! - `Resolver`, which tries the sources in priority order
//! - Static manifest loading (`.json`, `.toml`, `.py`) that never executes code

mod manifest;
mod sources;

pub use manifest::{load_manifest, parse_manifest, ManifestError, ManifestFormat};
pub use sources::{FileSource, Miss, ModuleSource, RegistrySource, MODULE_PATH_ENV};

use crate::config::RegistryConfig;
use std::collections::BTreeMap;
use std::path::PathBuf;
use thiserror::Error;

/// Mapping of identifier name to an opaque implementation handle.
///
/// Keys iterate in lexicographic order, which makes every lookup that
/// scans the registry deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Registry {
    entries: BTreeMap<String, String>,
}

impl Registry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an identifier with its implementation handle.
    pub fn insert(&mut self, name: impl Into<String>, handle: impl Into<String>) {
        self.entries.insert(name.into(), handle.into());
    }

    /// Check whether `name` is an exact registry key.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Implementation handle registered for `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }

    /// Number of identifiers.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the registry has no identifiers.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Identifiers in lexicographic order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Up to `limit` keys starting (case-insensitively) with `prefix`.
    pub fn sample_with_prefix(&self, prefix: &str, limit: usize) -> Vec<&str> {
        let prefix = prefix.to_lowercase();
        self.keys().filter(|k| k.to_lowercase().starts_with(&prefix)).take(limit).collect()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Registry {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut registry = Registry::new();
        for (name, handle) in iter {
            registry.insert(name, handle);
        }
        registry
    }
}

/// Where a registry was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryOrigin {
    /// Resolved from a dotted module name on the module search path
    Module(String),
    /// Loaded from a well-known file under an installation root
    File(PathBuf),
}

impl std::fmt::Display for RegistryOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegistryOrigin::Module(name) => write!(f, "{}", name),
            RegistryOrigin::File(path) => write!(f, "file://{}", path.display()),
        }
    }
}

/// A registry together with the place it came from.
#[derive(Debug, Clone)]
pub struct Resolved {
    /// The identifier mapping
    pub registry: Registry,
    /// Where it was found
    pub origin: RegistryOrigin,
}

/// Registry resolution error
#[derive(Debug, Error)]
pub enum RegistryError {
    /// No source produced a mapping at all
    #[error("registry not found ({} location(s) tried)", .tried.len())]
    NotFound {
        /// Every location that was attempted, in order
        tried: Vec<Miss>,
    },
}

/// Tries registry sources in priority order.
///
/// The first non-empty mapping wins. When every mapping found is empty the
/// first of them is returned, so an installed but empty registry leads to
/// an empty resolution rather than a failure.
pub struct Resolver {
    sources: Vec<Box<dyn RegistrySource>>,
}

impl Resolver {
    /// Create a resolver over an explicit, ordered source list.
    pub fn new(sources: Vec<Box<dyn RegistrySource>>) -> Self {
        Self { sources }
    }

    /// Module lookup first, then the installation-root file scan.
    pub fn from_config(config: &RegistryConfig) -> Self {
        Self::new(vec![
            Box::new(ModuleSource::from_config(config)),
            Box::new(FileSource::from_config(config)),
        ])
    }

    /// Resolve the registry or fail with [`RegistryError::NotFound`].
    pub fn resolve(&self) -> Result<Resolved, RegistryError> {
        let mut tried = Vec::new();
        let mut fallback = None;
        for source in &self.sources {
            match source.resolve(&mut tried) {
                Some(resolved) if !resolved.registry.is_empty() => return Ok(resolved),
                Some(resolved) => {
                    fallback.get_or_insert(resolved);
                }
                None => {}
            }
        }
        fallback.ok_or(RegistryError::NotFound { tried })
    }
}
