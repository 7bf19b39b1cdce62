//! Registry sources, tried in priority order by the resolver.

use super::manifest::{load_manifest, ManifestFormat};
use super::{Registry, RegistryOrigin, Resolved};
use crate::config::RegistryConfig;
use std::env;
use std::path::{Path, PathBuf};

/// Environment variable extending the module search path
pub const MODULE_PATH_ENV: &str = "NODEFIX_MODULE_PATH";

/// A location that was tried and did not yield a registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Miss {
    /// Module name or file path that was attempted
    pub location: String,
    /// Why it was rejected
    pub reason: String,
}

impl Miss {
    fn new(location: impl Into<String>, reason: impl Into<String>) -> Self {
        Self { location: location.into(), reason: reason.into() }
    }
}

impl std::fmt::Display for Miss {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.location, self.reason)
    }
}

/// A place a registry may be found.
///
/// Implementations must not fail: every location they reject is recorded
/// in `tried` so the caller can explain a total miss.
pub trait RegistrySource {
    /// Return the first non-empty registry this source can find, or else
    /// the first empty one.
    fn resolve(&self, tried: &mut Vec<Miss>) -> Option<Resolved>;
}

/// Load a manifest, recording failures and empty mappings as misses.
///
/// An empty mapping is still returned so callers can fall back to it when
/// nothing better exists.
fn load_recorded(path: &Path, attribute: &str, tried: &mut Vec<Miss>) -> Option<Registry> {
    match load_manifest(path, attribute) {
        Ok(registry) => {
            if registry.is_empty() {
                tried.push(Miss::new(path.display().to_string(), format!("{} is empty", attribute)));
            }
            Some(registry)
        }
        Err(e) => {
            tried.push(Miss::new(path.display().to_string(), e.to_string()));
            None
        }
    }
}

/// Resolves dotted module names against a module search path.
///
/// `pkg.sub.mod` is looked up as `<dir>/pkg/sub/mod.{json,toml,py}` for each
/// search path entry.
#[derive(Debug, Clone)]
pub struct ModuleSource {
    modules: Vec<String>,
    search_path: Vec<PathBuf>,
    attribute: String,
}

impl ModuleSource {
    /// Create a module source with an explicit search path.
    pub fn new(modules: Vec<String>, search_path: Vec<PathBuf>, attribute: &str) -> Self {
        Self { modules, search_path, attribute: attribute.to_string() }
    }

    /// Configured module paths followed by the `NODEFIX_MODULE_PATH` entries.
    pub fn from_config(config: &RegistryConfig) -> Self {
        let mut search_path = config.module_paths.clone();
        if let Some(value) = env::var_os(MODULE_PATH_ENV) {
            search_path.extend(env::split_paths(&value).filter(|p| !p.as_os_str().is_empty()));
        }
        Self::new(config.modules.clone(), search_path, &config.attribute)
    }

    /// Search path entries, in lookup order.
    pub fn search_path(&self) -> &[PathBuf] {
        &self.search_path
    }
}

/// Convert `a.b.c` into `a/b/c`; `None` for malformed names.
fn module_relative_path(module: &str) -> Option<PathBuf> {
    let mut path = PathBuf::new();
    for segment in module.split('.') {
        if segment.is_empty() || !segment.chars().all(|c| c.is_alphanumeric() || c == '_') {
            return None;
        }
        path.push(segment);
    }
    Some(path)
}

impl RegistrySource for ModuleSource {
    fn resolve(&self, tried: &mut Vec<Miss>) -> Option<Resolved> {
        let mut fallback = None;
        for module in &self.modules {
            let Some(relative) = module_relative_path(module) else {
                tried.push(Miss::new(module.as_str(), "not a valid module name"));
                continue;
            };

            let mut found_any = false;
            for dir in &self.search_path {
                for format in ManifestFormat::ALL {
                    let candidate = dir.join(&relative).with_extension(format.extension());
                    if !candidate.is_file() {
                        continue;
                    }
                    found_any = true;
                    let Some(registry) = load_recorded(&candidate, &self.attribute, tried) else {
                        continue;
                    };
                    let resolved =
                        Resolved { registry, origin: RegistryOrigin::Module(module.clone()) };
                    if !resolved.registry.is_empty() {
                        return Some(resolved);
                    }
                    fallback.get_or_insert(resolved);
                }
            }

            if !found_any {
                tried.push(Miss::new(module.as_str(), "not found on module search path"));
            }
        }
        fallback
    }
}

/// Looks for a well-known registry file under a list of installation roots.
#[derive(Debug, Clone)]
pub struct FileSource {
    roots: Vec<PathBuf>,
    file: PathBuf,
    attribute: String,
}

impl FileSource {
    /// Create a file source over explicit roots.
    pub fn new(roots: Vec<PathBuf>, file: PathBuf, attribute: &str) -> Self {
        Self { roots, file, attribute: attribute.to_string() }
    }

    /// Roots and relative file from the registry config.
    pub fn from_config(config: &RegistryConfig) -> Self {
        Self::new(config.roots.clone(), config.file.clone(), &config.attribute)
    }
}

impl RegistrySource for FileSource {
    fn resolve(&self, tried: &mut Vec<Miss>) -> Option<Resolved> {
        let mut fallback = None;
        for root in &self.roots {
            let candidate = root.join(&self.file);
            if !candidate.is_file() {
                tried.push(Miss::new(candidate.display().to_string(), "not found"));
                continue;
            }
            let Some(registry) = load_recorded(&candidate, &self.attribute, tried) else {
                continue;
            };
            let resolved = Resolved { registry, origin: RegistryOrigin::File(candidate) };
            if !resolved.registry.is_empty() {
                return Some(resolved);
            }
            fallback.get_or_insert(resolved);
        }
        fallback
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_module_relative_path() {
        assert_eq!(
            module_relative_path("custom_nodes.pack.node_wrappers"),
            Some(PathBuf::from("custom_nodes/pack/node_wrappers"))
        );
        assert_eq!(module_relative_path("a..b"), None);
        assert_eq!(module_relative_path("../etc"), None);
    }

    #[test]
    fn test_module_source_tries_extensions_in_order() {
        let dir = TempDir::new().expect("should create temp dir");
        fs::create_dir_all(dir.path().join("pack")).expect("should create pack dir");
        fs::write(dir.path().join("pack/wrappers.json"), r#"{"M": {}}"#).expect("write json");
        fs::write(dir.path().join("pack/wrappers.toml"), "[M]\n\"pkg.Node\" = \"Node\"\n")
            .expect("write toml");

        let source =
            ModuleSource::new(vec!["pack.wrappers".to_string()], vec![dir.path().into()], "M");
        let mut tried = Vec::new();
        let resolved = source.resolve(&mut tried).expect("toml manifest should resolve");

        assert_eq!(resolved.registry.get("pkg.Node"), Some("Node"));
        // the empty json manifest was tried first
        assert_eq!(tried.len(), 1);
        assert!(tried[0].location.ends_with("wrappers.json"));
    }

    #[test]
    fn test_invalid_module_name_is_a_miss() {
        let source = ModuleSource::new(vec!["bad/name".to_string()], vec![], "M");
        let mut tried = Vec::new();
        assert!(source.resolve(&mut tried).is_none());
        assert_eq!(tried, vec![Miss::new("bad/name", "not a valid module name")]);
    }

    #[test]
    #[serial]
    fn test_from_config_appends_env_search_path() {
        let config = RegistryConfig {
            module_paths: vec![PathBuf::from("/configured")],
            ..Default::default()
        };
        let joined = env::join_paths([PathBuf::from("/env/one"), PathBuf::from("/env/two")])
            .expect("should join paths");
        env::set_var(MODULE_PATH_ENV, &joined);
        let source = ModuleSource::from_config(&config);
        env::remove_var(MODULE_PATH_ENV);

        assert_eq!(
            source.search_path(),
            &[
                PathBuf::from("/configured"),
                PathBuf::from("/env/one"),
                PathBuf::from("/env/two")
            ]
        );
    }

    #[test]
    fn test_file_source_skips_broken_manifest() {
        let bad = TempDir::new().expect("should create temp dir");
        let good = TempDir::new().expect("should create temp dir");
        fs::write(bad.path().join("reg.json"), "{ not json").expect("write bad");
        fs::write(good.path().join("reg.json"), r#"{"M": {"pkg.Node": "Node"}}"#)
            .expect("write good");

        let source = FileSource::new(
            vec![bad.path().into(), good.path().into()],
            PathBuf::from("reg.json"),
            "M",
        );
        let mut tried = Vec::new();
        let resolved = source.resolve(&mut tried).expect("second root should resolve");

        assert_eq!(resolved.origin, RegistryOrigin::File(good.path().join("reg.json")));
        assert_eq!(tried.len(), 1);
    }
}
