//! Configuration schema types for `nodefix.toml`
//!
//! Defines the structure, defaults and validation rules for a nodefix run.
//! Every section is optional; omitted values fall back to the built-in
//! ComfyUI / controlnet_aux layout.

use crate::alias::{builtin_targets, AliasTarget};
use crate::patch::text::{builtin_rules, TextRule};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Where the authoritative identifier registry is looked up
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Name of the mapping attribute inside a registry manifest
    pub attribute: String,
    /// Dotted module names, tried in order against the module search path
    pub modules: Vec<String>,
    /// Module search path (the `NODEFIX_MODULE_PATH` entries are appended)
    pub module_paths: Vec<PathBuf>,
    /// Installation roots scanned for the well-known registry file
    pub roots: Vec<PathBuf>,
    /// Registry file path relative to each root
    pub file: PathBuf,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            attribute: "NODE_CLASS_MAPPINGS".to_string(),
            modules: vec![
                "comfyui_controlnet_aux.node_wrappers".to_string(),
                "custom_nodes.comfyui_controlnet_aux.node_wrappers".to_string(),
            ],
            module_paths: Vec::new(),
            roots: vec![
                PathBuf::from("/workspace/ComfyUI/custom_nodes"),
                PathBuf::from("/ComfyUI/custom_nodes"),
                PathBuf::from("/content/ComfyUI/custom_nodes"),
            ],
            file: PathBuf::from("comfyui_controlnet_aux/node_wrappers.py"),
        }
    }
}

/// Workflow document scanning section
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentsConfig {
    /// Candidate workflow directories; missing ones are skipped
    pub roots: Vec<PathBuf>,
    /// File extension of workflow documents (without the dot)
    pub extension: String,
    /// Top-level field holding the node array
    pub nodes_field: String,
    /// Node field holding the class identifier
    pub type_field: String,
    /// Suffix appended to the file name for the pre-patch copy
    pub backup_suffix: String,
}

impl Default for DocumentsConfig {
    fn default() -> Self {
        Self {
            roots: vec![
                PathBuf::from("/workspace/ComfyUI/workflows"),
                PathBuf::from("/workspace/workflows"),
                PathBuf::from("/ComfyUI/workflows"),
                PathBuf::from("/content/ComfyUI/workflows"),
            ],
            extension: "json".to_string(),
            nodes_field: "nodes".to_string(),
            type_field: "class_type".to_string(),
            backup_suffix: ".bak".to_string(),
        }
    }
}

/// Raw text substitution section
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TextConfig {
    /// Extensions of files the text rules apply to
    pub extensions: Vec<String>,
    /// Ordered substitution rules
    pub rules: Vec<TextRule>,
}

impl Default for TextConfig {
    fn default() -> Self {
        Self { extensions: vec!["py".to_string()], rules: builtin_rules() }
    }
}

/// Complete nodefix configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NodefixConfig {
    /// Registry lookup
    pub registry: RegistryConfig,
    /// Workflow documents
    pub documents: DocumentsConfig,
    /// Identifiers to canonicalize, with their known historical variants
    pub targets: Vec<AliasTarget>,
    /// Text substitution variant
    pub text: TextConfig,
}

impl Default for NodefixConfig {
    fn default() -> Self {
        Self {
            registry: RegistryConfig::default(),
            documents: DocumentsConfig::default(),
            targets: builtin_targets(),
            text: TextConfig::default(),
        }
    }
}

/// A single config validation problem
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigValidationError {
    /// Dotted path of the offending field
    pub field: String,
    /// What is wrong with it
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl NodefixConfig {
    /// Validate the configuration, returning every problem found.
    pub fn validate(&self) -> Vec<ConfigValidationError> {
        let mut errors = Vec::new();
        let mut push = |field: String, message: &str| {
            errors.push(ConfigValidationError { field, message: message.to_string() });
        };

        if self.registry.attribute.trim().is_empty() {
            push("registry.attribute".to_string(), "must be a non-empty string");
        }
        if self.registry.file.as_os_str().is_empty() {
            push("registry.file".to_string(), "must be a non-empty path");
        }

        if self.documents.extension.trim().is_empty() {
            push("documents.extension".to_string(), "must be a non-empty string");
        }
        if self.documents.nodes_field.is_empty() {
            push("documents.nodes_field".to_string(), "must be a non-empty string");
        }
        if self.documents.type_field.is_empty() {
            push("documents.type_field".to_string(), "must be a non-empty string");
        }
        // An empty suffix would make the backup overwrite the document itself
        if self.documents.backup_suffix.is_empty() {
            push("documents.backup_suffix".to_string(), "must be a non-empty string");
        }

        for (i, target) in self.targets.iter().enumerate() {
            if target.suffix.trim().is_empty() {
                push(format!("targets[{}].suffix", i), "must be a non-empty string");
            }
            if target.variants.is_empty() {
                push(format!("targets[{}].variants", i), "must list at least one variant");
            }
        }

        if self.text.extensions.iter().any(|e| e.trim().is_empty()) {
            push("text.extensions".to_string(), "must not contain empty extensions");
        }
        for (i, rule) in self.text.rules.iter().enumerate() {
            if let Err(e) = Regex::new(&rule.pattern) {
                errors.push(ConfigValidationError {
                    field: format!("text.rules[{}].pattern", i),
                    message: format!("invalid regex: {}", e),
                });
            }
        }

        errors
    }
}
