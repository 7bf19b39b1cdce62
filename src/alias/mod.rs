//! Canonical identifier matching and the alias table.
//!
//! For every target the registry is searched for the canonical key
//! (exact `namespace.suffix` first, then any key ending in the suffix,
//! both case-insensitive). The target's fixed list of historical variants
//! is then mapped, lower-cased, onto that key. Spellings that are not in
//! the list are never rewritten.

mod targets;

pub use targets::builtin_targets;

use crate::registry::Registry;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// A logical identifier to canonicalize and its known historical variants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AliasTarget {
    /// Display name used in reports (defaults to the suffix)
    #[serde(default)]
    pub label: String,
    /// Namespace prefix of the canonical key, without the trailing dot
    #[serde(default)]
    pub namespace: String,
    /// Logical name the canonical key ends with
    pub suffix: String,
    /// Historical spellings rewritten to the canonical key
    pub variants: Vec<String>,
}

impl AliasTarget {
    /// Label for reports.
    pub fn display_label(&self) -> &str {
        if self.label.is_empty() {
            &self.suffix
        } else {
            &self.label
        }
    }
}

/// Find the canonical registry key for `namespace.suffix`.
///
/// Exact case-insensitive match wins; otherwise the first key (in the
/// registry's lexicographic order) whose lower-cased form ends with the
/// lower-cased suffix.
pub fn pick_canonical<'a>(registry: &'a Registry, namespace: &str, suffix: &str) -> Option<&'a str> {
    let suffix = suffix.to_lowercase();
    let exact = if namespace.is_empty() {
        suffix.clone()
    } else {
        format!("{}.{}", namespace.to_lowercase(), suffix)
    };

    registry
        .keys()
        .find(|k| k.to_lowercase() == exact)
        .or_else(|| registry.keys().find(|k| k.to_lowercase().ends_with(&suffix)))
}

/// Resolution result for a single target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetOutcome {
    /// Target label
    pub label: String,
    /// Canonical registry key, if one matched
    pub canonical: Option<String>,
}

/// Lower-cased variant → canonical identifier.
#[derive(Debug, Clone, Default)]
pub struct AliasTable {
    aliases: HashMap<String, String>,
    canonical_keys: HashSet<String>,
}

impl AliasTable {
    /// Resolve every target against the registry and build the table.
    ///
    /// Targets that do not resolve are left out; the others still apply.
    pub fn build(registry: &Registry, targets: &[AliasTarget]) -> Resolution {
        let mut table = AliasTable {
            aliases: HashMap::new(),
            canonical_keys: registry.keys().map(str::to_string).collect(),
        };
        let mut outcomes = Vec::with_capacity(targets.len());

        for target in targets {
            let canonical = pick_canonical(registry, &target.namespace, &target.suffix);
            if let Some(canonical) = canonical {
                for variant in &target.variants {
                    table.aliases.insert(variant.to_lowercase(), canonical.to_string());
                }
            }
            outcomes.push(TargetOutcome {
                label: target.display_label().to_string(),
                canonical: canonical.map(str::to_string),
            });
        }

        Resolution { outcomes, table }
    }

    /// The canonical replacement for `identifier`, if it must change.
    ///
    /// Returns `None` for unknown spellings, for identifiers already in
    /// canonical form, and for any exact registry key.
    pub fn rewrite(&self, identifier: &str) -> Option<&str> {
        if self.canonical_keys.contains(identifier) {
            return None;
        }
        self.aliases
            .get(&identifier.to_lowercase())
            .map(String::as_str)
            .filter(|canonical| *canonical != identifier)
    }
}

/// Per-target outcomes together with the resulting alias table.
#[derive(Debug, Clone)]
pub struct Resolution {
    /// One entry per requested target, in request order
    pub outcomes: Vec<TargetOutcome>,
    /// Aliases of every target that resolved
    pub table: AliasTable,
}

impl Resolution {
    /// True when no target resolved; the patch run is skipped.
    pub fn is_empty(&self) -> bool {
        self.outcomes.iter().all(|o| o.canonical.is_none())
    }
}
