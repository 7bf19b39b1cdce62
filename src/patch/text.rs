//! Raw text substitution patcher.
//!
//! Applies an ordered list of regex rules to the whole content of a file
//! and rewrites it in place when the result differs. No structure is
//! parsed and no backup is written.

use super::{PatchError, PatchOutcome, Patcher};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// A pattern → replacement rule. The replacement may use `$1`-style groups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextRule {
    /// Regular expression to search for
    pub pattern: String,
    /// Replacement text
    pub replacement: String,
}

impl TextRule {
    /// Create a rule.
    pub fn new(pattern: impl Into<String>, replacement: impl Into<String>) -> Self {
        Self { pattern: pattern.into(), replacement: replacement.into() }
    }
}

/// Make the NSFW gating defaults permissive in common Python libraries.
pub fn builtin_rules() -> Vec<TextRule> {
    vec![
        TextRule::new(
            r"\bblock_nsfw\s*:\s*Optional\[bool\]\s*=\s*None\b",
            "block_nsfw: Optional[bool] = False",
        ),
        TextRule::new(
            r"\benable_nsfw\s*:\s*Optional\[bool\]\s*=\s*None\b",
            "enable_nsfw: Optional[bool] = True",
        ),
    ]
}

#[derive(Debug, Clone)]
struct CompiledRule {
    regex: Regex,
    replacement: String,
}

/// Patches files by applying substitution rules in order.
#[derive(Debug, Clone)]
pub struct TextPatcher {
    rules: Vec<CompiledRule>,
    dry_run: bool,
}

impl TextPatcher {
    /// Compile the rules; fails on the first invalid pattern.
    pub fn new(rules: &[TextRule]) -> Result<Self, regex::Error> {
        let rules = rules
            .iter()
            .map(|r| -> Result<CompiledRule, regex::Error> {
                Ok(CompiledRule { regex: Regex::new(&r.pattern)?, replacement: r.replacement.clone() })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { rules, dry_run: false })
    }

    /// Report changes without writing anything.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Apply every rule to `text`.
    ///
    /// Returns the new text and the number of matches substituted, or
    /// `None` when the text is unchanged.
    pub fn apply(&self, text: &str) -> Option<(String, usize)> {
        let mut current = text.to_string();
        let mut substitutions = 0;

        for rule in &self.rules {
            let matches = rule.regex.find_iter(&current).count();
            if matches == 0 {
                continue;
            }
            substitutions += matches;
            current = rule.regex.replace_all(&current, rule.replacement.as_str()).into_owned();
        }

        if current == text {
            None
        } else {
            Some((current, substitutions))
        }
    }
}

impl Patcher for TextPatcher {
    fn patch(&self, path: &Path) -> Result<PatchOutcome, PatchError> {
        // unreadable or non-UTF-8 files are skipped
        let Ok(text) = fs::read_to_string(path) else {
            return Ok(PatchOutcome::unchanged());
        };
        let Some((patched, substitutions)) = self.apply(&text) else {
            return Ok(PatchOutcome::unchanged());
        };

        if !self.dry_run {
            fs::write(path, patched)
                .map_err(|source| PatchError::Write { path: path.to_path_buf(), source })?;
        }
        Ok(PatchOutcome::changed(substitutions))
    }

    fn is_dry_run(&self) -> bool {
        self.dry_run
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn builtin() -> TextPatcher {
        TextPatcher::new(&builtin_rules()).expect("builtin rules compile")
    }

    #[test]
    fn test_enable_nsfw_default() {
        let (patched, n) = builtin()
            .apply("    enable_nsfw: Optional[bool] = None\n")
            .expect("should change");
        assert_eq!(patched, "    enable_nsfw: Optional[bool] = True\n");
        assert_eq!(n, 1);
    }

    #[test]
    fn test_block_nsfw_with_odd_spacing() {
        let (patched, _) = builtin()
            .apply("block_nsfw :Optional[bool]=  None")
            .expect("should change");
        assert_eq!(patched, "block_nsfw: Optional[bool] = False");
    }

    #[test]
    fn test_unrelated_text_is_untouched() {
        let patcher = builtin();
        assert!(patcher.apply("width: Optional[int] = None\n").is_none());
        assert!(patcher.apply("enable_nsfw: Optional[bool] = True\n").is_none());
        assert!(patcher.apply("my_enable_nsfw: Optional[bool] = None\n").is_none());
    }

    #[test]
    fn test_attribute_access_still_matches() {
        let (patched, n) = builtin()
            .apply("obj.enable_nsfw: Optional[bool] = None\nself.block_nsfw: Optional[bool] = None\n")
            .expect("should change");
        assert_eq!(
            patched,
            "obj.enable_nsfw: Optional[bool] = True\nself.block_nsfw: Optional[bool] = False\n"
        );
        assert_eq!(n, 2);
        // identifier characters before the name are not a boundary
        assert!(builtin().apply("self_enable_nsfw: Optional[bool] = None\n").is_none());
    }

    #[test]
    fn test_rules_apply_in_order() {
        let patcher = TextPatcher::new(&[TextRule::new("a", "b"), TextRule::new("b", "c")])
            .expect("rules compile");
        assert_eq!(patcher.apply("a").map(|(t, _)| t), Some("c".to_string()));
    }

    #[test]
    fn test_identity_substitution_is_not_a_change() {
        let patcher = TextPatcher::new(&[TextRule::new("(x)", "$1")]).expect("rule compiles");
        assert!(patcher.apply("xxx").is_none());
    }

    #[test]
    fn test_invalid_rule_is_rejected() {
        assert!(TextPatcher::new(&[TextRule::new("(open", "")]).is_err());
    }

    #[test]
    fn test_patch_file_in_place_without_backup() {
        let dir = TempDir::new().expect("should create temp dir");
        let path = dir.path().join("pipeline.py");
        fs::write(&path, "x = 1\nenable_nsfw: Optional[bool] = None\ny = 2\n").expect("write");

        let outcome = builtin().patch(&path).expect("patch should succeed");
        assert!(outcome.changed);
        assert_eq!(
            fs::read_to_string(&path).expect("read"),
            "x = 1\nenable_nsfw: Optional[bool] = True\ny = 2\n"
        );
        assert_eq!(fs::read_dir(dir.path()).expect("list").count(), 1);
    }

    #[test]
    fn test_non_utf8_file_is_skipped() {
        let dir = TempDir::new().expect("should create temp dir");
        let path = dir.path().join("blob.py");
        fs::write(&path, [0xff, 0xfe, 0x00, 0x80]).expect("write");

        let outcome = builtin().patch(&path).expect("patch should not fail");
        assert!(!outcome.changed);
    }
}
