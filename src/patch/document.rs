//! Workflow document patcher.
//!
//! Rewrites the identifier field of every node in a JSON workflow through
//! the alias table. A document is written at most once, only when a node
//! changed, and only after its original bytes were copied to a backup.

use super::{PatchError, PatchOutcome, Patcher};
use crate::alias::AliasTable;
use crate::config::DocumentsConfig;
use serde_json::Value;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

/// `wf.json` + `.bak` → `wf.json.bak`
pub fn backup_path(path: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

/// Patches node identifiers in structured workflow documents.
#[derive(Debug, Clone)]
pub struct DocumentPatcher<'a> {
    table: &'a AliasTable,
    nodes_field: String,
    type_field: String,
    backup_suffix: String,
    dry_run: bool,
}

impl<'a> DocumentPatcher<'a> {
    /// Create a patcher using the field names and backup suffix from `config`.
    pub fn new(table: &'a AliasTable, config: &DocumentsConfig) -> Self {
        Self {
            table,
            nodes_field: config.nodes_field.clone(),
            type_field: config.type_field.clone(),
            backup_suffix: config.backup_suffix.clone(),
            dry_run: false,
        }
    }

    /// Report changes without writing anything.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Rewrite identifiers in a parsed document, returning how many changed.
    ///
    /// Documents without an array under the nodes field are left alone, as
    /// are nodes that are not objects or whose identifier is not a string.
    pub fn rewrite_document(&self, document: &mut Value) -> usize {
        let Some(nodes) = document.get_mut(&self.nodes_field).and_then(Value::as_array_mut) else {
            return 0;
        };

        let mut rewrites = 0;
        for node in nodes.iter_mut() {
            let Some(Value::String(identifier)) =
                node.as_object_mut().and_then(|n| n.get_mut(&self.type_field))
            else {
                continue;
            };
            if let Some(canonical) = self.table.rewrite(identifier) {
                *identifier = canonical.to_string();
                rewrites += 1;
            }
        }
        rewrites
    }
}

impl Patcher for DocumentPatcher<'_> {
    fn patch(&self, path: &Path) -> Result<PatchOutcome, PatchError> {
        let Ok(original) = fs::read(path) else {
            return Ok(PatchOutcome::unchanged());
        };
        let Ok(mut document) = serde_json::from_slice::<Value>(&original) else {
            return Ok(PatchOutcome::unchanged());
        };

        let rewrites = self.rewrite_document(&mut document);
        if rewrites == 0 {
            return Ok(PatchOutcome::unchanged());
        }

        let mut outcome = PatchOutcome::changed(rewrites);
        if self.dry_run {
            return Ok(outcome);
        }

        // The backup must exist before the document is overwritten; a failed
        // backup does not stop the write.
        let backup = backup_path(path, &self.backup_suffix);
        if let Err(e) = fs::write(&backup, &original) {
            outcome = outcome.with_warning(format!("backup {} not written: {}", backup.display(), e));
        }

        let serialized = format!("{:#}", document);
        fs::write(path, serialized)
            .map_err(|source| PatchError::Write { path: path.to_path_buf(), source })?;

        Ok(outcome)
    }

    fn is_dry_run(&self) -> bool {
        self.dry_run
    }
}
