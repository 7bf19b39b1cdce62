//! File patchers and the scan loop that drives them.
//!
//! A [`Patcher`] examines one file and rewrites it when needed. Problems
//! with an individual file (unreadable, unparseable, wrong shape) leave it
//! untouched and are not errors; only failing to write a file the patcher
//! decided to change aborts the scan.

pub mod document;
pub mod text;

pub use document::{backup_path, DocumentPatcher};
pub use text::{TextPatcher, TextRule};

use crate::discovery::find_files;
use crate::report::{ReportEvent, Reporter, RunSummary};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Patch error
#[derive(Debug, Error)]
pub enum PatchError {
    /// The patched content could not be written back
    #[error("cannot write '{}': {source}", .path.display())]
    Write {
        /// Target file
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },
}

/// Result of patching one file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatchOutcome {
    /// Whether the file content changed
    pub changed: bool,
    /// Number of identifiers or substitutions rewritten
    pub rewrites: usize,
    /// Non-fatal problem encountered while patching
    pub warning: Option<String>,
}

impl PatchOutcome {
    /// Outcome for a file left as it was.
    pub fn unchanged() -> Self {
        Self::default()
    }

    /// Outcome for a file with `rewrites` rewrites.
    pub fn changed(rewrites: usize) -> Self {
        Self { changed: true, rewrites, warning: None }
    }

    /// Attach a warning.
    pub fn with_warning(mut self, warning: impl Into<String>) -> Self {
        self.warning = Some(warning.into());
        self
    }
}

/// Something that conditionally rewrites a single file.
pub trait Patcher {
    /// Patch `path`, returning what happened.
    fn patch(&self, path: &Path) -> Result<PatchOutcome, PatchError>;

    /// Whether writes are suppressed.
    fn is_dry_run(&self) -> bool {
        false
    }
}

/// Patch every file with one of `extensions` under each existing root.
///
/// Roots are processed in order and missing roots are skipped. Each file
/// found counts as scanned; each file whose content changed is reported.
pub fn scan<P: Patcher + ?Sized>(
    patcher: &P,
    roots: &[PathBuf],
    extensions: &[String],
    reporter: &dyn Reporter,
) -> Result<RunSummary, PatchError> {
    let mut summary = RunSummary::new();

    for root in roots {
        let exists = root.is_dir();
        reporter.report(ReportEvent::RootStarted { root: root.clone(), exists });
        if !exists {
            continue;
        }

        for path in find_files(root, extensions) {
            let outcome = patcher.patch(&path)?;
            if let Some(warning) = &outcome.warning {
                reporter.report(ReportEvent::Warning {
                    path: Some(path.clone()),
                    message: warning.clone(),
                });
            }
            if outcome.changed {
                reporter.report(ReportEvent::FileChanged {
                    path: path.clone(),
                    rewrites: outcome.rewrites,
                    dry_run: patcher.is_dry_run(),
                });
            }
            summary.record(&path, &outcome);
        }
    }

    Ok(summary)
}
