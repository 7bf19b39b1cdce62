//! Recursive file discovery.
//!
//! Enumerates every file with one of the given extensions below a root
//! directory. Roots that do not exist produce no files.

use glob::{glob, Pattern};
use std::path::{Path, PathBuf};

/// Find all files with the given extensions under `root` (recursively).
///
/// Results are sorted and deduplicated. Unreadable directory entries are
/// skipped.
pub fn find_files(root: &Path, extensions: &[String]) -> Vec<PathBuf> {
    if !root.is_dir() {
        return Vec::new();
    }

    let base = Pattern::escape(&root.display().to_string());
    let mut files = Vec::new();

    for ext in extensions {
        let pattern = format!("{}/**/*.{}", base, ext.trim_start_matches('.'));
        if let Ok(paths) = glob(&pattern) {
            files.extend(paths.filter_map(Result::ok).filter(|p| p.is_file()));
        }
    }

    files.sort();
    files.dedup();
    files
}
