//! Text substitution command

use std::path::Path;
use std::process::ExitCode;

use crate::config::CliOverrides;
use crate::pipeline::patch_text;
use crate::report::{ReportEvent, Reporter};

use super::{
    load_effective_config, reporter_for, CommonArgs, EXIT_ERROR, EXIT_INVALID_ARGS, EXIT_SUCCESS,
};

/// Execute the text command
pub fn run_text(common: &CommonArgs, root: &Path, dry_run: bool) -> ExitCode {
    let reporter = reporter_for(common);
    if !root.is_dir() {
        reporter.report(ReportEvent::Error {
            message: format!("'{}' is not a directory", root.display()),
        });
        return ExitCode::from(EXIT_INVALID_ARGS);
    }

    let Some(config) = load_effective_config(common, &CliOverrides::default(), &reporter) else {
        return ExitCode::from(EXIT_ERROR);
    };

    match patch_text(&config, root, dry_run, &reporter) {
        Ok(_) => ExitCode::from(EXIT_SUCCESS),
        Err(e) => {
            reporter.report(ReportEvent::Error { message: e.to_string() });
            ExitCode::from(EXIT_ERROR)
        }
    }
}
