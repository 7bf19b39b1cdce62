//! Workflow patching and registry resolution commands

use std::process::ExitCode;

use crate::config::CliOverrides;
use crate::pipeline::{patch_workflows, resolve_targets, RunError};
use crate::registry::RegistryError;
use crate::report::{ReportEvent, Reporter};

use super::{load_effective_config, reporter_for, CommonArgs, EXIT_ERROR, EXIT_SUCCESS};

/// Explain a fatal error, listing every registry location that was tried.
fn report_fatal(reporter: &dyn Reporter, error: &RunError) {
    if let RunError::Registry(RegistryError::NotFound { tried }) = error {
        for miss in tried {
            reporter.report(ReportEvent::Warning { path: None, message: miss.to_string() });
        }
    }
    reporter.report(ReportEvent::Error { message: error.to_string() });
}

/// Execute the workflows command
pub fn run_workflows(common: &CommonArgs, overrides: &CliOverrides, dry_run: bool) -> ExitCode {
    let reporter = reporter_for(common);
    let Some(config) = load_effective_config(common, overrides, &reporter) else {
        return ExitCode::from(EXIT_ERROR);
    };

    // A skipped run (no canonical identifiers) is a success.
    match patch_workflows(&config, dry_run, &reporter) {
        Ok(_) => ExitCode::from(EXIT_SUCCESS),
        Err(e) => {
            report_fatal(&reporter, &e);
            ExitCode::from(EXIT_ERROR)
        }
    }
}

/// Execute the resolve command
pub fn run_resolve(common: &CommonArgs, overrides: &CliOverrides) -> ExitCode {
    let reporter = reporter_for(common);
    let Some(config) = load_effective_config(common, overrides, &reporter) else {
        return ExitCode::from(EXIT_ERROR);
    };

    match resolve_targets(&config, &reporter) {
        Ok(resolution) => {
            if resolution.is_empty() {
                reporter.report(ReportEvent::Skipped {
                    reason: "no canonical identifiers found".to_string(),
                });
            }
            ExitCode::from(EXIT_SUCCESS)
        }
        Err(e) => {
            report_fatal(&reporter, &RunError::Registry(e));
            ExitCode::from(EXIT_ERROR)
        }
    }
}
