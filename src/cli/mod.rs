//! Command-line interface implementation
//!
//! This module provides the CLI entry point and dispatches to submodules
//! for specific command implementations.

mod text;
mod workflows;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use crate::config::{load_config, merge_cli_overrides, CliOverrides, NodefixConfig};
use crate::report::{ConsoleReporter, ReportEvent, Reporter};

/// Exit codes
pub(crate) const EXIT_SUCCESS: u8 = 0;
pub(crate) const EXIT_ERROR: u8 = 1;
pub(crate) const EXIT_INVALID_ARGS: u8 = 2;

/// nodefix - remap outdated node class identifiers in workflow files
#[derive(Parser)]
#[command(name = "nodefix")]
#[command(about = "Remap outdated or miscased node class identifiers in workflow files")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Options shared by every command
#[derive(Args, Debug, Clone, Default)]
pub struct CommonArgs {
    /// Configuration file (default: nearest nodefix.toml, then the XDG config dir)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Show per-directory progress
    #[arg(short, long)]
    pub verbose: bool,
}

/// Where the registry is looked up
#[derive(Args, Debug, Clone, Default)]
pub struct RegistryArgs {
    /// Installation root to search for the registry file (repeatable, replaces the configured roots)
    #[arg(long = "registry-root", value_name = "DIR")]
    pub registry_roots: Vec<PathBuf>,

    /// Directory searched for registry modules before the configured ones (repeatable)
    #[arg(long = "module-path", value_name = "DIR")]
    pub module_paths: Vec<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Canonicalize node identifiers in workflow documents (writes .bak backups)
    Workflows {
        /// Workflow directory to scan (repeatable, replaces the configured roots)
        #[arg(long = "root", value_name = "DIR")]
        roots: Vec<PathBuf>,

        #[command(flatten)]
        registry: RegistryArgs,

        /// Report what would change without writing anything
        #[arg(long)]
        dry_run: bool,

        #[command(flatten)]
        common: CommonArgs,
    },
    /// Resolve the registry and canonical identifiers without touching documents
    Resolve {
        #[command(flatten)]
        registry: RegistryArgs,

        #[command(flatten)]
        common: CommonArgs,
    },
    /// Apply the text substitution rules to source files in place (no backups)
    Text {
        /// Directory to scan (default: current directory)
        #[arg(default_value = ".")]
        root: PathBuf,

        /// Report what would change without writing anything
        #[arg(long)]
        dry_run: bool,

        #[command(flatten)]
        common: CommonArgs,
    },
}

/// Run the CLI and return the exit code
pub fn run() -> ExitCode {
    let cli = Cli::parse();

    match cli.command {
        Commands::Workflows { roots, registry, dry_run, common } => {
            let overrides = CliOverrides {
                document_roots: roots,
                registry_roots: registry.registry_roots,
                module_paths: registry.module_paths,
            };
            workflows::run_workflows(&common, &overrides, dry_run)
        }
        Commands::Resolve { registry, common } => {
            let overrides = CliOverrides {
                document_roots: Vec::new(),
                registry_roots: registry.registry_roots,
                module_paths: registry.module_paths,
            };
            workflows::run_resolve(&common, &overrides)
        }
        Commands::Text { root, dry_run, common } => text::run_text(&common, &root, dry_run),
    }
}

fn reporter_for(common: &CommonArgs) -> ConsoleReporter {
    ConsoleReporter::new().with_verbose(common.verbose)
}

/// Load the configuration and apply command-line overrides.
///
/// Errors are reported and turned into `None`.
fn load_effective_config(
    common: &CommonArgs,
    overrides: &CliOverrides,
    reporter: &dyn Reporter,
) -> Option<NodefixConfig> {
    match load_config(common.config.as_deref()) {
        Ok(mut config) => {
            merge_cli_overrides(&mut config, overrides);
            Some(config)
        }
        Err(e) => {
            reporter.report(ReportEvent::Error { message: e.to_string() });
            None
        }
    }
}
