//! Run reporting.
//!
//! Collects per-run counters in [`RunSummary`] and renders human-readable
//! progress through a [`Reporter`]. Console output is informational only and
//! not a stable format.
//!
//! # Example
//!
//! ```ignore
//! use nodefix::report::{ConsoleReporter, Reporter, ReportEvent};
//!
//! let reporter = ConsoleReporter::new();
//! reporter.report(ReportEvent::Skipped { reason: "no canonical identifiers found".into() });
//! ```

use crate::patch::PatchOutcome;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Counters for one scan, threaded through the scan loop and returned.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Files examined
    pub scanned: usize,
    /// Files that changed (or would change in dry-run mode)
    pub changed: usize,
    /// Individual identifiers or substitutions rewritten
    pub rewrites: usize,
    /// Paths of changed files, in scan order
    pub changed_files: Vec<PathBuf>,
}

impl RunSummary {
    /// Create an empty summary.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the outcome of one file.
    pub fn record(&mut self, path: &Path, outcome: &PatchOutcome) {
        self.scanned += 1;
        if outcome.changed {
            self.changed += 1;
            self.rewrites += outcome.rewrites;
            self.changed_files.push(path.to_path_buf());
        }
    }
}

/// Events reported during a run.
#[derive(Debug, Clone)]
pub enum ReportEvent {
    /// The registry was resolved
    RegistryFound {
        /// Origin descriptor
        origin: String,
        /// Number of identifiers in the registry
        size: usize,
        /// A few identifiers under the target namespace
        sample: Vec<String>,
    },
    /// A target was looked up in the registry
    TargetResolved {
        /// Target label
        label: String,
        /// The canonical key, if found
        canonical: Option<String>,
    },
    /// The run was deliberately skipped
    Skipped {
        /// Why
        reason: String,
    },
    /// A root directory is about to be scanned
    RootStarted {
        /// The root
        root: PathBuf,
        /// Whether it exists
        exists: bool,
    },
    /// A file was rewritten
    FileChanged {
        /// The file
        path: PathBuf,
        /// Rewrites applied to it
        rewrites: usize,
        /// Nothing was written
        dry_run: bool,
    },
    /// The run finished
    Finished {
        /// Final counters
        summary: RunSummary,
        /// Nothing was written
        dry_run: bool,
    },
    /// A non-fatal problem
    Warning {
        /// File concerned, if any
        path: Option<PathBuf>,
        /// What happened
        message: String,
    },
    /// A fatal problem
    Error {
        /// What happened
        message: String,
    },
}

/// Trait for run reporters.
pub trait Reporter {
    /// Report an event.
    fn report(&self, event: ReportEvent);
}

/// A reporter that discards all events.
#[derive(Debug, Default)]
pub struct NullReporter;

impl NullReporter {
    /// Create a new null reporter.
    pub fn new() -> Self {
        Self
    }
}

impl Reporter for NullReporter {
    fn report(&self, _event: ReportEvent) {}
}

/// Console reporter with optional colors.
pub struct ConsoleReporter {
    use_colors: bool,
    verbose: bool,
    output: Mutex<Box<dyn Write + Send>>,
}

impl std::fmt::Debug for ConsoleReporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConsoleReporter")
            .field("use_colors", &self.use_colors)
            .field("verbose", &self.verbose)
            .finish()
    }
}

impl ConsoleReporter {
    /// Reporter on stderr; colors only when stderr is a terminal.
    pub fn new() -> Self {
        Self {
            use_colors: atty::is(atty::Stream::Stderr),
            verbose: false,
            output: Mutex::new(Box::new(std::io::stderr())),
        }
    }

    /// Create a reporter that writes to a custom output, without colors.
    pub fn with_output<W: Write + Send + 'static>(output: W) -> Self {
        Self { use_colors: false, verbose: false, output: Mutex::new(Box::new(output)) }
    }

    /// Set verbose mode.
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    fn color(&self, text: &str, color: &str) -> String {
        if self.use_colors {
            format!("{}{}\x1b[0m", color, text)
        } else {
            text.to_string()
        }
    }

    fn green(&self, text: &str) -> String {
        self.color(text, "\x1b[32m")
    }

    fn yellow(&self, text: &str) -> String {
        self.color(text, "\x1b[33m")
    }

    fn red(&self, text: &str) -> String {
        self.color(text, "\x1b[31m")
    }

    fn tag(&self) -> String {
        self.color("[nodefix]", "\x1b[36m")
    }

    fn writeln(&self, line: &str) {
        if let Ok(mut output) = self.output.lock() {
            let _ = writeln!(output, "{} {}", self.tag(), line);
        }
    }
}

impl Default for ConsoleReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl Reporter for ConsoleReporter {
    fn report(&self, event: ReportEvent) {
        match event {
            ReportEvent::RegistryFound { origin, size, sample } => {
                self.writeln(&format!("registry from: {} ({} identifiers)", origin, size));
                if !sample.is_empty() {
                    self.writeln(&format!("sample: {} ...", sample.join(", ")));
                }
            }
            ReportEvent::TargetResolved { label, canonical } => match canonical {
                Some(canonical) => self.writeln(&format!("{} -> {}", label, self.green(&canonical))),
                None => self.writeln(&format!("{} -> {}", label, self.red("not found"))),
            },
            ReportEvent::Skipped { reason } => {
                self.writeln(&format!("{} {}", self.yellow("skip:"), reason));
            }
            ReportEvent::RootStarted { root, exists } => {
                if self.verbose {
                    if exists {
                        self.writeln(&format!("scanning {}", root.display()));
                    } else {
                        self.writeln(&format!("missing {}, skipped", root.display()));
                    }
                }
            }
            ReportEvent::FileChanged { path, rewrites, dry_run } => {
                let verb = if dry_run { "would patch" } else { "patched" };
                self.writeln(&format!(
                    "{} {} ({} rewrite{})",
                    self.green(verb),
                    path.display(),
                    rewrites,
                    if rewrites == 1 { "" } else { "s" }
                ));
            }
            ReportEvent::Finished { summary, dry_run } => {
                self.writeln(&format!(
                    "Done{}. scanned={}, changed={}, rewrites={}",
                    if dry_run { " (dry run)" } else { "" },
                    summary.scanned,
                    summary.changed,
                    summary.rewrites
                ));
            }
            ReportEvent::Warning { path, message } => {
                let prefix = match path {
                    Some(p) => format!("{}: ", p.display()),
                    None => String::new(),
                };
                self.writeln(&format!("{} {}{}", self.yellow("warning:"), prefix, message));
            }
            ReportEvent::Error { message } => {
                self.writeln(&format!("{} {}", self.red("error:"), message));
            }
        }
    }
}
