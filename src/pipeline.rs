//! End-to-end runs: registry → alias table → document scan, and the
//! independent text substitution scan.

use crate::alias::{AliasTable, Resolution};
use crate::config::NodefixConfig;
use crate::patch::{scan, DocumentPatcher, PatchError, TextPatcher};
use crate::registry::{RegistryError, Resolver};
use crate::report::{ReportEvent, Reporter, RunSummary};
use std::path::Path;
use thiserror::Error;

/// Number of registry identifiers shown after resolution
const SAMPLE_SIZE: usize = 6;

/// Fatal run error
#[derive(Debug, Error)]
pub enum RunError {
    /// The registry could not be found anywhere
    #[error(transparent)]
    Registry(#[from] RegistryError),
    /// A changed file could not be written
    #[error(transparent)]
    Patch(#[from] PatchError),
    /// A text rule does not compile
    #[error("invalid text rule: {0}")]
    InvalidRule(#[from] regex::Error),
}

/// How a document run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// No target resolved; no document was touched
    Skipped,
    /// The scan ran to completion
    Completed(RunSummary),
}

/// Resolve the registry and every target, reporting each step.
pub fn resolve_targets(
    config: &NodefixConfig,
    reporter: &dyn Reporter,
) -> Result<Resolution, RegistryError> {
    let resolved = Resolver::from_config(&config.registry).resolve()?;

    let prefix = config
        .targets
        .first()
        .filter(|t| !t.namespace.is_empty())
        .map(|t| format!("{}.", t.namespace))
        .unwrap_or_default();
    reporter.report(ReportEvent::RegistryFound {
        origin: resolved.origin.to_string(),
        size: resolved.registry.len(),
        sample: resolved
            .registry
            .sample_with_prefix(&prefix, SAMPLE_SIZE)
            .into_iter()
            .map(str::to_string)
            .collect(),
    });

    let resolution = AliasTable::build(&resolved.registry, &config.targets);
    for outcome in &resolution.outcomes {
        reporter.report(ReportEvent::TargetResolved {
            label: outcome.label.clone(),
            canonical: outcome.canonical.clone(),
        });
    }
    Ok(resolution)
}

/// Canonicalize node identifiers in every workflow under the document roots.
pub fn patch_workflows(
    config: &NodefixConfig,
    dry_run: bool,
    reporter: &dyn Reporter,
) -> Result<RunOutcome, RunError> {
    let resolution = resolve_targets(config, reporter)?;
    if resolution.is_empty() {
        reporter.report(ReportEvent::Skipped {
            reason: "no canonical identifiers found".to_string(),
        });
        return Ok(RunOutcome::Skipped);
    }

    let patcher = DocumentPatcher::new(&resolution.table, &config.documents).with_dry_run(dry_run);
    let extensions = [config.documents.extension.clone()];
    let summary = scan(&patcher, &config.documents.roots, &extensions, reporter)?;

    reporter.report(ReportEvent::Finished { summary: summary.clone(), dry_run });
    Ok(RunOutcome::Completed(summary))
}

/// Apply the text rules to every matching file under `root`.
pub fn patch_text(
    config: &NodefixConfig,
    root: &Path,
    dry_run: bool,
    reporter: &dyn Reporter,
) -> Result<RunSummary, RunError> {
    let patcher = TextPatcher::new(&config.text.rules)?.with_dry_run(dry_run);
    let summary = scan(&patcher, &[root.to_path_buf()], &config.text.extensions, reporter)?;

    reporter.report(ReportEvent::Finished { summary: summary.clone(), dry_run });
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patch::backup_path;
    use crate::report::NullReporter;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    struct Fixture {
        _dir: TempDir,
        config: NodefixConfig,
        workflows: PathBuf,
    }

    /// A registry file installed under a root plus an empty workflow dir.
    fn fixture(mappings: &str) -> Fixture {
        let dir = TempDir::new().expect("should create temp dir");
        let install = dir.path().join("custom_nodes");
        let wrappers = install.join("comfyui_controlnet_aux");
        fs::create_dir_all(&wrappers).expect("mkdir");
        fs::write(
            wrappers.join("node_wrappers.json"),
            format!(r#"{{"NODE_CLASS_MAPPINGS": {}}}"#, mappings),
        )
        .expect("write registry");
        let workflows = dir.path().join("workflows");
        fs::create_dir_all(&workflows).expect("mkdir");

        let mut config = NodefixConfig::default();
        config.registry.modules.clear();
        config.registry.roots = vec![install];
        config.registry.file = PathBuf::from("comfyui_controlnet_aux/node_wrappers.json");
        config.documents.roots = vec![dir.path().join("missing"), workflows.clone()];

        Fixture { _dir: dir, config, workflows }
    }

    fn node_doc(class_type: &str) -> String {
        format!(r#"{{"nodes": [{{"id": 1, "class_type": "{}", "width": 512}}]}}"#, class_type)
    }

    #[test]
    fn test_scenario_rewrite_with_backup() {
        let fx = fixture(r#"{"pkg.OpenPosePreprocessor": "impl1"}"#);
        let wf = fx.workflows.join("pose.json");
        let original = node_doc("controlnet_aux.openposepreprocessor");
        fs::write(&wf, &original).expect("write");

        let outcome = patch_workflows(&fx.config, false, &NullReporter::new()).expect("run");
        let RunOutcome::Completed(summary) = outcome else { panic!("run should complete") };
        assert_eq!(summary.scanned, 1);
        assert_eq!(summary.changed, 1);

        let text = fs::read_to_string(&wf).expect("read");
        assert!(text.contains("\"class_type\": \"pkg.OpenPosePreprocessor\""));
        assert!(text.contains("\"width\": 512"));
        assert_eq!(fs::read_to_string(backup_path(&wf, ".bak")).expect("backup"), original);
    }

    #[test]
    fn test_empty_registry_skips_run() {
        let fx = fixture("{}");
        let wf = fx.workflows.join("pose.json");
        fs::write(&wf, node_doc("controlnet_aux.openposepreprocessor")).expect("write");

        let outcome = patch_workflows(&fx.config, false, &NullReporter::new()).expect("run");
        assert_eq!(outcome, RunOutcome::Skipped);
        assert!(!backup_path(&wf, ".bak").exists());
    }

    #[test]
    fn test_missing_registry_is_fatal() {
        let mut fx = fixture("{}");
        fx.config.registry.roots = vec![fx.workflows.join("nowhere")];
        let wf = fx.workflows.join("pose.json");
        let original = node_doc("controlnet_aux.openposepreprocessor");
        fs::write(&wf, &original).expect("write");

        let result = patch_workflows(&fx.config, false, &NullReporter::new());
        assert!(matches!(result, Err(RunError::Registry(_))));
        assert_eq!(fs::read_to_string(&wf).expect("read"), original);
    }

    #[test]
    fn test_no_target_resolves_skips_run() {
        let fx = fixture(r#"{"controlnet_aux.CannyEdgePreprocessor": "Canny"}"#);
        let wf = fx.workflows.join("pose.json");
        let original = node_doc("controlnet_aux.openposepreprocessor");
        fs::write(&wf, &original).expect("write");

        let outcome = patch_workflows(&fx.config, false, &NullReporter::new()).expect("run");
        assert_eq!(outcome, RunOutcome::Skipped);
        assert_eq!(fs::read_to_string(&wf).expect("read"), original);
        assert!(!backup_path(&wf, ".bak").exists());
    }

    #[test]
    fn test_partial_resolution_patches_resolved_target_only() {
        let fx = fixture(r#"{"controlnet_aux.DWPosePreprocessor": "DW"}"#);
        let open = fx.workflows.join("open.json");
        let dw = fx.workflows.join("dw.json");
        let open_content = node_doc("controlnet_aux.OpenposePreprocessor");
        fs::write(&open, &open_content).expect("write");
        fs::write(&dw, node_doc("controlnet_aux.DwPosePreprocessor")).expect("write");

        let outcome = patch_workflows(&fx.config, false, &NullReporter::new()).expect("run");
        let RunOutcome::Completed(summary) = outcome else { panic!("run should complete") };
        assert_eq!(summary.scanned, 2);
        assert_eq!(summary.changed_files, vec![dw.clone()]);
        assert_eq!(fs::read_to_string(&open).expect("read"), open_content);
        assert!(fs::read_to_string(&dw).expect("read").contains("controlnet_aux.DWPosePreprocessor"));
    }

    #[test]
    fn test_array_document_is_scanned_not_changed() {
        let fx = fixture(r#"{"controlnet_aux.OpenPosePreprocessor": "OP"}"#);
        fs::write(fx.workflows.join("list.json"), r#"[{"class_type": "x"}]"#).expect("write");

        let outcome = patch_workflows(&fx.config, false, &NullReporter::new()).expect("run");
        let RunOutcome::Completed(summary) = outcome else { panic!("run should complete") };
        assert_eq!((summary.scanned, summary.changed), (1, 0));
    }

    #[test]
    fn test_patch_text_counts_files() {
        let dir = TempDir::new().expect("should create temp dir");
        fs::create_dir_all(dir.path().join("pkg")).expect("mkdir");
        fs::write(dir.path().join("pkg/a.py"), "enable_nsfw: Optional[bool] = None\n")
            .expect("write");
        fs::write(dir.path().join("b.py"), "print('hi')\n").expect("write");

        let summary = patch_text(&NodefixConfig::default(), dir.path(), false, &NullReporter::new())
            .expect("run");
        assert_eq!(summary.scanned, 2);
        assert_eq!(summary.changed, 1);
    }
}
