//! Built-in canonicalization targets.
//!
//! Pure data: each target names the logical identifier to look up in the
//! registry and the historical spellings that should be rewritten to it.

use super::AliasTarget;

struct BuiltinTarget {
    label: &'static str,
    namespace: &'static str,
    suffix: &'static str,
    variants: &'static [&'static str],
}

const BUILTIN_TARGETS: &[BuiltinTarget] = &[
    BuiltinTarget {
        label: "OpenPose",
        namespace: "controlnet_aux",
        suffix: "OpenPosePreprocessor",
        variants: &[
            "controlnet_aux.OpenposePreprocessor",
            "controlnet_aux.OpenPosePreprocessor",
            "controlnet_aux.openposepreprocessor",
            "controlnet_aux.Openposepreprocessor",
            "controlnet_aux.OpenposePreProcessor",
        ],
    },
    BuiltinTarget {
        label: "DWPose",
        namespace: "controlnet_aux",
        suffix: "DWPosePreprocessor",
        variants: &[
            "controlnet_aux.DWposePreprocessor",
            "controlnet_aux.DWPosePreprocessor",
            "controlnet_aux.dwposepreprocessor",
            "controlnet_aux.DwposePreprocessor",
            "controlnet_aux.DwPosePreprocessor",
        ],
    },
];

/// The built-in OpenPose and DWPose targets.
pub fn builtin_targets() -> Vec<AliasTarget> {
    BUILTIN_TARGETS
        .iter()
        .map(|t| AliasTarget {
            label: t.label.to_string(),
            namespace: t.namespace.to_string(),
            suffix: t.suffix.to_string(),
            variants: t.variants.iter().map(|v| v.to_string()).collect(),
        })
        .collect()
}
