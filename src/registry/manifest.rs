//! Static registry manifest loading.
//!
//! A manifest exposes the identifier mapping under a named attribute. Python
//! sources are scanned for the dict literal (and subscript assignments)
//! bound to that attribute; nothing is ever executed.

use super::Registry;
use regex::Regex;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Manifest loading error
#[derive(Debug, Error)]
pub enum ManifestError {
    /// File I/O error
    #[error("cannot read manifest: {0}")]
    Io(#[from] std::io::Error),
    /// JSON manifest is malformed
    #[error("invalid JSON manifest: {0}")]
    Json(#[from] serde_json::Error),
    /// TOML manifest is malformed
    #[error("invalid TOML manifest: {0}")]
    Toml(#[from] toml::de::Error),
    /// Extension is not one of json, toml, py
    #[error("unsupported manifest format '{0}'")]
    UnsupportedFormat(String),
    /// The mapping attribute is not present
    #[error("attribute '{0}' not found")]
    MissingAttribute(String),
    /// The attribute is present but is not a mapping
    #[error("attribute '{0}' is not a mapping")]
    NotAMapping(String),
}

/// Supported manifest formats, in module lookup order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManifestFormat {
    /// `{"ATTR": {"name": "handle"}}`
    Json,
    /// `[ATTR]` table
    Toml,
    /// Python source with an `ATTR = {...}` literal
    Python,
}

impl ManifestFormat {
    /// All formats, in the order module lookup tries them.
    pub const ALL: [ManifestFormat; 3] =
        [ManifestFormat::Json, ManifestFormat::Toml, ManifestFormat::Python];

    /// File extension without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            ManifestFormat::Json => "json",
            ManifestFormat::Toml => "toml",
            ManifestFormat::Python => "py",
        }
    }

    /// Detect the format from a file extension.
    pub fn from_path(path: &Path) -> Result<Self, ManifestError> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or_default();
        Self::ALL
            .into_iter()
            .find(|f| f.extension().eq_ignore_ascii_case(ext))
            .ok_or_else(|| ManifestError::UnsupportedFormat(ext.to_string()))
    }
}

/// Load the mapping bound to `attribute` from a manifest file.
pub fn load_manifest(path: &Path, attribute: &str) -> Result<Registry, ManifestError> {
    let format = ManifestFormat::from_path(path)?;
    let content = fs::read_to_string(path)?;
    parse_manifest(&content, format, attribute)
}

/// Parse manifest content of a known format.
pub fn parse_manifest(
    content: &str,
    format: ManifestFormat,
    attribute: &str,
) -> Result<Registry, ManifestError> {
    match format {
        ManifestFormat::Json => parse_json(content, attribute),
        ManifestFormat::Toml => parse_toml(content, attribute),
        ManifestFormat::Python => parse_python(content, attribute),
    }
}

fn parse_json(content: &str, attribute: &str) -> Result<Registry, ManifestError> {
    let value: serde_json::Value = serde_json::from_str(content)?;
    let mapping = value
        .get(attribute)
        .ok_or_else(|| ManifestError::MissingAttribute(attribute.to_string()))?
        .as_object()
        .ok_or_else(|| ManifestError::NotAMapping(attribute.to_string()))?;

    Ok(mapping
        .iter()
        .map(|(name, handle)| match handle {
            serde_json::Value::String(s) => (name.clone(), s.clone()),
            other => (name.clone(), other.to_string()),
        })
        .collect())
}

fn parse_toml(content: &str, attribute: &str) -> Result<Registry, ManifestError> {
    let table: toml::Table = toml::from_str(content)?;
    let mapping = table
        .get(attribute)
        .ok_or_else(|| ManifestError::MissingAttribute(attribute.to_string()))?
        .as_table()
        .ok_or_else(|| ManifestError::NotAMapping(attribute.to_string()))?;

    Ok(mapping
        .iter()
        .map(|(name, handle)| match handle {
            toml::Value::String(s) => (name.clone(), s.clone()),
            other => (name.clone(), other.to_string()),
        })
        .collect())
}

fn parse_python(content: &str, attribute: &str) -> Result<Registry, ManifestError> {
    let attr = regex::escape(attribute);
    let regex_err = |_| ManifestError::MissingAttribute(attribute.to_string());

    // `ATTR = {` or `ATTR: Dict[str, Any] = {`
    let literal_start = Regex::new(&format!(r"(?m)^[ \t]*{}[ \t]*(?::[^=\n]*)?=[ \t]*\{{", attr))
        .map_err(regex_err)?;
    // `ATTR["name"] = Handle`
    let subscript = Regex::new(&format!(
        r#"(?m)^[ \t]*{}\[\s*(?:"([^"\\]*)"|'([^'\\]*)')\s*\]\s*=\s*([^\n#]+)"#,
        attr
    ))
    .map_err(regex_err)?;
    // one top-level `"name": Handle` item
    let entry = Regex::new(r#"(?s)^\s*(?:"([^"\\]*)"|'([^'\\]*)')\s*:\s*(.+?)\s*$"#)
        .map_err(regex_err)?;

    let mut found = false;
    let mut registry = Registry::new();

    if let Some(m) = literal_start.find(content) {
        let body = dict_body(&content[m.end()..])
            .ok_or_else(|| ManifestError::NotAMapping(attribute.to_string()))?;
        found = true;
        for caps in top_level_items(&body).into_iter().filter_map(|item| entry.captures(item)) {
            let name = caps.get(1).or_else(|| caps.get(2)).map_or("", |m| m.as_str());
            let handle = caps.get(3).map_or("", |m| m.as_str().trim());
            registry.insert(name, handle);
        }
    }

    for caps in subscript.captures_iter(content) {
        found = true;
        let name = caps.get(1).or_else(|| caps.get(2)).map_or("", |m| m.as_str());
        let handle = caps.get(3).map_or("", |m| m.as_str().trim());
        registry.insert(name, handle);
    }

    if found {
        Ok(registry)
    } else {
        Err(ManifestError::MissingAttribute(attribute.to_string()))
    }
}

/// Text of a dict literal up to its closing brace, with comments removed.
///
/// `rest` starts just after the opening brace. Returns `None` when the
/// literal is never closed.
fn dict_body(rest: &str) -> Option<String> {
    let mut body = String::new();
    let mut depth = 1usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut chars = rest.chars();

    while let Some(c) = chars.next() {
        if let Some(q) = quote {
            body.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }

        match c {
            '"' | '\'' => {
                quote = Some(c);
                body.push(c);
            }
            '#' => {
                // skip to end of line
                for c in chars.by_ref() {
                    if c == '\n' {
                        body.push('\n');
                        break;
                    }
                }
            }
            '{' => {
                depth += 1;
                body.push(c);
            }
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(body);
                }
                body.push(c);
            }
            _ => body.push(c),
        }
    }

    None
}

/// Split a dict body at the commas that are not nested in brackets or strings.
fn top_level_items(body: &str) -> Vec<&str> {
    let mut items = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut start = 0;

    for (i, c) in body.char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }

        match c {
            '"' | '\'' => quote = Some(c),
            '{' | '[' | '(' => depth += 1,
            '}' | ']' | ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                items.push(&body[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    items.push(&body[start..]);

    items
}

#[cfg(test)]
mod tests {
    use super::*;

    const ATTR: &str = "NODE_CLASS_MAPPINGS";

    #[test]
    fn test_json_manifest() {
        let registry = parse_manifest(
            r#"{"NODE_CLASS_MAPPINGS": {"pkg.A": "A", "pkg.B": 2}, "other": 1}"#,
            ManifestFormat::Json,
            ATTR,
        )
        .expect("should parse");
        assert_eq!(registry.get("pkg.A"), Some("A"));
        assert_eq!(registry.get("pkg.B"), Some("2"));
    }

    #[test]
    fn test_json_attribute_errors() {
        assert!(matches!(
            parse_manifest(r#"{"x": {}}"#, ManifestFormat::Json, ATTR),
            Err(ManifestError::MissingAttribute(_))
        ));
        assert!(matches!(
            parse_manifest(r#"{"NODE_CLASS_MAPPINGS": []}"#, ManifestFormat::Json, ATTR),
            Err(ManifestError::NotAMapping(_))
        ));
    }

    #[test]
    fn test_toml_manifest() {
        let registry = parse_manifest(
            "[NODE_CLASS_MAPPINGS]\n\"controlnet_aux.OpenPosePreprocessor\" = \"OpenPose\"\n",
            ManifestFormat::Toml,
            ATTR,
        )
        .expect("should parse");
        assert_eq!(registry.get("controlnet_aux.OpenPosePreprocessor"), Some("OpenPose"));
    }

    #[test]
    fn test_python_dict_literal() {
        let source = r#"
import os

NODE_CLASS_MAPPINGS = {
    # pose estimators
    "controlnet_aux.OpenPosePreprocessor": OpenPose_Preprocessor,
    'controlnet_aux.DWPreprocessor': DWPose_Preprocessor,  # the "fast" one
    "nested": {"a": 1, "b": Wrapper(x, y)},
    "pkg.Last": Last
}

NODE_DISPLAY_NAME_MAPPINGS = {"x": "y"}
"#;
        let registry = parse_manifest(source, ManifestFormat::Python, ATTR).expect("should parse");
        assert_eq!(
            registry.get("controlnet_aux.OpenPosePreprocessor"),
            Some("OpenPose_Preprocessor")
        );
        assert_eq!(registry.get("controlnet_aux.DWPreprocessor"), Some("DWPose_Preprocessor"));
        assert!(!registry.contains("x"));
        assert_eq!(registry.get("nested"), Some(r#"{"a": 1, "b": Wrapper(x, y)}"#));
        assert!(!registry.contains("a"));
        assert!(!registry.contains("b"));
        assert_eq!(registry.get("pkg.Last"), Some("Last"));
        assert_eq!(registry.len(), 4);
    }

    #[test]
    fn test_python_subscript_assignments() {
        let source = "NODE_CLASS_MAPPINGS: dict = {}\nNODE_CLASS_MAPPINGS[\"pkg.Late\"] = Late\n";
        let registry = parse_manifest(source, ManifestFormat::Python, ATTR).expect("should parse");
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("pkg.Late"), Some("Late"));
    }

    #[test]
    fn test_python_without_attribute() {
        assert!(matches!(
            parse_manifest("OTHER = {}\n", ManifestFormat::Python, ATTR),
            Err(ManifestError::MissingAttribute(_))
        ));
    }

    #[test]
    fn test_python_unclosed_literal() {
        assert!(matches!(
            parse_manifest("NODE_CLASS_MAPPINGS = {\n \"a\": A,\n", ManifestFormat::Python, ATTR),
            Err(ManifestError::NotAMapping(_))
        ));
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(
            ManifestFormat::from_path(Path::new("a/b.PY")).expect("py"),
            ManifestFormat::Python
        );
        assert!(matches!(
            ManifestFormat::from_path(Path::new("a/b.yaml")),
            Err(ManifestError::UnsupportedFormat(_))
        ));
    }
}
