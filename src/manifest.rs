//! TOML manifest support for formatter catalogs
//!
//! Next to the catalog language, formatter declarations can be loaded from
//! a TOML manifest, the form used when a site configuration carries them.
//! Both inputs produce the same declarations and flow through the same
//! configuration construction.

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::formatter::{FormatterDecl, FormatterKind};

/// Errors that can occur when loading or parsing manifests
#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("Failed to read manifest file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse manifest TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Invalid formatter entry #{index}: {reason}")]
    Entry { index: usize, reason: String },
}

/// A loaded formatter manifest
#[derive(Debug, Clone)]
pub struct Manifest {
    /// Optional name for the manifest
    pub name: Option<String>,
    /// Optional description
    pub description: Option<String>,
    /// Declarations in manifest order
    pub formatters: Vec<FormatterDecl>,
}

/// TOML structure for deserializing manifests
#[derive(Deserialize)]
struct TomlManifest {
    metadata: Option<TomlMetadata>,
    #[serde(default)]
    formatter: Vec<TomlFormatter>,
}

#[derive(Deserialize)]
struct TomlMetadata {
    name: Option<String>,
    description: Option<String>,
}

#[derive(Deserialize)]
struct TomlFormatter {
    name: Option<String>,
    #[serde(rename = "type")]
    container_type: Option<String>,
    #[serde(rename = "min-width")]
    min_width: Option<i32>,
    #[serde(rename = "max-width")]
    max_width: Option<i32>,
    template: String,
    #[serde(default)]
    preview: bool,
}

impl Manifest {
    /// Load a manifest from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ManifestError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content, &path.display().to_string())
    }

    /// Load a manifest from a TOML string; `origin` names the source in
    /// declaration locations.
    pub fn from_str(content: &str, origin: &str) -> Result<Self, ManifestError> {
        let parsed: TomlManifest = toml::from_str(content)?;

        let mut formatters = Vec::with_capacity(parsed.formatter.len());
        for (i, entry) in parsed.formatter.into_iter().enumerate() {
            let index = i + 1;
            formatters.push(convert_entry(entry, index, origin)?);
        }

        Ok(Manifest {
            name: parsed.metadata.as_ref().and_then(|m| m.name.clone()),
            description: parsed.metadata.as_ref().and_then(|m| m.description.clone()),
            formatters,
        })
    }
}

fn convert_entry(
    entry: TomlFormatter,
    index: usize,
    origin: &str,
) -> Result<FormatterDecl, ManifestError> {
    // An entry carrying both a type and width bounds binds by type, the
    // same rule the catalog language applies.
    let kind = if let Some(container_type) = entry.container_type {
        FormatterKind::Type { container_type }
    } else if let Some(min_width) = entry.min_width {
        FormatterKind::Width {
            min_width,
            max_width: entry.max_width.unwrap_or(i32::MAX),
        }
    } else if entry.max_width.is_some() {
        return Err(ManifestError::Entry {
            index,
            reason: "max-width given without min-width".to_string(),
        });
    } else {
        return Err(ManifestError::Entry {
            index,
            reason: "needs a type or a width range".to_string(),
        });
    };

    Ok(FormatterDecl {
        name: entry.name,
        kind,
        template: entry.template,
        template_id: None,
        preview: entry.preview,
        location: format!("{}: formatter #{}", origin, index),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_manifest_with_metadata() {
        let toml_str = r#"
[metadata]
name = "site formatters"
description = "formatters for the default site"

[[formatter]]
name = "article_detail"
type = "article"
template = "article/detail.ht"

[[formatter]]
min-width = 100
max-width = 300
template = "teaser/narrow.ht"
"#;
        let manifest = Manifest::from_str(toml_str, "formatters.toml").expect("Should parse");

        assert_eq!(manifest.name.as_deref(), Some("site formatters"));
        assert_eq!(
            manifest.description.as_deref(),
            Some("formatters for the default site")
        );
        assert_eq!(manifest.formatters.len(), 2);

        let first = &manifest.formatters[0];
        assert_eq!(first.name.as_deref(), Some("article_detail"));
        assert_eq!(first.kind.container_type(), Some("article"));
        assert_eq!(first.location, "formatters.toml: formatter #1");

        let second = &manifest.formatters[1];
        assert_eq!(second.kind.width_bounds(), Some((100, 300)));
        assert_eq!(second.location, "formatters.toml: formatter #2");
    }

    #[test]
    fn test_parse_manifest_without_metadata() {
        let toml_str = r#"
[[formatter]]
type = "article"
template = "article/detail.ht"
preview = true
"#;
        let manifest = Manifest::from_str(toml_str, "formatters.toml").expect("Should parse");
        assert_eq!(manifest.name, None);
        assert!(manifest.formatters[0].preview);
    }

    #[test]
    fn test_open_ended_width_entry() {
        let toml_str = r#"
[[formatter]]
min-width = 500
template = "wide.ht"
"#;
        let manifest = Manifest::from_str(toml_str, "formatters.toml").expect("Should parse");
        assert_eq!(
            manifest.formatters[0].kind.width_bounds(),
            Some((500, i32::MAX))
        );
    }

    #[test]
    fn test_empty_manifest() {
        let manifest = Manifest::from_str("", "formatters.toml").expect("Should parse");
        assert!(manifest.formatters.is_empty());
    }

    #[test]
    fn test_entry_without_binding_is_an_error() {
        let toml_str = r#"
[[formatter]]
template = "a.ht"
"#;
        let result = Manifest::from_str(toml_str, "formatters.toml");
        assert!(matches!(
            result,
            Err(ManifestError::Entry { index: 1, .. })
        ));
    }

    #[test]
    fn test_max_width_without_min_width_is_an_error() {
        let toml_str = r#"
[[formatter]]
type = "article"
template = "a.ht"

[[formatter]]
max-width = 300
template = "b.ht"
"#;
        let result = Manifest::from_str(toml_str, "formatters.toml");
        match result {
            Err(ManifestError::Entry { index, reason }) => {
                assert_eq!(index, 2);
                assert!(reason.contains("min-width"));
            }
            other => panic!("Expected entry error, got {:?}", other.map(|m| m.formatters)),
        }
    }

    #[test]
    fn test_missing_template_is_a_parse_error() {
        let toml_str = r#"
[[formatter]]
type = "article"
"#;
        let result = Manifest::from_str(toml_str, "formatters.toml");
        assert!(matches!(result, Err(ManifestError::ParseError(_))));
    }

    #[test]
    fn test_invalid_toml_error() {
        let invalid = "this is not valid toml {{{{";
        let result = Manifest::from_str(invalid, "formatters.toml");
        assert!(matches!(result, Err(ManifestError::ParseError(_))));
    }
}
