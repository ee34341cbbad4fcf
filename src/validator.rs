//! Render-template validation
//!
//! Construction of a formatter configuration checks every declared template
//! path against a [`TemplateValidator`] before the formatter is accepted.
//! The filesystem implementation resolves paths against a template root and
//! accepts files by extension; the map implementation backs tests and
//! embedded catalogs where no filesystem is involved.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Stable identifier of a validated render template
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TemplateId(String);

impl TemplateId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TemplateId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Errors signalled by template validation
#[derive(Debug, Error)]
pub enum ValidateError {
    /// No template exists at the declared path
    #[error("template not found: {path}")]
    NotFound { path: String },

    /// Something exists at the path, but it is not a render template
    #[error("not a render template: {path}")]
    WrongKind { path: String },
}

/// Checks that a declared render-template path refers to an existing
/// template of the accepted kind, and returns its stable identifier.
///
/// Validation failures are never fatal to configuration construction; the
/// declaration is dropped with a diagnostic instead.
pub trait TemplateValidator {
    fn validate(&self, path: &str) -> Result<TemplateId, ValidateError>;
}

/// Filesystem-backed validator: templates live under a root directory and
/// are recognized by file extension.
#[derive(Debug, Clone)]
pub struct FsTemplateValidator {
    root: PathBuf,
    extensions: Vec<String>,
}

impl FsTemplateValidator {
    /// Create a validator rooted at the given template directory
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            extensions: vec!["ht".to_string(), "tpl".to_string()],
        }
    }

    /// Replace the accepted template file extensions
    pub fn with_extensions(mut self, extensions: Vec<String>) -> Self {
        self.extensions = extensions;
        self
    }

    /// Resolve a declared path against the template root
    pub fn resolve_path(&self, declared: &str) -> PathBuf {
        self.root.join(declared)
    }

    fn is_template(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map_or(false, |ext| self.extensions.iter().any(|e| e == ext))
    }
}

impl TemplateValidator for FsTemplateValidator {
    fn validate(&self, path: &str) -> Result<TemplateId, ValidateError> {
        let full = self.resolve_path(path);
        if !full.is_file() {
            return Err(ValidateError::NotFound {
                path: path.to_string(),
            });
        }
        if !self.is_template(&full) {
            return Err(ValidateError::WrongKind {
                path: path.to_string(),
            });
        }
        // Canonical form keeps the id stable across repeated validation.
        let canonical = full.canonicalize().unwrap_or(full);
        Ok(TemplateId::new(canonical.to_string_lossy().into_owned()))
    }
}

/// In-memory validator over a fixed set of known template paths
#[derive(Debug, Clone, Default)]
pub struct MapTemplateValidator {
    templates: HashMap<String, TemplateId>,
}

impl MapTemplateValidator {
    /// Create an empty validator (every path fails validation)
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a known template path; its id is the path itself
    pub fn with_template(mut self, path: impl Into<String>) -> Self {
        let path = path.into();
        self.templates.insert(path.clone(), TemplateId::new(path));
        self
    }

    /// Register a known template path with an explicit id
    pub fn with_template_id(mut self, path: impl Into<String>, id: TemplateId) -> Self {
        self.templates.insert(path.into(), id);
        self
    }
}

impl TemplateValidator for MapTemplateValidator {
    fn validate(&self, path: &str) -> Result<TemplateId, ValidateError> {
        self.templates
            .get(path)
            .cloned()
            .ok_or_else(|| ValidateError::NotFound {
                path: path.to_string(),
            })
    }
}
