//! Construction diagnostics for formatter configurations
//!
//! Configuration construction never fails: declarations that cannot be
//! used are dropped and duplicates are overwritten, each reported as a
//! diagnostic for the caller to log or print.

use std::fmt;

use crate::validator::ValidateError;

use super::definition::{Formatter, FormatterDecl};

/// A non-fatal finding emitted while building a configuration
#[derive(Debug)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
}

/// Category of construction finding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// The declared render template is missing or of the wrong kind
    UnresolvableTemplate,
    /// Two declarations collide on the same type key or width bounds
    DuplicateFormatter,
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticKind::UnresolvableTemplate => write!(f, "unresolvable template"),
            DiagnosticKind::DuplicateFormatter => write!(f, "duplicate formatter"),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl Diagnostic {
    /// A declaration was dropped because its template failed validation
    pub(crate) fn unresolvable(decl: &FormatterDecl, err: &ValidateError) -> Self {
        let location = if decl.location.is_empty() {
            String::new()
        } else {
            format!(" (declared at {})", decl.location)
        };
        Self {
            kind: DiagnosticKind::UnresolvableTemplate,
            message: format!(
                "dropping formatter {}: {}{}",
                decl.display_name(),
                err,
                location
            ),
        }
    }

    /// A later declaration replaced an earlier one registered for the same
    /// type key or width bounds
    pub(crate) fn duplicate(key: &str, replaced: &Formatter, replacement: &Formatter) -> Self {
        let location = if replacement.location.is_empty() {
            String::new()
        } else {
            format!(" (declared at {})", replacement.location)
        };
        Self {
            kind: DiagnosticKind::DuplicateFormatter,
            message: format!(
                "{} replaces {} for {}{}",
                replacement.template, replaced.template, key, location
            ),
        }
    }
}
