//! Slot Formatter - formatter selection for container-page rendering
//!
//! This library builds an immutable catalog of formatter definitions from
//! configuration input and selects the best-matching formatter for a
//! container type and pixel width.
//!
//! # Example
//!
//! ```rust
//! use slot_formatter::{compile, MapTemplateValidator};
//!
//! let validator = MapTemplateValidator::new().with_template("article/detail.ht");
//! let catalog = compile(
//!     r#"formatter detail [type: article, template: "article/detail.ht"]"#,
//!     "pages.cat",
//!     &validator,
//! )
//! .unwrap();
//!
//! let selected = catalog.configuration.formatter("article", 0).unwrap();
//! assert_eq!(selected.template, "article/detail.ht");
//! ```

pub mod error;
pub mod formatter;
pub mod manifest;
pub mod parser;
pub mod validator;

pub use error::ParseError;
pub use formatter::{
    Diagnostic, DiagnosticKind, Formatter, FormatterConfiguration, FormatterDecl, FormatterKind,
    PREVIEW_WIDTH, WILDCARD_TYPE,
};
pub use manifest::{Manifest, ManifestError};
pub use parser::{parse, Document};
pub use validator::{
    FsTemplateValidator, MapTemplateValidator, TemplateId, TemplateValidator, ValidateError,
};

use thiserror::Error;

/// Errors that can occur while loading a catalog
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Error during catalog parsing
    #[error("parse errors: {}", format_parse_errors(.0))]
    Parse(Vec<ParseError>),

    /// Error during manifest loading
    #[error("manifest error: {0}")]
    Manifest(#[from] ManifestError),
}

impl From<Vec<ParseError>> for CatalogError {
    fn from(errors: Vec<ParseError>) -> Self {
        CatalogError::Parse(errors)
    }
}

fn format_parse_errors(errors: &[ParseError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// A loaded catalog: the frozen configuration plus whatever construction
/// had to report
#[derive(Debug)]
pub struct Catalog {
    /// The frozen formatter configuration
    pub configuration: FormatterConfiguration,
    /// Non-fatal construction findings, in emission order
    pub diagnostics: Vec<Diagnostic>,
}

impl Catalog {
    /// Human-readable listing of the accepted formatters, in declaration
    /// order
    pub fn describe(&self) -> String {
        let formatters = self.configuration.formatters();
        if formatters.is_empty() {
            return "(no formatters)\n".to_string();
        }
        let mut out = String::new();
        for f in formatters {
            out.push_str(&format!("{}: {} -> {}", f.display_name(), f.kind, f.template));
            if f.preview {
                out.push_str(" (preview)");
            }
            out.push('\n');
        }
        out
    }
}

/// Compile catalog source into a frozen formatter configuration
///
/// Parsing is strict; construction is not. Syntax errors fail the compile,
/// while unresolvable templates and duplicate registrations only surface
/// as [`Diagnostic`] values on the returned catalog.
pub fn compile(
    source: &str,
    origin: &str,
    validator: &dyn TemplateValidator,
) -> Result<Catalog, CatalogError> {
    let doc = parse(source)?;

    let decls: Vec<FormatterDecl> = doc
        .formatters
        .into_iter()
        .map(|spanned| {
            let line = line_number(source, spanned.span.start);
            spanned.node.with_location(format!("{}:{}", origin, line))
        })
        .collect();

    let (configuration, diagnostics) = FormatterConfiguration::build(decls, validator);
    Ok(Catalog {
        configuration,
        diagnostics,
    })
}

/// Compile a TOML manifest into a frozen formatter configuration
pub fn compile_manifest(
    content: &str,
    origin: &str,
    validator: &dyn TemplateValidator,
) -> Result<Catalog, CatalogError> {
    let manifest = Manifest::from_str(content, origin)?;
    let (configuration, diagnostics) = FormatterConfiguration::build(manifest.formatters, validator);
    Ok(Catalog {
        configuration,
        diagnostics,
    })
}

/// 1-based line of a byte offset in `source`
fn line_number(source: &str, offset: usize) -> usize {
    let end = offset.min(source.len());
    source.as_bytes()[..end].iter().filter(|&&b| b == b'\n').count() + 1
}
