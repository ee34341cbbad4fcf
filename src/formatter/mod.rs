//! Formatter definitions, configuration construction, and selection

pub mod configuration;
pub mod definition;
pub mod diagnostic;

pub use configuration::{FormatterConfiguration, FormatterSet};
pub use definition::{Formatter, FormatterDecl, FormatterKind, PREVIEW_WIDTH, WILDCARD_TYPE};
pub use diagnostic::{Diagnostic, DiagnosticKind};
