//! Immutable formatter configurations and the selection queries over them
//!
//! A configuration is built once from a list of declarations, validated and
//! compacted during construction, then frozen. All queries are read-only;
//! the only state computed after construction is the memoized preview
//! result.

use std::sync::OnceLock;

use indexmap::IndexMap;

use crate::validator::TemplateValidator;

use super::definition::{Formatter, FormatterDecl, FormatterKind, PREVIEW_WIDTH, WILDCARD_TYPE};
use super::diagnostic::Diagnostic;

/// A frozen formatter configuration
///
/// Built from configuration input with [`FormatterConfiguration::build`];
/// empty input yields the `Empty` case, which callers must treat as "has
/// formatters" even though no query ever matches (see
/// [`has_formatters`](FormatterConfiguration::has_formatters)).
#[derive(Debug)]
pub enum FormatterConfiguration {
    /// Built from empty input; never matches anything
    Empty,
    /// Built from at least one declaration
    Populated(FormatterSet),
}

/// The derived collections of a populated configuration
#[derive(Debug)]
pub struct FormatterSet {
    /// Every accepted formatter, in declaration order
    all: Vec<Formatter>,
    /// Winning type-bound formatter per container type
    by_type: IndexMap<String, Formatter>,
    /// Width-bound formatters, in declaration order
    by_width: Vec<Formatter>,
    /// Memoized preview selection; a `None` result is memoized too
    preview: OnceLock<Option<Formatter>>,
}

impl FormatterConfiguration {
    /// Build a configuration from raw declarations.
    ///
    /// Each declaration's template path is resolved through `validator`
    /// unless it already carries a resolved id; declarations that fail
    /// validation are dropped. Later declarations overwrite earlier ones
    /// registered for the same container type or the same width bounds.
    /// Every drop and overwrite is reported as a [`Diagnostic`];
    /// construction itself never fails.
    pub fn build(
        decls: Vec<FormatterDecl>,
        validator: &dyn TemplateValidator,
    ) -> (Self, Vec<Diagnostic>) {
        if decls.is_empty() {
            return (Self::Empty, Vec::new());
        }

        let mut diagnostics = Vec::new();
        let mut all = Vec::new();
        let mut by_type: IndexMap<String, Formatter> = IndexMap::new();
        let mut by_width: Vec<Formatter> = Vec::new();

        for decl in decls {
            let template_id = match &decl.template_id {
                Some(id) => id.clone(),
                None => match validator.validate(&decl.template) {
                    Ok(id) => id,
                    Err(err) => {
                        diagnostics.push(Diagnostic::unresolvable(&decl, &err));
                        continue;
                    }
                },
            };

            let formatter = Formatter {
                name: decl.name,
                kind: decl.kind,
                template: decl.template,
                template_id,
                preview: decl.preview,
                location: decl.location,
            };

            match &formatter.kind {
                FormatterKind::Type { container_type } => {
                    let key = container_type.clone();
                    if let Some(replaced) = by_type.insert(key.clone(), formatter.clone()) {
                        diagnostics.push(Diagnostic::duplicate(&key, &replaced, &formatter));
                    }
                }
                FormatterKind::Width { min_width, .. } => {
                    // Value-equal bounds replace the earlier entry, so the
                    // newcomer keeps last-wins semantics but moves to the
                    // end of the scan order.
                    if let Some(old) = by_width.iter().rposition(|f| f.kind == formatter.kind) {
                        let replaced = by_width.remove(old);
                        let key = min_width.to_string();
                        diagnostics.push(Diagnostic::duplicate(&key, &replaced, &formatter));
                    }
                    by_width.push(formatter.clone());
                }
            }
            all.push(formatter);
        }

        let set = FormatterSet {
            all,
            by_type,
            by_width,
            preview: OnceLock::new(),
        };
        (Self::Populated(set), diagnostics)
    }

    /// Select the matching formatter for the given container type and width.
    ///
    /// A type-map entry for `container_type` wins unconditionally. Only
    /// when no type matches and `container_width` is positive are the
    /// width-bound formatters scanned; among the ranges containing the
    /// width, the greatest lower bound wins, ties going to the earliest
    /// declaration. Querying the wildcard type selects the preview
    /// formatter.
    pub fn formatter(&self, container_type: &str, container_width: i32) -> Option<&Formatter> {
        match self {
            Self::Empty => None,
            Self::Populated(set) => {
                if container_type == WILDCARD_TYPE {
                    return self.preview_formatter();
                }
                set.match_formatter(container_type, container_width)
            }
        }
    }

    /// The formatter used for preview rendering, if any.
    ///
    /// Computed at most once per configuration: a wildcard-type entry or a
    /// width formatter covering the preview width wins; failing that, a
    /// width formatter whose range starts at or beyond the preview width
    /// (the preview pane scrolls, so wider content still fits); failing
    /// that, the first registered type formatter. A `None` outcome is
    /// memoized like any other.
    pub fn preview_formatter(&self) -> Option<&Formatter> {
        match self {
            Self::Empty => None,
            Self::Populated(set) => set
                .preview
                .get_or_init(|| set.compute_preview().cloned())
                .as_ref(),
        }
    }

    /// Whether a formatter matches the given container type and width
    pub fn has_formatter(&self, container_type: &str, container_width: i32) -> bool {
        self.formatter(container_type, container_width).is_some()
    }

    /// Whether this configuration has formatters at all.
    ///
    /// The empty configuration reports `true` here; callers depend on that
    /// answer even though none of its queries ever match.
    pub fn has_formatters(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Populated(set) => !set.by_type.is_empty() || !set.by_width.is_empty(),
        }
    }

    /// Every accepted formatter, in declaration order
    pub fn formatters(&self) -> &[Formatter] {
        match self {
            Self::Empty => &[],
            Self::Populated(set) => &set.all,
        }
    }

    /// Whether this is the empty configuration
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }
}

impl FormatterSet {
    /// Type lookup with width fallback; no wildcard delegation
    fn match_formatter(&self, container_type: &str, container_width: i32) -> Option<&Formatter> {
        let mut result = self.by_type.get(container_type);
        if result.is_none() && container_width > 0 {
            let mut best: Option<(&Formatter, i32)> = None;
            for f in &self.by_width {
                let Some((min, max)) = f.kind.width_bounds() else {
                    continue;
                };
                if min <= container_width
                    && container_width <= max
                    && best.map_or(true, |(_, best_min)| best_min < min)
                {
                    best = Some((f, min));
                }
            }
            result = best.map(|(f, _)| f);
        }
        result
    }

    fn compute_preview(&self) -> Option<&Formatter> {
        let mut result = self.match_formatter(WILDCARD_TYPE, PREVIEW_WIDTH);
        if result.is_none() && !self.by_width.is_empty() {
            // No range covers the preview width from below; accept ranges
            // starting at or beyond it instead.
            let mut best: Option<(&Formatter, i32)> = None;
            for f in &self.by_width {
                let Some((min, max)) = f.kind.width_bounds() else {
                    continue;
                };
                if min >= PREVIEW_WIDTH
                    && PREVIEW_WIDTH <= max
                    && best.map_or(true, |(_, best_min)| best_min < min)
                {
                    best = Some((f, min));
                }
            }
            result = best.map(|(f, _)| f);
        }
        if result.is_none() {
            result = self.by_type.values().next();
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validator::{MapTemplateValidator, TemplateId};
    use pretty_assertions::assert_eq;

    fn accepting(paths: &[&str]) -> MapTemplateValidator {
        paths
            .iter()
            .fold(MapTemplateValidator::new(), |v, p| v.with_template(*p))
    }

    fn build(
        decls: Vec<FormatterDecl>,
        validator: &MapTemplateValidator,
    ) -> (FormatterConfiguration, Vec<Diagnostic>) {
        FormatterConfiguration::build(decls, validator)
    }

    #[test]
    fn test_empty_input_builds_empty_configuration() {
        let (config, diagnostics) = build(vec![], &accepting(&[]));
        assert!(config.is_empty());
        assert!(diagnostics.is_empty());
        assert!(config.formatter("article", 100).is_none());
        assert!(config.preview_formatter().is_none());
        assert!(config.formatters().is_empty());
    }

    // The empty configuration answers "yes" to has_formatters() while
    // matching nothing; callers rely on exactly that pairing.
    #[test]
    fn test_empty_configuration_reports_has_formatters() {
        let (config, _) = build(vec![], &accepting(&[]));
        assert!(config.has_formatters());
        assert!(!config.has_formatter("article", 100));
    }

    #[test]
    fn test_type_match_wins_over_width_match() {
        let validator = accepting(&["a.ht", "w.ht"]);
        let (config, _) = build(
            vec![
                FormatterDecl::for_type("article", "a.ht"),
                FormatterDecl::for_width(0, 100, "w.ht"),
            ],
            &validator,
        );

        // width 50 also fits the width formatter; the type entry still wins
        let selected = config.formatter("article", 50).expect("Should match");
        assert_eq!(selected.template, "a.ht");
    }

    #[test]
    fn test_selection_scenario() {
        let validator = accepting(&["a.ht", "narrow.ht", "wide.ht"]);
        let (config, diagnostics) = build(
            vec![
                FormatterDecl::for_type("article", "a.ht"),
                FormatterDecl::for_width(0, 100, "narrow.ht"),
                FormatterDecl::for_width(101, 300, "wide.ht"),
            ],
            &validator,
        );
        assert!(diagnostics.is_empty());

        assert_eq!(config.formatter("article", 50).unwrap().template, "a.ht");
        assert_eq!(
            config.formatter("other", 50).unwrap().template,
            "narrow.ht"
        );
        assert_eq!(
            config.formatter("other", 200).unwrap().template,
            "wide.ht"
        );
        assert!(config.formatter("other", 500).is_none());
    }

    #[test]
    fn test_width_tie_break_prefers_greatest_min_width() {
        let validator = accepting(&["loose.ht", "tight.ht"]);
        let (config, _) = build(
            vec![
                FormatterDecl::for_width(10, 50, "loose.ht"),
                FormatterDecl::for_width(20, 50, "tight.ht"),
            ],
            &validator,
        );

        let selected = config.formatter("other", 30).expect("Should match");
        assert_eq!(selected.template, "tight.ht");
    }

    #[test]
    fn test_equal_min_width_keeps_first_encountered() {
        let validator = accepting(&["first.ht", "second.ht"]);
        let (config, _) = build(
            vec![
                FormatterDecl::for_width(20, 50, "first.ht"),
                FormatterDecl::for_width(20, 60, "second.ht"),
            ],
            &validator,
        );

        let selected = config.formatter("other", 30).expect("Should match");
        assert_eq!(selected.template, "first.ht");
    }

    #[test]
    fn test_zero_width_never_matches_width_formatters() {
        let validator = accepting(&["w.ht"]);
        let (config, _) = build(vec![FormatterDecl::for_width(0, 100, "w.ht")], &validator);
        assert!(config.formatter("other", 0).is_none());
    }

    #[test]
    fn test_duplicate_type_registration_last_wins() {
        let validator = accepting(&["old.ht", "new.ht"]);
        let (config, diagnostics) = build(
            vec![
                FormatterDecl::for_type("article", "old.ht"),
                FormatterDecl::for_type("article", "new.ht"),
            ],
            &validator,
        );

        assert_eq!(config.formatter("article", 0).unwrap().template, "new.ht");
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(
            diagnostics[0].kind,
            crate::formatter::diagnostic::DiagnosticKind::DuplicateFormatter
        );
        // both accepted declarations stay in the full list
        assert_eq!(config.formatters().len(), 2);
    }

    #[test]
    fn test_duplicate_width_bounds_replaced_last_wins() {
        let validator = accepting(&["old.ht", "new.ht", "other.ht"]);
        let (config, diagnostics) = build(
            vec![
                FormatterDecl::for_width(100, 300, "old.ht"),
                FormatterDecl::for_width(50, 400, "other.ht"),
                FormatterDecl::for_width(100, 300, "new.ht"),
            ],
            &validator,
        );

        assert_eq!(diagnostics.len(), 1);
        let selected = config.formatter("other", 200).expect("Should match");
        assert_eq!(selected.template, "new.ht");
    }

    #[test]
    fn test_unresolvable_declaration_is_dropped() {
        let validator = accepting(&["good.ht"]);
        let (config, diagnostics) = build(
            vec![
                FormatterDecl::for_type("article", "good.ht"),
                FormatterDecl::for_type("news", "missing.ht"),
            ],
            &validator,
        );

        assert_eq!(diagnostics.len(), 1);
        assert_eq!(
            diagnostics[0].kind,
            crate::formatter::diagnostic::DiagnosticKind::UnresolvableTemplate
        );
        assert!(config.formatter("news", 0).is_none());
        assert!(config.formatter("article", 0).is_some());
        // the surviving declaration keeps has_formatters() true
        assert!(config.has_formatters());
        assert_eq!(config.formatters().len(), 1);
    }

    #[test]
    fn test_all_declarations_dropped_is_not_the_empty_configuration() {
        let (config, diagnostics) = build(
            vec![FormatterDecl::for_type("article", "missing.ht")],
            &accepting(&[]),
        );

        assert_eq!(diagnostics.len(), 1);
        assert!(!config.is_empty());
        assert!(!config.has_formatters());
        assert!(config.formatter("article", 0).is_none());
    }

    #[test]
    fn test_preresolved_template_id_skips_validation() {
        // the validator knows nothing, the resolved id carries the decl
        let (config, diagnostics) = build(
            vec![FormatterDecl::for_type("article", "reused.ht")
                .with_template_id(TemplateId::new("content:/reused"))],
            &accepting(&[]),
        );

        assert!(diagnostics.is_empty());
        let selected = config.formatter("article", 0).expect("Should match");
        assert_eq!(selected.template_id.as_str(), "content:/reused");
    }

    #[test]
    fn test_wildcard_query_delegates_to_preview() {
        let validator = accepting(&["g.ht"]);
        let (config, _) = build(
            vec![FormatterDecl::for_type(WILDCARD_TYPE, "g.ht").with_preview(true)],
            &validator,
        );

        assert_eq!(config.formatter(WILDCARD_TYPE, 0), config.preview_formatter());
        assert_eq!(config.preview_formatter().unwrap().template, "g.ht");
    }

    #[test]
    fn test_preview_prefers_wildcard_type_entry() {
        let validator = accepting(&["g.ht", "a.ht", "w.ht"]);
        let (config, _) = build(
            vec![
                FormatterDecl::for_type("article", "a.ht"),
                FormatterDecl::for_width(0, 2000, "w.ht"),
                FormatterDecl::for_type(WILDCARD_TYPE, "g.ht").with_preview(true),
            ],
            &validator,
        );

        assert_eq!(config.preview_formatter().unwrap().template, "g.ht");
    }

    #[test]
    fn test_preview_falls_back_to_covering_width_range() {
        let validator = accepting(&["w.ht"]);
        let (config, _) = build(vec![FormatterDecl::for_width(600, 700, "w.ht")], &validator);
        assert_eq!(config.preview_formatter().unwrap().template, "w.ht");
    }

    #[test]
    fn test_preview_accepts_range_starting_beyond_preview_width() {
        // 700..800 does not contain 640, but the preview pane scrolls
        let validator = accepting(&["wide.ht"]);
        let (config, _) = build(
            vec![FormatterDecl::for_width(700, 800, "wide.ht")],
            &validator,
        );
        assert_eq!(config.preview_formatter().unwrap().template, "wide.ht");
    }

    #[test]
    fn test_preview_falls_back_to_first_registered_type_formatter() {
        let validator = accepting(&["a.ht", "n.ht"]);
        let (config, _) = build(
            vec![
                FormatterDecl::for_type("article", "a.ht"),
                FormatterDecl::for_type("news", "n.ht"),
            ],
            &validator,
        );

        assert_eq!(config.preview_formatter().unwrap().template, "a.ht");
    }

    #[test]
    fn test_preview_fallback_survives_overwritten_first_entry() {
        // overwriting the first type entry keeps its registration order
        let validator = accepting(&["a.ht", "n.ht", "a2.ht"]);
        let (config, _) = build(
            vec![
                FormatterDecl::for_type("article", "a.ht"),
                FormatterDecl::for_type("news", "n.ht"),
                FormatterDecl::for_type("article", "a2.ht"),
            ],
            &validator,
        );

        assert_eq!(config.preview_formatter().unwrap().template, "a2.ht");
    }

    #[test]
    fn test_preview_is_idempotent() {
        let validator = accepting(&["a.ht"]);
        let (config, _) = build(vec![FormatterDecl::for_type("article", "a.ht")], &validator);

        let first = config.preview_formatter();
        let second = config.preview_formatter();
        assert_eq!(first, second);
        assert!(first.is_some());
    }

    #[test]
    fn test_preview_none_is_memoized() {
        // narrow width range only: no step of the cascade matches
        let validator = accepting(&["w.ht"]);
        let (config, _) = build(vec![FormatterDecl::for_width(10, 20, "w.ht")], &validator);

        assert!(config.preview_formatter().is_none());
        assert!(config.preview_formatter().is_none());
    }
}
