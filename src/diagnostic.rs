//! Located problems in model artifacts.
//!
//! Artifacts are JSON, so a diagnostic points at a byte range of the file:
//! the token the parser stopped at, or the key of a field the generator
//! ignores. Rendering goes through ariadne with the artifact as source.

use std::ops::Range;

use ariadne::{Color, Label, Report, ReportKind, Source};

use crate::span::Span;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

impl Severity {
    fn style(self) -> (ReportKind<'static>, Color) {
        match self {
            Severity::Error => (ReportKind::Error, Color::Red),
            Severity::Warning => (ReportKind::Warning, Color::Yellow),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    pub span: Span,
    /// Text under the highlighted range. Falls back to `message`.
    pub label: Option<String>,
    pub notes: Vec<String>,
    pub help: Option<String>,
}

impl Diagnostic {
    fn new(severity: Severity, message: impl Into<String>, span: Span) -> Self {
        Self {
            severity,
            message: message.into(),
            span,
            label: None,
            notes: Vec::new(),
            help: None,
        }
    }

    pub fn error(message: impl Into<String>, span: Span) -> Self {
        Self::new(Severity::Error, message, span)
    }

    pub fn warning(message: impl Into<String>, span: Span) -> Self {
        Self::new(Severity::Warning, message, span)
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    /// The span clamped to a source of `len` bytes.
    fn range(&self, len: usize) -> Range<usize> {
        let start = (self.span.start as usize).min(len);
        let end = (self.span.end as usize).clamp(start, len);
        start..end
    }

    /// Print to stderr against the artifact text at `path`.
    pub fn render(&self, path: &str, source: &str) {
        let (kind, color) = self.severity.style();
        let range = self.range(source.len());
        let label = self.label.as_deref().unwrap_or(&self.message);

        let mut report = Report::build(kind, path, range.start)
            .with_message(&self.message)
            .with_label(Label::new((path, range)).with_message(label).with_color(color));
        for note in &self.notes {
            report = report.with_note(note);
        }
        if let Some(help) = &self.help {
            report = report.with_help(help);
        }
        // Nothing left to report a failed stderr write to.
        let _ = report.finish().eprint((path, Source::from(source)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ignored_field_warning() {
        let d = Diagnostic::warning("field `tree_` is ignored", Span::new(40, 47))
            .with_label("not read for LinearRegression")
            .with_note("only `intercept_` and `coef_` are used");
        assert!(!d.is_error());
        assert_eq!(d.label.as_deref(), Some("not read for LinearRegression"));
        assert_eq!(d.notes.len(), 1);
        assert!(d.help.is_none());
    }

    #[test]
    fn test_range_is_clamped_to_source() {
        let d = Diagnostic::error("unexpected end of input", Span::new(30, 90));
        assert_eq!(d.range(12), 12..12);
        let d = Diagnostic::error("bad token", Span::new(3, 7));
        assert_eq!(d.range(12), 3..7);
        assert_eq!(d.range(5), 3..5);
    }

    #[test]
    fn test_render_parse_error_in_artifact() {
        let source = "{\n  \"model_type\": LinearRegression\n}\n";
        let d = Diagnostic::error("expected value", Span::new(18, 19))
            .with_help("`model_type` is a string such as \"LinearRegression\"");
        assert!(d.is_error());
        d.render("model.json", source);
    }

    #[test]
    fn test_render_past_end_of_truncated_artifact() {
        let d = Diagnostic::error("EOF while parsing an object", Span::new(40, 41));
        d.render("model.json", "{\"model_type\": ");
    }
}
