//! Diagnostics for user-facing errors (§7 kind 1: `ThrowError`-originated
//! messages surfaced by `loomc-drv`) and for pretty-printing the offending
//! term of a compiler-internal invariant violation (§7 kind 2). This module
//! does not decide *whether* something is an error — that's each pass's
//! `thiserror` enum — it only renders one.

use crate::span::{SourceMap, Span};
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    Warning,
    Error,
    /// A compiler-internal invariant violation (§7 kind 2). Distinct from
    /// `Error` so the driver can format it with the "this is a compiler bug"
    /// framing and attach the offending term's `Debug` output.
    InternalError,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Level::Warning => "warning",
            Level::Error => "error",
            Level::InternalError => "internal compiler error",
        };
        write!(f, "{s}")
    }
}

pub struct Diagnostic {
    pub level: Level,
    pub message: String,
    pub span: Span,
    /// For `InternalError`: the `Debug`-formatted offending term, per §7's
    /// requirement that invariant violations are tagged and carry the term.
    pub offending_term: Option<String>,
}

impl Diagnostic {
    pub fn error(message: impl Into<String>, span: Span) -> Self {
        Diagnostic { level: Level::Error, message: message.into(), span, offending_term: None }
    }

    pub fn warning(message: impl Into<String>, span: Span) -> Self {
        Diagnostic { level: Level::Warning, message: message.into(), span, offending_term: None }
    }

    pub fn internal(message: impl Into<String>, offending_term: impl fmt::Debug) -> Self {
        Diagnostic {
            level: Level::InternalError,
            message: message.into(),
            span: Span::SYNTHETIC,
            offending_term: Some(format!("{offending_term:?}")),
        }
    }

    pub fn render(&self, source: Option<&SourceMap>) -> String {
        let mut out = format!("{}: {}", self.level, self.message);
        if let (Some(source), false) = (source, self.span.is_synthetic()) {
            let (line, col) = source.line_col(self.span.to_range().start as u32);
            out.push_str(&format!("\n  --> line {line}, column {col}\n  {}", source.snippet(self.span)));
        }
        if let Some(term) = &self.offending_term {
            out.push_str(&format!("\n  offending term: {term}"));
        }
        out
    }
}

/// Accumulates diagnostics across a pass; `loomc-drv` drains this at the end
/// of each stage and decides whether to abort.
#[derive(Default)]
pub struct Handler {
    diagnostics: Vec<Diagnostic>,
}

impl Handler {
    pub fn new() -> Self {
        Handler::default()
    }

    pub fn emit(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(|d| d.level >= Level::Error)
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn render_all(&self, source: Option<&SourceMap>) -> String {
        self.diagnostics.iter().map(|d| d.render(source)).collect::<Vec<_>>().join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn internal_error_outranks_plain_error_for_has_errors() {
        let mut handler = Handler::new();
        handler.emit(Diagnostic::internal("hoist failure", "Seq(..)"));
        assert!(handler.has_errors());
    }

    #[test]
    fn warning_alone_does_not_count_as_error() {
        let mut handler = Handler::new();
        handler.emit(Diagnostic::warning("unused binder", Span::SYNTHETIC));
        assert!(!handler.has_errors());
    }

    #[test]
    fn render_includes_offending_term_for_internal_errors() {
        let diag = Diagnostic::internal("shape mismatch", vec![1, 2, 3]);
        let rendered = diag.render(None);
        assert!(rendered.contains("[1, 2, 3]"));
        assert!(rendered.contains("internal compiler error"));
    }
}
