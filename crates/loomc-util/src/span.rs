//! Minimal source-position plumbing — just enough for diagnostics to point
//! at the high-IR term that caused a lowering failure. Out of scope: real
//! parsing, multi-file source maps, macro expansion spans.

use std::fmt;
use std::ops::Range;

/// A byte-offset range into a single compilation unit's source text.
/// `loomc-ir` atoms and expressions carry an optional `Span` inherited from
/// the high IR; most synthesized destination/Imp nodes carry `Span::SYNTHETIC`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Span {
    lo: u32,
    hi: u32,
}

impl Span {
    /// Marks a node introduced by a lowering pass itself, with no source
    /// counterpart. Diagnostics render this as `<synthesized>`.
    pub const SYNTHETIC: Span = Span { lo: u32::MAX, hi: u32::MAX };

    pub fn new(lo: u32, hi: u32) -> Self {
        assert!(lo <= hi, "span lo {lo} > hi {hi}");
        Span { lo, hi }
    }

    pub fn is_synthetic(&self) -> bool {
        *self == Self::SYNTHETIC
    }

    pub fn to_range(&self) -> Range<usize> {
        self.lo as usize..self.hi as usize
    }

    /// Smallest span enclosing both `self` and `other`. Used when a lowered
    /// node is built from several high-IR terms (e.g. merging an `if`'s
    /// scrutinee and arm spans for a `case` destination write).
    pub fn merge(&self, other: &Span) -> Span {
        if self.is_synthetic() {
            return *other;
        }
        if other.is_synthetic() {
            return *self;
        }
        Span { lo: self.lo.min(other.lo), hi: self.hi.max(other.hi) }
    }
}

impl fmt::Debug for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_synthetic() {
            write!(f, "<synthesized>")
        } else {
            write!(f, "{}..{}", self.lo, self.hi)
        }
    }
}

/// The source text of one compilation unit, used to render a snippet under
/// a diagnostic. Line lookups are computed once and cached.
pub struct SourceMap {
    text: String,
    line_starts: Vec<u32>,
}

impl SourceMap {
    pub fn new(text: String) -> Self {
        let mut line_starts = vec![0u32];
        for (i, b) in text.bytes().enumerate() {
            if b == b'\n' {
                line_starts.push(i as u32 + 1);
            }
        }
        SourceMap { text, line_starts }
    }

    pub fn snippet(&self, span: Span) -> &str {
        if span.is_synthetic() {
            return "<synthesized>";
        }
        let range = span.to_range();
        self.text.get(range).unwrap_or("<out of bounds>")
    }

    /// 1-based (line, column) of a byte offset.
    pub fn line_col(&self, offset: u32) -> (u32, u32) {
        let line = match self.line_starts.binary_search(&offset) {
            Ok(i) => i,
            Err(i) => i - 1,
        };
        let col = offset - self.line_starts[line];
        (line as u32 + 1, col + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn synthetic_span_merges_to_the_other_side() {
        let real = Span::new(3, 7);
        assert_eq!(Span::SYNTHETIC.merge(&real), real);
        assert_eq!(real.merge(&Span::SYNTHETIC), real);
    }

    #[test]
    fn merge_takes_the_enclosing_range() {
        let a = Span::new(3, 7);
        let b = Span::new(5, 12);
        assert_eq!(a.merge(&b), Span::new(3, 12));
    }

    #[test]
    fn source_map_line_col_tracks_newlines() {
        let map = SourceMap::new("ab\ncd\nef".to_string());
        assert_eq!(map.line_col(0), (1, 1));
        assert_eq!(map.line_col(3), (2, 1));
        assert_eq!(map.line_col(6), (3, 1));
    }

    #[test]
    fn snippet_extracts_the_span_text() {
        let map = SourceMap::new("for i. body".to_string());
        let span = Span::new(0, 3);
        assert_eq!(map.snippet(span), "for");
    }
}
