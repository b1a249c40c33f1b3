//! Source locations for document nodes and diagnostics.
//!
//! A [`Span`] is a half-open byte range into one source text. A [`Position`]
//! pairs a span with the file it came from and the human-facing line and
//! column of its start. Positions are carried by every node of the document
//! model but never take part in structural equality.

use std::{
    fmt,
    ops::Range,
    path::Path,
    sync::Arc,
};

/// A half-open byte range `start..end` into a source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    start: usize,
    end: usize,
}

impl Span {
    /// Create a span from a byte range.
    pub fn new(range: Range<usize>) -> Self {
        Self {
            start: range.start,
            end: range.end.max(range.start),
        }
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn end(&self) -> usize {
        self.end
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// The smallest span covering both `self` and `other`.
    pub fn union(&self, other: Span) -> Span {
        Span::new(self.start.min(other.start)..self.end.max(other.end))
    }
}

/// The lexical location of a node or diagnostic.
///
/// `line` and `column` are 1-based. A `line` of zero marks a node that was
/// built in code rather than read from a source.
#[derive(Debug, Clone, Default)]
pub struct Position {
    file: Option<Arc<Path>>,
    line: usize,
    column: usize,
    span: Span,
}

impl Position {
    pub fn new(file: Option<Arc<Path>>, line: usize, column: usize, span: Span) -> Self {
        Self {
            file,
            line,
            column,
            span,
        }
    }

    /// A position that refers to nothing.
    pub fn unknown() -> Self {
        Self::default()
    }

    pub fn file(&self) -> Option<&Path> {
        self.file.as_deref()
    }

    pub fn line(&self) -> usize {
        self.line
    }

    pub fn column(&self) -> usize {
        self.column
    }

    pub fn span(&self) -> Span {
        self.span
    }

    pub fn is_known(&self) -> bool {
        self.line > 0
    }

    /// A position covering `self` through the end of `other`.
    ///
    /// The file, line and column of `self` are kept.
    pub fn through(&self, other: &Position) -> Position {
        Position {
            file: self.file.clone(),
            line: self.line,
            column: self.column,
            span: self.span.union(other.span),
        }
    }
}

/// Positions never affect structural equality of the nodes carrying them.
impl PartialEq for Position {
    fn eq(&self, _other: &Self) -> bool {
        true
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.file {
            Some(file) => write!(f, "{}:{}:{}", file.display(), self.line, self.column),
            None => write!(f, "<input>:{}:{}", self.line, self.column),
        }
    }
}

/// Maps byte offsets of one source text to positions.
#[derive(Debug, Clone)]
pub struct LineIndex {
    file: Option<Arc<Path>>,
    line_starts: Vec<usize>,
    source: Arc<str>,
}

impl LineIndex {
    pub fn new(source: &str, file: Option<&Path>) -> Self {
        let line_starts = std::iter::once(0)
            .chain(source.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        Self {
            file: file.map(Arc::from),
            line_starts,
            source: Arc::from(source),
        }
    }

    pub fn file(&self) -> Option<&Arc<Path>> {
        self.file.as_ref()
    }

    /// Resolve a byte span to a position. Columns count characters.
    pub fn position(&self, span: Span) -> Position {
        let offset = span.start().min(self.source.len());
        let line = match self.line_starts.binary_search(&offset) {
            Ok(line) => line,
            Err(next) => next - 1,
        };
        let line_start = self.line_starts[line];
        let column = self
            .source
            .get(line_start..offset)
            .map_or(offset - line_start, |prefix| prefix.chars().count())
            + 1;
        Position::new(self.file.clone(), line + 1, column, span)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_union() {
        let a = Span::new(3..5);
        let b = Span::new(10..12);
        assert_eq!(a.union(b), Span::new(3..12));
        assert_eq!(b.union(a), Span::new(3..12));
        assert_eq!(a.union(b).len(), 9);
    }

    #[test]
    fn test_position_equality_ignores_location() {
        let a = Position::new(None, 1, 1, Span::new(0..1));
        let b = Position::new(Some(Arc::from(Path::new("x.sd"))), 9, 4, Span::new(40..41));
        assert_eq!(a, b);
    }

    #[test]
    fn test_line_index_positions() {
        let index = LineIndex::new("(a\n  b)\nλx", Some(Path::new("doc.sd")));

        let first = index.position(Span::new(0..1));
        assert_eq!((first.line(), first.column()), (1, 1));

        let b = index.position(Span::new(5..6));
        assert_eq!((b.line(), b.column()), (2, 3));

        // Columns count characters, not bytes.
        let x = index.position(Span::new(10..11));
        assert_eq!((x.line(), x.column()), (3, 2));
        assert_eq!(x.to_string(), "doc.sd:3:2");
    }

    #[test]
    fn test_unknown_position() {
        let p = Position::unknown();
        assert!(!p.is_known());
        assert!(p.file().is_none());
    }
}
