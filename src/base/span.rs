//! Source positions for diagnostics.
//!
//! Lines and columns are 0-indexed throughout.

use std::fmt;

use super::Name;

/// A source range within one file.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Span {
    /// Start line (0-indexed)
    pub start_line: u32,
    /// Start column (0-indexed)
    pub start_col: u32,
    /// End line (0-indexed)
    pub end_line: u32,
    /// End column (0-indexed)
    pub end_col: u32,
}

impl Span {
    pub fn new(start_line: u32, start_col: u32, end_line: u32, end_col: u32) -> Self {
        Self { start_line, start_col, end_line, end_col }
    }

    /// A single-point span.
    pub fn point(line: u32, col: u32) -> Self {
        Self::new(line, col, line, col)
    }

    /// Check if a position is within this span.
    pub fn contains(&self, line: u32, col: u32) -> bool {
        let after_start =
            line > self.start_line || (line == self.start_line && col >= self.start_col);
        let before_end = line < self.end_line || (line == self.end_line && col <= self.end_col);
        after_start && before_end
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.start_line, self.start_col)
    }
}

/// A span paired with the file it belongs to.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Location {
    pub file: Name,
    pub span: Span,
}

impl Location {
    pub fn new(file: impl Into<Name>, span: Span) -> Self {
        Self { file: file.into(), span }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.span)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_contains() {
        let span = Span::new(2, 4, 2, 10);
        assert!(span.contains(2, 4));
        assert!(span.contains(2, 10));
        assert!(!span.contains(2, 11));
        assert!(!span.contains(1, 8));
    }

    #[test]
    fn test_location_display() {
        let loc = Location::new("Billing.cs", Span::point(7, 3));
        assert_eq!(loc.to_string(), "Billing.cs:7:3");
    }
}
