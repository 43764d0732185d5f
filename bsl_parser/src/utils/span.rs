//! Source location tracking for BSL modules
//!
//! Offsets count Unicode scalar values from the start of the module text, which
//! is how the lexer walks the source. Rows and columns are 1-based.
use serde::{Deserialize, Serialize};
use std::fmt;

/// A position in source text with row, column, and character offset.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct Position {
    /// Character offset from start of input (0-based)
    pub offset: usize,
    /// Row number (1-based)
    pub row: u32,
    /// Column number (1-based)
    pub column: u32,
}

impl Position {
    /// Create a new position
    pub fn new(offset: usize, row: u32, column: u32) -> Self {
        Self {
            offset,
            row,
            column,
        }
    }

    /// Create the starting position (offset 0, row 1, column 1)
    pub fn start() -> Self {
        Self {
            offset: 0,
            row: 1,
            column: 1,
        }
    }

    /// Advance position by one character
    pub fn advance(self, ch: char) -> Self {
        match ch {
            '\n' => Self {
                offset: self.offset + 1,
                row: self.row + 1,
                column: 1,
            },
            _ => Self {
                offset: self.offset + 1,
                row: self.row,
                column: self.column + 1,
            },
        }
    }

    /// Advance position over every character of a string
    pub fn advance_str(self, s: &str) -> Self {
        s.chars().fold(self, |pos, ch| pos.advance(ch))
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.row, self.column)
    }
}

/// A span of source text from start to end position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Span {
    /// Start position (inclusive)
    pub start: Position,
    /// End position (exclusive)
    pub end: Position,
}

impl Span {
    /// Create a new span
    pub fn new(start: Position, end: Position) -> Self {
        debug_assert!(
            start.offset <= end.offset,
            "Span start must not be after end"
        );
        Self { start, end }
    }

    /// Span of `length` characters on a single row, starting at `start`
    pub fn from_token_extent(start: Position, length: usize) -> Self {
        Self {
            start,
            end: Position {
                offset: start.offset + length,
                row: start.row,
                column: start.column + length as u32,
            },
        }
    }

    /// Create a single-character span
    pub fn single(pos: Position) -> Self {
        Self::from_token_extent(pos, 1)
    }

    /// Merge two spans into one covering both
    pub fn merge(self, other: Self) -> Self {
        let start = if self.start.offset < other.start.offset {
            self.start
        } else {
            other.start
        };

        let end = if self.end.offset > other.end.offset {
            self.end
        } else {
            other.end
        };

        Self { start, end }
    }

    /// Length of this span in characters
    pub fn len(&self) -> usize {
        self.end.offset - self.start.offset
    }

    /// Check if this span is empty
    pub fn is_empty(&self) -> bool {
        self.start.offset == self.end.offset
    }

    /// Check if this span contains a position
    pub fn contains(&self, pos: Position) -> bool {
        pos.offset >= self.start.offset && pos.offset < self.end.offset
    }

    /// Create an unknown/dummy span (useful for generated nodes)
    pub fn dummy() -> Self {
        Self {
            start: Position::start(),
            end: Position::start(),
        }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start.row == self.end.row {
            write!(f, "{}:{}-{}", self.start.row, self.start.column, self.end.column)
        } else {
            write!(f, "{}-{}", self.start, self.end)
        }
    }
}

/// Line index over a module's text for rendering diagnostics
#[derive(Debug, Clone)]
pub struct SourceMap {
    /// The original source text
    pub source: String,
    /// Byte offsets of line starts
    line_starts: Vec<usize>,
}

impl SourceMap {
    /// Create a new source map from source text
    pub fn new(source: String) -> Self {
        let mut line_starts = vec![0];
        for (offset, ch) in source.char_indices() {
            if ch == '\n' {
                line_starts.push(offset + 1);
            }
        }
        Self {
            source,
            line_starts,
        }
    }

    /// Number of rows in the source
    pub fn row_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Get a row of text by number (1-based), without its line terminator
    pub fn get_line(&self, row: u32) -> Option<&str> {
        if row == 0 {
            return None;
        }

        let index = (row - 1) as usize;
        let start = *self.line_starts.get(index)?;
        let end = match self.line_starts.get(index + 1) {
            Some(next) => next - 1,
            None => self.source.len(),
        };

        Some(self.source[start..end].trim_end_matches('\r'))
    }

    /// Text covered by a span, using character offsets
    pub fn span_text(&self, span: &Span) -> String {
        self.source
            .chars()
            .skip(span.start.offset)
            .take(span.len())
            .collect()
    }

    /// Format an error message with source context
    pub fn format_error(&self, span: &Span, message: &str) -> String {
        let mut result = String::new();

        result.push_str(&format!("Error: {}\n", message));
        result.push_str(&format!("  --> {}:{}\n", span.start.row, span.start.column));

        if let Some(line) = self.get_line(span.start.row) {
            let row_str = span.start.row.to_string();
            let padding = " ".repeat(row_str.len());

            result.push_str(&format!("   {} |\n", padding));
            result.push_str(&format!("{} | {}\n", row_str, line));

            let mut underline = format!("   {} | ", padding);
            for _ in 1..span.start.column {
                underline.push(' ');
            }

            let span_len = if span.start.row == span.end.row {
                span.end.column.saturating_sub(span.start.column) as usize
            } else {
                line.chars()
                    .count()
                    .saturating_sub((span.start.column - 1) as usize)
            };

            for _ in 0..span_len.max(1) {
                underline.push('^');
            }

            result.push_str(&underline);
            result.push('\n');
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance_resets_column_after_newline() {
        let pos = Position::start().advance_str("ab\nc");
        assert_eq!(pos, Position::new(4, 2, 2));
    }

    #[test]
    fn test_token_extent_and_merge() {
        let a = Span::from_token_extent(Position::new(0, 1, 1), 9);
        let b = Span::from_token_extent(Position::new(10, 1, 11), 4);
        let merged = a.merge(b);

        assert_eq!(merged.len(), 14);
        assert!(merged.contains(Position::new(12, 1, 13)));
        assert!(!merged.contains(Position::new(14, 1, 15)));
        assert_eq!(merged.to_string(), "1:1-15");
    }

    #[test]
    fn test_source_map_lines_and_text() {
        let map = SourceMap::new("Процедура Тест()\r\nКонецПроцедуры".to_string());
        assert_eq!(map.row_count(), 2);
        assert_eq!(map.get_line(1), Some("Процедура Тест()"));
        assert_eq!(map.get_line(2), Some("КонецПроцедуры"));
        assert_eq!(map.get_line(3), None);

        let span = Span::from_token_extent(Position::new(10, 1, 11), 4);
        assert_eq!(map.span_text(&span), "Тест");
    }

    #[test]
    fn test_format_error_underlines_span() {
        let map = SourceMap::new("А = (1 + 2;".to_string());
        let span = Span::single(Position::new(4, 1, 5));
        let rendered = map.format_error(&span, "Unmatched '('");

        assert!(rendered.contains("--> 1:5"));
        assert!(rendered.contains("1 | А = (1 + 2;"));
        assert!(rendered.trim_end().ends_with('^'));
    }
}
