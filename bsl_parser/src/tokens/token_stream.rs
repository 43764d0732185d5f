//! Cursor-based token stream with balanced-block and statement extraction
//!
//! Extraction copies the covered tokens into a new stream with its own cursor,
//! so a parent stream and its sub-streams never alias each other.

use crate::tokens::token::{Token, TokenKind};
use crate::utils::{SourceMap, Span};

/// Token stream errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TokenStreamError {
    /// Stream ran out before the operation's contract was met
    #[error("Expected {expected}, but reached end of input")]
    UnexpectedEndOfStream { expected: String },

    /// A required token kind did not match
    #[error("Expected {expected}, found {found} '{text}' at {span}")]
    UnexpectedToken {
        expected: String,
        found: TokenKind,
        text: String,
        span: Span,
    },
}

/// Ordered tokens plus a read cursor
#[derive(Debug, Clone, Default)]
pub struct TokenStream {
    tokens: Vec<Token>,
    position: usize,
    source_map: Option<SourceMap>,
}

impl TokenStream {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            position: 0,
            source_map: None,
        }
    }

    /// Create stream with source map for enhanced error reporting
    pub fn with_source_map(tokens: Vec<Token>, source_map: SourceMap) -> Self {
        Self {
            tokens,
            position: 0,
            source_map: Some(source_map),
        }
    }

    // === CURSOR OPERATIONS ===

    /// Token at the cursor, advancing past it; `None` once exhausted
    pub fn read(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.position)?.clone();
        self.position += 1;
        Some(token)
    }

    /// Like [`read`](Self::read) but running out is an error
    pub fn read_expecting(&mut self, expected: &str) -> Result<Token, TokenStreamError> {
        self.read()
            .ok_or_else(|| TokenStreamError::UnexpectedEndOfStream {
                expected: expected.to_string(),
            })
    }

    /// Strict lookahead: the token one past the cursor, which must exist
    pub fn peek_next(&self) -> Result<&Token, TokenStreamError> {
        self.tokens
            .get(self.position + 1)
            .ok_or_else(|| TokenStreamError::UnexpectedEndOfStream {
                expected: "a following token".to_string(),
            })
    }

    /// Read one token and require it to be of `kind`
    pub fn check(&mut self, kind: TokenKind) -> Result<Token, TokenStreamError> {
        let token = self.read_expecting(kind.description())?;
        if token.kind != kind {
            return Err(TokenStreamError::UnexpectedToken {
                expected: kind.description().to_string(),
                found: token.kind,
                text: token.text,
                span: token.span,
            });
        }
        Ok(token)
    }

    /// Token at the cursor without advancing; errors when exhausted
    pub fn current(&self) -> Result<&Token, TokenStreamError> {
        self.tokens
            .get(self.position)
            .ok_or_else(|| TokenStreamError::UnexpectedEndOfStream {
                expected: "a token".to_string(),
            })
    }

    /// Safe probe of the token at the cursor
    pub fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.position)
    }

    /// Kind of the token at the cursor, if any
    pub fn current_kind(&self) -> Option<TokenKind> {
        self.peek().map(|token| token.kind)
    }

    /// Whether any token of `kind` exists anywhere in the stream, regardless of cursor
    pub fn has(&self, kind: TokenKind) -> bool {
        self.tokens.iter().any(|token| token.kind == kind)
    }

    /// Rewind the cursor to the first token
    pub fn reset(&mut self) {
        self.position = 0;
    }

    pub fn is_at_end(&self) -> bool {
        self.position >= self.tokens.len()
    }

    // === EXTRACTION ===

    /// Consume a balanced region up to the `close` that matches nesting level 0.
    ///
    /// The terminating `close` is consumed but not included in the result.
    pub fn extract_block(
        &mut self,
        open: TokenKind,
        close: TokenKind,
    ) -> Result<TokenStream, TokenStreamError> {
        let mut level = 0usize;
        let mut block = Vec::new();

        loop {
            let token = self.read_expecting(close.description())?;

            if token.kind == open {
                level += 1;
            } else if token.kind == close {
                if level == 0 {
                    break;
                }
                level -= 1;
            }

            block.push(token);
        }

        Ok(TokenStream::new(block))
    }

    /// Consume tokens through the next `;`, returning those before it.
    ///
    /// Returns `None` when the stream is already exhausted. A final statement
    /// without a terminator yields the remaining tokens.
    pub fn extract_statement(&mut self) -> Option<TokenStream> {
        if self.is_at_end() {
            return None;
        }

        let mut statement = Vec::new();
        while let Some(token) = self.read() {
            if token.kind == TokenKind::EndExpression {
                break;
            }
            statement.push(token);
        }

        Some(TokenStream::new(statement))
    }

    // === INSPECTION ===

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn into_tokens(self) -> Vec<Token> {
        self.tokens
    }

    pub fn iter(&self) -> impl Iterator<Item = &Token> {
        self.tokens.iter()
    }

    /// Copy of this stream without comment tokens, cursor at the start
    pub fn without_comments(&self) -> TokenStream {
        TokenStream::new(
            self.tokens
                .iter()
                .filter(|token| token.kind != TokenKind::Comment)
                .cloned()
                .collect(),
        )
    }

    /// Span covering every token in the stream
    pub fn full_span(&self) -> Span {
        match (self.tokens.first(), self.tokens.last()) {
            (Some(first), Some(last)) => first.span.merge(last.span),
            _ => Span::dummy(),
        }
    }

    /// Span of the last token, used to place end-of-input diagnostics
    pub fn last_span(&self) -> Span {
        self.tokens
            .last()
            .map(|token| token.span)
            .unwrap_or_else(Span::dummy)
    }

    pub fn source_map(&self) -> Option<&SourceMap> {
        self.source_map.as_ref()
    }

    /// Format an error with source context when the source map is available
    pub fn format_error(&self, span: Span, message: &str) -> String {
        match self.source_map {
            Some(ref source_map) => source_map.format_error(&span, message),
            None => format!("Error at {}: {}", span, message),
        }
    }

    pub fn diagnostic(&self) -> String {
        let current = match self.peek() {
            Some(token) => format!("'{}' at {}", token, token.span),
            None => "<EOF>".to_string(),
        };
        format!(
            "TokenStream(pos: {}/{}, current: {})",
            self.position,
            self.tokens.len(),
            current
        )
    }
}

/// Validation functions for span accuracy
pub mod validation {
    use super::*;

    /// Validate that token offsets never move backwards
    pub fn validate_span_order(tokens: &[Token]) -> Result<(), String> {
        for window in tokens.windows(2) {
            let current = window[0].span;
            let next = window[1].span;

            if current.start.offset > next.start.offset {
                return Err(format!(
                    "Span order violation: token at offset {} precedes token at offset {}",
                    current.start.offset, next.start.offset
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::Position;
    use assert_matches::assert_matches;

    fn stream_of(words: &[(&str, TokenKind)]) -> TokenStream {
        let mut offset = 0;
        let tokens = words
            .iter()
            .map(|(text, kind)| {
                let token = Token::at(*kind, *text, Position::new(offset, 1, offset as u32 + 1));
                offset += text.chars().count() + 1;
                token
            })
            .collect();
        TokenStream::new(tokens)
    }

    fn texts(stream: &TokenStream) -> Vec<&str> {
        stream.iter().map(|t| t.text.as_str()).collect()
    }

    use TokenKind::*;

    #[test]
    fn test_read_and_exhaustion() {
        let mut stream = stream_of(&[("a", Identifier)]);
        assert_eq!(stream.read().map(|t| t.text), Some("a".to_string()));
        assert!(stream.read().is_none());
        assert!(stream.is_at_end());
        assert_matches!(
            stream.read_expecting("identifier"),
            Err(TokenStreamError::UnexpectedEndOfStream { .. })
        );
        assert_matches!(
            stream.current(),
            Err(TokenStreamError::UnexpectedEndOfStream { .. })
        );
    }

    #[test]
    fn test_peek_next_is_strict() {
        let stream = stream_of(&[("a", Identifier), ("=", EqualsSign)]);
        assert_eq!(stream.peek_next().unwrap().kind, EqualsSign);

        let single = stream_of(&[("a", Identifier)]);
        assert_matches!(
            single.peek_next(),
            Err(TokenStreamError::UnexpectedEndOfStream { .. })
        );
    }

    #[test]
    fn test_check_reports_expected_and_actual() {
        let mut stream = stream_of(&[("a", Identifier), ("(", OpeningBracket)]);
        let err = stream.check(OpeningBracket).unwrap_err();
        assert_matches!(
            err,
            TokenStreamError::UnexpectedToken { found: Identifier, ref expected, .. } if expected == "("
        );
        assert!(stream.check(OpeningBracket).is_ok());
    }

    #[test]
    fn test_has_ignores_cursor_and_reset_rewinds() {
        let mut stream = stream_of(&[("Экспорт", Export), ("a", Identifier)]);
        stream.read();
        stream.read();
        assert!(stream.has(Export));
        assert!(!stream.has(Comma));
        stream.reset();
        assert_eq!(stream.current().unwrap().kind, Export);
    }

    #[test]
    fn test_extract_block_balanced() {
        let mut stream = stream_of(&[
            ("A", Identifier),
            ("(", OpeningBracket),
            ("B", Identifier),
            ("(", OpeningBracket),
            ("C", Identifier),
            (")", ClosingBracket),
            ("D", Identifier),
            (")", ClosingBracket),
            ("E", Identifier),
        ]);
        stream.read();
        stream.check(OpeningBracket).unwrap();

        let mut block = stream.extract_block(OpeningBracket, ClosingBracket).unwrap();
        assert_eq!(texts(&block), vec!["B", "(", "C", ")", "D"]);
        assert_eq!(block.position(), 0);
        assert_eq!(block.read().map(|t| t.text), Some("B".to_string()));

        assert_eq!(stream.read().map(|t| t.text), Some("E".to_string()));
        assert!(stream.is_at_end());
    }

    #[test]
    fn test_extract_block_unbalanced() {
        let mut stream = stream_of(&[
            ("B", Identifier),
            ("(", OpeningBracket),
            ("C", Identifier),
            (")", ClosingBracket),
        ]);
        assert_matches!(
            stream.extract_block(OpeningBracket, ClosingBracket),
            Err(TokenStreamError::UnexpectedEndOfStream { .. })
        );
    }

    #[test]
    fn test_extract_statement_sequence() {
        let mut stream = stream_of(&[
            ("a", Identifier),
            ("=", EqualsSign),
            ("1", NumericConst),
            (";", EndExpression),
            (";", EndExpression),
            ("b", Identifier),
        ]);

        let first = stream.extract_statement().unwrap();
        assert_eq!(texts(&first), vec!["a", "=", "1"]);

        let empty = stream.extract_statement().unwrap();
        assert!(empty.is_empty());

        let last = stream.extract_statement().unwrap();
        assert_eq!(texts(&last), vec!["b"]);

        assert!(stream.extract_statement().is_none());
    }

    #[test]
    fn test_without_comments_and_spans() {
        let stream = stream_of(&[("a", Identifier), ("// x", Comment), ("b", Identifier)]);
        let filtered = stream.without_comments();
        assert_eq!(texts(&filtered), vec!["a", "b"]);
        assert_eq!(filtered.full_span().start.offset, 0);
        assert_eq!(filtered.last_span().start.offset, 7);
        assert!(validation::validate_span_order(stream.tokens()).is_ok());
    }
}
