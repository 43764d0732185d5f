//! Character scanner turning module text into classified tokens
//!
//! Single left-to-right pass over code points with one character of lookahead.
//! The scanner never fails: malformed input degrades to identifier tokens and
//! an unterminated string literal absorbs the rest of the module.

use crate::tokens::token::{classify, BYTE_ORDER_MARK};
use crate::tokens::{Token, TokenKind};
use crate::utils::{Position, Span};

/// Characters that end the pending token and become one-character tokens
const DIVIDERS: &[char] = &[
    '\\', '/', '%', '(', ')', '-', '=', '+', ';', '.', ',', '<', '>', '[', ']',
];

pub(crate) fn is_divider(ch: char) -> bool {
    DIVIDERS.contains(&ch)
}

/// Control characters and space; the byte-order mark also separates tokens
pub(crate) fn is_separator(ch: char) -> bool {
    (ch as u32) < 33 || ch == BYTE_ORDER_MARK
}

/// Result of a scan, including where an unclosed string literal started
#[derive(Debug, Clone, Default)]
pub struct ScanOutput {
    pub tokens: Vec<Token>,
    pub unterminated_string: Option<Position>,
}

#[derive(Default)]
struct Scanner {
    tokens: Vec<Token>,
    value: String,
    start: Position,
    in_string: bool,
    in_comment: bool,
}

impl Scanner {
    /// Emit the pending value (if it classifies) and start an empty one
    fn flush(&mut self, end: Position) {
        let is_string_literal = self.in_string;
        let value = std::mem::take(&mut self.value);

        if let Some(kind) = classify(&value, is_string_literal) {
            let mut token = Token::new(kind, value, Span::new(self.start, end));
            token.is_string_literal = is_string_literal;
            self.tokens.push(token);
        }

        self.start = end;
    }

    fn push_divider(&mut self, ch: char, at: Position) {
        let text = ch.to_string();
        if let Some(kind) = classify(&text, false) {
            self.tokens.push(Token::new(kind, text, Span::single(at)));
        }
    }
}

/// Tokenize a module's text. Total: every input produces a token sequence.
pub fn tokenize(source: &str) -> Vec<Token> {
    scan(source).tokens
}

/// Tokenize and report lexical irregularities alongside the tokens
pub fn scan(source: &str) -> ScanOutput {
    let chars: Vec<char> = source.chars().collect();
    let mut scanner = Scanner::default();
    let mut pos = Position::start();
    scanner.start = pos;

    let mut index = 0;
    while index < chars.len() {
        let ch = chars[index];
        let next = chars.get(index + 1).copied();

        if ch == '\n' {
            scanner.in_comment = false;
        }

        if ch == '/' && next == Some('/') && !scanner.in_comment && !scanner.in_string {
            scanner.flush(pos);
            scanner.in_comment = true;
            scanner.start = pos;
        }

        if scanner.in_comment {
            if ch != '\r' {
                scanner.value.push(ch);
            }
        } else if is_separator(ch) && !scanner.in_string {
            scanner.flush(pos);
        } else if is_divider(ch) && !scanner.in_string {
            scanner.flush(pos);
            scanner.push_divider(ch, pos);
            scanner.start = pos.advance(ch);
        } else if ch == '"' {
            if scanner.in_string {
                if next == Some('"') {
                    // Doubled quote inside a literal
                    scanner.value.push('"');
                    pos = pos.advance(ch).advance('"');
                    index += 2;
                    continue;
                }
                scanner.flush(pos.advance(ch));
                scanner.in_string = false;
            } else {
                scanner.flush(pos);
                scanner.in_string = true;
                scanner.start = pos;
            }
        } else {
            if scanner.value.is_empty() && !scanner.in_string {
                scanner.start = pos;
            }
            scanner.value.push(ch);
        }

        pos = pos.advance(ch);
        index += 1;
    }

    let unterminated_string = if scanner.in_string {
        Some(scanner.start)
    } else {
        None
    };

    if scanner.in_string || !scanner.value.is_empty() {
        scanner.flush(pos);
    }

    ScanOutput {
        tokens: scanner.tokens,
        unterminated_string,
    }
}
