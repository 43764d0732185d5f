//! Lexical analyzer with FileProcessingResult integration
//!
//! Wraps the scanner with compile-time security limits, runtime preferences and
//! the global logging system. The scanner itself never fails; every error here
//! comes from a limit check or from strict string-literal handling.

use crate::config::compile_time::lexical::*;
use crate::config::runtime::LexicalPreferences;
use crate::file_processor::FileProcessingResult;
use crate::lexical::scanner;
use crate::logging::codes;
use crate::tokens::{Token, TokenKind, TokenStream};
use crate::utils::{SourceMap, Span};
use crate::{log_debug, log_error, log_success, log_warning};
use serde::Serialize;

/// Lexical analysis errors with compile-time security boundaries
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LexerError {
    #[error("Unterminated string literal starting at line {row}, column {column}")]
    UnterminatedString { row: u32, column: u32 },

    #[error("Identifier too long: {length} characters (max {MAX_IDENTIFIER_LENGTH})")]
    IdentifierTooLong { length: usize },

    #[error("String too large: {size} characters (max {MAX_STRING_SIZE})")]
    StringTooLarge { size: usize },

    #[error("Comment too long: {length} characters (max {MAX_COMMENT_LENGTH})")]
    CommentTooLong { length: usize },

    #[error("Too many tokens: {count} (max {MAX_TOKEN_COUNT})")]
    TooManyTokens { count: usize },
}

impl LexerError {
    pub fn error_code(&self) -> crate::logging::Code {
        match self {
            LexerError::UnterminatedString { .. } => codes::lexical::UNTERMINATED_STRING,
            LexerError::IdentifierTooLong { .. } => codes::lexical::IDENTIFIER_TOO_LONG,
            LexerError::StringTooLarge { .. } => codes::lexical::STRING_TOO_LARGE,
            LexerError::CommentTooLong { .. } => codes::lexical::COMMENT_TOO_LONG,
            LexerError::TooManyTokens { .. } => codes::lexical::TOO_MANY_TOKENS,
        }
    }

    pub fn severity(&self) -> &'static str {
        codes::get_severity(self.error_code().as_str()).as_str()
    }
}

/// Per-module token statistics
#[derive(Debug, Default, Clone, Serialize)]
pub struct LexicalMetrics {
    pub total_tokens: usize,
    pub keyword_tokens: usize,
    pub identifier_tokens: usize,
    pub operator_tokens: usize,
    pub literal_tokens: usize,
    pub comment_count: usize,
    pub annotation_count: usize,
    pub directive_tokens: usize,
    pub max_string_length: usize,
    pub max_comment_length: usize,
    pub line_count: usize,
    pub unterminated_strings: usize,
}

impl LexicalMetrics {
    pub(crate) fn record_token(&mut self, token: &Token, preferences: &LexicalPreferences) {
        self.total_tokens += 1;

        if !preferences.collect_detailed_metrics {
            return;
        }

        let kind = token.kind;
        match kind {
            TokenKind::Identifier => self.identifier_tokens += 1,
            TokenKind::NumericConst | TokenKind::BooleanConst => self.literal_tokens += 1,
            TokenKind::StringConst => {
                self.literal_tokens += 1;
                self.record_string_length(token.text.chars().count(), preferences);
            }
            TokenKind::Comment => {
                self.comment_count += 1;
                self.max_comment_length = self.max_comment_length.max(token.text.chars().count());
            }
            TokenKind::Annotation => self.annotation_count += 1,
            _ if kind.is_directive() => self.directive_tokens += 1,
            _ if kind.is_binary_operator() => self.operator_tokens += 1,
            _ if kind.is_keyword() => self.keyword_tokens += 1,
            _ => {}
        }
    }

    fn record_string_length(&mut self, length: usize, preferences: &LexicalPreferences) {
        self.max_string_length = self.max_string_length.max(length);

        if preferences.log_string_statistics {
            log_debug!("String literal processed",
                "length" => length,
                "max_so_far" => self.max_string_length
            );
        }
    }
}

/// Lexical analyzer with global logging integration and compile-time security boundaries
pub struct LexicalAnalyzer {
    metrics: LexicalMetrics,
    preferences: LexicalPreferences,
}

impl LexicalAnalyzer {
    pub fn new() -> Self {
        Self {
            metrics: LexicalMetrics::default(),
            preferences: LexicalPreferences::default(),
        }
    }

    pub fn with_preferences(preferences: LexicalPreferences) -> Self {
        Self {
            metrics: LexicalMetrics::default(),
            preferences,
        }
    }

    /// Tokenize a loaded module file
    pub fn tokenize_file_result(
        &mut self,
        file_result: &FileProcessingResult,
    ) -> Result<TokenStream, LexerError> {
        let file_path = file_result.metadata.path.display().to_string();

        log_debug!("Starting lexical analysis",
            "file" => file_path.as_str(),
            "char_count" => file_result.char_count(),
            "line_count" => file_result.metadata.line_count,
            "file_size_bytes" => file_result.metadata.size
        );

        self.tokenize_source(&file_result.source, &file_path)
    }

    /// Tokenize module text; `origin` names the source in log events
    pub fn tokenize_source(&mut self, source: &str, origin: &str) -> Result<TokenStream, LexerError> {
        self.metrics = LexicalMetrics {
            line_count: source.lines().count(),
            ..LexicalMetrics::default()
        };

        let output = scanner::scan(source);

        if output.tokens.len() > MAX_TOKEN_COUNT {
            let error = LexerError::TooManyTokens {
                count: output.tokens.len(),
            };
            log_error!(error.error_code(), "Token limit exceeded",
                "token_count" => output.tokens.len(),
                "limit" => MAX_TOKEN_COUNT,
                "file" => origin
            );
            return Err(error);
        }

        if let Some(start) = output.unterminated_string {
            self.metrics.unterminated_strings += 1;
            let error = LexerError::UnterminatedString {
                row: start.row,
                column: start.column,
            };

            if self.preferences.strict_string_literals {
                log_error!(error.error_code(), "Unterminated string literal",
                    span = Span::single(start),
                    "file" => origin
                );
                return Err(error);
            }

            log_warning!("String literal runs to end of module",
                "row" => start.row,
                "column" => start.column,
                "file" => origin
            );
        }

        for token in &output.tokens {
            self.check_limits(token, origin)?;
            self.metrics.record_token(token, &self.preferences);
        }

        let token_stream = TokenStream::with_source_map(output.tokens, SourceMap::new(source.to_string()));

        log_success!(codes::success::TOKENIZATION_COMPLETE,
            "Lexical analysis completed successfully",
            "file" => origin,
            "token_count" => token_stream.len(),
            "keywords" => self.metrics.keyword_tokens,
            "identifiers" => self.metrics.identifier_tokens,
            "operators" => self.metrics.operator_tokens,
            "comments" => self.metrics.comment_count,
            "max_string_length" => self.metrics.max_string_length,
            "security_limits_applied" => format!("tokens:{}, strings:{}, identifiers:{}",
                MAX_TOKEN_COUNT, MAX_STRING_SIZE, MAX_IDENTIFIER_LENGTH)
        );

        Ok(token_stream)
    }

    /// Get current metrics
    pub fn metrics(&self) -> &LexicalMetrics {
        &self.metrics
    }

    /// Get current preferences
    pub fn preferences(&self) -> &LexicalPreferences {
        &self.preferences
    }

    /// SECURITY: Validate per-token sizes against compile-time limits
    fn check_limits(&self, token: &Token, origin: &str) -> Result<(), LexerError> {
        let length = token.text.chars().count();

        let error = match token.kind {
            TokenKind::StringConst if length > MAX_STRING_SIZE => {
                LexerError::StringTooLarge { size: length }
            }
            TokenKind::Identifier if length > MAX_IDENTIFIER_LENGTH => {
                LexerError::IdentifierTooLong { length }
            }
            TokenKind::Comment if length > MAX_COMMENT_LENGTH => {
                LexerError::CommentTooLong { length }
            }
            _ => return Ok(()),
        };

        let message = if self.preferences.include_position_in_errors {
            format!(
                "Lexical analysis failed at line {}, column {}",
                token.row(),
                token.column()
            )
        } else {
            "Lexical analysis failed".to_string()
        };

        log_error!(error.error_code(), &message,
            span = token.span,
            "length" => length,
            "file" => origin
        );
        Err(error)
    }
}

impl Default for LexicalAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn lenient() -> LexicalPreferences {
        LexicalPreferences {
            collect_detailed_metrics: true,
            strict_string_literals: false,
            ..Default::default()
        }
    }

    #[test]
    fn test_tokenize_source_builds_stream_with_source_map() {
        let mut analyzer = LexicalAnalyzer::with_preferences(lenient());
        let stream = analyzer
            .tokenize_source("Процедура П()\nКонецПроцедуры", "test.bsl")
            .unwrap();

        assert_eq!(stream.len(), 5);
        assert!(stream.source_map().is_some());
        assert_eq!(analyzer.metrics().total_tokens, 5);
        assert_eq!(analyzer.metrics().identifier_tokens, 1);
        assert_eq!(analyzer.metrics().keyword_tokens, 2);
        assert_eq!(analyzer.metrics().line_count, 2);
    }

    #[test]
    fn test_metrics_by_category() {
        let mut analyzer = LexicalAnalyzer::with_preferences(lenient());
        analyzer
            .tokenize_source("&НаСервере\n#Область Р\nА = \"текст\" + 1; // c", "m.bsl")
            .unwrap();

        let metrics = analyzer.metrics();
        assert_eq!(metrics.annotation_count, 1);
        assert_eq!(metrics.directive_tokens, 1);
        assert_eq!(metrics.literal_tokens, 2);
        assert_eq!(metrics.comment_count, 1);
        assert_eq!(metrics.max_string_length, 5);
        assert_eq!(metrics.operator_tokens, 2);
    }

    #[test]
    fn test_unterminated_string_lenient_and_strict() {
        let mut analyzer = LexicalAnalyzer::with_preferences(lenient());
        let stream = analyzer.tokenize_source("А = \"abc", "m.bsl").unwrap();
        assert_eq!(stream.len(), 3);
        assert_eq!(analyzer.metrics().unterminated_strings, 1);

        let mut strict = LexicalAnalyzer::with_preferences(LexicalPreferences {
            strict_string_literals: true,
            ..lenient()
        });
        let err = strict.tokenize_source("А = \"abc", "m.bsl").unwrap_err();
        assert_eq!(err, LexerError::UnterminatedString { row: 1, column: 5 });
        assert_eq!(err.error_code(), codes::lexical::UNTERMINATED_STRING);
    }

    #[test]
    fn test_identifier_length_limit() {
        let long_name = "я".repeat(MAX_IDENTIFIER_LENGTH + 1);
        let mut analyzer = LexicalAnalyzer::with_preferences(lenient());
        assert_matches!(
            analyzer.tokenize_source(&long_name, "m.bsl"),
            Err(LexerError::IdentifierTooLong { length }) if length == MAX_IDENTIFIER_LENGTH + 1
        );
    }

    #[test]
    fn test_empty_source_is_valid() {
        let mut analyzer = LexicalAnalyzer::new();
        let stream = analyzer.tokenize_source("", "empty.bsl").unwrap();
        assert!(stream.is_empty());
    }
}
