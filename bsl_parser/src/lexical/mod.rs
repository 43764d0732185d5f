//! Lexical analysis module with FileProcessingResult integration
//!
//! Turns BSL module text into classified tokens. [`scanner`] is the pure
//! character pass; [`analyzer`] layers limits, metrics and logging on top.

pub mod analyzer;
pub mod scanner;

use crate::config::compile_time::lexical::*;
use crate::config::runtime::LexicalPreferences;
use crate::file_processor::FileProcessingResult;
use crate::tokens::{TokenKind, TokenStream};
use serde::Serialize;

pub use analyzer::{LexerError, LexicalAnalyzer, LexicalMetrics};
pub use scanner::{scan, tokenize, ScanOutput};

// ============================================================================
// FILE-AWARE MODULE API WITH SECURITY BOUNDARIES
// ============================================================================

/// Tokenize file processing result with default preferences
pub fn tokenize_file_result(file_result: &FileProcessingResult) -> Result<TokenStream, LexerError> {
    let mut analyzer = LexicalAnalyzer::new();
    analyzer.tokenize_file_result(file_result)
}

/// Tokenize with custom runtime preferences (security boundaries remain compile-time)
pub fn tokenize_file_result_with_preferences(
    file_result: &FileProcessingResult,
    preferences: LexicalPreferences,
) -> Result<TokenStream, LexerError> {
    let mut analyzer = LexicalAnalyzer::with_preferences(preferences);
    analyzer.tokenize_file_result(file_result)
}

// ============================================================================
// MODULE INITIALIZATION AND VALIDATION
// ============================================================================

const LEXICAL_ERROR_CODES: [crate::logging::Code; 5] = [
    crate::logging::codes::lexical::UNTERMINATED_STRING,
    crate::logging::codes::lexical::IDENTIFIER_TOO_LONG,
    crate::logging::codes::lexical::STRING_TOO_LARGE,
    crate::logging::codes::lexical::COMMENT_TOO_LONG,
    crate::logging::codes::lexical::TOO_MANY_TOKENS,
];

/// Initialize lexical analysis module validation (for system startup)
pub fn init_lexical_analysis_logging() -> Result<(), String> {
    for code in &LEXICAL_ERROR_CODES {
        if crate::logging::codes::get_error_metadata(code.as_str()).is_none() {
            return Err(format!(
                "Lexical error code {} not found in metadata registry",
                code.as_str()
            ));
        }
    }

    crate::log_debug!("Lexical security limits initialized",
        "max_string_size" => MAX_STRING_SIZE,
        "max_identifier_length" => MAX_IDENTIFIER_LENGTH,
        "max_comment_length" => MAX_COMMENT_LENGTH,
        "max_token_count" => MAX_TOKEN_COUNT
    );

    Ok(())
}

/// Validate error code metadata and compile-time limits
pub fn validate_tokenization() -> Result<(), String> {
    for code in &LEXICAL_ERROR_CODES {
        let description = crate::logging::codes::get_description(code.as_str());
        if description == "Unknown error" {
            return Err(format!(
                "Lexical error code {} has no description",
                code.as_str()
            ));
        }
    }

    if MAX_STRING_SIZE == 0 {
        return Err("MAX_STRING_SIZE cannot be zero".to_string());
    }
    if MAX_IDENTIFIER_LENGTH == 0 {
        return Err("MAX_IDENTIFIER_LENGTH cannot be zero".to_string());
    }
    if MAX_TOKEN_COUNT == 0 {
        return Err("MAX_TOKEN_COUNT cannot be zero".to_string());
    }
    if MAX_COMMENT_LENGTH == 0 {
        return Err("MAX_COMMENT_LENGTH cannot be zero".to_string());
    }

    Ok(())
}

/// Get the current compile-time security limits (for reporting/debugging)
pub fn get_security_limits() -> SecurityLimits {
    SecurityLimits {
        max_string_size: MAX_STRING_SIZE,
        max_identifier_length: MAX_IDENTIFIER_LENGTH,
        max_comment_length: MAX_COMMENT_LENGTH,
        max_token_count: MAX_TOKEN_COUNT,
    }
}

/// Information about compile-time security limits
#[derive(Debug, Clone, Serialize)]
pub struct SecurityLimits {
    pub max_string_size: usize,
    pub max_identifier_length: usize,
    pub max_comment_length: usize,
    pub max_token_count: usize,
}

// ============================================================================
// TOKEN DISTRIBUTION
// ============================================================================

/// Count tokens per category across a whole stream, ignoring the cursor
pub fn get_token_counts(token_stream: &TokenStream) -> TokenCounts {
    let mut counts = TokenCounts::default();

    for token in token_stream.iter() {
        counts.total += 1;
        match token.kind {
            TokenKind::Identifier => counts.identifiers += 1,
            TokenKind::NumericConst => counts.numbers += 1,
            TokenKind::BooleanConst => counts.booleans += 1,
            TokenKind::StringConst => counts.strings += 1,
            TokenKind::Comment => counts.comments += 1,
            TokenKind::Annotation => counts.annotations += 1,
            kind if kind.is_directive() => counts.directives += 1,
            kind if kind.is_binary_operator() => counts.operators += 1,
            kind if kind.is_keyword() => counts.keywords += 1,
            _ => {} // brackets, commas, statement terminators
        }
    }

    counts
}

/// Token distribution for a module
#[derive(Debug, Default, Clone, Serialize)]
pub struct TokenCounts {
    pub total: usize,
    pub keywords: usize,
    pub identifiers: usize,
    pub numbers: usize,
    pub booleans: usize,
    pub strings: usize,
    pub comments: usize,
    pub annotations: usize,
    pub operators: usize,
    pub directives: usize,
}

impl TokenCounts {
    /// Tokens other than comments
    pub fn significant_tokens(&self) -> usize {
        self.total - self.comments
    }

    /// Whether the module contains anything beyond comments and punctuation
    pub fn has_content(&self) -> bool {
        self.keywords > 0 || self.identifiers > 0 || self.strings > 0
    }

    pub fn is_within_security_limits(&self) -> bool {
        self.total <= MAX_TOKEN_COUNT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_logging() {
        assert!(init_lexical_analysis_logging().is_ok());
    }

    #[test]
    fn test_validate_tokenization() {
        assert!(validate_tokenization().is_ok());
    }

    #[test]
    fn test_security_limits() {
        let limits = get_security_limits();
        assert!(limits.max_string_size > 0);
        assert!(limits.max_identifier_length > 0);
        assert!(limits.max_token_count > 0);
        assert_eq!(limits.max_comment_length, MAX_COMMENT_LENGTH);
    }

    #[test]
    fn test_token_counts() {
        let stream = TokenStream::new(tokenize(
            "&НаКлиенте\nФункция Ф(Знач А) Экспорт\n  Возврат Истина; // да\nКонецФункции",
        ));
        let counts = get_token_counts(&stream);

        assert_eq!(counts.total, 13);
        assert_eq!(counts.annotations, 1);
        assert_eq!(counts.keywords, 4);
        assert_eq!(counts.identifiers, 3);
        assert_eq!(counts.booleans, 1);
        assert_eq!(counts.comments, 1);
        assert_eq!(counts.significant_tokens(), 12);
        assert!(counts.has_content());
        assert!(counts.is_within_security_limits());
    }
}
