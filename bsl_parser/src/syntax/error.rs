//! Error types for token-to-AST transformation with global logging integration
//!
//! Every variant maps to a registered error code, so severity, category and
//! recoverability come from the code registry rather than being hard-coded here.

use crate::logging::{codes, Code};
use crate::tokens::{TokenKind, TokenStreamError};
use crate::utils::Span;

pub type SyntaxResult<T> = Result<T, SyntaxError>;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SyntaxError {
    #[error("Unexpected end of input: expected {expected}")]
    UnexpectedEndOfStream { expected: String },

    #[error("Unexpected token: expected {expected}, found {found} '{text}' at {span}")]
    UnexpectedToken {
        expected: String,
        found: TokenKind,
        text: String,
        span: Span,
    },

    #[error("Mismatched delimiter '{delimiter}' at {span}")]
    MismatchedDelimiter { delimiter: String, span: Span },

    #[error("Malformed expression: {message} at {span}")]
    MalformedExpression { message: String, span: Span },

    #[error("Maximum expression nesting depth exceeded at {span}")]
    MaxRecursionDepth { span: Span },
}

impl SyntaxError {
    pub fn unexpected_end(expected: &str) -> Self {
        Self::UnexpectedEndOfStream {
            expected: expected.to_string(),
        }
    }

    pub fn unexpected_token(expected: &str, token: &crate::tokens::Token) -> Self {
        Self::UnexpectedToken {
            expected: expected.to_string(),
            found: token.kind,
            text: token.text.clone(),
            span: token.span,
        }
    }

    pub fn mismatched_delimiter(delimiter: &str, span: Span) -> Self {
        Self::MismatchedDelimiter {
            delimiter: delimiter.to_string(),
            span,
        }
    }

    pub fn malformed_expression(message: &str, span: Span) -> Self {
        Self::MalformedExpression {
            message: message.to_string(),
            span,
        }
    }

    /// Get error code for global logging system
    pub fn error_code(&self) -> Code {
        match self {
            Self::UnexpectedEndOfStream { .. } => codes::syntax::UNEXPECTED_END_OF_STREAM,
            Self::UnexpectedToken { .. } => codes::syntax::UNEXPECTED_TOKEN,
            Self::MismatchedDelimiter { .. } => codes::syntax::MISMATCHED_DELIMITER,
            Self::MalformedExpression { .. } => codes::syntax::MALFORMED_EXPRESSION,
            Self::MaxRecursionDepth { .. } => codes::syntax::MAX_RECURSION_DEPTH,
        }
    }

    /// Get span if available
    pub fn span(&self) -> Option<Span> {
        match self {
            Self::UnexpectedToken { span, .. }
            | Self::MismatchedDelimiter { span, .. }
            | Self::MalformedExpression { span, .. }
            | Self::MaxRecursionDepth { span } => Some(*span),
            Self::UnexpectedEndOfStream { .. } => None,
        }
    }

    pub fn requires_halt(&self) -> bool {
        codes::requires_halt(self.error_code().as_str())
    }

    pub fn is_recoverable(&self) -> bool {
        codes::is_recoverable(self.error_code().as_str())
    }

    pub fn severity(&self) -> &'static str {
        codes::get_severity(self.error_code().as_str()).as_str()
    }

    pub fn category(&self) -> &'static str {
        codes::get_category(self.error_code().as_str())
    }

    pub fn description(&self) -> &'static str {
        codes::get_description(self.error_code().as_str())
    }

    pub fn recommended_action(&self) -> &'static str {
        codes::get_action(self.error_code().as_str())
    }

    /// Message with the registry's recommended action appended
    pub fn enhanced_message(&self) -> String {
        match self {
            Self::UnexpectedToken {
                expected, text, ..
            } => format!(
                "Expected {} but found '{}'. {}",
                expected,
                text,
                self.recommended_action()
            ),
            Self::UnexpectedEndOfStream { expected } => format!(
                "Unexpected end of input while expecting {}. {}",
                expected,
                self.recommended_action()
            ),
            Self::MismatchedDelimiter { delimiter, .. } => format!(
                "Unmatched '{}' delimiter. {}",
                delimiter,
                self.recommended_action()
            ),
            _ => format!("{} ({})", self, self.recommended_action()),
        }
    }
}

impl From<TokenStreamError> for SyntaxError {
    fn from(error: TokenStreamError) -> Self {
        match error {
            TokenStreamError::UnexpectedEndOfStream { expected } => {
                Self::UnexpectedEndOfStream { expected }
            }
            TokenStreamError::UnexpectedToken {
                expected,
                found,
                text,
                span,
            } => Self::UnexpectedToken {
                expected,
                found,
                text,
                span,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokens::Token;
    use crate::utils::Position;

    #[test]
    fn test_error_code_mapping() {
        let span = Span::dummy();
        let token = Token::at(TokenKind::Comma, ",", Position::start());

        assert_eq!(SyntaxError::unexpected_token("identifier", &token).error_code().as_str(), "E050");
        assert_eq!(SyntaxError::unexpected_end("')'").error_code().as_str(), "E040");
        assert_eq!(SyntaxError::mismatched_delimiter(")", span).error_code().as_str(), "E042");
        assert_eq!(
            SyntaxError::malformed_expression("missing operand", span).error_code().as_str(),
            "E043"
        );
        assert_eq!(SyntaxError::MaxRecursionDepth { span }.error_code().as_str(), "E087");
    }

    #[test]
    fn test_error_properties_come_from_registry() {
        let depth = SyntaxError::MaxRecursionDepth { span: Span::dummy() };
        assert!(depth.requires_halt());
        assert!(!depth.is_recoverable());

        let token = Token::at(TokenKind::Export, "Экспорт", Position::start());
        let unexpected = SyntaxError::unexpected_token("identifier", &token);
        assert!(!unexpected.requires_halt());
        assert!(unexpected.is_recoverable());
        assert_eq!(unexpected.category(), "Syntax");
        assert_eq!(unexpected.severity(), "High");
    }

    #[test]
    fn test_span_and_messages() {
        let span = Span::new(Position::new(10, 2, 3), Position::new(11, 2, 4));
        let error = SyntaxError::mismatched_delimiter(")", span);
        assert_eq!(error.span(), Some(span));
        assert!(error.enhanced_message().contains("Unmatched ')'"));

        let end = SyntaxError::unexpected_end("subprogram name");
        assert_eq!(end.span(), None);
        assert!(end.to_string().contains("subprogram name"));
    }

    #[test]
    fn test_from_token_stream_error() {
        let converted: SyntaxError = TokenStreamError::UnexpectedToken {
            expected: "(".to_string(),
            found: TokenKind::Identifier,
            text: "а".to_string(),
            span: Span::dummy(),
        }
        .into();
        assert!(matches!(
            converted,
            SyntaxError::UnexpectedToken { found: TokenKind::Identifier, .. }
        ));

        let end: SyntaxError = TokenStreamError::UnexpectedEndOfStream {
            expected: "a token".to_string(),
        }
        .into();
        assert_eq!(end, SyntaxError::unexpected_end("a token"));
    }
}
