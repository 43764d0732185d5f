use crate::config::runtime::ConfigError;
use crate::file_processor::FileProcessorError;
use crate::lexical::LexerError;
use crate::logging::{codes, Code};
use crate::syntax::SyntaxError;

/// Pipeline processing errors
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("File processing failed: {0}")]
    FileProcessing(#[from] FileProcessorError),

    #[error("Lexical analysis failed: {0}")]
    LexicalAnalysis(#[from] LexerError),

    #[error("Syntax analysis failed: {0}")]
    SyntaxAnalysis(#[from] SyntaxError),

    #[error("Configuration failed: {0}")]
    Configuration(#[from] ConfigError),

    #[error("Pipeline error: {message}")]
    Pipeline { message: String },
}

impl PipelineError {
    pub fn pipeline_error(message: &str) -> Self {
        Self::Pipeline {
            message: message.to_string(),
        }
    }

    pub fn error_code(&self) -> Code {
        match self {
            Self::FileProcessing(e) => e.error_code(),
            Self::LexicalAnalysis(e) => e.error_code(),
            Self::SyntaxAnalysis(e) => e.error_code(),
            Self::Configuration(_) => codes::system::INITIALIZATION_FAILURE,
            Self::Pipeline { .. } => codes::system::INTERNAL_ERROR,
        }
    }

    /// Stage that produced the error, as shown in batch reports
    pub fn stage(&self) -> &'static str {
        match self {
            Self::FileProcessing(_) => "file",
            Self::LexicalAnalysis(_) => "lexical",
            Self::SyntaxAnalysis(_) => "syntax",
            Self::Configuration(_) => "config",
            Self::Pipeline { .. } => "pipeline",
        }
    }
}
