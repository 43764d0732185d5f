// RUNTIME PREFERENCES (User Experience)

use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

/// Errors raised while loading a runtime preferences file
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read configuration file '{path}': {message}")]
    Io { path: String, message: String },

    #[error("Invalid runtime configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileProcessorPreferences {
    /// Whether to require a .bsl or .os extension
    pub require_bsl_extension: bool,

    /// Whether to enable detailed performance logging
    pub enable_performance_logging: bool,

    /// Whether to log debug information for files with other extensions
    pub log_non_bsl_processing: bool,

    /// Whether to include complexity scores in output
    pub include_complexity_metrics: bool,
}

impl Default for FileProcessorPreferences {
    fn default() -> Self {
        Self {
            require_bsl_extension: env::var("BSL_FILE_REQUIRE_EXTENSION")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),
            enable_performance_logging: env::var("BSL_FILE_PERFORMANCE_LOGGING")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(true),
            log_non_bsl_processing: env::var("BSL_FILE_LOG_NON_BSL")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),
            include_complexity_metrics: env::var("BSL_FILE_COMPLEXITY_METRICS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LexicalPreferences {
    /// Whether to collect per-category token metrics
    pub collect_detailed_metrics: bool,

    /// Treat a string literal that never closes as an error instead of a warning
    pub strict_string_literals: bool,

    /// Whether to log string length statistics
    pub log_string_statistics: bool,

    /// Whether to show position information in error messages
    pub include_position_in_errors: bool,
}

impl Default for LexicalPreferences {
    fn default() -> Self {
        Self {
            collect_detailed_metrics: env::var("BSL_LEXICAL_DETAILED_METRICS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(true),
            strict_string_literals: env::var("BSL_LEXICAL_STRICT_STRINGS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),
            log_string_statistics: env::var("BSL_LEXICAL_LOG_STRING_STATS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),
            include_position_in_errors: env::var("BSL_LEXICAL_INCLUDE_POSITIONS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(true),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyntaxPreferences {
    /// Skip `#Область`/`#Если`-style directives at module level instead of rejecting them
    pub skip_preprocessor_directives: bool,

    /// Log a debug event for every statement kept as an unparsed token run
    pub log_unparsed_statements: bool,
}

impl Default for SyntaxPreferences {
    fn default() -> Self {
        Self {
            skip_preprocessor_directives: env::var("BSL_SYNTAX_SKIP_DIRECTIVES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(true),
            log_unparsed_statements: env::var("BSL_SYNTAX_LOG_UNPARSED")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingPreferences {
    /// Whether to use structured JSON logging
    pub use_structured_logging: bool,

    /// Whether to enable console output
    pub enable_console_logging: bool,

    /// Preferred minimum log level (within security constraints)
    pub min_log_level: LogLevel,

    /// Whether to include performance metrics in logs
    pub log_performance_events: bool,

    /// Whether to enable cargo-style error reporting
    pub enable_cargo_style_output: bool,

    /// Whether to include file context in log messages
    pub include_file_context: bool,

    /// Append log events to this file in addition to other sinks
    pub log_file: Option<PathBuf>,
}

impl Default for LoggingPreferences {
    fn default() -> Self {
        Self {
            use_structured_logging: env::var("BSL_LOG_STRUCTURED")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),
            enable_console_logging: env::var("BSL_LOG_CONSOLE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),
            min_log_level: env::var("BSL_LOG_LEVEL")
                .ok()
                .and_then(|v| parse_log_level(&v))
                .unwrap_or(LogLevel::Info),
            log_performance_events: env::var("BSL_LOG_PERFORMANCE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(true),
            enable_cargo_style_output: env::var("BSL_LOG_CARGO_STYLE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(true),
            include_file_context: env::var("BSL_LOG_FILE_CONTEXT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(true),
            log_file: env::var_os("BSL_LOG_FILE").map(PathBuf::from),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error = 0,
    Warning = 1,
    Info = 2,
    Debug = 3,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "ERROR",
            LogLevel::Warning => "WARN",
            LogLevel::Info => "INFO",
            LogLevel::Debug => "DEBUG",
        }
    }

    /// Convert to events::LogLevel
    pub fn to_events_log_level(&self) -> crate::logging::events::LogLevel {
        match self {
            LogLevel::Error => crate::logging::events::LogLevel::Error,
            LogLevel::Warning => crate::logging::events::LogLevel::Warning,
            LogLevel::Info => crate::logging::events::LogLevel::Info,
            LogLevel::Debug => crate::logging::events::LogLevel::Debug,
        }
    }
}

/// Parse log level from string (used for environment variables)
pub fn parse_log_level(level: &str) -> Option<LogLevel> {
    match level.to_lowercase().as_str() {
        "error" | "0" => Some(LogLevel::Error),
        "warning" | "warn" | "1" => Some(LogLevel::Warning),
        "info" | "2" => Some(LogLevel::Info),
        "debug" | "3" => Some(LogLevel::Debug),
        _ => None,
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub file_processor: FileProcessorPreferences,
    pub lexical: LexicalPreferences,
    pub syntax: SyntaxPreferences,
    pub logging: LoggingPreferences,
}

impl RuntimeConfig {
    /// Parse preferences from TOML text; missing sections fall back to environment defaults
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Load preferences from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_toml_str(&content)
    }
}

/// Environment variable names for configuration
pub mod env_vars {
    // File Processor
    pub const FILE_REQUIRE_EXTENSION: &str = "BSL_FILE_REQUIRE_EXTENSION";
    pub const FILE_PERFORMANCE_LOGGING: &str = "BSL_FILE_PERFORMANCE_LOGGING";
    pub const FILE_LOG_NON_BSL: &str = "BSL_FILE_LOG_NON_BSL";
    pub const FILE_COMPLEXITY_METRICS: &str = "BSL_FILE_COMPLEXITY_METRICS";

    // Lexical
    pub const LEXICAL_DETAILED_METRICS: &str = "BSL_LEXICAL_DETAILED_METRICS";
    pub const LEXICAL_STRICT_STRINGS: &str = "BSL_LEXICAL_STRICT_STRINGS";
    pub const LEXICAL_LOG_STRING_STATS: &str = "BSL_LEXICAL_LOG_STRING_STATS";
    pub const LEXICAL_INCLUDE_POSITIONS: &str = "BSL_LEXICAL_INCLUDE_POSITIONS";

    // Syntax
    pub const SYNTAX_SKIP_DIRECTIVES: &str = "BSL_SYNTAX_SKIP_DIRECTIVES";
    pub const SYNTAX_LOG_UNPARSED: &str = "BSL_SYNTAX_LOG_UNPARSED";

    // Logging
    pub const LOG_STRUCTURED: &str = "BSL_LOG_STRUCTURED";
    pub const LOG_CONSOLE: &str = "BSL_LOG_CONSOLE";
    pub const LOG_LEVEL: &str = "BSL_LOG_LEVEL";
    pub const LOG_PERFORMANCE: &str = "BSL_LOG_PERFORMANCE";
    pub const LOG_CARGO_STYLE: &str = "BSL_LOG_CARGO_STYLE";
    pub const LOG_FILE_CONTEXT: &str = "BSL_LOG_FILE_CONTEXT";
    pub const LOG_FILE: &str = "BSL_LOG_FILE";
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_log_level_parsing() {
        assert_eq!(parse_log_level("error"), Some(LogLevel::Error));
        assert_eq!(parse_log_level("ERROR"), Some(LogLevel::Error));
        assert_eq!(parse_log_level("0"), Some(LogLevel::Error));
        assert_eq!(parse_log_level("warn"), Some(LogLevel::Warning));
        assert_eq!(parse_log_level("warning"), Some(LogLevel::Warning));
        assert_eq!(parse_log_level("info"), Some(LogLevel::Info));
        assert_eq!(parse_log_level("debug"), Some(LogLevel::Debug));
        assert_eq!(parse_log_level("3"), Some(LogLevel::Debug));
        assert_eq!(parse_log_level("invalid"), None);
    }

    #[test]
    fn test_partial_toml_keeps_other_sections() {
        let config = RuntimeConfig::from_toml_str(
            r#"
            [lexical]
            strict_string_literals = true

            [logging]
            min_log_level = "debug"
            "#,
        )
        .unwrap();

        assert!(config.lexical.strict_string_literals);
        assert_eq!(config.logging.min_log_level, LogLevel::Debug);
        assert!(config.lexical.include_position_in_errors);
    }

    #[test]
    fn test_invalid_toml_is_rejected() {
        let result = RuntimeConfig::from_toml_str("[syntax]\nskip_preprocessor_directives = 3");
        assert_matches!(result, Err(ConfigError::Parse(_)));
    }

    #[test]
    fn test_from_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bsl.toml");
        fs::write(&path, "[syntax]\nskip_preprocessor_directives = false\n").unwrap();

        let config = RuntimeConfig::from_file(&path).unwrap();
        assert!(!config.syntax.skip_preprocessor_directives);

        let missing = RuntimeConfig::from_file(&dir.path().join("missing.toml"));
        assert_matches!(missing, Err(ConfigError::Io { .. }));
    }

    #[test]
    fn test_env_var_names_exist() {
        assert!(env_vars::LOG_LEVEL.starts_with("BSL_"));
        assert!(env_vars::SYNTAX_SKIP_DIRECTIVES.starts_with("BSL_"));
        assert!(env_vars::LEXICAL_STRICT_STRINGS.starts_with("BSL_"));
    }
}
