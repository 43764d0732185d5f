//! Log events emitted by the lexer, parser and file pipeline

use super::codes::{self, Code};
use crate::utils::Span;
use std::collections::BTreeMap;
use std::time::SystemTime;

/// Log severity levels, ordered from least to most verbose
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
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
}

/// Placeholder codes for events that carry no registry entry
const GENERIC_WARNING: Code = Code::new("W000");
const GENERIC_INFO: Code = Code::new("I000");
const GENERIC_DEBUG: Code = Code::new("D000");

fn truncate_message(message: &str) -> String {
    let limit = super::config::get_max_log_message_length();
    match message.char_indices().nth(limit) {
        Some((cut, _)) => format!("{}...", &message[..cut]),
        None => message.to_string(),
    }
}

#[derive(Debug, Clone)]
pub struct LogEvent {
    pub timestamp: SystemTime,
    pub level: LogLevel,
    pub code: Code,
    pub message: String,
    pub span: Option<Span>,
    /// Sorted so text and JSON output are stable
    pub context: BTreeMap<String, String>,
}

impl LogEvent {
    fn new(level: LogLevel, code: Code, message: &str) -> Self {
        Self {
            timestamp: SystemTime::now(),
            level,
            code,
            message: truncate_message(message),
            span: None,
            context: BTreeMap::new(),
        }
    }

    pub fn error(code: Code, message: &str) -> Self {
        Self::new(LogLevel::Error, code, message)
    }

    pub fn warning(message: &str) -> Self {
        Self::new(LogLevel::Warning, GENERIC_WARNING, message)
    }

    pub fn warning_with_code(code: Code, message: &str) -> Self {
        Self::new(LogLevel::Warning, code, message)
    }

    pub fn info(message: &str) -> Self {
        Self::new(LogLevel::Info, GENERIC_INFO, message)
    }

    /// Info-level event carrying a success code
    pub fn success(code: Code, message: &str) -> Self {
        Self::new(LogLevel::Info, code, message)
    }

    pub fn debug(message: &str) -> Self {
        Self::new(LogLevel::Debug, GENERIC_DEBUG, message)
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    pub fn with_context(mut self, key: &str, value: &str) -> Self {
        self.context.insert(key.to_string(), value.to_string());
        self
    }

    pub fn is_error(&self) -> bool {
        self.level == LogLevel::Error
    }

    pub fn is_warning(&self) -> bool {
        self.level == LogLevel::Warning
    }

    pub fn requires_halt(&self) -> bool {
        codes::requires_halt(self.code.as_str())
    }

    pub fn severity(&self) -> &'static str {
        codes::get_severity(self.code.as_str()).as_str()
    }

    pub fn category(&self) -> &'static str {
        codes::get_category(self.code.as_str())
    }

    pub fn description(&self) -> &'static str {
        codes::get_description(self.code.as_str())
    }

    pub fn recommended_action(&self) -> &'static str {
        codes::get_action(self.code.as_str())
    }

    pub fn is_recoverable(&self) -> bool {
        codes::is_recoverable(self.code.as_str())
    }

    /// One-line rendering: `[ERROR] E050 - message at 3:7`
    pub fn format(&self) -> String {
        let location = self
            .span
            .map(|s| format!(" at {}:{}", s.start.row, s.start.column))
            .unwrap_or_default();

        format!(
            "[{}] {} - {}{}",
            self.level.as_str(),
            self.code.as_str(),
            self.message,
            location
        )
    }

    /// Multi-line rendering with registry metadata and context
    pub fn format_detailed(&self) -> String {
        let mut output = self.format();

        if self.is_error() {
            output.push_str(&format!("\n  Category: {}", self.category()));
            output.push_str(&format!("\n  Severity: {}", self.severity()));
            output.push_str(&format!("\n  Recoverable: {}", self.is_recoverable()));

            let action = self.recommended_action();
            if action != "No specific action available" {
                output.push_str(&format!("\n  Recommended action: {}", action));
            }
        }

        if !self.context.is_empty() {
            output.push_str("\n  Context:");
            for (key, value) in &self.context {
                output.push_str(&format!("\n    {}: {}", key, value));
            }
        }

        output
    }

    pub fn format_json(&self) -> Result<String, serde_json::Error> {
        let timestamp = self
            .timestamp
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();

        let mut json = serde_json::json!({
            "timestamp": timestamp,
            "level": self.level.as_str(),
            "code": self.code.as_str(),
            "message": self.message,
        });

        if self.is_error() {
            json["error_metadata"] = serde_json::json!({
                "category": self.category(),
                "severity": self.severity(),
                "recoverable": self.is_recoverable(),
                "requires_halt": self.requires_halt(),
                "recommended_action": self.recommended_action(),
            });
        }

        if let Some(span) = &self.span {
            json["span"] = serde_json::to_value(span)?;
        }

        if !self.context.is_empty() {
            json["context"] = serde_json::to_value(&self.context)?;
        }

        serde_json::to_string(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::Position;

    #[test]
    fn test_event_levels() {
        assert!(LogEvent::error(codes::syntax::UNEXPECTED_TOKEN, "bad").is_error());
        assert!(LogEvent::warning("careful").is_warning());
        assert_eq!(LogEvent::info("note").level, LogLevel::Info);
        assert_eq!(
            LogEvent::success(codes::success::TOKENIZATION_COMPLETE, "done").level,
            LogLevel::Info
        );
        assert!(LogLevel::Error < LogLevel::Debug);
    }

    #[test]
    fn test_format_includes_location() {
        let span = Span::from_token_extent(Position::new(14, 2, 5), 3);
        let event = LogEvent::error(codes::syntax::UNEXPECTED_TOKEN, "Unexpected token").with_span(span);
        assert_eq!(event.format(), "[ERROR] E050 - Unexpected token at 2:5");
    }

    #[test]
    fn test_format_detailed_uses_registry() {
        let event = LogEvent::error(codes::syntax::MAX_RECURSION_DEPTH, "Too deep")
            .with_context("depth", "129");
        let detailed = event.format_detailed();
        assert!(detailed.contains("Recoverable: false"));
        assert!(detailed.contains("depth: 129"));
        assert!(event.requires_halt());
    }

    #[test]
    fn test_long_messages_are_truncated() {
        let limit = crate::logging::config::get_max_log_message_length();
        let event = LogEvent::info(&"я".repeat(limit + 10));
        assert_eq!(event.message.chars().count(), limit + 3);
        assert!(event.message.ends_with("..."));
    }

    #[test]
    fn test_json_format() {
        let event = LogEvent::error(codes::file_processing::PERMISSION_DENIED, "Access denied")
            .with_context("file", "Модуль.bsl");
        let json: serde_json::Value = serde_json::from_str(&event.format_json().unwrap()).unwrap();

        assert_eq!(json["code"], "E009");
        assert_eq!(json["context"]["file"], "Модуль.bsl");
        assert_eq!(json["error_metadata"]["recoverable"], event.is_recoverable());
    }
}
