//! Syntax analysis: token stream to AST
//!
//! [`parse_module`] drives the module builder over a whole-file token stream.
//! Subprogram headers are parsed directly from tokens; statement bodies go
//! through the shunting-yard expression parser in [`expression`].

mod builder;
mod error;
pub mod expression;
mod subprogram;

pub use builder::ModuleBuilder;
pub use error::{SyntaxError, SyntaxResult};
pub use expression::{parse_expression, parse_statement};
pub use subprogram::parse_subprogram;

use crate::config::runtime::SyntaxPreferences;
use crate::grammar::ast::Node;
use crate::lexical::LexicalAnalyzer;
use crate::logging::codes;
use crate::tokens::TokenStream;
use crate::{log_debug, log_error, log_info, log_success};

/// Build the module AST with default preferences
pub fn parse_module(token_stream: TokenStream) -> SyntaxResult<Node> {
    parse_module_with_preferences(token_stream, SyntaxPreferences::default())
}

pub fn parse_module_with_preferences(
    token_stream: TokenStream,
    preferences: SyntaxPreferences,
) -> SyntaxResult<Node> {
    log_debug!("Starting syntax analysis", "tokens" => token_stream.len());

    let source_map = token_stream.source_map().cloned();
    let result = ModuleBuilder::with_preferences(preferences).build(token_stream);

    match &result {
        Ok(module) => {
            log_success!(
                codes::success::AST_CONSTRUCTION_COMPLETE,
                "Syntax analysis completed successfully",
                "top_level_nodes" => module.children().len(),
                "subprograms" => module.subprograms().len(),
                "total_nodes" => module.count_nodes()
            );
        }
        Err(error) => {
            let rendered = match (error.span(), &source_map) {
                (Some(span), Some(map)) => map.format_error(&span, &error.to_string()),
                _ => error.to_string(),
            };
            match error.span() {
                Some(span) => log_error!(error.error_code(), "Syntax analysis failed", span = span,
                    "error" => rendered
                ),
                None => log_error!(error.error_code(), "Syntax analysis failed",
                    "error" => rendered
                ),
            }
        }
    }

    result
}

/// Tokenize and parse source text in one call
pub fn parse_source(source: &str) -> Result<Node, crate::pipeline::PipelineError> {
    let token_stream = LexicalAnalyzer::new().tokenize_source(source, "<source>")?;
    Ok(parse_module(token_stream)?)
}

/// Check that every syntax error code has registry metadata
pub fn init_syntax_logging() -> Result<(), String> {
    let syntax_codes = [
        codes::syntax::UNEXPECTED_END_OF_STREAM,
        codes::syntax::MISMATCHED_DELIMITER,
        codes::syntax::MALFORMED_EXPRESSION,
        codes::syntax::UNEXPECTED_TOKEN,
        codes::syntax::MAX_RECURSION_DEPTH,
    ];

    for code in &syntax_codes {
        if codes::get_error_metadata(code.as_str()).is_none() {
            return Err(format!(
                "Syntax error code {} not found in metadata registry",
                code.as_str()
            ));
        }
    }

    log_info!("Syntax module logging validation completed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::ast::SubprogramDescriptor;
    use crate::lexical::tokenize;
    use assert_matches::assert_matches;

    const MODULE: &str = "\
&НаКлиенте
Процедура ПриОткрытии(Отказ, Знач Режим = 1) Экспорт
    Сообщение = Новый СообщениеПользователю;
    Сообщение.Текст = \"Открыто\";
    Сообщение.Сообщить();
КонецПроцедуры

Функция Сумма(а, б)
    Возврат а + б;
КонецФункции
";

    #[test]
    fn test_module_initialization() {
        assert!(init_syntax_logging().is_ok());
    }

    #[test]
    fn test_empty_module() {
        let module = parse_module(TokenStream::new(Vec::new())).unwrap();
        assert_eq!(module, Node::Module { children: Vec::new() });
    }

    #[test]
    fn test_parse_source_end_to_end() {
        let module = parse_source(MODULE).unwrap();
        let subs: Vec<&SubprogramDescriptor> = module.subprograms();

        assert_eq!(subs.len(), 2);
        assert_matches!(module.children()[1], Node::Function(_));

        let handler = subs[0];
        assert_eq!(handler.name, "ПриОткрытии");
        assert_eq!(handler.annotations, vec!["&НаКлиенте"]);
        assert!(handler.export);
        assert!(handler.parameter("режим").is_some_and(|p| p.passed_by_value && p.has_default));
        assert_eq!(handler.body.len(), 3);
        assert_eq!(handler.body[0].to_string(), "(= Сообщение (new СообщениеПользователю))");
        assert_eq!(handler.body[1].to_string(), "(= (. Сообщение Текст) \"Открыто\")");
        assert_eq!(handler.body[2].to_string(), "(. Сообщение (call Сообщить))");

        assert!(subs[1].body[0].is_unparsed());
    }

    #[test]
    fn test_errors_propagate() {
        assert_matches!(
            parse_module(TokenStream::new(tokenize("Процедура П(\n"))),
            Err(SyntaxError::UnexpectedEndOfStream { .. })
        );
        assert_matches!(
            parse_module(TokenStream::new(tokenize("а = (1 + 2;"))),
            Err(SyntaxError::MismatchedDelimiter { .. })
        );
    }

    #[test]
    fn test_preferences_control_directives() {
        let strict = SyntaxPreferences {
            skip_preprocessor_directives: false,
            ..Default::default()
        };
        let tokens = || TokenStream::new(tokenize("#Область Тест\n#КонецОбласти"));

        assert!(parse_module(tokens()).is_ok());
        assert_matches!(
            parse_module_with_preferences(tokens(), strict),
            Err(SyntaxError::UnexpectedToken { .. })
        );
    }
}
