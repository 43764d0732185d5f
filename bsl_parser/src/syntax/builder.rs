//! Module-level AST builder
//!
//! Walks the top-level token stream and dispatches each construct: annotations
//! are held for the next subprogram, comments are dropped, subprogram blocks go
//! to the subprogram parser and identifier-led statements to the expression
//! parser. Preprocessor directive lines are skipped when configured to be.
//! Anything else at top level is rejected.

use crate::config::runtime::SyntaxPreferences;
use crate::grammar::ast::Node;
use crate::syntax::error::{SyntaxError, SyntaxResult};
use crate::syntax::expression::parse_statement;
use crate::syntax::subprogram::parse_subprogram;
use crate::tokens::{TokenKind, TokenStream};
use crate::log_debug;

const TOP_LEVEL_EXPECTED: &str = "annotation, comment, subprogram or expression statement";

pub struct ModuleBuilder {
    preferences: SyntaxPreferences,
    pending_annotations: Vec<String>,
    skipped_directives: usize,
}

impl ModuleBuilder {
    pub fn new() -> Self {
        Self::with_preferences(SyntaxPreferences::default())
    }

    pub fn with_preferences(preferences: SyntaxPreferences) -> Self {
        Self {
            preferences,
            pending_annotations: Vec::new(),
            skipped_directives: 0,
        }
    }

    /// Number of preprocessor directive tokens skipped by the last build
    pub fn skipped_directives(&self) -> usize {
        self.skipped_directives
    }

    /// Build the module root from a whole-module token stream
    pub fn build(&mut self, mut stream: TokenStream) -> SyntaxResult<Node> {
        self.pending_annotations.clear();
        self.skipped_directives = 0;
        let mut children = Vec::new();

        while let Some(kind) = stream.current_kind() {
            match kind {
                TokenKind::Annotation => {
                    let token = stream.read_expecting("annotation")?;
                    self.pending_annotations.push(token.text);
                }
                TokenKind::Comment => {
                    stream.read();
                }
                TokenKind::BeginProcedure => {
                    stream.read();
                    let block =
                        stream.extract_block(TokenKind::BeginProcedure, TokenKind::EndProcedure)?;
                    let annotations = std::mem::take(&mut self.pending_annotations);
                    children.push(Node::Procedure(parse_subprogram(block, annotations)?));
                }
                TokenKind::BeginFunction => {
                    stream.read();
                    let block =
                        stream.extract_block(TokenKind::BeginFunction, TokenKind::EndFunction)?;
                    let annotations = std::mem::take(&mut self.pending_annotations);
                    children.push(Node::Function(parse_subprogram(block, annotations)?));
                }
                TokenKind::Identifier => {
                    if let Some(statement) = stream.extract_statement() {
                        if let Some(node) = parse_statement(&statement)? {
                            self.log_unparsed(&node);
                            children.push(node);
                        }
                    }
                }
                _ if kind.is_directive() && self.preferences.skip_preprocessor_directives => {
                    self.skip_directive_line(&mut stream)?;
                }
                _ => {
                    let token = stream.current()?;
                    return Err(SyntaxError::unexpected_token(TOP_LEVEL_EXPECTED, token));
                }
            }
        }

        Ok(Node::Module { children })
    }

    /// Directives are line-oriented: drop the directive and its operands
    fn skip_directive_line(&mut self, stream: &mut TokenStream) -> SyntaxResult<()> {
        let directive = stream.read_expecting("directive")?;
        let mut operands = 0usize;
        while stream
            .peek()
            .is_some_and(|token| token.row() == directive.row())
        {
            stream.read();
            operands += 1;
        }

        self.skipped_directives += 1;
        log_debug!("Skipping preprocessor directive",
            "directive" => directive.text.as_str(),
            "operands" => operands,
            "position" => directive.span
        );
        Ok(())
    }

    fn log_unparsed(&self, node: &Node) {
        if self.preferences.log_unparsed_statements && node.is_unparsed() {
            log_debug!("Top-level statement kept unparsed",
                "span" => node.span().map(|s| s.to_string()).unwrap_or_default()
            );
        }
    }
}

impl Default for ModuleBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexical::tokenize;
    use assert_matches::assert_matches;

    fn build(source: &str) -> SyntaxResult<Node> {
        ModuleBuilder::new().build(TokenStream::new(tokenize(source)))
    }

    fn strict() -> ModuleBuilder {
        ModuleBuilder::with_preferences(SyntaxPreferences {
            skip_preprocessor_directives: false,
            log_unparsed_statements: false,
        })
    }

    #[test]
    fn test_minimal_procedure_round_trip() {
        let module = build("Процедура Тест()\nКонецПроцедуры").unwrap();
        let subs = module.subprograms();

        assert_eq!(module.children().len(), 1);
        assert_matches!(module.children()[0], Node::Procedure(_));
        assert_eq!(subs[0].name, "Тест");
        assert!(subs[0].parameters.is_empty());
        assert!(subs[0].body.is_empty());
        assert!(!subs[0].export);
    }

    #[test]
    fn test_annotations_attach_to_next_subprogram_only() {
        let module = build(
            "&НаКлиенте\n// c\nФункция Ф() Экспорт\n  Возврат 1;\nКонецФункции\n\
             Процедура П()\nКонецПроцедуры",
        )
        .unwrap();
        let subs = module.subprograms();

        assert_matches!(module.children()[0], Node::Function(_));
        assert_eq!(subs[0].annotations, vec!["&НаКлиенте"]);
        assert!(subs[0].export);
        assert!(subs[1].annotations.is_empty());
    }

    #[test]
    fn test_top_level_statements_in_source_order() {
        let module = build("а = 1;\nПроцедура П()\nКонецПроцедуры\nб.в(2);").unwrap();
        let kinds: Vec<&str> = module.children().iter().map(|n| n.kind_name()).collect();
        assert_eq!(kinds, vec!["Binary", "Procedure", "Member"]);
    }

    #[test]
    fn test_directives_skipped_or_rejected() {
        let source = "#Область Основная\nПроцедура П()\nКонецПроцедуры\n#КонецОбласти\n\
                      #Если Сервер Тогда\nа = 1;\n#КонецЕсли";

        let mut builder = ModuleBuilder::new();
        let module = builder.build(TokenStream::new(tokenize(source))).unwrap();
        assert_eq!(module.subprograms().len(), 1);
        assert_eq!(module.children().len(), 2);
        assert_eq!(builder.skipped_directives(), 4);

        assert_matches!(
            strict().build(TokenStream::new(tokenize(source))),
            Err(SyntaxError::UnexpectedToken { found: TokenKind::DirectiveRegion, .. })
        );
    }

    #[test]
    fn test_unhandled_top_level_kind_is_rejected() {
        assert_matches!(
            build("Перем а;"),
            Err(SyntaxError::UnexpectedToken { found: TokenKind::KeywordVar, .. })
        );
    }

    #[test]
    fn test_unterminated_subprogram() {
        assert_matches!(
            build("Процедура П()\n  а = 1;"),
            Err(SyntaxError::UnexpectedEndOfStream { .. })
        );
    }

    #[test]
    fn test_everyday_statements_parse_inside_bodies() {
        let module = build(
            "Процедура П(а, // первый\n  б)\n\
               Флаг = а <> б;\n\
               Сумма = -Документ.Сумма;\n\
               Цена = 1.5;\n\
               Ф(, 1);\n\
             КонецПроцедуры",
        )
        .unwrap();
        let sub = &module.subprograms()[0];

        assert_eq!(sub.parameters.len(), 2);
        let body: Vec<String> = sub.body.iter().map(|n| n.to_string()).collect();
        assert_eq!(
            body,
            vec![
                "(= Флаг (<> а б))",
                "(= Сумма (- (. Документ Сумма)))",
                "(= Цена 1.5)",
                "(call Ф _ 1)",
            ]
        );
    }

    #[test]
    fn test_function_block_closes_at_end_function() {
        let module = build("Функция Ф()\n  Возврат 1;\nКонецФункции\nа = 2;").unwrap();
        assert_eq!(module.children().len(), 2);
        assert_eq!(module.subprograms()[0].body.len(), 1);
    }
}
