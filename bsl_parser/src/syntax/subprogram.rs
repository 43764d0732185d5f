//! Procedure and function definitions
//!
//! Input is the block between `Процедура`/`Функция` and its end keyword, both
//! exclusive. Comments are dropped up front, so they may sit anywhere in the
//! header. The header is read token by token; the rest of the block is split
//! into `;`-terminated statements and handed to the expression parser.

use crate::grammar::ast::{ParameterDescriptor, SubprogramDescriptor};
use crate::logging::codes;
use crate::syntax::error::{SyntaxError, SyntaxResult};
use crate::syntax::expression::{join_split_lexemes, parse_statement};
use crate::tokens::{TokenKind, TokenStream};
use crate::{log_debug, log_success};

/// Parse a subprogram block, attaching the annotations collected before it
pub fn parse_subprogram(
    block: TokenStream,
    annotations: Vec<String>,
) -> SyntaxResult<SubprogramDescriptor> {
    let mut block = TokenStream::new(join_split_lexemes(block.without_comments().tokens()));

    let name = block.read_expecting("subprogram name")?;
    if name.kind != TokenKind::Identifier {
        return Err(SyntaxError::unexpected_token("subprogram name", &name));
    }
    block.check(TokenKind::OpeningBracket)?;

    let mut subprogram = SubprogramDescriptor::new(name.text);
    subprogram.annotations = annotations;
    subprogram.parameters = parse_parameters(&mut block)?;

    if block.current_kind() == Some(TokenKind::Export) {
        block.read();
        subprogram.export = true;
    }

    while let Some(statement) = block.extract_statement() {
        if let Some(node) = parse_statement(&statement)? {
            subprogram.body.push(node);
        }
    }

    log_success!(codes::success::SUBPROGRAM_PARSED, "Subprogram parsed",
        "name" => subprogram.name.as_str(),
        "parameters" => subprogram.parameters.len(),
        "statements" => subprogram.body.len(),
        "export" => subprogram.export
    );

    Ok(subprogram)
}

/// Read descriptors up to and including the closing `)`
fn parse_parameters(block: &mut TokenStream) -> SyntaxResult<Vec<ParameterDescriptor>> {
    let mut parameters = Vec::new();

    loop {
        let mut token = block.read_expecting("parameter name or ')'")?;

        // `()` and the recovery case of a trailing comma: `(а, )`
        if token.kind == TokenKind::ClosingBracket {
            break;
        }

        let passed_by_value = token.kind == TokenKind::KeywordVal;
        if passed_by_value {
            token = block.read_expecting("parameter name")?;
        }
        if token.kind != TokenKind::Identifier {
            return Err(SyntaxError::unexpected_token("parameter name", &token));
        }

        let mut parameter = ParameterDescriptor::new(token.text);
        parameter.passed_by_value = passed_by_value;

        let mut next = block.read_expecting("',', '=' or ')'")?;
        if next.kind == TokenKind::EqualsSign {
            parameter.has_default = true;
            parameter.default_value = Some(read_default_value(block)?);
            next = block.read_expecting("',' or ')'")?;
            if next.kind != TokenKind::Comma && next.kind != TokenKind::ClosingBracket {
                return Err(SyntaxError::unexpected_token("',' or ')'", &next));
            }
        }

        log_debug!("Parameter parsed",
            "name" => parameter.name.as_str(),
            "by_value" => parameter.passed_by_value,
            "has_default" => parameter.has_default
        );
        parameters.push(parameter);

        match next.kind {
            TokenKind::ClosingBracket => break,
            TokenKind::Comma => continue,
            _ => return Err(SyntaxError::unexpected_token("',', '=' or ')'", &next)),
        }
    }

    Ok(parameters)
}

/// A default is one constant or identifier token, or `-` followed by a number
fn read_default_value(block: &mut TokenStream) -> SyntaxResult<String> {
    let token = block.read_expecting("default value")?;

    match token.kind {
        TokenKind::MinusSign => {
            let number = block.read_expecting("numeric default value")?;
            if number.kind != TokenKind::NumericConst {
                return Err(SyntaxError::unexpected_token("numeric default value", &number));
            }
            Ok(format!("-{}", number.text))
        }
        kind if kind.is_operand() => Ok(token.text),
        _ => Err(SyntaxError::unexpected_token("default value", &token)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::ast::Node;
    use crate::lexical::tokenize;
    use assert_matches::assert_matches;

    /// Tokens after the begin keyword and before the end keyword
    fn block(source: &str) -> TokenStream {
        TokenStream::new(tokenize(source))
    }

    #[test]
    fn test_parameter_forms() {
        let sub = parse_subprogram(block("Proc(a, Val b, c = 1) Export"), Vec::new()).unwrap();

        assert_eq!(sub.name, "Proc");
        assert!(sub.export);
        assert_eq!(sub.parameters.len(), 3);

        assert_eq!(sub.parameters[0], ParameterDescriptor::new("a"));
        assert!(sub.parameters[1].passed_by_value);
        assert!(!sub.parameters[1].has_default);
        assert!(sub.parameters[2].has_default);
        assert_eq!(sub.parameters[2].default_value.as_deref(), Some("1"));
    }

    #[test]
    fn test_default_value_kinds() {
        let sub = parse_subprogram(
            block("П(Знач а = \"x\", б = Истина, в = -5, г = Неопределено)"),
            Vec::new(),
        )
        .unwrap();

        let defaults: Vec<Option<&str>> = sub
            .parameters
            .iter()
            .map(|p| p.default_value.as_deref())
            .collect();
        assert_eq!(defaults, vec![Some("x"), Some("Истина"), Some("-5"), Some("Неопределено")]);
        assert!(!sub.export);
    }

    #[test]
    fn test_body_statements_and_annotations() {
        let sub = parse_subprogram(
            block("Тест() Экспорт\n  а = 1;\n  ;\n  Сообщить(а) // вывод\n"),
            vec!["&НаКлиенте".to_string()],
        )
        .unwrap();

        assert_eq!(sub.annotations, vec!["&НаКлиенте"]);
        assert_eq!(sub.body.len(), 2);
        assert_eq!(sub.body[0].to_string(), "(= а 1)");
        assert_matches!(sub.body[1], Node::Call { .. });
    }

    #[test]
    fn test_comments_inside_header() {
        let sub = parse_subprogram(
            block("П(а, // первый\n  Знач б = 2.5 // второй\n) // конец\nЭкспорт\n  а = б;"),
            Vec::new(),
        )
        .unwrap();

        let names: Vec<&str> = sub.parameters.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["а", "б"]);
        assert!(sub.parameters[1].passed_by_value);
        assert_eq!(sub.parameters[1].default_value.as_deref(), Some("2.5"));
        assert!(sub.export);
        assert_eq!(sub.body.len(), 1);
    }

    #[test]
    fn test_header_errors() {
        assert_matches!(
            parse_subprogram(block(""), Vec::new()),
            Err(SyntaxError::UnexpectedEndOfStream { .. })
        );
        assert_matches!(
            parse_subprogram(block("Тест а"), Vec::new()),
            Err(SyntaxError::UnexpectedToken { found: TokenKind::Identifier, .. })
        );
        assert_matches!(
            parse_subprogram(block("Тест(а, б"), Vec::new()),
            Err(SyntaxError::UnexpectedEndOfStream { .. })
        );
        assert_matches!(
            parse_subprogram(block("Тест(а = 1 2)"), Vec::new()),
            Err(SyntaxError::UnexpectedToken { found: TokenKind::NumericConst, .. })
        );
        assert_matches!(
            parse_subprogram(block("Тест(а б)"), Vec::new()),
            Err(SyntaxError::UnexpectedToken { .. })
        );
    }
}
