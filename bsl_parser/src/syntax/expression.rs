//! Operator-precedence expression parsing
//!
//! Two passes: [`shunting_yard`] linearizes an infix token run into postfix
//! order, after gluing split lexemes (`1.5`, `<>`, `<=`, `>=`) back together,
//! then [`build_tree`] folds the postfix sequence into a [`Node`] with an
//! explicit operand stack. Call and subscript applications are carried through
//! the postfix form as markers with their argument counts.
//!
//! Precedence, lowest to highest:
//!
//! | operators          | precedence | associativity |
//! |--------------------|-----------:|---------------|
//! | `=`                | 0          | right         |
//! | `<>` `<` `<=` `>` `>=` | 1      | left          |
//! | `+` `-`            | 2          | left          |
//! | `*` `/`            | 3          | left          |
//! | prefix `-` `+` `Новый` | 4      | right         |
//! | `.`                | 5          | left          |

use crate::config::compile_time::syntax::{MAX_EXPRESSION_DEPTH, MAX_STATEMENT_TOKENS};
use crate::grammar::ast::{BinaryOperator, Node, UnaryOperator};
use crate::log_debug;
use crate::syntax::error::{SyntaxError, SyntaxResult};
use crate::tokens::{Token, TokenKind, TokenStream};
use crate::utils::Span;

const PREFIX_PRECEDENCE: i32 = 4;

/// One element of the postfix linearization
#[derive(Debug, Clone, PartialEq)]
pub enum PostfixItem {
    Operand(Token),
    /// Binary operator, including member access `.`
    Operator(Token),
    /// Prefix sign
    Unary(Token),
    New(Token),
    /// Application of the preceding callee to `arity` arguments; `token` is the `(`
    Call { token: Token, arity: usize },
    /// Index application; `token` is the `[`
    Subscript(Token),
    /// Empty slot in a call argument list; `token` is the `,` or `)` after it
    Omitted(Token),
}

impl PostfixItem {
    pub fn token(&self) -> &Token {
        match self {
            PostfixItem::Operand(token)
            | PostfixItem::Operator(token)
            | PostfixItem::Unary(token)
            | PostfixItem::New(token)
            | PostfixItem::Subscript(token)
            | PostfixItem::Omitted(token) => token,
            PostfixItem::Call { token, .. } => token,
        }
    }
}

/// Binding strength of an infix operator; -1 for kinds that never pop
pub fn precedence(kind: TokenKind) -> i32 {
    match kind {
        TokenKind::EqualsSign => 0,
        TokenKind::LessSign | TokenKind::GreaterSign => 1,
        TokenKind::PlusSign | TokenKind::MinusSign => 2,
        TokenKind::MultiplySign | TokenKind::DivisionSign => 3,
        TokenKind::DotSign => 5,
        _ => -1,
    }
}

/// Open bracket bookkeeping for argument counting
struct Frame {
    token: Token,
    is_call: bool,
    output_mark: usize,
    commas: usize,
}

enum StackEntry {
    Binary(Token),
    Prefix(Token),
    Open(Frame),
}

impl StackEntry {
    fn precedence(&self) -> i32 {
        match self {
            StackEntry::Binary(token) => precedence(token.kind),
            StackEntry::Prefix(_) => PREFIX_PRECEDENCE,
            StackEntry::Open(_) => -1,
        }
    }
}

struct ShuntingYard {
    output: Vec<PostfixItem>,
    stack: Vec<StackEntry>,
    open_depth: usize,
    expect_operand: bool,
}

impl ShuntingYard {
    fn new() -> Self {
        Self {
            output: Vec::new(),
            stack: Vec::new(),
            open_depth: 0,
            expect_operand: true,
        }
    }

    fn emit(&mut self, entry: StackEntry) {
        match entry {
            StackEntry::Binary(token) => self.output.push(PostfixItem::Operator(token)),
            StackEntry::Prefix(token) if token.kind == TokenKind::OperatorNew => {
                self.output.push(PostfixItem::New(token))
            }
            StackEntry::Prefix(token) => self.output.push(PostfixItem::Unary(token)),
            StackEntry::Open(_) => {}
        }
    }

    /// Pop operators until an open bracket is on top; returns that frame
    fn pop_to_open(&mut self) -> Option<Frame> {
        while let Some(entry) = self.stack.pop() {
            match entry {
                StackEntry::Open(frame) => return Some(frame),
                other => self.emit(other),
            }
        }
        None
    }

    fn last_output_is_identifier(&self) -> bool {
        matches!(
            self.output.last(),
            Some(PostfixItem::Operand(token)) if token.kind == TokenKind::Identifier
        )
    }

    fn push_open(&mut self, token: Token, is_call: bool) -> SyntaxResult<()> {
        self.open_depth += 1;
        if self.open_depth > MAX_EXPRESSION_DEPTH {
            return Err(SyntaxError::MaxRecursionDepth { span: token.span });
        }

        let token = if is_call { token.with_call_hint() } else { token };
        self.stack.push(StackEntry::Open(Frame {
            token,
            is_call,
            output_mark: self.output.len(),
            commas: 0,
        }));
        self.expect_operand = true;
        Ok(())
    }

    fn process(&mut self, token: Token) -> SyntaxResult<()> {
        let kind = token.kind;

        match kind {
            _ if kind.is_operand() => {
                self.output.push(PostfixItem::Operand(token));
                self.expect_operand = false;
            }

            TokenKind::OperatorNew => {
                self.stack.push(StackEntry::Prefix(token));
                self.expect_operand = true;
            }

            TokenKind::PlusSign | TokenKind::MinusSign if self.expect_operand => {
                self.stack.push(StackEntry::Prefix(token));
            }

            _ if kind.is_binary_operator() => {
                if self.expect_operand {
                    return Err(SyntaxError::malformed_expression(
                        &format!("missing operand before '{}'", token.text),
                        token.span,
                    ));
                }

                let incoming = precedence(kind);
                let right_associative = kind == TokenKind::EqualsSign;
                while let Some(top) = self.stack.last() {
                    let top_precedence = top.precedence();
                    if top_precedence == -1
                        || top_precedence < incoming
                        || (right_associative && top_precedence == incoming)
                    {
                        break;
                    }
                    if let Some(entry) = self.stack.pop() {
                        self.emit(entry);
                    }
                }

                self.stack.push(StackEntry::Binary(token));
                self.expect_operand = true;
            }

            TokenKind::OpeningBracket => {
                let is_call = !self.expect_operand && self.last_output_is_identifier();
                self.push_open(token, is_call)?;
            }

            TokenKind::OpeningSquareBracket => {
                if self.expect_operand {
                    return Err(SyntaxError::malformed_expression(
                        "subscript without an indexed value",
                        token.span,
                    ));
                }
                self.push_open(token, false)?;
            }

            TokenKind::Comma => {
                match self.pop_to_open() {
                    Some(mut frame) if frame.is_call => {
                        if self.expect_operand {
                            self.output.push(PostfixItem::Omitted(token));
                        }
                        frame.commas += 1;
                        self.stack.push(StackEntry::Open(frame));
                        self.expect_operand = true;
                    }
                    _ => {
                        return Err(SyntaxError::unexpected_token(
                            "call argument separator inside '(' ')'",
                            &token,
                        ))
                    }
                }
            }

            TokenKind::ClosingBracket | TokenKind::ClosingSquareBracket => {
                self.close(token)?;
            }

            _ => {
                return Err(SyntaxError::unexpected_token("expression token", &token));
            }
        }

        Ok(())
    }

    fn close(&mut self, token: Token) -> SyntaxResult<()> {
        let frame = self
            .pop_to_open()
            .ok_or_else(|| SyntaxError::mismatched_delimiter(&token.text, token.span))?;
        self.open_depth = self.open_depth.saturating_sub(1);

        let expected_open = match token.kind {
            TokenKind::ClosingBracket => TokenKind::OpeningBracket,
            _ => TokenKind::OpeningSquareBracket,
        };
        if frame.token.kind != expected_open {
            return Err(SyntaxError::mismatched_delimiter(&token.text, token.span));
        }

        if self.expect_operand {
            if frame.is_call && frame.commas > 0 {
                self.output.push(PostfixItem::Omitted(token.clone()));
            } else if self.output.len() > frame.output_mark || !frame.is_call {
                return Err(SyntaxError::malformed_expression(
                    &format!("missing operand before '{}'", token.text),
                    token.span,
                ));
            }
        }
        let grew = self.output.len() > frame.output_mark;

        if frame.is_call {
            let arity = if grew { frame.commas + 1 } else { 0 };
            self.output.push(PostfixItem::Call {
                token: frame.token,
                arity,
            });
        } else if expected_open == TokenKind::OpeningSquareBracket {
            self.output.push(PostfixItem::Subscript(frame.token));
        }

        self.expect_operand = false;
        Ok(())
    }

    fn finish(mut self) -> SyntaxResult<Vec<PostfixItem>> {
        while let Some(entry) = self.stack.pop() {
            match entry {
                StackEntry::Open(frame) => {
                    return Err(SyntaxError::mismatched_delimiter(
                        &frame.token.text,
                        frame.token.span,
                    ))
                }
                other => self.emit(other),
            }
        }
        Ok(self.output)
    }
}

fn touching(left: &Token, right: &Token) -> bool {
    left.span.end.offset == right.span.start.offset
}

fn glued(first: &Token, last: &Token, text: String) -> Token {
    Token::new(first.kind, text, first.span.merge(last.span))
}

/// Rejoin lexemes the scanner splits at dividers: decimal literals and
/// two-character comparisons. Only tokens with no gap between them are joined.
pub fn join_split_lexemes(tokens: &[Token]) -> Vec<Token> {
    let mut joined: Vec<Token> = Vec::with_capacity(tokens.len());
    let mut i = 0;

    while i < tokens.len() {
        let token = &tokens[i];

        if let [number, dot, fraction, ..] = &tokens[i..] {
            let decimal = number.kind == TokenKind::NumericConst
                && dot.kind == TokenKind::DotSign
                && fraction.kind == TokenKind::NumericConst;
            if decimal && touching(number, dot) && touching(dot, fraction) {
                let text = format!("{}.{}", number.text, fraction.text);
                joined.push(glued(number, fraction, text));
                i += 3;
                continue;
            }
        }

        if let Some(next) = tokens.get(i + 1) {
            let compound = matches!(
                (token.kind, next.kind),
                (TokenKind::LessSign, TokenKind::GreaterSign)
                    | (TokenKind::LessSign, TokenKind::EqualsSign)
                    | (TokenKind::GreaterSign, TokenKind::EqualsSign)
            );
            if compound && touching(token, next) {
                let text = format!("{}{}", token.text, next.text);
                joined.push(glued(token, next, text));
                i += 2;
                continue;
            }
        }

        joined.push(token.clone());
        i += 1;
    }

    joined
}

/// Linearize an infix token run into postfix order
pub fn shunting_yard(tokens: &[Token]) -> SyntaxResult<Vec<PostfixItem>> {
    let mut state = ShuntingYard::new();
    for token in join_split_lexemes(tokens) {
        state.process(token)?;
    }
    state.finish()
}

fn leaf(token: &Token) -> SyntaxResult<Node> {
    let span = token.span;
    match token.kind {
        TokenKind::Identifier => Ok(Node::Identifier {
            name: token.text.clone(),
            span,
        }),
        TokenKind::NumericConst => Ok(Node::NumericConstant {
            text: token.text.clone(),
            span,
        }),
        TokenKind::StringConst => Ok(Node::StringConstant {
            value: token.text.clone(),
            span,
        }),
        TokenKind::BooleanConst => {
            let upper = token.text.to_uppercase();
            Ok(Node::BooleanConstant {
                value: upper == "ИСТИНА" || upper == "TRUE",
                span,
            })
        }
        _ => Err(SyntaxError::unexpected_token("operand", token)),
    }
}

/// Operand stack entries carry subtree depth so pathological nesting is caught
struct Operands {
    stack: Vec<(Node, usize)>,
}

impl Operands {
    fn pop(&mut self, at: &Token) -> SyntaxResult<(Node, usize)> {
        self.stack.pop().ok_or_else(|| {
            SyntaxError::malformed_expression(
                &format!("missing operand for '{}'", at.text),
                at.span,
            )
        })
    }

    fn push(&mut self, node: Node, depth: usize, at: &Token) -> SyntaxResult<()> {
        if depth > MAX_EXPRESSION_DEPTH {
            return Err(SyntaxError::MaxRecursionDepth { span: at.span });
        }
        self.stack.push((node, depth));
        Ok(())
    }
}

/// Fold postfix items into zero or more expression roots
fn build_roots(postfix: Vec<PostfixItem>) -> SyntaxResult<Vec<Node>> {
    let mut operands = Operands { stack: Vec::new() };

    for item in postfix {
        match item {
            PostfixItem::Operand(token) => {
                let node = leaf(&token)?;
                operands.push(node, 1, &token)?;
            }
            PostfixItem::Operator(token) => {
                let (right, right_depth) = operands.pop(&token)?;
                let (left, left_depth) = operands.pop(&token)?;
                let depth = 1 + left_depth.max(right_depth);

                let node = if token.kind == TokenKind::DotSign {
                    Node::Member {
                        object: Box::new(left),
                        property: Box::new(right),
                    }
                } else {
                    let operator = BinaryOperator::parse(&token.text).ok_or_else(|| {
                        SyntaxError::unexpected_token("binary operator", &token)
                    })?;
                    Node::Binary {
                        operator,
                        left: Box::new(left),
                        right: Box::new(right),
                    }
                };
                operands.push(node, depth, &token)?;
            }
            PostfixItem::Unary(token) => {
                let (operand, depth) = operands.pop(&token)?;
                let operator = if token.kind == TokenKind::MinusSign {
                    UnaryOperator::Negate
                } else {
                    UnaryOperator::Plus
                };
                let node = Node::Unary {
                    operator,
                    operand: Box::new(operand),
                };
                operands.push(node, depth + 1, &token)?;
            }
            PostfixItem::New(token) => {
                let (target, depth) = operands.pop(&token)?;
                let node = Node::New {
                    target: Box::new(target),
                };
                operands.push(node, depth + 1, &token)?;
            }
            PostfixItem::Call { token, arity } => {
                let mut arguments = Vec::with_capacity(arity);
                let mut depth = 0;
                for _ in 0..arity {
                    let (argument, argument_depth) = operands.pop(&token)?;
                    depth = depth.max(argument_depth);
                    arguments.push(argument);
                }
                arguments.reverse();

                let (callee, callee_depth) = operands.pop(&token)?;
                let node = Node::Call {
                    callee: Box::new(callee),
                    arguments,
                };
                operands.push(node, 1 + depth.max(callee_depth), &token)?;
            }
            PostfixItem::Omitted(token) => {
                let at = token.span.start;
                let node = Node::OmittedArgument {
                    span: Span::new(at, at),
                };
                operands.push(node, 1, &token)?;
            }
            PostfixItem::Subscript(token) => {
                let (index, index_depth) = operands.pop(&token)?;
                let (object, object_depth) = operands.pop(&token)?;
                let node = Node::Subscript {
                    object: Box::new(object),
                    index: Box::new(index),
                };
                operands.push(node, 1 + index_depth.max(object_depth), &token)?;
            }
        }
    }

    Ok(operands.stack.into_iter().map(|(node, _)| node).collect())
}

/// Build a single expression tree from postfix items
pub fn build_tree(postfix: Vec<PostfixItem>) -> SyntaxResult<Node> {
    let span = postfix
        .first()
        .map(|item| item.token().span)
        .unwrap_or_default();
    let mut roots = build_roots(postfix)?;

    match roots.len() {
        1 => Ok(roots.remove(0)),
        0 => Err(SyntaxError::malformed_expression("empty expression", span)),
        _ => Err(SyntaxError::malformed_expression(
            "operands without an operator between them",
            span,
        )),
    }
}

/// Parse one expression from a token run
pub fn parse_expression(tokens: &[Token]) -> SyntaxResult<Node> {
    build_tree(shunting_yard(tokens)?)
}

/// Parse one `;`-delimited statement.
///
/// Comments are dropped first; an empty statement yields `None`. Statements
/// using tokens outside the expression grammar, or that leave more than one
/// value, are kept as [`Node::Unparsed`].
pub fn parse_statement(statement: &TokenStream) -> SyntaxResult<Option<Node>> {
    let tokens = statement.without_comments().into_tokens();
    if tokens.is_empty() {
        return Ok(None);
    }

    if tokens.len() > MAX_STATEMENT_TOKENS
        || tokens.iter().any(|token| !token.kind.is_expression_token())
    {
        return Ok(Some(Node::Unparsed { tokens }));
    }

    let mut roots = build_roots(shunting_yard(&tokens)?)?;
    if roots.len() == 1 {
        return Ok(roots.pop());
    }

    log_debug!("Statement kept unparsed",
        "roots" => roots.len(),
        "tokens" => tokens.len()
    );
    Ok(Some(Node::Unparsed { tokens }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexical::tokenize;
    use assert_matches::assert_matches;

    fn postfix_text(source: &str) -> String {
        shunting_yard(&tokenize(source))
            .unwrap()
            .iter()
            .map(|item| match item {
                PostfixItem::Call { arity, .. } => format!("call/{}", arity),
                PostfixItem::Subscript(_) => "[]".to_string(),
                PostfixItem::Unary(token) => format!("u{}", token.text),
                PostfixItem::New(_) => "new".to_string(),
                PostfixItem::Omitted(_) => "_".to_string(),
                other => other.token().text.clone(),
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn tree(source: &str) -> String {
        parse_expression(&tokenize(source)).unwrap().to_string()
    }

    #[test]
    fn test_precedence_ordering() {
        assert_eq!(postfix_text("1 + 2 * 3"), "1 2 3 * +");
        assert_eq!(postfix_text("1 * 2 + 3"), "1 2 * 3 +");
        assert_eq!(postfix_text("1 - 2 - 3"), "1 2 - 3 -");
        assert_eq!(postfix_text("а = б + 1"), "а б 1 + =");
        assert_eq!(postfix_text("а = б = в"), "а б в = =");
        assert_eq!(postfix_text("а = б < в"), "а б в < =");
    }

    #[test]
    fn test_tree_shapes() {
        assert_eq!(tree("1 + 2 * 3"), "(+ 1 (* 2 3))");
        assert_eq!(tree("(1 + 2) * 3"), "(* (+ 1 2) 3)");
        assert_eq!(tree("а.б.в"), "(. (. а б) в)");
        assert_eq!(tree("-а + 1"), "(+ (- а) 1)");
        assert_eq!(tree("-а.б"), "(- (. а б))");
        assert_eq!(tree("-а.б * 2"), "(* (- (. а б)) 2)");
        assert_eq!(tree("Истина"), "true");
        assert_eq!(tree("\"текст\""), "\"текст\"");
    }

    #[test]
    fn test_decimal_literals() {
        assert_eq!(tree("а = 1.5"), "(= а 1.5)");
        assert_eq!(tree("-0.25 * х"), "(* (- 0.25) х)");

        let joined = join_split_lexemes(&tokenize("3.14"));
        assert_eq!(joined.len(), 1);
        assert_eq!(joined[0].kind, TokenKind::NumericConst);
        assert_eq!(joined[0].source_length(), 4);

        // a gap keeps member access
        assert_eq!(tree("1 . 5"), "(. 1 5)");
    }

    #[test]
    fn test_compound_comparisons() {
        assert_eq!(tree("а <> б"), "(<> а б)");
        assert_eq!(tree("а <= б + 1"), "(<= а (+ б 1))");
        assert_eq!(tree("а >= 1"), "(>= а 1)");
        assert_eq!(postfix_text("а<>б"), "а б <>");
        assert_matches!(
            parse_expression(&tokenize("а < > б")),
            Err(SyntaxError::MalformedExpression { .. })
        );
    }

    #[test]
    fn test_omitted_call_arguments() {
        assert_eq!(tree("Ф(, 1)"), "(call Ф _ 1)");
        assert_eq!(tree("Ф(1, )"), "(call Ф 1 _)");
        assert_eq!(tree("Ф(1,, 2)"), "(call Ф 1 _ 2)");
        assert_eq!(postfix_text("Ф(,)"), "Ф _ _ call/2");

        let node = parse_expression(&tokenize("Ф(, 1)")).unwrap();
        assert_matches!(
            node,
            Node::Call { ref arguments, .. } if matches!(arguments[0], Node::OmittedArgument { .. })
        );
    }

    #[test]
    fn test_comma_outside_call_is_rejected() {
        assert_matches!(
            shunting_yard(&tokenize("м[1, 2]")),
            Err(SyntaxError::UnexpectedToken { found: TokenKind::Comma, .. })
        );
        assert_matches!(
            shunting_yard(&tokenize("(1, 2)")),
            Err(SyntaxError::UnexpectedToken { found: TokenKind::Comma, .. })
        );
    }

    #[test]
    fn test_call_hint_only_after_identifier() {
        let items = shunting_yard(&tokenize("f ( 1 , 2 )")).unwrap();
        assert_matches!(
            items.last(),
            Some(PostfixItem::Call { token, arity: 2 }) if token.is_call_hint
        );

        let grouped = shunting_yard(&tokenize("( 1 + 2 )")).unwrap();
        assert!(!grouped.iter().any(|i| matches!(i, PostfixItem::Call { .. })));

        let after_operator = shunting_yard(&tokenize("а + (б)")).unwrap();
        assert!(!after_operator.iter().any(|i| matches!(i, PostfixItem::Call { .. })));
    }

    #[test]
    fn test_calls_and_arity() {
        assert_eq!(tree("f()"), "(call f)");
        assert_eq!(tree("f(1, g(2), 3)"), "(call f 1 (call g 2) 3)");
        assert_eq!(tree("Объект.Метод(1)"), "(. Объект (call Метод 1))");
        assert_eq!(postfix_text("f(a + 1)"), "f a 1 + call/1");
    }

    #[test]
    fn test_subscript_and_new() {
        assert_eq!(tree("м[1]"), "([] м 1)");
        assert_eq!(tree("м[i + 1].Имя"), "(. ([] м (+ i 1)) Имя)");
        assert_eq!(tree("Новый Массив"), "(new Массив)");
        assert_eq!(tree("Новый Структура(\"А\", 1)"), "(new (call Структура \"А\" 1))");
    }

    #[test]
    fn test_mismatched_delimiters() {
        assert_matches!(
            shunting_yard(&tokenize("а )")),
            Err(SyntaxError::MismatchedDelimiter { ref delimiter, .. }) if delimiter == ")"
        );
        assert_matches!(
            shunting_yard(&tokenize("f ( 1")),
            Err(SyntaxError::MismatchedDelimiter { ref delimiter, .. }) if delimiter == "("
        );
        assert_matches!(
            shunting_yard(&tokenize("м[1)")),
            Err(SyntaxError::MismatchedDelimiter { .. })
        );
    }

    #[test]
    fn test_malformed_expressions() {
        assert_matches!(
            parse_expression(&tokenize("1 +")),
            Err(SyntaxError::MalformedExpression { .. })
        );
        assert_matches!(
            parse_expression(&tokenize("* 2")),
            Err(SyntaxError::MalformedExpression { .. })
        );
        assert_matches!(
            parse_expression(&tokenize("()")),
            Err(SyntaxError::MalformedExpression { .. })
        );
        assert_matches!(
            shunting_yard(&tokenize("1, 2")),
            Err(SyntaxError::UnexpectedToken { found: TokenKind::Comma, .. })
        );
    }

    #[test]
    fn test_nesting_depth_is_bounded() {
        let source = format!("{}1{}", "(".repeat(MAX_EXPRESSION_DEPTH + 1), ")".repeat(MAX_EXPRESSION_DEPTH + 1));
        assert_matches!(
            shunting_yard(&tokenize(&source)),
            Err(SyntaxError::MaxRecursionDepth { .. })
        );

        let chain = vec!["1"; MAX_EXPRESSION_DEPTH + 2].join(" + ");
        assert_matches!(
            parse_expression(&tokenize(&chain)),
            Err(SyntaxError::MaxRecursionDepth { .. })
        );
    }

    #[test]
    fn test_statements() {
        let statement = TokenStream::new(tokenize("а = 1 // note"));
        let node = parse_statement(&statement).unwrap().unwrap();
        assert_eq!(node.to_string(), "(= а 1)");

        let keyword = TokenStream::new(tokenize("Если а Тогда"));
        assert_matches!(parse_statement(&keyword), Ok(Some(Node::Unparsed { ref tokens })) if tokens.len() == 3);

        let two_roots = TokenStream::new(tokenize("Возврат а"));
        assert_matches!(parse_statement(&two_roots), Ok(Some(Node::Unparsed { .. })));

        let only_comment = TokenStream::new(tokenize("// x"));
        assert_matches!(parse_statement(&only_comment), Ok(None));
    }
}
