//! AST node definitions for BSL modules
//!
//! The tree is a closed sum type: every consumer matches on [`Node`] directly.
//! Each node owns its children, so dropping the root releases the whole tree.
//!
//! Design principles:
//! - Closed variants: adding a node kind is a compile-time-checked change
//! - Span tracking: leaf nodes keep the span of the token they came from
//! - Serde compatible: nodes serialize as JSON objects tagged by `kind`

use crate::tokens::Token;
use crate::utils::Span;
use serde::{Deserialize, Serialize};
use std::fmt;

// === OPERATORS ===

/// Infix operators that produce a [`Node::Binary`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOperator {
    Add,
    Subtract,
    Multiply,
    Divide,
    Equal,
    NotEqual,
    Less,
    LessOrEqual,
    Greater,
    GreaterOrEqual,
}

impl BinaryOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Subtract => "-",
            Self::Multiply => "*",
            Self::Divide => "/",
            Self::Equal => "=",
            Self::NotEqual => "<>",
            Self::Less => "<",
            Self::LessOrEqual => "<=",
            Self::Greater => ">",
            Self::GreaterOrEqual => ">=",
        }
    }

    /// Parse from the operator's source spelling
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "+" => Some(Self::Add),
            "-" => Some(Self::Subtract),
            "*" => Some(Self::Multiply),
            "/" => Some(Self::Divide),
            "=" => Some(Self::Equal),
            "<>" => Some(Self::NotEqual),
            "<" => Some(Self::Less),
            "<=" => Some(Self::LessOrEqual),
            ">" => Some(Self::Greater),
            ">=" => Some(Self::GreaterOrEqual),
            _ => None,
        }
    }
}

impl fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Prefix sign operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnaryOperator {
    Negate,
    Plus,
}

impl UnaryOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Negate => "-",
            Self::Plus => "+",
        }
    }
}

// === SUBPROGRAMS ===

/// One entry of a subprogram's parameter list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterDescriptor {
    pub name: String,
    pub passed_by_value: bool,
    pub has_default: bool,
    /// Source text of the default value token (`-` prefixed for negative numbers)
    pub default_value: Option<String>,
}

impl ParameterDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            passed_by_value: false,
            has_default: false,
            default_value: None,
        }
    }
}

/// Header and body of a procedure or function
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubprogramDescriptor {
    pub name: String,
    pub parameters: Vec<ParameterDescriptor>,
    pub export: bool,
    /// Annotations (`&НаКлиенте`, ...) that directly preceded the definition
    pub annotations: Vec<String>,
    /// Statement nodes in source order
    pub body: Vec<Node>,
}

impl SubprogramDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parameters: Vec::new(),
            export: false,
            annotations: Vec::new(),
            body: Vec::new(),
        }
    }

    pub fn parameter(&self, name: &str) -> Option<&ParameterDescriptor> {
        self.parameters
            .iter()
            .find(|p| p.name.to_uppercase() == name.to_uppercase())
    }
}

// === NODES ===

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Node {
    /// Root: subprograms and top-level statements in source order
    Module { children: Vec<Node> },

    Procedure(SubprogramDescriptor),
    Function(SubprogramDescriptor),

    Identifier { name: String, span: Span },
    NumericConstant { text: String, span: Span },
    StringConstant { value: String, span: Span },
    BooleanConstant { value: bool, span: Span },
    /// Skipped positional argument, as in `Ф(, 1)`
    OmittedArgument { span: Span },

    Binary {
        operator: BinaryOperator,
        left: Box<Node>,
        right: Box<Node>,
    },
    Unary {
        operator: UnaryOperator,
        operand: Box<Node>,
    },
    /// `Новый Тип` / `Новый Тип(args)`
    New { target: Box<Node> },
    /// `object.property`
    Member {
        object: Box<Node>,
        property: Box<Node>,
    },
    /// `object[index]`
    Subscript {
        object: Box<Node>,
        index: Box<Node>,
    },
    /// `callee(arguments...)`
    Call {
        callee: Box<Node>,
        arguments: Vec<Node>,
    },

    /// Statement kept as raw tokens (control flow, declarations, ...)
    Unparsed { tokens: Vec<Token> },
}

impl Node {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Node::Module { .. } => "Module",
            Node::Procedure(_) => "Procedure",
            Node::Function(_) => "Function",
            Node::Identifier { .. } => "Identifier",
            Node::NumericConstant { .. } => "NumericConstant",
            Node::StringConstant { .. } => "StringConstant",
            Node::BooleanConstant { .. } => "BooleanConstant",
            Node::OmittedArgument { .. } => "OmittedArgument",
            Node::Binary { .. } => "Binary",
            Node::Unary { .. } => "Unary",
            Node::New { .. } => "New",
            Node::Member { .. } => "Member",
            Node::Subscript { .. } => "Subscript",
            Node::Call { .. } => "Call",
            Node::Unparsed { .. } => "Unparsed",
        }
    }

    /// Direct children in source order
    pub fn children(&self) -> Vec<&Node> {
        match self {
            Node::Module { children } => children.iter().collect(),
            Node::Procedure(sub) | Node::Function(sub) => sub.body.iter().collect(),
            Node::Binary { left, right, .. } => vec![left.as_ref(), right.as_ref()],
            Node::Unary { operand, .. } => vec![operand.as_ref()],
            Node::New { target } => vec![target.as_ref()],
            Node::Member { object, property } => vec![object.as_ref(), property.as_ref()],
            Node::Subscript { object, index } => vec![object.as_ref(), index.as_ref()],
            Node::Call { callee, arguments } => std::iter::once(callee.as_ref())
                .chain(arguments.iter())
                .collect(),
            Node::Identifier { .. }
            | Node::NumericConstant { .. }
            | Node::StringConstant { .. }
            | Node::BooleanConstant { .. }
            | Node::OmittedArgument { .. }
            | Node::Unparsed { .. } => Vec::new(),
        }
    }

    /// Number of nodes in this subtree, including `self`
    pub fn count_nodes(&self) -> usize {
        1 + self
            .children()
            .into_iter()
            .map(Node::count_nodes)
            .sum::<usize>()
    }

    /// Procedures and functions directly under a module root
    pub fn subprograms(&self) -> Vec<&SubprogramDescriptor> {
        match self {
            Node::Module { children } => children
                .iter()
                .filter_map(|child| match child {
                    Node::Procedure(sub) | Node::Function(sub) => Some(sub),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        }
    }

    pub fn as_subprogram(&self) -> Option<&SubprogramDescriptor> {
        match self {
            Node::Procedure(sub) | Node::Function(sub) => Some(sub),
            _ => None,
        }
    }

    pub fn is_unparsed(&self) -> bool {
        matches!(self, Node::Unparsed { .. })
    }

    /// Span covered by this subtree; `None` for module and subprogram nodes
    pub fn span(&self) -> Option<Span> {
        match self {
            Node::Identifier { span, .. }
            | Node::NumericConstant { span, .. }
            | Node::StringConstant { span, .. }
            | Node::BooleanConstant { span, .. }
            | Node::OmittedArgument { span } => Some(*span),
            Node::Unparsed { tokens } => match (tokens.first(), tokens.last()) {
                (Some(first), Some(last)) => Some(first.span.merge(last.span)),
                _ => None,
            },
            Node::Module { .. } | Node::Procedure(_) | Node::Function(_) => None,
            _ => self
                .children()
                .into_iter()
                .filter_map(Node::span)
                .reduce(Span::merge),
        }
    }
}

/// Compact prefix rendering of expressions: `(+ 1 (* 2 3))`
impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Module { children } => write!(f, "(module {})", children.len()),
            Node::Procedure(sub) => write!(f, "(procedure {})", sub.name),
            Node::Function(sub) => write!(f, "(function {})", sub.name),
            Node::Identifier { name, .. } => write!(f, "{}", name),
            Node::NumericConstant { text, .. } => write!(f, "{}", text),
            Node::StringConstant { value, .. } => write!(f, "\"{}\"", value),
            Node::BooleanConstant { value, .. } => write!(f, "{}", value),
            Node::OmittedArgument { .. } => write!(f, "_"),
            Node::Binary {
                operator,
                left,
                right,
            } => write!(f, "({} {} {})", operator, left, right),
            Node::Unary { operator, operand } => write!(f, "({} {})", operator.as_str(), operand),
            Node::New { target } => write!(f, "(new {})", target),
            Node::Member { object, property } => write!(f, "(. {} {})", object, property),
            Node::Subscript { object, index } => write!(f, "([] {} {})", object, index),
            Node::Call { callee, arguments } => {
                write!(f, "(call {}", callee)?;
                for argument in arguments {
                    write!(f, " {}", argument)?;
                }
                write!(f, ")")
            }
            Node::Unparsed { tokens } => write!(f, "(unparsed {})", tokens.len()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::Position;

    fn ident(name: &str, column: u32) -> Node {
        Node::Identifier {
            name: name.to_string(),
            span: Span::from_token_extent(
                Position::new(column as usize - 1, 1, column),
                name.chars().count(),
            ),
        }
    }

    fn sample_module() -> Node {
        let mut proc = SubprogramDescriptor::new("Тест");
        proc.body.push(Node::Call {
            callee: Box::new(ident("Сообщить", 1)),
            arguments: vec![ident("а", 10)],
        });

        Node::Module {
            children: vec![
                Node::Procedure(proc),
                Node::Function(SubprogramDescriptor::new("Ф")),
                ident("х", 1),
            ],
        }
    }

    #[test]
    fn test_subprograms_and_counts() {
        let module = sample_module();
        let names: Vec<&str> = module.subprograms().iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Тест", "Ф"]);
        // module, procedure, call, callee, argument, function, identifier
        assert_eq!(module.count_nodes(), 7);
        assert_eq!(module.children().len(), 3);
        assert_eq!(module.kind_name(), "Module");
    }

    #[test]
    fn test_display_and_span() {
        let expr = Node::Binary {
            operator: BinaryOperator::Add,
            left: Box::new(ident("а", 1)),
            right: Box::new(Node::Member {
                object: Box::new(ident("б", 5)),
                property: Box::new(ident("в", 7)),
            }),
        };
        assert_eq!(expr.to_string(), "(+ а (. б в))");

        let span = expr.span().unwrap();
        assert_eq!(span.start.column, 1);
        assert_eq!(span.end.column, 8);
    }

    #[test]
    fn test_serializes_with_kind_tag() {
        let json = serde_json::to_value(sample_module()).unwrap();
        assert_eq!(json["kind"], "Module");
        assert_eq!(json["children"][0]["kind"], "Procedure");
        assert_eq!(json["children"][0]["name"], "Тест");
        assert_eq!(json["children"][0]["body"][0]["kind"], "Call");
    }

    #[test]
    fn test_parameter_lookup_is_case_insensitive() {
        let mut sub = SubprogramDescriptor::new("П");
        sub.parameters.push(ParameterDescriptor::new("Значение"));
        assert!(sub.parameter("ЗНАЧЕНИЕ").is_some());
        assert!(sub.parameter("другой").is_none());
        assert_eq!(BinaryOperator::parse("*"), Some(BinaryOperator::Multiply));
        assert_eq!(BinaryOperator::parse("<>"), Some(BinaryOperator::NotEqual));
        assert_eq!(BinaryOperator::GreaterOrEqual.as_str(), ">=");
    }
}
