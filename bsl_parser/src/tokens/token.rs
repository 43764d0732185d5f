//! Token kinds, the bilingual keyword table, and token classification
//!
//! Every keyword, directive and punctuation mark is resolved through one table
//! that pairs a Russian and an English spelling with a [`TokenKind`]. Lookup is
//! case-insensitive on both sides.
use crate::utils::{Position, Span};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::OnceLock;

/// Byte-order mark as it appears once the module text is decoded
pub const BYTE_ORDER_MARK: char = '\u{FEFF}';

/// Closed set of token kinds produced by the lexer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenKind {
    // === SUBPROGRAM BOUNDARIES ===
    BeginProcedure,
    BeginFunction,
    EndProcedure,
    EndFunction,
    Export,

    // === PUNCTUATION AND OPERATORS ===
    EqualsSign,
    OpeningBracket,
    ClosingBracket,
    OpeningSquareBracket,
    ClosingSquareBracket,
    Comma,
    EndExpression,
    PlusSign,
    MinusSign,
    MultiplySign,
    DivisionSign,
    DotSign,
    LessSign,
    GreaterSign,

    // === CONSTANTS AND OPERATOR WORDS ===
    BooleanConst,
    OperatorNew,

    // === CONTROL FLOW ===
    OperatorIf,
    OperatorThen,
    OperatorElse,
    OperatorElseIf,
    OperatorEndIf,
    OperatorFor,
    OperatorWhile,
    OperatorEndLoop,
    OperatorTry,
    OperatorEndTry,

    // === PREPROCESSOR DIRECTIVES ===
    DirectiveIf,
    DirectiveThen,
    DirectiveElseIf,
    DirectiveElse,
    DirectiveEndIf,
    DirectiveInsert,
    DirectiveEndInsert,
    DirectiveDelete,
    DirectiveEndDelete,
    DirectiveRegion,
    DirectiveEndRegion,

    // === KEYWORDS ===
    KeywordAnd,
    KeywordOr,
    KeywordNot,
    KeywordVar,
    KeywordLoop,
    KeywordEach,
    KeywordVal,

    // === VALUE-CARRYING KINDS ===
    StringConst,
    NumericConst,
    Comment,
    Annotation,
    Identifier,
}

/// One row of the bilingual keyword table
#[derive(Debug, Clone, Copy)]
pub struct KeywordEntry {
    pub kind: TokenKind,
    pub russian: &'static str,
    pub english: &'static str,
}

const fn entry(kind: TokenKind, russian: &'static str, english: &'static str) -> KeywordEntry {
    KeywordEntry {
        kind,
        russian,
        english,
    }
}

/// Fixed keyword dictionary. Boolean constants have two rows (false, true).
pub static KEYWORD_TABLE: &[KeywordEntry] = &[
    entry(TokenKind::BeginProcedure, "ПРОЦЕДУРА", "PROCEDURE"),
    entry(TokenKind::BeginFunction, "ФУНКЦИЯ", "FUNCTION"),
    entry(TokenKind::EndProcedure, "КОНЕЦПРОЦЕДУРЫ", "ENDPROCEDURE"),
    entry(TokenKind::EndFunction, "КОНЕЦФУНКЦИИ", "ENDFUNCTION"),
    entry(TokenKind::EqualsSign, "=", "="),
    entry(TokenKind::OpeningBracket, "(", "("),
    entry(TokenKind::ClosingBracket, ")", ")"),
    entry(TokenKind::Export, "ЭКСПОРТ", "EXPORT"),
    entry(TokenKind::Comma, ",", ","),
    entry(TokenKind::EndExpression, ";", ";"),
    entry(TokenKind::PlusSign, "+", "+"),
    entry(TokenKind::MinusSign, "-", "-"),
    entry(TokenKind::MultiplySign, "*", "*"),
    entry(TokenKind::DivisionSign, "/", "/"),
    entry(TokenKind::DotSign, ".", "."),
    entry(TokenKind::BooleanConst, "ЛОЖЬ", "FALSE"),
    entry(TokenKind::BooleanConst, "ИСТИНА", "TRUE"),
    entry(TokenKind::OperatorNew, "НОВЫЙ", "NEW"),
    entry(TokenKind::OperatorIf, "ЕСЛИ", "IF"),
    entry(TokenKind::OperatorThen, "ТОГДА", "THEN"),
    entry(TokenKind::OperatorElse, "ИНАЧЕ", "ELSE"),
    entry(TokenKind::OperatorElseIf, "ИНАЧЕЕСЛИ", "ELSEIF"),
    entry(TokenKind::OperatorEndIf, "КОНЕЦЕСЛИ", "ENDIF"),
    entry(TokenKind::LessSign, "<", "<"),
    entry(TokenKind::GreaterSign, ">", ">"),
    entry(TokenKind::OperatorFor, "ДЛЯ", "FOR"),
    entry(TokenKind::OperatorWhile, "ПОКА", "WHILE"),
    entry(TokenKind::OperatorEndLoop, "КОНЕЦЦИКЛА", "ENDLOOP"),
    entry(TokenKind::OperatorTry, "ПОПЫТКА", "TRY"),
    entry(TokenKind::OperatorEndTry, "КОНЕЦПОПЫТКИ", "ENDTRY"),
    entry(TokenKind::DirectiveIf, "#Если", "#IF"),
    entry(TokenKind::DirectiveThen, "#Тогда", "#THEN"),
    entry(TokenKind::DirectiveElseIf, "#ИначеЕсли", "#ELSEIF"),
    entry(TokenKind::DirectiveElse, "#Иначе", "#ELSE"),
    entry(TokenKind::DirectiveEndIf, "#КонецЕсли", "#ENDIF"),
    entry(TokenKind::DirectiveInsert, "#Вставка", "#INSERT"),
    entry(TokenKind::DirectiveEndInsert, "#КонецВставки", "#ENDINSERT"),
    entry(TokenKind::DirectiveDelete, "#Удаление", "#DELETE"),
    entry(TokenKind::DirectiveEndDelete, "#КонецУдаления", "#ENDDELETE"),
    entry(TokenKind::DirectiveRegion, "#Область", "#REGION"),
    entry(TokenKind::DirectiveEndRegion, "#КонецОбласти", "#ENDREGION"),
    entry(TokenKind::KeywordAnd, "И", "AND"),
    entry(TokenKind::KeywordOr, "ИЛИ", "OR"),
    entry(TokenKind::KeywordNot, "НЕ", "NOT"),
    entry(TokenKind::KeywordVar, "ПЕРЕМ", "VAR"),
    entry(TokenKind::KeywordLoop, "ЦИКЛ", "LOOP"),
    entry(TokenKind::KeywordEach, "КАЖДОГО", "EACH"),
    entry(TokenKind::KeywordVal, "ЗНАЧ", "VAL"),
    entry(TokenKind::OpeningSquareBracket, "[", "["),
    entry(TokenKind::ClosingSquareBracket, "]", "]"),
];

static KEYWORD_INDEX: OnceLock<HashMap<String, TokenKind>> = OnceLock::new();

fn keyword_index() -> &'static HashMap<String, TokenKind> {
    KEYWORD_INDEX.get_or_init(|| {
        let mut index = HashMap::with_capacity(KEYWORD_TABLE.len() * 2);
        for row in KEYWORD_TABLE {
            index.insert(row.russian.to_uppercase(), row.kind);
            index.insert(row.english.to_uppercase(), row.kind);
        }
        index
    })
}

/// Case-insensitive lookup of a word or punctuation mark in the keyword table
pub fn lookup_keyword(text: &str) -> Option<TokenKind> {
    keyword_index().get(&text.to_uppercase()).copied()
}

/// Classify a flushed token value.
///
/// Returns `None` for values the lexer drops: empty non-literal text and a bare
/// byte-order mark. A literal always classifies as a string constant, even when empty.
pub fn classify(text: &str, is_string_literal: bool) -> Option<TokenKind> {
    if is_string_literal {
        return Some(TokenKind::StringConst);
    }

    let first = text.chars().next()?;
    if text.chars().all(|c| c == BYTE_ORDER_MARK) {
        return None;
    }

    if first == '&' {
        Some(TokenKind::Annotation)
    } else if text.bytes().all(|b| b.is_ascii_digit()) {
        Some(TokenKind::NumericConst)
    } else if text.starts_with("//") {
        Some(TokenKind::Comment)
    } else {
        Some(lookup_keyword(text).unwrap_or(TokenKind::Identifier))
    }
}

impl TokenKind {
    /// Table entry for keyword kinds (first row for boolean constants)
    pub fn keyword_entry(self) -> Option<&'static KeywordEntry> {
        KEYWORD_TABLE.iter().find(|row| row.kind == self)
    }

    /// Human-readable name used in diagnostics
    pub fn description(self) -> &'static str {
        match self {
            Self::StringConst => "string constant",
            Self::NumericConst => "numeric constant",
            Self::Comment => "comment",
            Self::Annotation => "annotation",
            Self::Identifier => "identifier",
            Self::BooleanConst => "boolean constant",
            other => other
                .keyword_entry()
                .map(|row| row.english)
                .unwrap_or("token"),
        }
    }

    /// True for kinds spelled as words in the keyword table
    pub fn is_keyword(self) -> bool {
        self.keyword_entry()
            .map(|row| row.english.chars().any(|c| c.is_ascii_alphabetic()))
            .unwrap_or(false)
    }

    /// Preprocessor directive kinds (`#Если`, `#Область`, ...)
    pub fn is_directive(self) -> bool {
        matches!(
            self,
            Self::DirectiveIf
                | Self::DirectiveThen
                | Self::DirectiveElseIf
                | Self::DirectiveElse
                | Self::DirectiveEndIf
                | Self::DirectiveInsert
                | Self::DirectiveEndInsert
                | Self::DirectiveDelete
                | Self::DirectiveEndDelete
                | Self::DirectiveRegion
                | Self::DirectiveEndRegion
        )
    }

    /// Infix operators understood by the expression parser
    pub fn is_binary_operator(self) -> bool {
        matches!(
            self,
            Self::PlusSign
                | Self::MinusSign
                | Self::MultiplySign
                | Self::DivisionSign
                | Self::DotSign
                | Self::EqualsSign
                | Self::LessSign
                | Self::GreaterSign
        )
    }

    /// Kinds that stand for a value on their own
    pub fn is_operand(self) -> bool {
        matches!(
            self,
            Self::Identifier | Self::NumericConst | Self::StringConst | Self::BooleanConst
        )
    }

    /// Kinds allowed inside an expression statement
    pub fn is_expression_token(self) -> bool {
        self.is_operand()
            || self.is_binary_operator()
            || matches!(
                self,
                Self::OpeningBracket
                    | Self::ClosingBracket
                    | Self::OpeningSquareBracket
                    | Self::ClosingSquareBracket
                    | Self::Comma
                    | Self::OperatorNew
            )
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// A classified token with its source extent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub kind: TokenKind,
    /// Token value; for string literals the unquoted, unescaped content
    pub text: String,
    pub span: Span,
    pub is_string_literal: bool,
    /// Set on `(` tokens that apply the preceding identifier as a call
    pub is_call_hint: bool,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, span: Span) -> Self {
        Self {
            kind,
            text: text.into(),
            span,
            is_string_literal: kind == TokenKind::StringConst,
            is_call_hint: false,
        }
    }

    /// Build a token whose span is its text laid out on one row from `start`
    pub fn at(kind: TokenKind, text: impl Into<String>, start: Position) -> Self {
        let text = text.into();
        let span = Span::from_token_extent(start, text.chars().count());
        Self::new(kind, text, span)
    }

    pub fn with_call_hint(mut self) -> Self {
        self.is_call_hint = true;
        self
    }

    pub fn source_offset(&self) -> usize {
        self.span.start.offset
    }

    pub fn source_length(&self) -> usize {
        self.span.len()
    }

    pub fn row(&self) -> u32 {
        self.span.start.row
    }

    pub fn column(&self) -> u32 {
        self.span.start.column
    }

    pub fn is(&self, kind: TokenKind) -> bool {
        self.kind == kind
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_string_literal {
            write!(f, "\"{}\"", self.text.replace('"', "\"\""))
        } else {
            write!(f, "{}", self.text)
        }
    }
}
