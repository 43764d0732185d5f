//! Shared source-location types used by the lexer, token stream and parser

pub mod span;

pub use span::{Position, SourceMap, Span};
