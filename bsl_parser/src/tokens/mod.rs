//! Token system for BSL modules
//!
//! A [`Token`] pairs a [`TokenKind`] with its text and source [`Span`]. Kinds for
//! keywords, directives and punctuation come from one bilingual table, so
//! `Процедура`, `PROCEDURE` and `procedure` all resolve to the same kind.
//!
//! [`TokenStream`] owns a token sequence with a read cursor and supports the two
//! structural extractions the parser is built on:
//! - balanced-block extraction (`Процедура ... КонецПроцедуры`, `( ... )`)
//! - statement extraction up to the next `;`

pub mod token;
pub mod token_stream;

pub use token::{classify, lookup_keyword, KeywordEntry, Token, TokenKind, KEYWORD_TABLE};
pub use token_stream::{TokenStream, TokenStreamError};

pub use crate::utils::{Position, SourceMap, Span};
