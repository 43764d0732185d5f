//! Front end for the bilingual (Russian/English) 1C:Enterprise module language
//!
//! Source text goes through [`lexical`] into a [`tokens::TokenStream`], and
//! [`syntax`] builds a [`grammar::ast::Node::Module`] from it: subprogram
//! headers are parsed exactly, statement bodies through a shunting-yard
//! expression parser, and anything else is kept as an unparsed token run.

pub mod batch;
pub mod config;
pub mod file_processor;
pub mod grammar;
pub mod lexical;
#[macro_use]
pub mod logging;
pub mod pipeline;
pub mod syntax;
pub mod tokens;
pub mod utils;

pub use batch::{BatchConfig, BatchError, BatchResults};
pub use grammar::ast::{Node, ParameterDescriptor, SubprogramDescriptor};
pub use lexical::{tokenize, LexerError};
pub use pipeline::{process_file, process_source, PipelineError, PipelineOutput, PipelineResult};
pub use syntax::{parse_module, parse_source, SyntaxError};
pub use tokens::{Token, TokenKind, TokenStream};
