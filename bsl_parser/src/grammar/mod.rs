//! Abstract syntax tree for BSL modules

pub mod ast;

pub use ast::{BinaryOperator, Node, ParameterDescriptor, SubprogramDescriptor, UnaryOperator};
