use super::PipelineResult;
use crate::grammar::ast::Node;
use crate::lexical::TokenCounts;
use serde::Serialize;

/// JSON document printed for a single module
#[derive(Debug, Serialize)]
pub struct PipelineOutput<'a> {
    pub file: &'a str,
    pub token_counts: &'a TokenCounts,
    pub subprogram_count: usize,
    pub unparsed_statement_count: usize,
    pub ast: &'a Node,
}

impl<'a> PipelineOutput<'a> {
    pub fn new(result: &'a PipelineResult) -> Self {
        Self {
            file: &result.origin,
            token_counts: &result.token_counts,
            subprogram_count: result.subprogram_count(),
            unparsed_statement_count: result.unparsed_statement_count(),
            ast: &result.ast,
        }
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
