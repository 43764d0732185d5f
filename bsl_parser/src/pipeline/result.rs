use crate::file_processor::FileMetadata;
use crate::grammar::ast::Node;
use crate::lexical::{LexicalMetrics, TokenCounts};
use std::time::Duration;

/// Everything produced for one module
#[derive(Debug)]
pub struct PipelineResult {
    /// Name used in logs: the file path, or the caller's name for in-memory sources
    pub origin: String,
    pub ast: Node,
    /// `None` for sources that did not come from disk
    pub file_metadata: Option<FileMetadata>,
    pub lexical_metrics: LexicalMetrics,
    pub token_counts: TokenCounts,
    pub token_count: usize,
    pub processing_duration: Duration,
}

impl PipelineResult {
    pub fn subprogram_count(&self) -> usize {
        self.ast.subprograms().len()
    }

    pub fn unparsed_statement_count(&self) -> usize {
        fn count(node: &Node) -> usize {
            let own = usize::from(node.is_unparsed());
            own + node.children().into_iter().map(count).sum::<usize>()
        }
        count(&self.ast)
    }

    pub fn log_success(&self) {
        let seconds = self.processing_duration.as_secs_f64();
        let tokens_per_sec = if seconds > 0.0 {
            self.token_count as f64 / seconds
        } else {
            0.0
        };

        crate::log_performance!(
            crate::logging::codes::success::AST_CONSTRUCTION_COMPLETE,
            "Module processing pipeline succeeded",
            duration = self.processing_duration,
            "file" => self.origin,
            "subprograms" => self.subprogram_count(),
            "tokens" => self.token_count,
            "tokens_per_sec" => format!("{:.0}", tokens_per_sec)
        );
    }
}
