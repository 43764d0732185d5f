//! File processor, lexer and module builder chained for one module

mod error;
mod info;
pub mod output;
mod result;
mod stats;
mod validation;

pub use error::PipelineError;
pub use info::{get_pipeline_info, PipelineInfo};
pub use output::PipelineOutput;
pub use result::PipelineResult;
pub use stats::{get_pipeline_stats, PipelineStats};
pub use validation::validate_pipeline;

use crate::config::runtime::RuntimeConfig;
use crate::file_processor::FileProcessor;
use crate::lexical::{get_token_counts, LexicalAnalyzer};
use crate::logging;
use crate::syntax;
use crate::tokens::TokenStream;
use std::path::Path;
use std::time::Instant;

/// Process one module file with environment-default preferences
pub fn process_file(file_path: impl AsRef<Path>) -> Result<PipelineResult, PipelineError> {
    process_file_with_config(file_path.as_ref(), 0, &RuntimeConfig::default())
}

/// Process one module file; events raised on the way are attributed to it
pub fn process_file_with_config(
    file_path: &Path,
    file_id: usize,
    config: &RuntimeConfig,
) -> Result<PipelineResult, PipelineError> {
    logging::with_file_context(file_path.to_path_buf(), file_id, || {
        let start_time = Instant::now();
        crate::log_info!("Starting module processing", "file" => file_path.display());

        let file_result =
            FileProcessor::from_preferences(&config.file_processor).process_file(file_path)?;

        let mut analyzer = LexicalAnalyzer::with_preferences(config.lexical.clone());
        let tokens = analyzer.tokenize_file_result(&file_result)?;

        let origin = file_result.metadata.path.display().to_string();
        let mut result = build(origin, tokens, analyzer, config)?;
        result.file_metadata = Some(file_result.metadata);
        result.processing_duration = start_time.elapsed();

        result.log_success();
        Ok(result)
    })
}

/// Process in-memory module text under `name`
pub fn process_source(name: &str, source: &str) -> Result<PipelineResult, PipelineError> {
    process_source_with_config(name, source, &RuntimeConfig::default())
}

pub fn process_source_with_config(
    name: &str,
    source: &str,
    config: &RuntimeConfig,
) -> Result<PipelineResult, PipelineError> {
    let start_time = Instant::now();

    let mut analyzer = LexicalAnalyzer::with_preferences(config.lexical.clone());
    let tokens = analyzer.tokenize_source(source, name)?;

    let mut result = build(name.to_string(), tokens, analyzer, config)?;
    result.processing_duration = start_time.elapsed();

    result.log_success();
    Ok(result)
}

fn build(
    origin: String,
    tokens: TokenStream,
    analyzer: LexicalAnalyzer,
    config: &RuntimeConfig,
) -> Result<PipelineResult, PipelineError> {
    let token_counts = get_token_counts(&tokens);
    let token_count = tokens.len();
    let ast = syntax::parse_module_with_preferences(tokens, config.syntax.clone())?;

    Ok(PipelineResult {
        origin,
        ast,
        file_metadata: None,
        lexical_metrics: analyzer.metrics().clone(),
        token_counts,
        token_count,
        processing_duration: Default::default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::ast::Node;
    use crate::syntax::SyntaxError;
    use assert_matches::assert_matches;
    use std::fs;
    use tempfile::tempdir;

    const MODULE: &str = "\
// Общий модуль
Процедура Инициализировать() Экспорт
    Кэш = Новый Соответствие;
КонецПроцедуры
";

    #[test]
    fn test_validate_pipeline() {
        assert!(validate_pipeline().is_ok());
    }

    #[test]
    fn test_process_file() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("ОбщийМодуль.bsl");
        fs::write(&file_path, "Процедура Тест()\n    а = 1;\nКонецПроцедуры\n").unwrap();

        let result = process_file(&file_path).unwrap();

        assert_eq!(result.subprogram_count(), 1);
        assert_eq!(result.unparsed_statement_count(), 0);
        assert_eq!(result.token_count, result.token_counts.total);
        assert!(result.file_metadata.as_ref().is_some_and(|m| m.is_bsl_file));
        assert!(result.origin.ends_with("ОбщийМодуль.bsl"));
    }

    #[test]
    fn test_empty_file_yields_empty_module() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("Пустой.bsl");
        fs::write(&file_path, "").unwrap();

        let result = process_file(&file_path).unwrap();
        assert_eq!(result.ast, Node::Module { children: Vec::new() });
        assert_eq!(result.token_count, 0);
    }

    #[test]
    fn test_stage_errors_are_wrapped() {
        assert_matches!(
            process_file("missing.bsl"),
            Err(PipelineError::FileProcessing(_))
        );

        let error = process_source("broken", "Процедура П(\n").unwrap_err();
        assert_matches!(
            error,
            PipelineError::SyntaxAnalysis(SyntaxError::UnexpectedEndOfStream { .. })
        );
        assert_eq!(error.stage(), "syntax");
        assert_eq!(error.error_code().as_str(), "E040");
    }

    #[test]
    fn test_process_source_output_json() {
        let result = process_source("ОбщийМодуль", MODULE).unwrap();
        assert!(result.file_metadata.is_none());
        assert_eq!(result.token_counts.comments, 1);
        assert_eq!(result.unparsed_statement_count(), 0);

        let json: serde_json::Value =
            serde_json::from_str(&PipelineOutput::new(&result).to_json_pretty().unwrap()).unwrap();
        assert_eq!(json["file"], "ОбщийМодуль");
        assert_eq!(json["ast"]["kind"], "Module");
        assert_eq!(json["subprogram_count"], 1);
    }

    #[test]
    fn test_stats_over_results() {
        let results = vec![
            process_source("ok", "а = 1;"),
            process_source("bad", "а = (1;"),
        ];
        let stats = get_pipeline_stats(&results);

        assert_eq!(stats.total_files_processed, 2);
        assert_eq!(stats.successful_parses, 1);
        assert_eq!(stats.failed_parses, 1);
        assert!((stats.success_rate() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_pipeline_info() {
        let info = get_pipeline_info();
        assert_eq!(info.pipeline_stages, 3);
        assert!(info.supported_extensions.contains(&"bsl".to_string()));
        assert!(info.report().contains("Max Expression Depth"));
    }
}
