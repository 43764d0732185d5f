use crate::config::compile_time::file_processing::MAX_FILE_SIZE;
use crate::config::compile_time::syntax::MAX_EXPRESSION_DEPTH;
use crate::file_processor::BSL_EXTENSIONS;

/// Information about pipeline capabilities
#[derive(Debug, Clone)]
pub struct PipelineInfo {
    pub pipeline_stages: usize,
    pub build_profile: &'static str,
    pub max_file_size: u64,
    pub max_expression_depth: usize,
    pub supported_extensions: Vec<String>,
    pub global_logging_enabled: bool,
    pub cargo_style_output: bool,
}

impl PipelineInfo {
    pub fn report(&self) -> String {
        format!(
            "BSL Parsing Pipeline:\n\
             - Pipeline Stages: {}\n\
             - Build Profile: {}\n\
             - Max File Size: {} MB\n\
             - Max Expression Depth: {}\n\
             - Supported Extensions: {}\n\
             - Global Logging: {}\n\
             - Cargo-style Output: {}",
            self.pipeline_stages,
            self.build_profile,
            self.max_file_size / (1024 * 1024),
            self.max_expression_depth,
            self.supported_extensions.join(", "),
            self.global_logging_enabled,
            self.cargo_style_output
        )
    }

    pub fn summary(&self) -> String {
        format!(
            "{}-stage BSL parser supporting {} extensions",
            self.pipeline_stages,
            self.supported_extensions.join(", ")
        )
    }
}

pub fn get_pipeline_info() -> PipelineInfo {
    PipelineInfo {
        pipeline_stages: 3,
        build_profile: crate::config::build_info::profile(),
        max_file_size: MAX_FILE_SIZE,
        max_expression_depth: MAX_EXPRESSION_DEPTH,
        supported_extensions: BSL_EXTENSIONS.iter().map(|ext| ext.to_string()).collect(),
        global_logging_enabled: crate::logging::is_initialized(),
        cargo_style_output: crate::logging::config::use_cargo_style_output(),
    }
}
