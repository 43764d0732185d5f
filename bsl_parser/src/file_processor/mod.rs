//! Reading module files from disk under compile-time size limits

mod processor;

use crate::config::compile_time::file_processing::{
    LARGE_FILE_THRESHOLD, MAX_FILE_SIZE, MAX_LINE_COUNT_FOR_ANALYSIS, PERFORMANCE_LOG_BUFFER_SIZE,
};
use crate::config::runtime::FileProcessorPreferences;
use crate::log_debug;
use crate::logging::codes;
use std::path::Path;

pub use processor::{
    is_bsl_extension, FileMetadata, FileProcessingResult, FileProcessor, FileProcessorError,
    BSL_EXTENSIONS,
};

/// Read a file with default settings
pub fn process_file(file_path: impl AsRef<Path>) -> Result<FileProcessingResult, FileProcessorError> {
    FileProcessor::new().process_file(file_path)
}

pub fn create_processor_from_preferences(prefs: &FileProcessorPreferences) -> FileProcessor {
    FileProcessor::from_preferences(prefs)
}

pub fn get_max_file_size() -> u64 {
    MAX_FILE_SIZE
}

pub fn get_large_file_threshold() -> u64 {
    LARGE_FILE_THRESHOLD
}

/// Check that file processing codes are registered
pub fn init_file_processor_logging() -> Result<(), String> {
    let file_codes = [
        codes::file_processing::FILE_NOT_FOUND,
        codes::file_processing::INVALID_EXTENSION,
        codes::file_processing::FILE_TOO_LARGE,
        codes::file_processing::TOO_MANY_LINES,
        codes::file_processing::PERMISSION_DENIED,
        codes::file_processing::INVALID_ENCODING,
        codes::file_processing::IO_ERROR,
        codes::file_processing::INVALID_PATH,
    ];

    for code in &file_codes {
        if codes::get_error_metadata(code.as_str()).is_none() {
            return Err(format!(
                "File processor error code {} not found in metadata registry",
                code.as_str()
            ));
        }
    }

    log_debug!("File processor compile-time configuration loaded",
        "max_file_size" => MAX_FILE_SIZE,
        "large_file_threshold" => LARGE_FILE_THRESHOLD,
        "max_line_count" => MAX_LINE_COUNT_FOR_ANALYSIS,
        "perf_buffer_size" => PERFORMANCE_LOG_BUFFER_SIZE
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_module_api() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("ОбщийМодуль.os");
        fs::write(&file_path, "Сообщить(\"Привет\");\n").unwrap();

        let result = process_file(&file_path).unwrap();
        assert!(result.metadata.is_bsl_file);
        assert_eq!(result.metadata.extension.as_deref(), Some("os"));
    }

    #[test]
    fn test_default_preferences_processor() {
        let processor = create_processor_from_preferences(&FileProcessorPreferences::default());
        assert!(processor.enable_performance_logging);
    }

    #[test]
    fn test_compile_time_limits() {
        assert!(get_large_file_threshold() <= get_max_file_size());
        assert!(MAX_LINE_COUNT_FOR_ANALYSIS > 0);
    }

    #[test]
    fn test_init_logging() {
        assert!(init_file_processor_logging().is_ok());
    }
}
