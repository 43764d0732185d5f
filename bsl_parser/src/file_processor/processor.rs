//! Module file reading with compile-time limits and global logging

use crate::config::compile_time::file_processing::{
    LARGE_FILE_THRESHOLD, MAX_FILE_SIZE, MAX_LINE_COUNT_FOR_ANALYSIS,
};
use crate::config::runtime::FileProcessorPreferences;
use crate::logging::codes;
use crate::{log_debug, log_error, log_success};
use serde::Serialize;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant, SystemTime};

/// Extensions of 1C:Enterprise and OneScript module files
pub const BSL_EXTENSIONS: &[&str] = &["bsl", "os"];

pub fn is_bsl_extension(extension: &str) -> bool {
    BSL_EXTENSIONS
        .iter()
        .any(|known| known.eq_ignore_ascii_case(extension))
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FileProcessorError {
    #[error("File not found: {path}")]
    FileNotFound { path: String },

    #[error("Invalid file extension: expected .bsl or .os, found {extension:?}")]
    InvalidExtension { extension: Option<String> },

    #[error("File too large: {size} bytes (max: {max_size})")]
    FileTooLarge { size: u64, max_size: u64 },

    #[error("File exceeds maximum line count: {lines} (max: {max_lines})")]
    TooManyLines { lines: usize, max_lines: usize },

    #[error("Permission denied: {path}")]
    PermissionDenied { path: String },

    #[error("Invalid UTF-8 encoding in file: {path}")]
    InvalidEncoding { path: String },

    #[error("I/O error reading file: {message}")]
    IoError { message: String },

    #[error("Invalid file path: {path}")]
    InvalidPath { path: String },
}

impl FileProcessorError {
    pub fn error_code(&self) -> crate::logging::Code {
        match self {
            Self::FileNotFound { .. } => codes::file_processing::FILE_NOT_FOUND,
            Self::InvalidExtension { .. } => codes::file_processing::INVALID_EXTENSION,
            Self::FileTooLarge { .. } => codes::file_processing::FILE_TOO_LARGE,
            Self::TooManyLines { .. } => codes::file_processing::TOO_MANY_LINES,
            Self::PermissionDenied { .. } => codes::file_processing::PERMISSION_DENIED,
            Self::InvalidEncoding { .. } => codes::file_processing::INVALID_ENCODING,
            Self::IoError { .. } => codes::file_processing::IO_ERROR,
            Self::InvalidPath { .. } => codes::file_processing::INVALID_PATH,
        }
    }

    pub fn requires_halt(&self) -> bool {
        codes::requires_halt(self.error_code().as_str())
    }

    pub fn severity(&self) -> &'static str {
        codes::get_severity(self.error_code().as_str()).as_str()
    }

    pub fn category(&self) -> &'static str {
        codes::get_category(self.error_code().as_str())
    }

    pub fn is_recoverable(&self) -> bool {
        codes::is_recoverable(self.error_code().as_str())
    }

    fn from_io(error: std::io::Error, path: &Path) -> Self {
        match error.kind() {
            ErrorKind::NotFound => Self::FileNotFound {
                path: path.display().to_string(),
            },
            ErrorKind::PermissionDenied => Self::PermissionDenied {
                path: path.display().to_string(),
            },
            ErrorKind::InvalidData => Self::InvalidEncoding {
                path: path.display().to_string(),
            },
            _ => Self::IoError {
                message: format!("'{}': {}", path.display(), error),
            },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FileMetadata {
    /// Canonical path
    pub path: PathBuf,
    pub size: u64,
    /// Lowercased extension without the dot
    pub extension: Option<String>,
    pub line_count: usize,
    pub is_bsl_file: bool,
    #[serde(skip)]
    pub modified: Option<SystemTime>,
}

impl FileMetadata {
    pub fn human_readable_size(&self) -> String {
        const UNITS: &[&str] = &["B", "KB", "MB", "GB"];
        let mut size = self.size as f64;
        let mut unit_index = 0;

        while size >= 1024.0 && unit_index < UNITS.len() - 1 {
            size /= 1024.0;
            unit_index += 1;
        }

        if unit_index == 0 {
            format!("{} {}", self.size, UNITS[0])
        } else {
            format!("{:.2} {}", size, UNITS[unit_index])
        }
    }

    pub fn is_large_file(&self) -> bool {
        self.size > LARGE_FILE_THRESHOLD
    }

    /// Rough effort estimate: size in KB plus a tenth of the line count
    pub fn complexity_score(&self) -> f64 {
        self.size as f64 / 1024.0 + self.line_count as f64 * 0.1
    }
}

/// Source text of one module file plus what was learned while reading it
#[derive(Debug, Clone)]
pub struct FileProcessingResult {
    /// UTF-8 text, BOM included if present; the lexer treats it as whitespace
    pub source: String,
    pub metadata: FileMetadata,
    pub processing_duration: Duration,
}

impl FileProcessingResult {
    pub fn char_count(&self) -> usize {
        self.source.chars().count()
    }

    pub fn is_effectively_empty(&self) -> bool {
        self.source
            .trim_matches(|c: char| c.is_whitespace() || c == '\u{FEFF}')
            .is_empty()
    }

    /// Characters per millisecond
    pub fn processing_rate(&self) -> f64 {
        let duration_ms = self.processing_duration.as_secs_f64() * 1000.0;
        if duration_ms > 0.0 {
            self.char_count() as f64 / duration_ms
        } else {
            0.0
        }
    }
}

pub struct FileProcessor {
    pub require_bsl_extension: bool,
    pub enable_performance_logging: bool,
    pub log_non_bsl_processing: bool,
    pub include_complexity_metrics: bool,
}

impl FileProcessor {
    pub fn new() -> Self {
        Self::from_preferences(&FileProcessorPreferences {
            require_bsl_extension: false,
            enable_performance_logging: true,
            log_non_bsl_processing: false,
            include_complexity_metrics: false,
        })
    }

    pub fn from_preferences(prefs: &FileProcessorPreferences) -> Self {
        Self {
            require_bsl_extension: prefs.require_bsl_extension,
            enable_performance_logging: prefs.enable_performance_logging,
            log_non_bsl_processing: prefs.log_non_bsl_processing,
            include_complexity_metrics: prefs.include_complexity_metrics,
        }
    }

    pub fn with_bsl_extension_required(mut self, required: bool) -> Self {
        self.require_bsl_extension = required;
        self
    }

    pub fn with_performance_logging(mut self, enabled: bool) -> Self {
        self.enable_performance_logging = enabled;
        self
    }

    pub fn max_file_size() -> u64 {
        MAX_FILE_SIZE
    }

    /// Read a module file and collect its metadata
    pub fn process_file(
        &self,
        file_path: impl AsRef<Path>,
    ) -> Result<FileProcessingResult, FileProcessorError> {
        let start_time = Instant::now();
        let file_path = file_path.as_ref();
        let display = file_path.display().to_string();

        log_debug!("Starting file processing", "file" => display);

        let path = self.validate_path(file_path)?;
        let mut metadata = self.get_metadata(&path)?;
        self.validate_file(&metadata)?;

        let source = fs::read_to_string(&path).map_err(|e| {
            let error = FileProcessorError::from_io(e, &path);
            log_error!(error.error_code(), "Failed to read module file",
                "file" => display,
                "error" => error
            );
            error
        })?;

        let line_count = source.lines().count();
        if line_count > MAX_LINE_COUNT_FOR_ANALYSIS {
            let error = FileProcessorError::TooManyLines {
                lines: line_count,
                max_lines: MAX_LINE_COUNT_FOR_ANALYSIS,
            };
            log_error!(error.error_code(), "File exceeds maximum line count for analysis",
                "file" => display,
                "lines" => line_count,
                "max_lines" => MAX_LINE_COUNT_FOR_ANALYSIS
            );
            return Err(error);
        }
        metadata.line_count = line_count;

        let result = FileProcessingResult {
            source,
            metadata,
            processing_duration: start_time.elapsed(),
        };

        self.log_processing_success(&result);

        if !result.metadata.is_bsl_file && self.log_non_bsl_processing {
            log_debug!("Processing file without a module extension",
                "extension" => result.metadata.extension.as_deref().unwrap_or("none"),
                "file" => display
            );
        }

        Ok(result)
    }

    fn log_processing_success(&self, result: &FileProcessingResult) {
        let file = result.metadata.path.display();
        let duration_ms = format!("{:.2}", result.processing_duration.as_secs_f64() * 1000.0);

        if !self.enable_performance_logging {
            log_success!(codes::success::FILE_PROCESSING_SUCCESS, "File read successfully",
                "file" => file,
                "lines" => result.metadata.line_count
            );
        } else if self.include_complexity_metrics {
            log_success!(codes::success::FILE_PROCESSING_SUCCESS, "File read successfully",
                "file" => file,
                "size" => result.metadata.human_readable_size(),
                "lines" => result.metadata.line_count,
                "chars" => result.char_count(),
                "duration_ms" => duration_ms,
                "complexity_score" => format!("{:.2}", result.metadata.complexity_score()),
                "is_large_file" => result.metadata.is_large_file()
            );
        } else {
            log_success!(codes::success::FILE_PROCESSING_SUCCESS, "File read successfully",
                "file" => file,
                "size" => result.metadata.human_readable_size(),
                "lines" => result.metadata.line_count,
                "chars" => result.char_count(),
                "duration_ms" => duration_ms,
                "chars_per_ms" => format!("{:.2}", result.processing_rate())
            );
        }
    }

    fn validate_path(&self, file_path: &Path) -> Result<PathBuf, FileProcessorError> {
        if file_path.as_os_str().is_empty() {
            let error = FileProcessorError::InvalidPath {
                path: String::new(),
            };
            log_error!(error.error_code(), "Empty file path provided");
            return Err(error);
        }

        if !file_path.exists() {
            let error = FileProcessorError::FileNotFound {
                path: file_path.display().to_string(),
            };
            log_error!(error.error_code(), "File not found", "path" => file_path.display());
            return Err(error);
        }

        if !file_path.is_file() {
            let error = FileProcessorError::InvalidPath {
                path: file_path.display().to_string(),
            };
            log_error!(error.error_code(), "Path is not a file", "path" => file_path.display());
            return Err(error);
        }

        file_path.canonicalize().map_err(|e| {
            let error = FileProcessorError::from_io(e, file_path);
            log_error!(error.error_code(), "Failed to canonicalize path",
                "path" => file_path.display(),
                "error" => error
            );
            error
        })
    }

    fn get_metadata(&self, path: &Path) -> Result<FileMetadata, FileProcessorError> {
        let metadata = fs::metadata(path).map_err(|e| {
            let error = FileProcessorError::from_io(e, path);
            log_error!(error.error_code(), "Failed to read file metadata",
                "path" => path.display(),
                "error" => error
            );
            error
        })?;

        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_lowercase);
        let is_bsl_file = extension.as_deref().is_some_and(is_bsl_extension);

        let file_metadata = FileMetadata {
            path: path.to_path_buf(),
            size: metadata.len(),
            extension,
            line_count: 0,
            is_bsl_file,
            modified: metadata.modified().ok(),
        };

        log_debug!("File metadata collected",
            "size" => file_metadata.human_readable_size(),
            "extension" => file_metadata.extension.as_deref().unwrap_or("none"),
            "is_bsl" => is_bsl_file,
            "is_large_file" => file_metadata.is_large_file()
        );

        Ok(file_metadata)
    }

    fn validate_file(&self, metadata: &FileMetadata) -> Result<(), FileProcessorError> {
        if metadata.size > MAX_FILE_SIZE {
            let error = FileProcessorError::FileTooLarge {
                size: metadata.size,
                max_size: MAX_FILE_SIZE,
            };
            log_error!(error.error_code(), "File exceeds compile-time maximum size limit",
                "file" => metadata.path.display(),
                "size_bytes" => metadata.size,
                "limit_bytes" => MAX_FILE_SIZE
            );
            return Err(error);
        }

        if self.require_bsl_extension && !metadata.is_bsl_file {
            let error = FileProcessorError::InvalidExtension {
                extension: metadata.extension.clone(),
            };
            log_error!(error.error_code(), "File does not have a module extension",
                "file" => metadata.path.display(),
                "extension" => metadata.extension.as_deref().unwrap_or("none"),
                "required" => BSL_EXTENSIONS.join(", ")
            );
            return Err(error);
        }

        Ok(())
    }
}

impl Default for FileProcessor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::fs;
    use tempfile::tempdir;

    const MODULE: &str = "Процедура Тест()\nКонецПроцедуры\n";

    #[test]
    fn test_process_valid_file() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("Модуль.bsl");
        fs::write(&file_path, MODULE).unwrap();

        let result = FileProcessor::new().process_file(&file_path).unwrap();

        assert_eq!(result.metadata.line_count, 2);
        assert!(result.metadata.is_bsl_file);
        assert_eq!(result.metadata.extension.as_deref(), Some("bsl"));
        assert_eq!(result.char_count(), MODULE.chars().count());
        assert!(!result.is_effectively_empty());
    }

    #[test]
    fn test_onescript_extension_and_case() {
        assert!(is_bsl_extension("os"));
        assert!(is_bsl_extension("BSL"));
        assert!(!is_bsl_extension("txt"));
    }

    #[test]
    fn test_byte_order_mark_is_kept() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("bom.bsl");
        fs::write(&file_path, format!("\u{FEFF}{}", MODULE)).unwrap();

        let result = FileProcessor::new().process_file(&file_path).unwrap();
        assert!(result.source.starts_with('\u{FEFF}'));
    }

    #[test]
    fn test_empty_file_is_accepted() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("Пустой.bsl");
        fs::write(&file_path, "").unwrap();

        let result = FileProcessor::new().process_file(&file_path).unwrap();
        assert!(result.is_effectively_empty());
        assert_eq!(result.metadata.line_count, 0);
    }

    #[test]
    fn test_file_not_found() {
        assert_matches!(
            FileProcessor::new().process_file("nonexistent.bsl"),
            Err(FileProcessorError::FileNotFound { .. })
        );
        assert_matches!(
            FileProcessor::new().process_file(""),
            Err(FileProcessorError::InvalidPath { .. })
        );
    }

    #[test]
    fn test_directory_is_not_a_file() {
        let dir = tempdir().unwrap();
        assert_matches!(
            FileProcessor::new().process_file(dir.path()),
            Err(FileProcessorError::InvalidPath { .. })
        );
    }

    #[test]
    fn test_invalid_utf8() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("cp1251.bsl");
        fs::write(&file_path, [0xCF, 0xF0, 0xEE, 0xF6]).unwrap();

        assert_matches!(
            FileProcessor::new().process_file(&file_path),
            Err(FileProcessorError::InvalidEncoding { .. })
        );
    }

    #[test]
    fn test_extension_requirement() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("module.txt");
        fs::write(&file_path, MODULE).unwrap();

        assert!(FileProcessor::new().process_file(&file_path).is_ok());
        assert_matches!(
            FileProcessor::new()
                .with_bsl_extension_required(true)
                .process_file(&file_path),
            Err(FileProcessorError::InvalidExtension { extension: Some(ext) }) if ext == "txt"
        );
    }

    #[test]
    fn test_too_many_lines() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("many_lines.bsl");
        fs::write(&file_path, "а = 1;\n".repeat(MAX_LINE_COUNT_FOR_ANALYSIS + 1)).unwrap();

        assert_matches!(
            FileProcessor::new().process_file(&file_path),
            Err(FileProcessorError::TooManyLines { max_lines, .. }) if max_lines == MAX_LINE_COUNT_FOR_ANALYSIS
        );
    }

    #[test]
    fn test_metadata_helpers() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("large.bsl");
        fs::write(&file_path, "А".repeat(LARGE_FILE_THRESHOLD as usize)).unwrap();

        let result = FileProcessor::new()
            .with_performance_logging(false)
            .process_file(&file_path)
            .unwrap();

        assert!(result.metadata.is_large_file());
        assert!(result.metadata.complexity_score() > 0.0);
        assert!(result.metadata.human_readable_size().ends_with("MB"));
    }

    #[test]
    fn test_error_metadata() {
        let error = FileProcessorError::FileNotFound {
            path: "Модуль.bsl".to_string(),
        };

        assert_eq!(error.error_code().as_str(), "E005");
        assert_eq!(error.category(), "FileProcessing");
        assert!(!error.is_recoverable());
        assert!(error.requires_halt());
    }

    #[test]
    fn test_from_preferences() {
        let prefs = FileProcessorPreferences {
            require_bsl_extension: true,
            enable_performance_logging: false,
            log_non_bsl_processing: true,
            include_complexity_metrics: true,
        };

        let processor = FileProcessor::from_preferences(&prefs);
        assert!(processor.require_bsl_extension);
        assert!(!processor.enable_performance_logging);
        assert!(processor.log_non_bsl_processing);
        assert!(processor.include_complexity_metrics);
        assert_eq!(FileProcessor::max_file_size(), MAX_FILE_SIZE);
    }
}
