//! Batch processing of module directories
//!
//! Discovers `.bsl`/`.os` files and runs each through the pipeline, either
//! sequentially or on worker threads fed in chunks. Every file runs inside its
//! own logging context, so the global error collector can produce a per-file
//! cargo-style report afterwards.

use crate::config::compile_time::batch_processing::{MAX_FILES_PER_BATCH, MAX_WORKER_THREADS};
use crate::config::compile_time::file_processing::MAX_FILE_SIZE;
use crate::config::runtime::RuntimeConfig;
use crate::file_processor::{is_bsl_extension, BSL_EXTENSIONS};
use crate::logging::codes;
use crate::pipeline::{self, PipelineError, PipelineResult};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;
use std::time::{Duration, Instant};

// ============================================================================
// BATCH PROCESSING TYPES
// ============================================================================

#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Worker threads; 1 selects sequential processing. Capped at `MAX_WORKER_THREADS`
    pub max_threads: usize,
    pub recursive: bool,
    /// Stop discovery after this many files. Capped at `MAX_FILES_PER_BATCH`
    pub max_files: Option<usize>,
    pub progress_reporting: bool,
    pub fail_fast: bool,
    /// Preferences handed to every pipeline run
    pub runtime: RuntimeConfig,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_threads: thread::available_parallelism()
                .map(|n| n.get().min(8))
                .unwrap_or(4),
            recursive: true,
            max_files: None,
            progress_reporting: false,
            fail_fast: false,
            runtime: RuntimeConfig::default(),
        }
    }
}

impl BatchConfig {
    pub fn effective_threads(&self) -> usize {
        self.max_threads.clamp(1, MAX_WORKER_THREADS)
    }

    pub fn effective_file_limit(&self) -> usize {
        self.max_files
            .map_or(MAX_FILES_PER_BATCH, |max| max.min(MAX_FILES_PER_BATCH))
    }
}

#[derive(Debug, Default)]
pub struct BatchResults {
    pub successful_files: Vec<(PathBuf, PipelineResult)>,
    pub failed_files: Vec<(PathBuf, PipelineError)>,
    pub skipped_files: Vec<(PathBuf, String)>,
    pub processing_duration: Duration,
    pub files_processed: usize,
    pub files_discovered: usize,
}

impl BatchResults {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn success_count(&self) -> usize {
        self.successful_files.len()
    }

    pub fn failure_count(&self) -> usize {
        self.failed_files.len()
    }

    pub fn has_failures(&self) -> bool {
        !self.failed_files.is_empty() || !self.skipped_files.is_empty()
    }

    pub fn success_rate(&self) -> f64 {
        if self.files_processed == 0 {
            0.0
        } else {
            self.successful_files.len() as f64 / self.files_processed as f64
        }
    }

    pub fn add_success(&mut self, file_path: PathBuf, result: PipelineResult) {
        self.successful_files.push((file_path, result));
        self.files_processed += 1;
    }

    pub fn add_failure(&mut self, file_path: PathBuf, error: PipelineError) {
        self.failed_files.push((file_path, error));
        self.files_processed += 1;
    }

    pub fn merge(&mut self, other: BatchResults) {
        self.successful_files.extend(other.successful_files);
        self.failed_files.extend(other.failed_files);
        self.skipped_files.extend(other.skipped_files);
        self.files_processed += other.files_processed;
    }

    /// Restore discovery order after parallel runs
    pub fn sort_by_path(&mut self) {
        self.successful_files.sort_by(|a, b| a.0.cmp(&b.0));
        self.failed_files.sort_by(|a, b| a.0.cmp(&b.0));
    }

    pub fn total_subprograms(&self) -> usize {
        self.successful_files
            .iter()
            .map(|(_, result)| result.subprogram_count())
            .sum()
    }

    pub fn summary(&self) -> String {
        format!(
            "Batch processing completed: {} files processed, {} successful ({:.1}%), {} failed, {} skipped, {} subprograms, {:.2}s total",
            self.files_processed,
            self.success_count(),
            self.success_rate() * 100.0,
            self.failure_count(),
            self.skipped_files.len(),
            self.total_subprograms(),
            self.processing_duration.as_secs_f64()
        )
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    #[error("Directory not found: {path}")]
    DirectoryNotFound { path: String },

    #[error("Not a directory: {path}")]
    NotADirectory { path: String },

    #[error("No module files ({extensions}) found in directory: {path}")]
    NoFilesFound { path: String, extensions: String },

    #[error("Too many files found: batch limit of {max} reached; pass a file limit to process a subset")]
    TooManyFiles { max: usize },

    #[error("IO error during directory traversal of '{path}': {message}")]
    IoError { path: String, message: String },

    #[error("Worker thread error: {message}")]
    ThreadError { message: String },
}

impl BatchError {
    pub fn error_code(&self) -> crate::logging::Code {
        match self {
            Self::DirectoryNotFound { .. } => codes::file_processing::FILE_NOT_FOUND,
            Self::NotADirectory { .. } => codes::file_processing::INVALID_PATH,
            Self::NoFilesFound { .. } => codes::file_processing::INVALID_EXTENSION,
            Self::TooManyFiles { .. } => codes::file_processing::FILE_TOO_LARGE,
            Self::IoError { .. } => codes::file_processing::IO_ERROR,
            Self::ThreadError { .. } => codes::system::INTERNAL_ERROR,
        }
    }
}

// ============================================================================
// FILE DISCOVERY
// ============================================================================

/// Find module files under `dir_path`, sorted by path
pub fn discover_bsl_files(dir_path: &Path, config: &BatchConfig) -> Result<Vec<PathBuf>, BatchError> {
    crate::log_info!("Starting file discovery",
        "directory" => dir_path.display(),
        "recursive" => config.recursive
    );

    if !dir_path.exists() {
        return Err(BatchError::DirectoryNotFound {
            path: dir_path.display().to_string(),
        });
    }

    if !dir_path.is_dir() {
        return Err(BatchError::NotADirectory {
            path: dir_path.display().to_string(),
        });
    }

    let mut files = Vec::new();
    visit_directory(dir_path, &mut files, config)?;

    if files.is_empty() {
        return Err(BatchError::NoFilesFound {
            path: dir_path.display().to_string(),
            extensions: BSL_EXTENSIONS.join(", "),
        });
    }

    files.sort();

    crate::log_success!(
        codes::success::FILE_VALIDATION_PASSED,
        "File discovery completed",
        "files_found" => files.len(),
        "directory" => dir_path.display()
    );

    Ok(files)
}

fn visit_directory(
    dir_path: &Path,
    files: &mut Vec<PathBuf>,
    config: &BatchConfig,
) -> Result<(), BatchError> {
    let io_error = |e: std::io::Error| BatchError::IoError {
        path: dir_path.display().to_string(),
        message: e.to_string(),
    };

    let mut entries = fs::read_dir(dir_path)
        .map_err(io_error)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<Result<Vec<_>, _>>()
        .map_err(io_error)?;
    entries.sort();

    let limit = config.effective_file_limit();

    for path in entries {
        if files.len() >= limit {
            break;
        }

        if path.is_dir() {
            if config.recursive {
                visit_directory(&path, files, config)?;
            }
        } else if is_bsl_file(&path) {
            files.push(path);

            if files.len() == limit {
                if config.max_files.is_none() {
                    return Err(BatchError::TooManyFiles { max: limit });
                }
                crate::log_warning!(
                    "Reached maximum file limit",
                    "files_found" => files.len(),
                    "limit" => limit
                );
            }
        }
    }

    Ok(())
}

fn is_bsl_file(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(is_bsl_extension)
}

/// Split files into those worth handing to the pipeline and those skipped with a reason
fn validate_files(files: &[PathBuf]) -> (Vec<PathBuf>, Vec<(PathBuf, String)>) {
    let mut valid_files = Vec::new();
    let mut invalid_files = Vec::new();

    for file in files {
        match validate_single_file(file) {
            Ok(()) => valid_files.push(file.clone()),
            Err(reason) => {
                crate::log_error!(
                    codes::file_processing::INVALID_PATH,
                    "File validation failed",
                    "file" => file.display(),
                    "reason" => reason
                );
                invalid_files.push((file.clone(), reason));
            }
        }
    }

    if !invalid_files.is_empty() {
        crate::log_warning!(
            "Some files failed validation",
            "valid_files" => valid_files.len(),
            "invalid_files" => invalid_files.len()
        );
    }

    (valid_files, invalid_files)
}

fn validate_single_file(file_path: &Path) -> Result<(), String> {
    let metadata =
        fs::metadata(file_path).map_err(|e| format!("Cannot read file metadata: {}", e))?;

    if !metadata.is_file() {
        return Err("Path is not a file".to_string());
    }

    if metadata.len() > MAX_FILE_SIZE {
        return Err(format!(
            "File too large: {} bytes (max: {} bytes)",
            metadata.len(),
            MAX_FILE_SIZE
        ));
    }

    Ok(())
}

// ============================================================================
// BATCH PROCESSING
// ============================================================================

fn report_progress(config: &BatchConfig, file_id: usize, total: usize, file_path: &Path) {
    if config.progress_reporting {
        eprintln!(
            "Processing file {} of {}: {}",
            file_id + 1,
            total,
            file_path.display()
        );
    }
}

pub fn process_directory_sequential(
    dir_path: &Path,
    config: &BatchConfig,
) -> Result<BatchResults, BatchError> {
    let start_time = Instant::now();

    crate::log_info!("Starting sequential batch processing",
        "directory" => dir_path.display()
    );

    let discovered_files = discover_bsl_files(dir_path, config)?;
    let (valid_files, invalid_files) = validate_files(&discovered_files);

    let mut results = BatchResults::new();
    results.files_discovered = discovered_files.len();
    results.skipped_files = invalid_files;

    for (file_id, file_path) in valid_files.iter().enumerate() {
        report_progress(config, file_id, valid_files.len(), file_path);

        match pipeline::process_file_with_config(file_path, file_id, &config.runtime) {
            Ok(pipeline_result) => results.add_success(file_path.clone(), pipeline_result),
            Err(pipeline_error) => {
                log_file_failure(file_path, &pipeline_error);
                results.add_failure(file_path.clone(), pipeline_error);

                if config.fail_fast {
                    crate::log_warning!("Fail-fast mode enabled, stopping batch processing");
                    break;
                }
            }
        }
    }

    results.processing_duration = start_time.elapsed();
    log_completion("Sequential batch processing completed", &results, 1);

    Ok(results)
}

pub fn process_directory_parallel(
    dir_path: &Path,
    config: &BatchConfig,
) -> Result<BatchResults, BatchError> {
    let start_time = Instant::now();
    let threads = config.effective_threads();

    crate::log_info!("Starting parallel batch processing",
        "directory" => dir_path.display(),
        "max_threads" => threads
    );

    let discovered_files = discover_bsl_files(dir_path, config)?;
    let (valid_files, invalid_files) = validate_files(&discovered_files);

    let mut results = BatchResults::new();
    results.files_discovered = discovered_files.len();
    results.skipped_files = invalid_files;

    if valid_files.is_empty() {
        results.processing_duration = start_time.elapsed();
        return Ok(results);
    }

    let chunk_size = calculate_chunk_size(valid_files.len(), threads);
    let runtime = Arc::new(config.runtime.clone());

    crate::log_debug!("Parallel processing configuration",
        "total_files" => valid_files.len(),
        "chunk_size" => chunk_size,
        "threads" => threads
    );

    for (chunk_index, chunk) in valid_files.chunks(chunk_size).enumerate() {
        let first_file_id = chunk_index * chunk_size;
        let chunk_results = process_chunk_parallel(chunk, first_file_id, threads, &runtime)?;
        results.merge(chunk_results);

        if config.fail_fast && results.failure_count() > 0 {
            crate::log_warning!("Fail-fast mode enabled, stopping batch processing");
            break;
        }
    }

    results.sort_by_path();
    results.processing_duration = start_time.elapsed();
    log_completion("Parallel batch processing completed", &results, threads);

    Ok(results)
}

fn lock_results(results: &Mutex<BatchResults>) -> MutexGuard<'_, BatchResults> {
    results.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Spread one chunk over at most `threads` workers
fn process_chunk_parallel(
    files: &[PathBuf],
    first_file_id: usize,
    threads: usize,
    runtime: &Arc<RuntimeConfig>,
) -> Result<BatchResults, BatchError> {
    let results = Arc::new(Mutex::new(BatchResults::new()));
    let files_per_thread = files.len().div_ceil(threads);

    let mut handles = Vec::new();

    for (thread_index, thread_files) in files.chunks(files_per_thread).enumerate() {
        let thread_files = thread_files.to_vec();
        let results = Arc::clone(&results);
        let runtime = Arc::clone(runtime);
        let base_id = first_file_id + thread_index * files_per_thread;

        let handle = thread::Builder::new()
            .name(format!("bsl-batch-{}", thread_index))
            .spawn(move || {
                for (offset, file_path) in thread_files.into_iter().enumerate() {
                    let outcome =
                        pipeline::process_file_with_config(&file_path, base_id + offset, &runtime);
                    match outcome {
                        Ok(result) => lock_results(&results).add_success(file_path, result),
                        Err(error) => {
                            log_file_failure(&file_path, &error);
                            lock_results(&results).add_failure(file_path, error)
                        }
                    }
                }
            })
            .map_err(|e| BatchError::ThreadError {
                message: e.to_string(),
            })?;

        handles.push(handle);
    }

    for handle in handles {
        handle.join().map_err(|_| BatchError::ThreadError {
            message: "Worker thread panicked during processing".to_string(),
        })?;
    }

    let results = Arc::try_unwrap(results).map_err(|_| BatchError::ThreadError {
        message: "Failed to collect results from worker threads".to_string(),
    })?;

    Ok(results
        .into_inner()
        .unwrap_or_else(|poisoned| poisoned.into_inner()))
}

/// Files per chunk: an even split over the workers, between 1 and 50
fn calculate_chunk_size(file_count: usize, threads: usize) -> usize {
    const MAX_CHUNK_SIZE: usize = 50;
    file_count.div_ceil(threads.max(1)).clamp(1, MAX_CHUNK_SIZE)
}

fn log_file_failure(file_path: &Path, error: &PipelineError) {
    let code = error.error_code();
    crate::log_classified_error!(code, "File processing failed",
        "file" => file_path.display(),
        "stage" => error.stage()
    );
}

fn log_completion(message: &str, results: &BatchResults, threads: usize) {
    crate::log_performance!(
        codes::success::OPERATION_COMPLETED_SUCCESSFULLY,
        message,
        duration = results.processing_duration,
        "files_processed" => results.files_processed,
        "successful" => results.success_count(),
        "failed" => results.failure_count(),
        "threads_used" => threads
    );
}

// ============================================================================
// PUBLIC API
// ============================================================================

pub fn process_directory(dir_path: &Path) -> Result<BatchResults, BatchError> {
    process_directory_with_config(dir_path, &BatchConfig::default())
}

/// Sequential when the effective thread count is 1, parallel otherwise
pub fn process_directory_with_config(
    dir_path: &Path,
    config: &BatchConfig,
) -> Result<BatchResults, BatchError> {
    if config.effective_threads() == 1 {
        process_directory_sequential(dir_path, config)
    } else {
        process_directory_parallel(dir_path, config)
    }
}
