use super::{PipelineError, PipelineResult};
use std::time::Duration;

/// Aggregate figures over a set of pipeline runs
#[derive(Debug, Clone, Default)]
pub struct PipelineStats {
    pub total_files_processed: usize,
    pub successful_parses: usize,
    pub failed_parses: usize,
    pub total_processing_time: Duration,
    pub total_tokens_processed: usize,
    pub total_bytes_processed: u64,
    pub total_subprograms: usize,
}

impl PipelineStats {
    pub fn record_success(&mut self, result: &PipelineResult) {
        self.total_files_processed += 1;
        self.successful_parses += 1;
        self.total_processing_time += result.processing_duration;
        self.total_tokens_processed += result.token_count;
        self.total_bytes_processed += result.file_metadata.as_ref().map_or(0, |m| m.size);
        self.total_subprograms += result.subprogram_count();
    }

    pub fn record_failure(&mut self, _error: &PipelineError) {
        self.total_files_processed += 1;
        self.failed_parses += 1;
    }

    pub fn success_rate(&self) -> f64 {
        if self.total_files_processed == 0 {
            0.0
        } else {
            self.successful_parses as f64 / self.total_files_processed as f64
        }
    }

    pub fn average_processing_time(&self) -> Duration {
        match u32::try_from(self.successful_parses) {
            Ok(count) if count > 0 => self.total_processing_time / count,
            _ => Duration::ZERO,
        }
    }

    /// Bytes per second over successful runs
    pub fn average_processing_rate(&self) -> f64 {
        let seconds = self.total_processing_time.as_secs_f64();
        if seconds > 0.0 {
            self.total_bytes_processed as f64 / seconds
        } else {
            0.0
        }
    }
}

pub fn get_pipeline_stats<'a, I>(results: I) -> PipelineStats
where
    I: IntoIterator<Item = &'a Result<PipelineResult, PipelineError>>,
{
    let mut stats = PipelineStats::default();
    for result in results {
        match result {
            Ok(success) => stats.record_success(success),
            Err(error) => stats.record_failure(error),
        }
    }
    stats
}
