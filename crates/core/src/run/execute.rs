//! Execution of a single job, shared by both runners.

use chrono::Utc;
use std::time::{Duration, Instant};

use crate::converter::Converter;
use crate::metrics;

use super::error::JobError;
use super::types::{ConversionJob, ConversionResult, JobStatus};

/// Runs one job to completion and builds its result. Never fails: every
/// problem becomes a `Failure` status.
///
/// The input has already been checked by the queue.
pub(crate) async fn execute_job<C>(converter: &C, job: &ConversionJob) -> ConversionResult
where
    C: Converter + ?Sized,
{
    let start = Instant::now();
    let format = job.target_format.extension();

    let outcome = {
        let _in_flight = metrics::GaugeGuard::hold(&metrics::CONVERSIONS_IN_FLIGHT);
        converter
            .convert(&job.input_path, &job.output_path, job.target_format)
            .await
            .map_err(JobError::from)
    };

    let elapsed = start.elapsed();
    metrics::CONVERSION_DURATION
        .with_label_values(&[format])
        .observe(elapsed.as_secs_f64());

    let status = match outcome {
        Ok(output) => {
            metrics::CONVERSIONS_TOTAL
                .with_label_values(&[format, "success"])
                .inc();
            tracing::debug!(
                input = %job.input_path.display(),
                output = %output.output_path.display(),
                elapsed_ms = elapsed.as_millis() as u64,
                "Converted"
            );
            JobStatus::Success {
                output_size_bytes: output.output_size_bytes,
            }
        }
        Err(error) => {
            metrics::CONVERSIONS_TOTAL
                .with_label_values(&[format, "failed"])
                .inc();
            tracing::warn!(input = %job.input_path.display(), "Conversion failed: {}", error);
            JobStatus::Failure { error }
        }
    };

    result_for(job, status, elapsed)
}

/// Result for a job that fails without reaching the converter.
pub(crate) fn rejected_result(job: &ConversionJob, error: JobError) -> ConversionResult {
    metrics::CONVERSIONS_TOTAL
        .with_label_values(&[job.target_format.extension(), "failed"])
        .inc();
    tracing::warn!(input = %job.input_path.display(), "Job rejected: {}", error);
    result_for(job, JobStatus::Failure { error }, Duration::ZERO)
}

/// Result for a job that was never dispatched.
pub(crate) fn not_run_result(job: &ConversionJob) -> ConversionResult {
    metrics::CONVERSIONS_TOTAL
        .with_label_values(&[job.target_format.extension(), "not_run"])
        .inc();
    result_for(job, JobStatus::NotRun, Duration::ZERO)
}

fn result_for(job: &ConversionJob, status: JobStatus, elapsed: Duration) -> ConversionResult {
    ConversionResult {
        index: job.index,
        input_path: job.input_path.clone(),
        output_path: job.output_path.clone(),
        status,
        elapsed,
        finished_at: Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::converter::TargetFormat;
    use crate::testing::MockConverter;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    fn job_for(input: &Path, out_dir: &Path) -> ConversionJob {
        ConversionJob {
            index: 0,
            input_path: input.to_path_buf(),
            target_format: TargetFormat::Wav,
            output_directory: out_dir.to_path_buf(),
            output_path: out_dir.join("out.wav"),
        }
    }

    #[tokio::test]
    async fn test_success_records_output_size() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("in.mp3");
        std::fs::write(&input, b"ID3").unwrap();
        let converter = MockConverter::new();

        let result = execute_job(&converter, &job_for(&input, dir.path())).await;

        assert!(result.is_success());
        assert_eq!(result.output_path, dir.path().join("out.wav"));
        assert_eq!(converter.conversion_count().await, 1);
    }

    #[tokio::test]
    async fn test_converter_failure_is_local() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("in.mp3");
        std::fs::write(&input, b"ID3").unwrap();
        let converter = MockConverter::new();
        converter.fail_input(&input, "corrupt frame").await;

        let result = execute_job(&converter, &job_for(&input, dir.path())).await;

        assert_eq!(
            result.error(),
            Some(&JobError::ConversionFailed {
                reason: "corrupt frame".to_string()
            })
        );
    }

    #[test]
    fn test_not_run_result_has_zero_elapsed() {
        let job = job_for(&PathBuf::from("/a.wav"), Path::new("/o"));
        let result = not_run_result(&job);
        assert!(result.is_not_run());
        assert_eq!(result.elapsed, Duration::ZERO);
    }
}
