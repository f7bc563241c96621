//! Types for conversion runs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use uuid::Uuid;

use crate::converter::TargetFormat;

use super::error::JobError;

/// Execution strategy for a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    /// One job at a time, in input order.
    #[default]
    Sequential,
    /// A fixed pool of workers, results in completion order.
    Parallel,
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sequential => f.write_str("sequential"),
            Self::Parallel => f.write_str("parallel"),
        }
    }
}

/// Unvalidated run parameters as supplied by a front end.
#[derive(Debug, Clone)]
pub struct RunRequest {
    pub mode: RunMode,
    /// Only used in parallel mode.
    pub worker_count: usize,
    /// Format name or extension, e.g. "MP3" or ".flac".
    pub target_format: String,
    pub output_directory: PathBuf,
    pub input_paths: Vec<PathBuf>,
}

/// Validated, immutable configuration of one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunConfiguration {
    pub mode: RunMode,
    pub worker_count: usize,
    pub target_format: TargetFormat,
    pub output_directory: PathBuf,
}

impl RunConfiguration {
    pub fn sequential(target_format: TargetFormat, output_directory: impl Into<PathBuf>) -> Self {
        Self {
            mode: RunMode::Sequential,
            worker_count: 1,
            target_format,
            output_directory: output_directory.into(),
        }
    }

    pub fn parallel(
        target_format: TargetFormat,
        output_directory: impl Into<PathBuf>,
        worker_count: usize,
    ) -> Self {
        Self {
            mode: RunMode::Parallel,
            worker_count,
            target_format,
            output_directory: output_directory.into(),
        }
    }
}

/// One unit of work: a single input file and where its conversion goes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConversionJob {
    /// Position of the input in the run's input list.
    pub index: usize,
    pub input_path: PathBuf,
    pub target_format: TargetFormat,
    pub output_directory: PathBuf,
    /// Derived from the input stem, the output directory and the format.
    pub output_path: PathBuf,
}

/// Outcome of a job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum JobStatus {
    Success { output_size_bytes: u64 },
    Failure { error: JobError },
    /// The run was stopped before this job was dispatched.
    NotRun,
}

/// Result of exactly one job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConversionResult {
    pub index: usize,
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    #[serde(flatten)]
    pub status: JobStatus,
    #[serde(rename = "elapsed_ms", serialize_with = "serialize_duration_ms")]
    pub elapsed: Duration,
    pub finished_at: DateTime<Utc>,
}

impl ConversionResult {
    pub fn is_success(&self) -> bool {
        matches!(self.status, JobStatus::Success { .. })
    }

    pub fn is_failure(&self) -> bool {
        matches!(self.status, JobStatus::Failure { .. })
    }

    pub fn is_not_run(&self) -> bool {
        matches!(self.status, JobStatus::NotRun)
    }

    /// The failure reason, present iff the job failed.
    pub fn error(&self) -> Option<&JobError> {
        match &self.status {
            JobStatus::Failure { error } => Some(error),
            _ => None,
        }
    }

    /// File name of the input, for display.
    pub fn file_name(&self) -> String {
        display_name(&self.input_path)
    }
}

/// Run-level rollup of all results.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub mode: RunMode,
    pub worker_count: usize,
    pub target_format: TargetFormat,
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub not_run: usize,
    pub started_at: DateTime<Utc>,
    /// Wall-clock duration of the run.
    #[serde(rename = "elapsed_ms", serialize_with = "serialize_duration_ms")]
    pub elapsed: Duration,
    /// Sum of the per-job durations.
    #[serde(rename = "job_time_ms", serialize_with = "serialize_duration_ms")]
    pub job_time: Duration,
    /// One result per job, in input order.
    pub results: Vec<ConversionResult>,
}

impl RunSummary {
    /// True when every job ran and succeeded.
    pub fn is_success(&self) -> bool {
        self.failed == 0 && self.not_run == 0
    }

    pub fn failures(&self) -> impl Iterator<Item = &ConversionResult> {
        self.results.iter().filter(|r| r.is_failure())
    }

    /// `(file name, elapsed)` for every job that ran, slowest first.
    pub fn timings_slowest_first(&self) -> Vec<(String, Duration)> {
        let mut timings: Vec<(String, Duration)> = self
            .results
            .iter()
            .filter(|r| !r.is_not_run())
            .map(|r| (r.file_name(), r.elapsed))
            .collect();
        timings.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        timings
    }

    /// Wall-clock speedup of this run relative to `baseline`.
    ///
    /// `None` when this run took no measurable time.
    pub fn speedup_against(&self, baseline: &RunSummary) -> Option<f64> {
        let this = self.elapsed.as_secs_f64();
        if this <= 0.0 {
            return None;
        }
        Some(baseline.elapsed.as_secs_f64() / this)
    }
}

pub(crate) fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string_lossy().to_string())
}

pub(crate) fn serialize_duration_ms<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_u64(duration.as_millis().min(u128::from(u64::MAX)) as u64)
}
