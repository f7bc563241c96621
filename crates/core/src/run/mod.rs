//! Batch conversion runs.
//!
//! A run turns a [`RunRequest`] into one [`ConversionJob`] per input, executes
//! them with either the [`SequentialRunner`] or the [`ParallelRunner`], and
//! returns a [`RunSummary`] holding exactly one [`ConversionResult`] per job.
//!
//! Problems with the request itself (unknown format, bad worker count, no
//! inputs) are [`RunError`]s and abort the run before any job exists. Problems
//! with a single file are [`JobError`]s recorded in that file's result; they
//! never affect other jobs.

mod error;
mod execute;
mod naming;
mod parallel;
mod queue;
mod sequential;
mod sink;
mod stop;
mod types;

pub use error::{JobError, RunError};
pub use naming::derive_output_path;
pub use parallel::{ParallelRunner, DEFAULT_RESULT_BUFFER};
pub use sequential::SequentialRunner;
pub use stop::StopHandle;
pub use types::{
    ConversionJob, ConversionResult, JobStatus, RunConfiguration, RunMode, RunRequest, RunSummary,
};

pub(crate) use types::serialize_duration_ms;

use std::sync::Arc;

use crate::converter::{Converter, TargetFormat};
use crate::metrics;
use crate::progress::ProgressReporter;

/// Upper bound on the worker pool size.
pub const MAX_WORKERS: usize = 256;

/// Validates a request and creates its jobs, in input order.
///
/// Nothing is touched on disk.
pub fn plan_run(request: &RunRequest) -> Result<(RunConfiguration, Vec<ConversionJob>), RunError> {
    let target_format: TargetFormat = request
        .target_format
        .parse()
        .map_err(|_| RunError::UnsupportedFormat(request.target_format.clone()))?;

    let config = match request.mode {
        RunMode::Sequential => {
            RunConfiguration::sequential(target_format, &request.output_directory)
        }
        RunMode::Parallel => {
            if request.worker_count == 0 {
                return Err(RunError::InvalidWorkerCount(request.worker_count));
            }
            if request.worker_count > MAX_WORKERS {
                return Err(RunError::WorkerPoolExhausted {
                    requested: request.worker_count,
                    max: MAX_WORKERS,
                });
            }
            RunConfiguration::parallel(
                target_format,
                &request.output_directory,
                request.worker_count,
            )
        }
    };

    if request.input_paths.is_empty() {
        return Err(RunError::NoInputs);
    }

    let jobs = request
        .input_paths
        .iter()
        .enumerate()
        .map(|(index, input)| ConversionJob {
            index,
            input_path: input.clone(),
            target_format,
            output_directory: config.output_directory.clone(),
            output_path: derive_output_path(input, &config.output_directory, target_format),
        })
        .collect();

    Ok((config, jobs))
}

/// Entry point for front ends: validates a request, prepares the output
/// directory and dispatches to the runner matching the requested mode.
pub struct BatchConverter<C: Converter + ?Sized> {
    converter: Arc<C>,
    stop: StopHandle,
    result_buffer: usize,
}

impl<C: Converter + 'static> BatchConverter<C> {
    pub fn new(converter: C) -> Self {
        Self::from_arc(Arc::new(converter))
    }
}

impl<C: Converter + ?Sized + 'static> BatchConverter<C> {
    pub fn from_arc(converter: Arc<C>) -> Self {
        Self {
            converter,
            stop: StopHandle::new(),
            result_buffer: DEFAULT_RESULT_BUFFER,
        }
    }

    pub fn with_result_buffer(mut self, capacity: usize) -> Self {
        self.result_buffer = capacity.max(1);
        self
    }

    /// Handle for requesting a cooperative stop of the current run.
    ///
    /// The handle is cleared when the next run starts.
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    pub fn converter(&self) -> &C {
        &self.converter
    }

    /// Executes one run.
    ///
    /// `on_result` is called once per job from a single task: in input order
    /// for sequential runs, in completion order for parallel ones.
    pub async fn run<F>(
        &self,
        request: &RunRequest,
        reporter: &mut ProgressReporter,
        on_result: F,
    ) -> Result<RunSummary, RunError>
    where
        F: FnMut(&ConversionResult),
    {
        let (config, jobs) = plan_run(request)?;

        tokio::fs::create_dir_all(&config.output_directory)
            .await
            .map_err(|e| RunError::OutputDirectory {
                path: config.output_directory.clone(),
                reason: e.to_string(),
            })?;

        // A stop applies to one run only.
        self.stop.reset();

        let mode = config.mode.to_string();
        metrics::RUNS_TOTAL.with_label_values(&[mode.as_str()]).inc();
        tracing::info!(
            mode = %config.mode,
            workers = config.worker_count,
            format = %config.target_format,
            jobs = jobs.len(),
            converter = self.converter.name(),
            "Starting conversion run"
        );

        let summary = match config.mode {
            RunMode::Sequential => {
                SequentialRunner::new(Arc::clone(&self.converter), self.stop.clone())
                    .run(&config, jobs, reporter, on_result)
                    .await
            }
            RunMode::Parallel => {
                ParallelRunner::new(Arc::clone(&self.converter), self.stop.clone())
                    .with_result_buffer(self.result_buffer)
                    .run(&config, jobs, reporter, on_result)
                    .await
            }
        };

        tracing::info!(
            run_id = %summary.run_id,
            succeeded = summary.succeeded,
            failed = summary.failed,
            not_run = summary.not_run,
            elapsed_ms = summary.elapsed.as_millis() as u64,
            "Conversion run finished"
        );
        Ok(summary)
    }
}
