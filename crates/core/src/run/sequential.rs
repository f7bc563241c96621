//! One-at-a-time runner.

use std::sync::Arc;

use crate::converter::Converter;
use crate::progress::ProgressReporter;

use super::execute::{execute_job, not_run_result, rejected_result};
use super::queue::{Dispatch, JobQueue};
use super::sink::ResultSink;
use super::stop::StopHandle;
use super::types::{ConversionJob, ConversionResult, RunConfiguration, RunSummary};

/// Runs jobs strictly in input order on the calling task.
///
/// Each result reaches `on_result` before the next job starts, so at most
/// one file is being converted at any time.
pub struct SequentialRunner<C: Converter + ?Sized> {
    converter: Arc<C>,
    stop: StopHandle,
}

impl<C: Converter + ?Sized> SequentialRunner<C> {
    pub fn new(converter: Arc<C>, stop: StopHandle) -> Self {
        Self { converter, stop }
    }

    pub async fn run<F>(
        &self,
        config: &RunConfiguration,
        jobs: Vec<ConversionJob>,
        reporter: &mut ProgressReporter,
        on_result: F,
    ) -> RunSummary
    where
        F: FnMut(&ConversionResult),
    {
        let mut sink = ResultSink::new(reporter, jobs.len(), on_result);
        let mut queue = JobQueue::new(jobs, self.stop.clone());

        while let Some(dispatch) = queue.next().await {
            let result = match dispatch {
                Dispatch::Ready(job) => {
                    tracing::debug!(index = job.index, input = %job.input_path.display(), "Dispatching");
                    execute_job(self.converter.as_ref(), &job).await
                }
                Dispatch::Rejected(job, error) => rejected_result(&job, error),
            };
            sink.deliver(result);
        }

        for job in queue.drain_pending() {
            sink.deliver(not_run_result(&job));
        }

        sink.into_summary(config)
    }
}
