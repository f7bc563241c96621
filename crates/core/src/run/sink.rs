//! Single consumer of job results.

use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::time::{Duration, Instant};
use uuid::Uuid;

use crate::progress::ProgressReporter;

use super::types::{ConversionResult, RunConfiguration, RunSummary};

/// Collects results, forwards each one to the reporter and the caller's
/// callback, and builds the summary at the end.
///
/// Only the runner's consumer owns a sink, so callbacks and counter updates
/// are never concurrent.
pub(crate) struct ResultSink<'a, F> {
    reporter: &'a mut ProgressReporter,
    on_result: F,
    results: Vec<ConversionResult>,
    delivered: HashSet<usize>,
    started_at: DateTime<Utc>,
    started: Instant,
}

impl<'a, F> ResultSink<'a, F>
where
    F: FnMut(&ConversionResult),
{
    pub(crate) fn new(reporter: &'a mut ProgressReporter, total: usize, on_result: F) -> Self {
        reporter.start(total);
        Self {
            reporter,
            on_result,
            results: Vec::with_capacity(total),
            delivered: HashSet::with_capacity(total),
            started_at: Utc::now(),
            started: Instant::now(),
        }
    }

    /// Delivers one result. A second result for the same job is dropped.
    pub(crate) fn deliver(&mut self, result: ConversionResult) -> bool {
        if !self.delivered.insert(result.index) {
            tracing::warn!(index = result.index, "Duplicate result dropped");
            return false;
        }
        self.reporter.on_result(&result);
        (self.on_result)(&result);
        self.results.push(result);
        true
    }

    pub(crate) fn has_delivered(&self, index: usize) -> bool {
        self.delivered.contains(&index)
    }

    pub(crate) fn delivered_count(&self) -> usize {
        self.results.len()
    }

    pub(crate) fn into_summary(self, config: &RunConfiguration) -> RunSummary {
        let mut results = self.results;
        results.sort_by_key(|r| r.index);

        let succeeded = results.iter().filter(|r| r.is_success()).count();
        let failed = results.iter().filter(|r| r.is_failure()).count();
        let not_run = results.iter().filter(|r| r.is_not_run()).count();
        let job_time: Duration = results.iter().map(|r| r.elapsed).sum();

        RunSummary {
            run_id: Uuid::new_v4(),
            mode: config.mode,
            worker_count: config.worker_count,
            target_format: config.target_format,
            total: results.len(),
            succeeded,
            failed,
            not_run,
            started_at: self.started_at,
            elapsed: self.started.elapsed(),
            job_time,
            results,
        }
    }
}
