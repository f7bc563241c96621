//! Types for progress reporting.

use serde::Serialize;
use std::time::Duration;

use crate::run::serialize_duration_ms;

/// Lifecycle of a single run as seen by the reporter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    #[default]
    NotStarted,
    /// At least one result has been reported.
    Running,
    /// Every job has a result.
    Completed,
}

/// Immutable view of the aggregate counters at one point in time.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ProgressSnapshot {
    pub state: RunState,
    /// Jobs that ran (succeeded or failed). Excludes jobs that never started.
    pub completed: usize,
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub not_run: usize,
    /// Sum of per-job conversion times.
    #[serde(rename = "elapsed_ms", serialize_with = "serialize_duration_ms")]
    pub elapsed: Duration,
}

impl ProgressSnapshot {
    /// Jobs that have a result of any kind.
    pub fn reported(&self) -> usize {
        self.completed + self.not_run
    }

    /// Fraction of jobs with a result, in `[0.0, 1.0]`.
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            return 1.0;
        }
        self.reported() as f64 / self.total as f64
    }

    pub fn is_completed(&self) -> bool {
        self.state == RunState::Completed
    }
}
