//! Dispatch queue shared by both runners.

use std::collections::VecDeque;
use std::io::ErrorKind;
use std::path::Path;

use super::error::JobError;
use super::naming::OutputClaims;
use super::stop::StopHandle;
use super::types::ConversionJob;

/// What the queue hands to a worker.
#[derive(Debug)]
pub(crate) enum Dispatch {
    /// Run the conversion.
    Ready(ConversionJob),
    /// Fails without running; its output path is unusable.
    Rejected(ConversionJob, JobError),
}

/// Jobs waiting to be dispatched, in input order.
///
/// Output paths are claimed at dispatch time, so "first dispatched wins"
/// holds for collisions in both modes. A job whose input cannot be read is
/// rejected before claiming, leaving its output free for a later job.
#[derive(Debug)]
pub(crate) struct JobQueue {
    pending: VecDeque<ConversionJob>,
    claims: OutputClaims,
    stop: StopHandle,
    dispatched: Vec<ConversionJob>,
}

impl JobQueue {
    pub(crate) fn new(jobs: Vec<ConversionJob>, stop: StopHandle) -> Self {
        let claims = OutputClaims::new(jobs.iter().map(|j| (j.index, j.input_path.as_path())));
        Self {
            pending: jobs.into(),
            claims,
            stop,
            dispatched: Vec::new(),
        }
    }

    /// Takes the next job, or `None` once the queue is empty or stopped.
    pub(crate) async fn next(&mut self) -> Option<Dispatch> {
        if self.stop.is_stopped() {
            return None;
        }
        let job = self.pending.pop_front()?;
        self.dispatched.push(job.clone());
        if let Err(err) = check_input(&job.input_path).await {
            return Some(Dispatch::Rejected(job, err));
        }
        match self.claims.claim(job.index, &job.input_path, &job.output_path) {
            Ok(()) => Some(Dispatch::Ready(job)),
            Err(err) => Some(Dispatch::Rejected(job, err)),
        }
    }

    /// Removes every job that was never dispatched.
    pub(crate) fn drain_pending(&mut self) -> Vec<ConversionJob> {
        self.pending.drain(..).collect()
    }

    /// Jobs handed out so far, in dispatch order.
    pub(crate) fn dispatched(&self) -> &[ConversionJob] {
        &self.dispatched
    }
}

/// Verifies the input is an existing, readable regular file.
async fn check_input(path: &Path) -> Result<(), JobError> {
    let meta = tokio::fs::metadata(path).await.map_err(|e| match e.kind() {
        ErrorKind::NotFound => JobError::InputNotFound {
            path: path.to_path_buf(),
        },
        _ => JobError::InputUnreadable {
            path: path.to_path_buf(),
            reason: e.to_string(),
        },
    })?;

    if !meta.is_file() {
        return Err(JobError::InputUnreadable {
            path: path.to_path_buf(),
            reason: "not a regular file".to_string(),
        });
    }

    tokio::fs::File::open(path)
        .await
        .map_err(|e| JobError::InputUnreadable {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

    Ok(())
}
