//! Fixed-size worker pool runner.

use std::sync::Arc;
use tokio::sync::{mpsc, Mutex, OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinSet;

use crate::analysis::{available_workers, CpuTopology};
use crate::converter::Converter;
use crate::progress::ProgressReporter;

use super::error::JobError;
use super::execute::{execute_job, not_run_result, rejected_result};
use super::queue::{Dispatch, JobQueue};
use super::sink::ResultSink;
use super::stop::StopHandle;
use super::types::{ConversionJob, ConversionResult, RunConfiguration, RunSummary};

/// Default capacity of the result channel.
pub const DEFAULT_RESULT_BUFFER: usize = 64;

/// A result on its way to the consumer, together with the pool slot it
/// occupies until delivered.
type Delivery = (ConversionResult, OwnedSemaphorePermit);

/// Runs jobs on a pool of `worker_count` tokio tasks.
///
/// Workers pull from a shared queue in input order and push results onto a
/// bounded channel. The calling task is the only consumer: it alone updates
/// the reporter and invokes `on_result`, in completion order.
///
/// A pool slot is held from dispatch until the consumer has delivered the
/// result, so at most `worker_count` jobs are dispatched but not yet
/// reported at any instant. This bounds both the conversions in flight and
/// the work that can still complete after a stop request.
pub struct ParallelRunner<C: Converter + ?Sized> {
    converter: Arc<C>,
    stop: StopHandle,
    result_buffer: usize,
}

impl<C: Converter + ?Sized + 'static> ParallelRunner<C> {
    pub fn new(converter: Arc<C>, stop: StopHandle) -> Self {
        Self {
            converter,
            stop,
            result_buffer: DEFAULT_RESULT_BUFFER,
        }
    }

    /// Sets the capacity of the result channel (at least 1).
    pub fn with_result_buffer(mut self, capacity: usize) -> Self {
        self.result_buffer = capacity.max(1);
        self
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
        let worker_count = config.worker_count.max(1);
        let hardware = available_workers();
        let topology = CpuTopology::detect();
        if worker_count > hardware {
            tracing::warn!(
                workers = worker_count,
                cpus = hardware,
                physical_cores = topology.physical,
                "Worker count exceeds available parallelism"
            );
        } else if topology.smt_enabled() && topology.shares_cores(worker_count) {
            tracing::info!(
                workers = worker_count,
                physical_cores = topology.physical,
                logical_cpus = topology.logical,
                "Workers share physical cores through SMT"
            );
        }

        let mut sink = ResultSink::new(reporter, jobs.len(), on_result);
        let spawned = worker_count.min(jobs.len());
        let queue = Arc::new(Mutex::new(JobQueue::new(jobs, self.stop.clone())));
        let slots = Arc::new(Semaphore::new(worker_count));
        let (tx, mut rx) = mpsc::channel::<Delivery>(self.result_buffer);

        let mut workers = JoinSet::new();
        for worker_id in 0..spawned {
            workers.spawn(worker_loop(
                worker_id,
                Arc::clone(&self.converter),
                Arc::clone(&queue),
                Arc::clone(&slots),
                tx.clone(),
            ));
        }
        drop(tx);

        while let Some((result, slot)) = rx.recv().await {
            sink.deliver(result);
            drop(slot);
        }

        while let Some(joined) = workers.join_next().await {
            if let Err(e) = joined {
                tracing::error!(error = %e, "Conversion worker terminated abnormally");
            }
        }

        // Anything not delivered by now either never left the queue or was
        // lost with its worker.
        let mut queue = queue.lock().await;
        let lost: Vec<ConversionJob> = queue
            .dispatched()
            .iter()
            .filter(|job| !sink.has_delivered(job.index))
            .cloned()
            .collect();
        for job in lost {
            sink.deliver(rejected_result(&job, JobError::WorkerLost));
        }

        let stopped = self.stop.is_stopped();
        for job in queue.drain_pending() {
            let result = if stopped {
                not_run_result(&job)
            } else {
                rejected_result(&job, JobError::WorkerLost)
            };
            sink.deliver(result);
        }

        tracing::debug!(
            workers = spawned,
            delivered = sink.delivered_count(),
            "Worker pool drained"
        );
        sink.into_summary(config)
    }
}

async fn worker_loop<C>(
    worker_id: usize,
    converter: Arc<C>,
    queue: Arc<Mutex<JobQueue>>,
    slots: Arc<Semaphore>,
    tx: mpsc::Sender<Delivery>,
) where
    C: Converter + ?Sized,
{
    loop {
        let Ok(slot) = Arc::clone(&slots).acquire_owned().await else {
            break;
        };
        let dispatch = queue.lock().await.next().await;
        let result = match dispatch {
            None => break,
            Some(Dispatch::Ready(job)) => {
                tracing::debug!(worker = worker_id, index = job.index, input = %job.input_path.display(), "Dispatching");
                execute_job(converter.as_ref(), &job).await
            }
            Some(Dispatch::Rejected(job, error)) => rejected_result(&job, error),
        };
        if tx.send((result, slot)).await.is_err() {
            break;
        }
    }
}
