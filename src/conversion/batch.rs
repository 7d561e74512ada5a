//! Bounded-concurrency scheduler for one batch of conversion jobs

use chrono::Utc;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::conversion::config::FailurePolicy;
use crate::conversion::converter::Converter;
use crate::conversion::stats::BatchReport;
use crate::conversion::worker::{run_job, ConversionJob, JobOutcome};
use crate::error::{ConversionError, ConversionResult, JobError};
use crate::progress::ProgressReporter;

/// Counters of a running batch. Only the dispatch loop touches them.
#[derive(Debug)]
struct BatchState {
    total: usize,
    completed: usize,
    failed: bool,
    first_error: Option<ConversionError>,
}

impl BatchState {
    fn new(total: usize) -> Self {
        Self {
            total,
            completed: 0,
            failed: false,
            first_error: None,
        }
    }

    /// Record the batch-rejecting error; later calls are ignored
    fn reject(&mut self, error: ConversionError) -> bool {
        if self.failed {
            return false;
        }
        self.failed = true;
        self.first_error = Some(error);
        true
    }
}

/// Runs jobs with at most `limit` in flight, admitting pending jobs in FIFO order.
///
/// A scheduler is built per batch and consumed by [`BatchScheduler::run`].
#[derive(Debug, Clone)]
pub struct BatchScheduler {
    limit: usize,
    policy: FailurePolicy,
}

impl BatchScheduler {
    /// `limit` is clamped to at least one
    pub fn new(limit: usize, policy: FailurePolicy) -> Self {
        Self {
            limit: limit.max(1),
            policy,
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn policy(&self) -> FailurePolicy {
        self.policy
    }

    /// Convert every job and resolve with a report, or reject with the first error.
    ///
    /// Under [`FailurePolicy::FailFast`] the first failing job rejects the batch:
    /// pending jobs are dropped and jobs already running are awaited so they can
    /// restore their file names, but their results are discarded. Under
    /// [`FailurePolicy::ContinueOnError`] every job runs and failures are collected
    /// in the report.
    pub async fn run<C>(
        self,
        converter: Arc<C>,
        jobs: Vec<ConversionJob>,
        progress: &ProgressReporter,
    ) -> ConversionResult<BatchReport>
    where
        C: Converter + ?Sized + 'static,
    {
        let started_at = Utc::now();
        let start = Instant::now();
        let mut state = BatchState::new(jobs.len());
        let mut pending: VecDeque<ConversionJob> = jobs.into();
        let mut in_flight: JoinSet<Result<JobOutcome, JobError>> = JoinSet::new();
        let mut converted = Vec::new();
        let mut failures = Vec::new();

        info!(
            jobs = state.total,
            limit = self.limit,
            policy = ?self.policy,
            "starting batch"
        );

        loop {
            while !state.failed && in_flight.len() < self.limit {
                let Some(job) = pending.pop_front() else {
                    break;
                };
                debug!(file = %job.source_name, in_flight = in_flight.len() + 1, "dispatching job");
                let converter = Arc::clone(&converter);
                in_flight.spawn(async move { run_job(converter.as_ref(), &job).await });
            }

            let Some(joined) = in_flight.join_next().await else {
                break;
            };

            let result = match joined {
                Ok(result) => result,
                Err(join_error) => {
                    let error =
                        ConversionError::internal(format!("conversion task failed: {join_error}"));
                    if state.reject(error) {
                        pending.clear();
                    }
                    continue;
                }
            };

            if state.failed {
                // rejected already; in-flight results no longer count
                if let Err(err) = result {
                    debug!(error = %err, "ignoring failure after batch rejection");
                }
                continue;
            }

            match result {
                Ok(outcome) => {
                    state.completed += 1;
                    progress.inc();
                    converted.push(outcome);
                }
                Err(err) => match self.policy {
                    FailurePolicy::FailFast => {
                        warn!(
                            file = %err.file_name,
                            stage = %err.stage,
                            dropped = pending.len(),
                            "job failed, cancelling remaining jobs"
                        );
                        pending.clear();
                        state.reject(err.into());
                    }
                    FailurePolicy::ContinueOnError => {
                        warn!(file = %err.file_name, stage = %err.stage, error = %err.cause, "job failed");
                        state.completed += 1;
                        progress.inc();
                        failures.push(err);
                    }
                },
            }
        }

        if let Some(error) = state.first_error {
            return Err(error);
        }

        info!(
            completed = state.completed,
            failed = failures.len(),
            "batch finished"
        );

        Ok(BatchReport {
            total: state.total,
            converted,
            failures,
            skipped: Vec::new(),
            started_at,
            finished_at: Utc::now(),
            elapsed: start.elapsed(),
        })
    }
}
