//! Spawns the worker pool and collects its outcome.

use crate::backend::Backend;
use crate::batch::BatchPlan;
use crate::config::WorkloadConfig;
use crate::counters::GlobalCounters;
use crate::error::{error_chain, WorkloadError};
use crate::pool::ConnectionPool;
use crate::summary::{SummaryBuilder, WorkloadSummary};
use crate::worker::{Worker, WorkerReport};
use std::sync::Arc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Runs one workload to completion over a [`ConnectionPool`].
///
/// The first structural error of any worker (today: failing to open its
/// session) cancels every other worker; the coordinator waits for all of them
/// before returning that error. Transaction failures stay inside the workers.
pub struct WorkloadCoordinator<B> {
    config: Arc<WorkloadConfig>,
    pool: Arc<ConnectionPool<B>>,
    counters: Arc<GlobalCounters>,
    cancel: CancellationToken,
}

impl<B: Backend + 'static> WorkloadCoordinator<B> {
    pub fn new(config: WorkloadConfig, pool: ConnectionPool<B>) -> Self {
        Self {
            config: Arc::new(config),
            pool: Arc::new(pool),
            counters: Arc::new(GlobalCounters::new()),
            cancel: CancellationToken::new(),
        }
    }

    /// Share an externally owned token, e.g. one cancelled on Ctrl-C.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn counters(&self) -> Arc<GlobalCounters> {
        Arc::clone(&self.counters)
    }

    pub async fn run(&self) -> Result<WorkloadSummary, WorkloadError> {
        self.config.validate()?;
        self.log_start();

        let summary = SummaryBuilder::start(&self.config, self.pool.len());
        let mut workers = JoinSet::new();
        for index in 0..self.config.threads {
            let pool = Arc::clone(&self.pool);
            let config = Arc::clone(&self.config);
            let counters = Arc::clone(&self.counters);
            let cancel = self.cancel.clone();
            workers.spawn(async move {
                let session = pool.acquire(index).await?;
                let worker = Worker::new(
                    index,
                    pool.endpoint_index(index),
                    session,
                    &config,
                    counters,
                    cancel,
                );
                Ok::<WorkerReport, WorkloadError>(worker.run().await)
            });
        }

        let mut reports = Vec::with_capacity(self.config.threads);
        let mut first_error: Option<WorkloadError> = None;
        while let Some(joined) = workers.join_next().await {
            let err = match joined {
                Ok(Ok(report)) => {
                    reports.push(report);
                    continue;
                }
                Ok(Err(e)) => e,
                Err(join_err) => WorkloadError::Worker(join_err),
            };
            if first_error.is_none() {
                error!("Stopping all workers: {}", error_chain(&err));
                self.cancel.cancel();
                first_error = Some(err);
            } else {
                warn!("Additional worker error: {}", error_chain(&err));
            }
        }

        self.pool.shutdown().await;
        if let Some(err) = first_error {
            return Err(err);
        }

        let summary = summary.finish(self.counters.snapshot(), reports);
        info!(
            "Total transactions: {}, rows: {}, failed attempts: {}, elapsed: {:?}",
            summary.total_txns,
            summary.total_rows,
            summary.failed_txns,
            summary.elapsed()
        );
        Ok(summary)
    }

    fn log_start(&self) {
        let config = &self.config;
        let plan = BatchPlan::for_worker(config, 0);
        info!(
            "Starting {} workload: {} workers over {} endpoint(s), {} rows of {} bytes per transaction in {} statement(s), mode {}",
            config.kind,
            config.threads,
            self.pool.len(),
            plan.row_count(),
            config.row_size,
            plan.batch_count(),
            config.mode
        );
        if config.target_txns == 0 {
            info!("No transaction target, running until interrupted");
        } else {
            info!(
                "Target {} transactions, {} per worker",
                config.target_txns,
                config.target_per_worker()
            );
        }
        if config.dropped_txns() > 0 {
            warn!(
                "{} transactions are not divisible across {} workers and will not run",
                config.dropped_txns(),
                config.threads
            );
        }
    }
}
