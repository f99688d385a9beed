//! The per-worker retry loop.

use crate::backend::Session;
use crate::batch::{BatchBuilder, BatchPlan};
use crate::config::{TxnMode, WorkloadConfig};
use crate::counters::GlobalCounters;
use crate::error::error_chain;
use crate::sampler::ThroughputSampler;
use crate::txn::TransactionRunner;
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// States of the worker loop.
///
/// ```text
/// Running --ok, target not reached--> Running
/// Running --ok, target reached------> Done
/// Running --error-------------------> Backoff --delay--> Running
/// Running | Backoff --cancelled-----> Cancelled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkerState {
    Running,
    Backoff,
    /// The target transaction count was reached.
    Done,
    /// The run was stopped before the target was reached.
    Cancelled,
}

/// Outcome of one worker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerReport {
    pub index: usize,
    pub endpoint: usize,
    pub successful_txns: u64,
    pub failed_txns: u64,
    pub rows: u64,
    pub state: WorkerState,
    /// Throughput samples logged; only set on the worker owning the sampler.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub samples: Option<u64>,
}

/// One worker: a dedicated session plus everything needed to keep issuing
/// transactions on it.
pub struct Worker<S, R = OsRng> {
    index: usize,
    endpoint: usize,
    session: S,
    plan: BatchPlan,
    builder: BatchBuilder<R>,
    mode: TxnMode,
    target: u64,
    backoff: Duration,
    counters: Arc<GlobalCounters>,
    sampler: Option<ThroughputSampler>,
    cancel: CancellationToken,
    state: WorkerState,
    successful: u64,
    failed: u64,
    rows: u64,
}

impl<S: Session> Worker<S, OsRng> {
    /// Worker `index` of a run described by `config`. Worker 0 owns the
    /// throughput sampler.
    pub fn new(
        index: usize,
        endpoint: usize,
        session: S,
        config: &WorkloadConfig,
        counters: Arc<GlobalCounters>,
        cancel: CancellationToken,
    ) -> Self {
        Self::with_builder(
            index,
            endpoint,
            session,
            config,
            BatchBuilder::os(),
            counters,
            cancel,
        )
    }
}

impl<S: Session, R: RngCore + Send> Worker<S, R> {
    pub fn with_builder(
        index: usize,
        endpoint: usize,
        session: S,
        config: &WorkloadConfig,
        builder: BatchBuilder<R>,
        counters: Arc<GlobalCounters>,
        cancel: CancellationToken,
    ) -> Self {
        let sampler = (index == 0).then(|| ThroughputSampler::new(config.sample_interval));
        Self {
            index,
            endpoint,
            session,
            plan: BatchPlan::for_worker(config, index),
            builder,
            mode: config.mode,
            target: config.target_per_worker(),
            backoff: config.backoff,
            counters,
            sampler,
            cancel,
            state: WorkerState::Running,
            successful: 0,
            failed: 0,
            rows: 0,
        }
    }

    /// Issue transactions until the target is reached or the run is cancelled.
    ///
    /// Transaction failures are logged and retried after the backoff; they
    /// never end the loop.
    pub async fn run(mut self) -> WorkerReport {
        debug!(
            "Worker {} started (endpoint {}, target {})",
            self.index,
            self.endpoint,
            if self.target == 0 {
                "unbounded".to_string()
            } else {
                self.target.to_string()
            }
        );

        while self.state == WorkerState::Running {
            self.step().await;
        }

        debug!(
            "Worker {} finished: {:?} after {} transactions ({} failed)",
            self.index, self.state, self.successful, self.failed
        );
        self.report()
    }

    /// One transition of the state machine.
    async fn step(&mut self) {
        if self.cancel.is_cancelled() {
            self.state = WorkerState::Cancelled;
            return;
        }

        let runner = TransactionRunner::new(self.mode, &self.counters, self.index);
        let result = runner
            .run(
                &mut self.session,
                &self.plan,
                &mut self.builder,
                self.sampler.as_mut(),
            )
            .await;

        match result {
            Ok(rows) => {
                self.successful += 1;
                self.rows += rows;
                if self.target > 0 && self.successful >= self.target {
                    self.state = WorkerState::Done;
                }
            }
            Err(e) => {
                self.failed += 1;
                warn!(
                    "Do transaction failed, worker {}, {} error: {}",
                    self.index,
                    e.kind(),
                    error_chain(&e)
                );
                self.state = WorkerState::Backoff;
                tokio::select! {
                    _ = tokio::time::sleep(self.backoff) => {
                        self.state = WorkerState::Running;
                    }
                    _ = self.cancel.cancelled() => {
                        self.state = WorkerState::Cancelled;
                    }
                }
            }
        }
    }

    fn report(&self) -> WorkerReport {
        WorkerReport {
            index: self.index,
            endpoint: self.endpoint,
            successful_txns: self.successful,
            failed_txns: self.failed,
            rows: self.rows,
            state: self.state,
            samples: self.sampler.as_ref().map(ThroughputSampler::reported),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::Backend;
    use crate::testing::{Fault, MockBackend};

    /// 4 rows of 16 bytes per transaction, 2 rows per batch.
    fn small_plan_config(target_txns: u64) -> WorkloadConfig {
        WorkloadConfig {
            threads: 1,
            row_size: 16,
            txn_size_bytes: 64,
            batch_rows: 2,
            target_txns,
            backoff: Duration::ZERO,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_worker_stops_at_target() {
        let backend = MockBackend::new();
        let session = backend.connect(0).await.unwrap();
        let counters = Arc::new(GlobalCounters::new());
        let config = small_plan_config(5);

        let report = Worker::new(
            0,
            0,
            session,
            &config,
            Arc::clone(&counters),
            CancellationToken::new(),
        )
        .run()
        .await;

        assert_eq!(report.state, WorkerState::Done);
        assert_eq!(report.successful_txns, 5);
        assert_eq!(report.failed_txns, 0);
        assert_eq!(report.rows, 20);
        assert_eq!(report.samples, Some(0));
        assert_eq!(counters.total_txns(), 5);
        assert_eq!(counters.total_rows(), 20);
        assert_eq!(backend.committed_rows("test.table_0"), 20);
    }

    #[tokio::test]
    async fn test_failures_do_not_count_towards_target() {
        let backend = MockBackend::new().with_fault(Fault::on("COMMIT").after(1).times(3));
        let session = backend.connect(0).await.unwrap();
        let counters = Arc::new(GlobalCounters::new());

        let report = Worker::new(
            0,
            0,
            session,
            &small_plan_config(4),
            Arc::clone(&counters),
            CancellationToken::new(),
        )
        .run()
        .await;

        assert_eq!(report.state, WorkerState::Done);
        assert_eq!(report.successful_txns, 4);
        assert_eq!(report.failed_txns, 3);
        assert_eq!(backend.count(Some(0), "BEGIN"), 7);
        assert_eq!(counters.total_txns(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_attempt_waits_for_backoff() {
        let backend = MockBackend::new().with_fault(Fault::on("INSERT").after(1));
        let session = backend.connect(0).await.unwrap();
        let counters = Arc::new(GlobalCounters::new());
        let config = WorkloadConfig {
            backoff: Duration::from_secs(1),
            // 5 rows: batches of 2, 2 and 1
            txn_size_bytes: 80,
            ..small_plan_config(1)
        };
        assert_eq!(BatchPlan::for_worker(&config, 0).batch_count(), 3);

        let start = tokio::time::Instant::now();
        let report = Worker::new(
            0,
            0,
            session,
            &config,
            Arc::clone(&counters),
            CancellationToken::new(),
        )
        .run()
        .await;

        assert!(start.elapsed() >= Duration::from_secs(1));
        assert_eq!(report.successful_txns, 1);
        assert_eq!(report.failed_txns, 1);
        let statements = backend.statements_for(0);
        assert_eq!(statements[0], "BEGIN PESSIMISTIC");
        assert!(statements[1].starts_with("INSERT"));
        assert!(statements[2].starts_with("INSERT"));
        assert_eq!(statements[3], "ROLLBACK");
        assert_eq!(statements[4], "BEGIN PESSIMISTIC");
        assert_eq!(counters.total_txns(), 1);
        assert_eq!(counters.total_rows(), 5);
    }

    #[tokio::test]
    async fn test_unbounded_worker_runs_until_cancelled() {
        let backend = MockBackend::new();
        let session = backend.connect(0).await.unwrap();
        let counters = Arc::new(GlobalCounters::new());
        let cancel = CancellationToken::new();

        let worker = Worker::new(
            0,
            0,
            session,
            &small_plan_config(0),
            Arc::clone(&counters),
            cancel.clone(),
        );
        let handle = tokio::spawn(worker.run());

        while counters.total_txns() < 50 {
            tokio::task::yield_now().await;
        }
        assert!(!handle.is_finished());

        cancel.cancel();
        let report = handle.await.unwrap();
        assert_eq!(report.state, WorkerState::Cancelled);
        assert!(report.successful_txns >= 50);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_interrupts_backoff() {
        let backend = MockBackend::new().with_fault(Fault::on("BEGIN").always());
        let session = backend.connect(0).await.unwrap();
        let cancel = CancellationToken::new();
        let config = WorkloadConfig {
            backoff: Duration::from_secs(3600),
            ..small_plan_config(0)
        };

        let worker = Worker::new(
            0,
            0,
            session,
            &config,
            Arc::new(GlobalCounters::new()),
            cancel.clone(),
        );
        let handle = tokio::spawn(worker.run());
        while backend.count(Some(0), "ROLLBACK") == 0 {
            tokio::task::yield_now().await;
        }
        cancel.cancel();

        let report = handle.await.unwrap();
        assert_eq!(report.state, WorkerState::Cancelled);
        assert_eq!(report.successful_txns, 0);
        assert_eq!(report.failed_txns, 1);
    }

    /// Commits 1 of 3, then two failed commits each followed by 6s of backoff.
    async fn run_through_one_interval(index: usize) -> (WorkerReport, Duration) {
        let backend = MockBackend::new().with_fault(Fault::on("COMMIT").after(1).times(2));
        let session = backend.connect(index).await.unwrap();
        let config = WorkloadConfig {
            threads: index + 1,
            target_txns: 3 * (index as u64 + 1),
            backoff: Duration::from_secs(6),
            sample_interval: Duration::from_secs(10),
            ..small_plan_config(0)
        };

        let start = tokio::time::Instant::now();
        let report = Worker::new(
            index,
            0,
            session,
            &config,
            Arc::new(GlobalCounters::new()),
            CancellationToken::new(),
        )
        .run()
        .await;
        (report, start.elapsed())
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_worker_samples_after_interval() {
        let (report, elapsed) = run_through_one_interval(0).await;

        assert!(elapsed >= Duration::from_secs(12));
        assert_eq!(report.successful_txns, 3);
        assert_eq!(report.failed_txns, 2);
        // Only the first batch after the 12s of backoff crosses the interval.
        assert_eq!(report.samples, Some(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_other_workers_never_sample() {
        let (report, elapsed) = run_through_one_interval(1).await;

        assert!(elapsed >= Duration::from_secs(12));
        assert_eq!(report.index, 1);
        assert_eq!(report.successful_txns, 3);
        assert_eq!(report.samples, None);
    }
}
