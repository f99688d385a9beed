//! Final report of a run.

use crate::config::{TxnMode, WorkloadConfig, WorkloadKind};
use crate::counters::CounterSnapshot;
use crate::worker::{WorkerReport, WorkerState};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Machine-readable outcome of one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkloadSummary {
    pub workload: WorkloadKind,
    pub mode: TxnMode,
    pub threads: usize,
    /// Number of configured backend endpoints
    pub endpoints: usize,
    /// Requested total, 0 = unbounded
    pub target_txns: u64,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    /// Wall time of the run in milliseconds
    pub elapsed_ms: u64,
    /// Committed transactions across all workers
    pub total_txns: u64,
    /// Rows written by committed transactions
    pub total_rows: u64,
    /// Rolled back attempts across all workers
    pub failed_txns: u64,
    pub txns_per_minute: f64,
    pub rows_per_second: f64,
    /// Per-worker reports, ordered by worker index
    pub workers: Vec<WorkerReport>,
}

impl WorkloadSummary {
    pub fn elapsed(&self) -> Duration {
        Duration::from_millis(self.elapsed_ms)
    }

    /// Whether every worker reached its share of the target.
    pub fn completed(&self) -> bool {
        self.workers.iter().all(|w| w.state == WorkerState::Done)
    }
}

/// Captures the start of a run; [`SummaryBuilder::finish`] produces the
/// [`WorkloadSummary`].
#[derive(Debug)]
pub struct SummaryBuilder {
    workload: WorkloadKind,
    mode: TxnMode,
    threads: usize,
    endpoints: usize,
    target_txns: u64,
    started_at: DateTime<Utc>,
    start: Instant,
}

impl SummaryBuilder {
    pub fn start(config: &WorkloadConfig, endpoints: usize) -> Self {
        Self {
            workload: config.kind,
            mode: config.mode,
            threads: config.threads,
            endpoints,
            target_txns: config.target_txns,
            started_at: Utc::now(),
            start: Instant::now(),
        }
    }

    pub fn finish(self, counters: CounterSnapshot, mut workers: Vec<WorkerReport>) -> WorkloadSummary {
        workers.sort_by_key(|w| w.index);

        let elapsed = self.start.elapsed();
        let secs = elapsed.as_secs_f64();
        let (txns_per_minute, rows_per_second) = if secs > 0.0 {
            (
                counters.total_txns as f64 * 60.0 / secs,
                counters.total_rows as f64 / secs,
            )
        } else {
            (0.0, 0.0)
        };

        WorkloadSummary {
            workload: self.workload,
            mode: self.mode,
            threads: self.threads,
            endpoints: self.endpoints,
            target_txns: self.target_txns,
            started_at: self.started_at,
            completed_at: Utc::now(),
            elapsed_ms: elapsed.as_millis() as u64,
            total_txns: counters.total_txns,
            total_rows: counters.total_rows,
            failed_txns: workers.iter().map(|w| w.failed_txns).sum(),
            txns_per_minute,
            rows_per_second,
            workers,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(index: usize, failed: u64, state: WorkerState) -> WorkerReport {
        WorkerReport {
            index,
            endpoint: 0,
            successful_txns: 2,
            failed_txns: failed,
            rows: 8,
            state,
            samples: None,
        }
    }

    #[test]
    fn test_finish_orders_workers_and_sums_failures() {
        let builder = SummaryBuilder::start(&WorkloadConfig::default(), 1);
        let summary = builder.finish(
            CounterSnapshot {
                total_rows: 16,
                total_txns: 4,
                pending_rows: 0,
            },
            vec![
                report(1, 3, WorkerState::Done),
                report(0, 1, WorkerState::Done),
            ],
        );

        assert_eq!(summary.workers[0].index, 0);
        assert_eq!(summary.workers[1].index, 1);
        assert_eq!(summary.failed_txns, 4);
        assert_eq!(summary.total_txns, 4);
        assert!(summary.completed_at >= summary.started_at);
        assert!(summary.completed());
    }

    #[test]
    fn test_summary_json_fields() {
        let summary = SummaryBuilder::start(&WorkloadConfig::default(), 2).finish(
            CounterSnapshot::default(),
            vec![report(0, 0, WorkerState::Cancelled)],
        );
        assert!(!summary.completed());

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["workload"], "insert");
        assert_eq!(json["mode"], "pessimistic");
        assert_eq!(json["endpoints"], 2);
        assert_eq!(json["workers"][0]["state"], "cancelled");
    }
}
