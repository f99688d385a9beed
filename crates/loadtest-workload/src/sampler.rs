//! Rolling throughput reports.

use crate::counters::GlobalCounters;
use std::time::Duration;
use tokio::time::Instant;
use tracing::info;

/// Result of a sampling window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Sample {
    /// Transactions completed in the window.
    Rate {
        /// Transactions per minute.
        qpm: f64,
        rows_per_second: f64,
    },
    /// No transaction completed in the window; rows written by still-open
    /// transactions.
    Pending { rows: u64 },
}

impl std::fmt::Display for Sample {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Sample::Rate {
                qpm,
                rows_per_second,
            } => write!(f, "QPM: {qpm:.2}, rows/s {rows_per_second:.2}"),
            Sample::Pending { rows } => write!(f, "Pending rows: {rows}"),
        }
    }
}

/// Sampling window owned by a single worker.
///
/// The rate baseline only moves when a window saw completed transactions, so
/// a transaction spanning several windows is credited in full to the window in
/// which it commits, measured over the whole span.
#[derive(Debug)]
pub struct ThroughputSampler {
    interval: Duration,
    last_report: Instant,
    last_rate_at: Instant,
    last_txns: u64,
    last_rows: u64,
    reported: u64,
}

impl ThroughputSampler {
    pub fn new(interval: Duration) -> Self {
        Self::starting_at(interval, Instant::now())
    }

    pub fn starting_at(interval: Duration, start: Instant) -> Self {
        Self {
            interval,
            last_report: start,
            last_rate_at: start,
            last_txns: 0,
            last_rows: 0,
            reported: 0,
        }
    }

    /// Samples logged by [`maybe_report`](Self::maybe_report) so far.
    pub fn reported(&self) -> u64 {
        self.reported
    }

    /// Log a sample if the interval has elapsed.
    pub fn maybe_report(&mut self, counters: &GlobalCounters) -> Option<Sample> {
        let sample = self.sample_at(counters, Instant::now())?;
        self.reported += 1;
        info!("{}", sample);
        Some(sample)
    }

    /// Compute a sample as of `now`, or `None` if the interval has not elapsed.
    pub fn sample_at(&mut self, counters: &GlobalCounters, now: Instant) -> Option<Sample> {
        if now.saturating_duration_since(self.last_report) < self.interval {
            return None;
        }
        self.last_report = now;

        let snapshot = counters.snapshot();
        let txns = snapshot.total_txns.saturating_sub(self.last_txns);
        let rows = snapshot.total_rows.saturating_sub(self.last_rows);

        if txns == 0 {
            return Some(Sample::Pending {
                rows: snapshot.pending_rows,
            });
        }

        let elapsed = now.saturating_duration_since(self.last_rate_at).as_secs_f64();
        self.last_rate_at = now;
        self.last_txns = snapshot.total_txns;
        self.last_rows = snapshot.total_rows;

        if elapsed <= 0.0 {
            return Some(Sample::Pending {
                rows: snapshot.pending_rows,
            });
        }

        Some(Sample::Rate {
            qpm: txns as f64 * 60.0 / elapsed,
            rows_per_second: rows as f64 / elapsed,
        })
    }
}
