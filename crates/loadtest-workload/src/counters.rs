//! Throughput counters shared by all workers of a run.

use std::sync::atomic::{AtomicU64, Ordering};

/// Process-wide row and transaction totals.
///
/// Every mutation is a single atomic add or subtract. Reads are independent
/// loads, so a snapshot taken while workers are running may mix values from
/// different moments; samples are approximate.
#[derive(Debug, Default)]
pub struct GlobalCounters {
    total_rows: AtomicU64,
    total_txns: AtomicU64,
    pending_rows: AtomicU64,
}

/// A point-in-time read of [`GlobalCounters`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CounterSnapshot {
    pub total_rows: u64,
    pub total_txns: u64,
    pub pending_rows: u64,
}

impl GlobalCounters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rows of an open transaction reached the backend.
    pub fn add_pending(&self, rows: u64) {
        self.pending_rows.fetch_add(rows, Ordering::Relaxed);
    }

    /// An open transaction was rolled back; its rows never become visible.
    pub fn discard_pending(&self, rows: u64) {
        self.pending_rows.fetch_sub(rows, Ordering::Relaxed);
    }

    /// A transaction committed `rows` rows, of which `pending` were already
    /// accounted as pending.
    pub fn record_commit(&self, rows: u64, pending: u64) {
        self.total_rows.fetch_add(rows, Ordering::Relaxed);
        self.total_txns.fetch_add(1, Ordering::Relaxed);
        self.pending_rows.fetch_sub(pending, Ordering::Relaxed);
    }

    pub fn total_rows(&self) -> u64 {
        self.total_rows.load(Ordering::Relaxed)
    }

    pub fn total_txns(&self) -> u64 {
        self.total_txns.load(Ordering::Relaxed)
    }

    pub fn pending_rows(&self) -> u64 {
        self.pending_rows.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            total_txns: self.total_txns(),
            total_rows: self.total_rows(),
            pending_rows: self.pending_rows(),
        }
    }
}
