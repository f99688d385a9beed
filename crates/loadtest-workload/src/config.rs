//! Resolved workload configuration.

use crate::error::WorkloadError;
use crate::tables;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Maximum number of rows carried by one INSERT statement.
pub const INSERT_BATCH_ROWS: usize = 1024;

/// Fixed delay between a failed transaction attempt and the next one.
pub const DEFAULT_BACKOFF: Duration = Duration::from_secs(1);

/// Minimum time between two throughput samples.
pub const DEFAULT_SAMPLE_INTERVAL: Duration = Duration::from_secs(10);

const BYTES_PER_MB: u64 = 1024 * 1024;

/// Concurrency-control mode requested when a transaction begins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TxnMode {
    /// `BEGIN OPTIMISTIC`: conflicts are detected at commit time.
    Optimistic,
    /// `BEGIN PESSIMISTIC`: rows are locked as they are written.
    Pessimistic,
}

impl TxnMode {
    pub fn begin_statement(&self) -> &'static str {
        match self {
            TxnMode::Optimistic => "BEGIN OPTIMISTIC",
            TxnMode::Pessimistic => "BEGIN PESSIMISTIC",
        }
    }
}

impl std::fmt::Display for TxnMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TxnMode::Optimistic => write!(f, "optimistic"),
            TxnMode::Pessimistic => write!(f, "pessimistic"),
        }
    }
}

/// The two fixed workload shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WorkloadKind {
    /// Random values generated client-side, inserted in multi-row batches.
    Insert,
    /// One `INSERT ... SELECT` per transaction from a pre-populated table.
    #[value(name = "insert-select")]
    InsertSelect,
}

impl std::fmt::Display for WorkloadKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WorkloadKind::Insert => write!(f, "insert"),
            WorkloadKind::InsertSelect => write!(f, "insert-select"),
        }
    }
}

/// Immutable configuration of one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkloadConfig {
    /// Number of concurrent workers (one connection each).
    pub threads: usize,
    /// Size of a single row value in bytes.
    pub row_size: usize,
    /// Size of a transaction in bytes.
    pub txn_size_bytes: u64,
    /// Transactions to execute across all workers, 0 = unbounded.
    pub target_txns: u64,
    pub mode: TxnMode,
    pub kind: WorkloadKind,
    /// Database holding the destination tables.
    pub database: String,
    /// Row cap of one INSERT statement.
    pub batch_rows: usize,
    #[serde(with = "duration_millis")]
    pub backoff: Duration,
    #[serde(with = "duration_millis")]
    pub sample_interval: Duration,
}

impl Default for WorkloadConfig {
    fn default() -> Self {
        Self {
            threads: 1,
            row_size: 1024,
            txn_size_bytes: 8 * BYTES_PER_MB,
            target_txns: 0,
            mode: TxnMode::Pessimistic,
            kind: WorkloadKind::Insert,
            database: "test".to_string(),
            batch_rows: INSERT_BATCH_ROWS,
            backoff: DEFAULT_BACKOFF,
            sample_interval: DEFAULT_SAMPLE_INTERVAL,
        }
    }
}

impl WorkloadConfig {
    /// Transaction size given in whole megabytes.
    pub fn with_txn_size_mb(mut self, mb: u64) -> Result<Self, WorkloadError> {
        self.txn_size_bytes = mb.checked_mul(BYTES_PER_MB).ok_or_else(|| {
            WorkloadError::Config(format!("transaction size of {mb} MB is too large"))
        })?;
        Ok(self)
    }

    /// Transaction size in whole megabytes, as used in source table names.
    pub fn txn_size_mb(&self) -> u64 {
        self.txn_size_bytes / BYTES_PER_MB
    }

    /// Rows written by one transaction.
    pub fn row_count(&self) -> u64 {
        if self.row_size == 0 {
            return 0;
        }
        self.txn_size_bytes / self.row_size as u64
    }

    /// Successful transactions each worker must execute, 0 = unbounded.
    ///
    /// Integer division: the remainder of `target_txns / threads` is never
    /// executed.
    pub fn target_per_worker(&self) -> u64 {
        if self.threads == 0 {
            return 0;
        }
        self.target_txns / self.threads as u64
    }

    /// Transactions lost to the uneven split of `target_txns`.
    pub fn dropped_txns(&self) -> u64 {
        if self.threads == 0 {
            return 0;
        }
        self.target_txns % self.threads as u64
    }

    /// Destination table of worker `index`, qualified with the database.
    pub fn dest_table(&self, index: usize) -> String {
        tables::dest_table(&self.database, index)
    }

    /// Source table read by the insert-select workload.
    pub fn select_source_table(&self) -> String {
        tables::select_source_table(self.txn_size_mb())
    }

    /// Reject configurations that would produce empty or unbounded batches.
    pub fn validate(&self) -> Result<(), WorkloadError> {
        if self.threads == 0 {
            return Err(WorkloadError::Config(
                "thread count must be at least 1".to_string(),
            ));
        }
        if self.row_size == 0 {
            return Err(WorkloadError::Config(
                "row size must be at least 1 byte".to_string(),
            ));
        }
        if self.batch_rows == 0 {
            return Err(WorkloadError::Config(
                "batch row cap must be at least 1".to_string(),
            ));
        }
        if self.row_count() < 1 {
            return Err(WorkloadError::Config(format!(
                "transaction size ({} bytes) is smaller than row size ({} bytes)",
                self.txn_size_bytes, self.row_size
            )));
        }
        if self.target_txns > 0 && self.target_per_worker() == 0 {
            return Err(WorkloadError::Config(format!(
                "target of {} transactions is smaller than the {} workers",
                self.target_txns, self.threads
            )));
        }
        if !tables::is_valid_identifier(&self.database) {
            return Err(WorkloadError::Config(format!(
                "invalid database name '{}'",
                self.database
            )));
        }
        Ok(())
    }
}

mod duration_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_count_from_mb() {
        let config = WorkloadConfig {
            row_size: 1024,
            ..Default::default()
        }
        .with_txn_size_mb(1)
        .unwrap();
        assert_eq!(config.txn_size_bytes, 1_048_576);
        assert_eq!(config.txn_size_mb(), 1);
        assert_eq!(config.row_count(), 1024);
    }

    #[test]
    fn test_oversized_txn_is_rejected() {
        let err = WorkloadConfig::default()
            .with_txn_size_mb(u64::MAX / 1024)
            .unwrap_err();
        assert!(matches!(err, WorkloadError::Config(_)));
        assert!(err.to_string().contains("too large"));

        let largest = u64::MAX / BYTES_PER_MB;
        let config = WorkloadConfig::default().with_txn_size_mb(largest).unwrap();
        assert_eq!(config.txn_size_mb(), largest);
    }

    #[test]
    fn test_target_per_worker_drops_remainder() {
        let config = WorkloadConfig {
            threads: 4,
            target_txns: 42,
            ..Default::default()
        };
        assert_eq!(config.target_per_worker(), 10);
        assert_eq!(config.dropped_txns(), 2);

        let unbounded = WorkloadConfig {
            threads: 4,
            target_txns: 0,
            ..Default::default()
        };
        assert_eq!(unbounded.target_per_worker(), 0);
    }

    #[test]
    fn test_validate_rejects_row_larger_than_txn() {
        let config = WorkloadConfig {
            row_size: 2 * 1024 * 1024,
            ..Default::default()
        }
        .with_txn_size_mb(1)
        .unwrap();
        let err = config.validate().unwrap_err();
        assert!(matches!(err, WorkloadError::Config(_)));
    }

    #[test]
    fn test_validate_rejects_zero_threads_and_rows() {
        for config in [
            WorkloadConfig {
                threads: 0,
                ..Default::default()
            },
            WorkloadConfig {
                row_size: 0,
                ..Default::default()
            },
            WorkloadConfig {
                batch_rows: 0,
                ..Default::default()
            },
            WorkloadConfig {
                database: "test; DROP DATABASE x".to_string(),
                ..Default::default()
            },
        ] {
            assert!(config.validate().is_err(), "{config:?} should be rejected");
        }
    }

    #[test]
    fn test_validate_rejects_target_below_thread_count() {
        let config = WorkloadConfig {
            threads: 8,
            target_txns: 5,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_default_config_is_valid() {
        WorkloadConfig::default().validate().unwrap();
    }

    #[test]
    fn test_begin_statements() {
        assert_eq!(TxnMode::Optimistic.begin_statement(), "BEGIN OPTIMISTIC");
        assert_eq!(TxnMode::Pessimistic.begin_statement(), "BEGIN PESSIMISTIC");
    }

    #[test]
    fn test_table_names() {
        let config = WorkloadConfig {
            database: "bench".to_string(),
            ..Default::default()
        }
        .with_txn_size_mb(16)
        .unwrap();
        assert_eq!(config.dest_table(3), "bench.table_3");
        assert_eq!(config.select_source_table(), "db_select.table_select_16");
    }
}
