//! CLI argument definitions shared by every backend.

use crate::config::{TxnMode, WorkloadConfig, WorkloadKind, INSERT_BATCH_ROWS};
use crate::duration::parse_duration;
use crate::error::WorkloadError;
use clap::{Args, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;

/// What to do with the selected workload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Action {
    /// Create and fill the insert-select source table
    Prepare,
    /// Run the workload
    Run,
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Action::Prepare => write!(f, "prepare"),
            Action::Run => write!(f, "run"),
        }
    }
}

/// Workload arguments shared by all backends.
#[derive(Args, Clone, Debug)]
pub struct WorkloadArgs {
    /// Number of concurrent workers, each with its own connection
    #[arg(long, default_value = "1")]
    pub threads: usize,

    /// Size of a single row value in bytes
    #[arg(long, default_value = "1024")]
    pub row_size: usize,

    /// Size of one transaction in MB
    #[arg(long, default_value = "8")]
    pub txn_size_mb: u64,

    /// Transactions to execute across all workers (0 = run until interrupted)
    #[arg(long, default_value = "0")]
    pub target_txns: u64,

    /// Transaction mode used for BEGIN
    #[arg(long, value_enum, default_value_t = TxnMode::Pessimistic)]
    pub mode: TxnMode,

    /// Database holding the destination tables
    #[arg(long, default_value = "test")]
    pub database: String,

    /// Workload shape
    #[arg(long, value_enum, default_value_t = WorkloadKind::Insert)]
    pub workload: WorkloadKind,

    /// Action to perform (prepare only applies to insert-select)
    #[arg(long, value_enum, default_value_t = Action::Run)]
    pub action: Action,

    /// Maximum rows per INSERT statement
    #[arg(long, default_value_t = INSERT_BATCH_ROWS)]
    pub batch_rows: usize,

    /// Delay after a failed transaction before the next attempt (e.g. 500ms, 1s)
    #[arg(long, default_value = "1s", value_parser = parse_duration)]
    pub backoff: Duration,

    /// Minimum time between two throughput reports
    #[arg(long, default_value = "10s", value_parser = parse_duration)]
    pub sample_interval: Duration,

    /// Write a JSON run summary to this file
    #[arg(long)]
    pub metrics_output: Option<PathBuf>,

    /// Dry-run mode: validate configuration without connecting
    #[arg(long)]
    pub dry_run: bool,
}

impl WorkloadArgs {
    /// Resolve the flags into a config. Fails when the transaction size does
    /// not fit in bytes.
    pub fn to_config(&self) -> Result<WorkloadConfig, WorkloadError> {
        WorkloadConfig {
            threads: self.threads,
            row_size: self.row_size,
            target_txns: self.target_txns,
            mode: self.mode,
            kind: self.workload,
            database: self.database.clone(),
            batch_rows: self.batch_rows,
            backoff: self.backoff,
            sample_interval: self.sample_interval,
            ..Default::default()
        }
        .with_txn_size_mb(self.txn_size_mb)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        args: WorkloadArgs,
    }

    #[test]
    fn test_defaults() {
        let cli = TestCli::try_parse_from(["test"]).unwrap();
        let config = cli.args.to_config().unwrap();

        assert_eq!(config.threads, 1);
        assert_eq!(config.row_size, 1024);
        assert_eq!(config.txn_size_mb(), 8);
        assert_eq!(config.row_count(), 8192);
        assert_eq!(config.mode, TxnMode::Pessimistic);
        assert_eq!(config.kind, WorkloadKind::Insert);
        assert_eq!(config.batch_rows, 1024);
        assert_eq!(config.backoff, Duration::from_secs(1));
        assert_eq!(config.sample_interval, Duration::from_secs(10));
        assert_eq!(cli.args.action, Action::Run);
        assert!(!cli.args.dry_run);
    }

    #[test]
    fn test_explicit_values() {
        let cli = TestCli::try_parse_from([
            "test",
            "--threads",
            "16",
            "--txn-size-mb",
            "1",
            "--mode",
            "optimistic",
            "--workload",
            "insert-select",
            "--action",
            "prepare",
            "--backoff",
            "250ms",
        ])
        .unwrap();
        let config = cli.args.to_config().unwrap();

        assert_eq!(config.threads, 16);
        assert_eq!(config.row_count(), 1024);
        assert_eq!(config.mode, TxnMode::Optimistic);
        assert_eq!(config.kind, WorkloadKind::InsertSelect);
        assert_eq!(config.backoff, Duration::from_millis(250));
        assert_eq!(cli.args.action, Action::Prepare);
    }

    #[test]
    fn test_oversized_txn_size_is_rejected() {
        let cli = TestCli::try_parse_from(["test", "--txn-size-mb", "18446744073709551"]).unwrap();
        let err = cli.args.to_config().unwrap_err();
        assert!(matches!(err, WorkloadError::Config(_)));
    }

    #[test]
    fn test_unknown_workload_is_rejected() {
        assert!(TestCli::try_parse_from(["test", "--workload", "update"]).is_err());
        assert!(TestCli::try_parse_from(["test", "--action", "cleanup"]).is_err());
    }
}
