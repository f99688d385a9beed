//! CLI argument definitions for the MySQL backend.

use clap::Args;
use std::path::PathBuf;

// Re-export WorkloadArgs for convenience
pub use loadtest_workload::WorkloadArgs;

/// MySQL-specific workload arguments.
#[derive(Args, Clone, Debug)]
pub struct MySQLWorkloadArgs {
    /// Comma-separated MySQL connection strings, one per endpoint
    /// (e.g., mysql://root@tidb-0:4000,mysql://root@tidb-1:4000)
    #[arg(
        long,
        env = "TXN_LOADTEST_DSN",
        default_value = "mysql://root@127.0.0.1:4000"
    )]
    pub dsn: String,

    /// PEM file with the root CA used to verify every endpoint's certificate
    #[arg(long)]
    pub ssl_ca: Option<PathBuf>,

    /// Run `SET GLOBAL tidb_mem_quota_query=<BYTES>` before creating tables
    #[arg(long)]
    pub mem_quota_query: Option<u64>,

    #[command(flatten)]
    pub common: WorkloadArgs,
}
