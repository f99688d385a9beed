//! Error types for the MySQL workload backend.

use loadtest_workload::{TxnError, WorkloadError};
use thiserror::Error;

/// Errors that can occur while setting up MySQL endpoints or schema.
#[derive(Error, Debug)]
pub enum MySQLWorkloadError {
    /// Malformed connection URL.
    #[error("Invalid connection string '{dsn}': {source}")]
    Url {
        dsn: String,
        #[source]
        source: mysql_async::UrlError,
    },

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The transaction filling the insert-select source table failed.
    #[error("Failed to fill {table}")]
    Prepare {
        table: String,
        #[source]
        source: TxnError,
    },

    /// Schema bootstrap or connection failure.
    #[error(transparent)]
    Workload(#[from] WorkloadError),
}
