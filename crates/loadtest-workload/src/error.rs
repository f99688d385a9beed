//! Error types for the workload engine.
//!
//! [`WorkloadError`] is structural and ends the run. [`TxnError`] describes a
//! single failed transaction attempt and never leaves the worker that
//! produced it.

use thiserror::Error;

/// Structural errors. Any of these aborts the whole run.
#[derive(Error, Debug)]
pub enum WorkloadError {
    /// Invalid or inconsistent configuration, detected before workers start.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A worker could not obtain its dedicated connection.
    #[error("Worker {worker} failed to connect to endpoint {endpoint}")]
    Connection {
        worker: usize,
        endpoint: String,
        #[source]
        source: anyhow::Error,
    },

    /// DDL failed during bootstrap or the prepare action.
    #[error("Schema error while executing `{statement}`")]
    Schema {
        statement: String,
        #[source]
        source: anyhow::Error,
    },

    /// A worker task panicked or was aborted.
    #[error("Worker task failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

/// Errors of a single transaction attempt. Always followed by a rollback.
#[derive(Error, Debug)]
pub enum TxnError {
    /// The entropy source could not produce a row value.
    #[error("generate random value failed")]
    Payload(#[source] rand::Error),

    #[error("begin failed")]
    Begin(#[source] anyhow::Error),

    /// Batch `batch` (zero-based) failed to execute.
    #[error("insert failed at batch {batch}")]
    Batch {
        batch: usize,
        #[source]
        source: anyhow::Error,
    },

    #[error("commit failed")]
    Commit(#[source] anyhow::Error),
}

impl TxnError {
    /// Short classification used in log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            TxnError::Payload(_) => "payload",
            TxnError::Begin(_) => "begin",
            TxnError::Batch { .. } => "batch",
            TxnError::Commit(_) => "commit",
        }
    }
}

/// Render an error with its whole source chain, `outer: inner: root`.
pub fn error_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut out = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        out.push_str(": ");
        out.push_str(&cause.to_string());
        source = cause.source();
    }
    out
}
