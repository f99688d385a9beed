//! Concurrent transactional write workload engine.
//!
//! A [`WorkloadCoordinator`] spawns one [`Worker`] per configured thread. Each
//! worker owns a dedicated session taken from the [`ConnectionPool`] and keeps
//! running transactions built by the [`BatchBuilder`] until its share of the
//! target is reached, retrying after a fixed backoff on failure. Committed
//! rows and transactions are accounted in [`GlobalCounters`], which worker 0
//! samples periodically to log throughput.
//!
//! The engine is backend-agnostic: it talks to the database only through the
//! [`Backend`] and [`Session`] traits. [`testing::MockBackend`] is an
//! in-memory implementation for tests.

pub mod args;
pub mod backend;
pub mod batch;
pub mod config;
pub mod coordinator;
pub mod counters;
pub mod duration;
pub mod error;
pub mod payload;
pub mod pool;
pub mod sampler;
pub mod summary;
pub mod tables;
pub mod testing;
pub mod txn;
pub mod worker;

pub use args::{Action, WorkloadArgs};
pub use backend::{Backend, Session};
pub use batch::{Batch, BatchBuilder, BatchPlan};
pub use config::{TxnMode, WorkloadConfig, WorkloadKind, INSERT_BATCH_ROWS};
pub use coordinator::WorkloadCoordinator;
pub use counters::{CounterSnapshot, GlobalCounters};
pub use error::{error_chain, TxnError, WorkloadError};
pub use payload::PayloadGenerator;
pub use pool::ConnectionPool;
pub use sampler::{Sample, ThroughputSampler};
pub use summary::{SummaryBuilder, WorkloadSummary};
pub use txn::TransactionRunner;
pub use worker::{Worker, WorkerReport, WorkerState};
