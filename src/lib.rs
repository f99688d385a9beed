//! txn-loadtest: transactional write load generation for MySQL-protocol
//! databases.
//!
//! The workload engine lives in `loadtest-workload` and the MySQL backend in
//! `loadtest-workload-mysql`; this crate wires them to the command line.

pub mod loadtest;
