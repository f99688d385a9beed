//! MySQL / TiDB backend for the txn-loadtest workload engine.
//!
//! Every configured connection string becomes a [`MySQLEndpoint`] implementing
//! [`loadtest_workload::Backend`]; each worker holds one [`MySQLSession`] on
//! its endpoint for the whole run. The [`schema`] and [`prepare`] modules issue
//! the DDL and source-table fill that run before the workers start.

pub mod args;
pub mod endpoint;
pub mod error;
pub mod prepare;
pub mod schema;
pub mod session;

pub use args::MySQLWorkloadArgs;
pub use endpoint::{mask_connection_password, parse_endpoints, split_dsns, MySQLEndpoint};
pub use error::MySQLWorkloadError;
pub use prepare::prepare_select_source;
pub use schema::bootstrap;
pub use session::MySQLSession;
