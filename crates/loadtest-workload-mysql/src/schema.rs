//! DDL issued once before the workers start.

use crate::error::MySQLWorkloadError;
use loadtest_workload::tables::SELECT_DATABASE;
use loadtest_workload::{Backend, Session, WorkloadConfig, WorkloadError, WorkloadKind};
use tracing::{debug, info};

/// Column type of every row value.
pub const VALUE_COLUMN: &str = "v VARBINARY(65535)";

pub fn generate_mem_quota(bytes: u64) -> String {
    format!("SET GLOBAL tidb_mem_quota_query={bytes}")
}

pub fn generate_create_database(database: &str) -> String {
    format!("CREATE DATABASE IF NOT EXISTS {database}")
}

/// Destination table of one worker. Insert-select copies a single-column
/// source, so its destinations carry no key column.
pub fn generate_create_dest_table(kind: WorkloadKind, table: &str) -> String {
    match kind {
        WorkloadKind::Insert => format!(
            "CREATE TABLE IF NOT EXISTS {table} (k BIGINT AUTO_INCREMENT PRIMARY KEY, {VALUE_COLUMN})"
        ),
        WorkloadKind::InsertSelect => {
            format!("CREATE TABLE IF NOT EXISTS {table} ({VALUE_COLUMN})")
        }
    }
}

pub fn generate_create_source_table(table: &str) -> String {
    format!("CREATE TABLE IF NOT EXISTS {table} ({VALUE_COLUMN})")
}

pub fn generate_truncate_table(table: &str) -> String {
    format!("TRUNCATE TABLE {table}")
}

/// Statements creating the database and one destination table per worker.
pub fn bootstrap_statements(config: &WorkloadConfig, mem_quota_query: Option<u64>) -> Vec<String> {
    let mut statements = Vec::with_capacity(config.threads + 2);
    if let Some(bytes) = mem_quota_query {
        statements.push(generate_mem_quota(bytes));
    }
    statements.push(generate_create_database(&config.database));
    statements.extend(
        (0..config.threads).map(|i| generate_create_dest_table(config.kind, &config.dest_table(i))),
    );
    statements
}

/// Statements creating and emptying the insert-select source table.
pub fn prepare_statements(config: &WorkloadConfig) -> Vec<String> {
    let source = config.select_source_table();
    vec![
        generate_create_database(SELECT_DATABASE),
        generate_create_source_table(&source),
        generate_truncate_table(&source),
    ]
}

/// Open a session on `backend` for DDL.
pub async fn ddl_session<B: Backend>(backend: &B) -> Result<B::Session, WorkloadError> {
    backend
        .connect(0)
        .await
        .map_err(|source| WorkloadError::Connection {
            worker: 0,
            endpoint: backend.describe(),
            source,
        })
}

/// Execute `statements` in order, stopping at the first failure.
pub async fn execute_ddl<S: Session + ?Sized>(
    session: &mut S,
    statements: &[String],
) -> Result<(), WorkloadError> {
    for statement in statements {
        debug!("Executing: {}", statement);
        session
            .execute(statement)
            .await
            .map_err(|source| WorkloadError::Schema {
                statement: statement.clone(),
                source,
            })?;
    }
    Ok(())
}

/// Create the database and the destination tables through `backend`.
pub async fn bootstrap<B: Backend>(
    backend: &B,
    config: &WorkloadConfig,
    mem_quota_query: Option<u64>,
) -> Result<(), MySQLWorkloadError> {
    config.validate()?;
    let statements = bootstrap_statements(config, mem_quota_query);
    let mut session = ddl_session(backend).await?;
    execute_ddl(&mut session, &statements).await?;
    info!(
        "Created database {} and {} destination tables",
        config.database, config.threads
    );
    Ok(())
}
