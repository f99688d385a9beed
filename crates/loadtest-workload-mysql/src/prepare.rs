//! The insert-select `prepare` action.

use crate::error::MySQLWorkloadError;
use crate::schema::{ddl_session, execute_ddl, prepare_statements};
use loadtest_workload::{
    Backend, BatchBuilder, BatchPlan, GlobalCounters, TransactionRunner, WorkloadConfig,
};
use std::time::Instant;
use tracing::info;

/// Create, empty and fill the insert-select source table with one
/// transaction's worth of random rows. Returns the rows written.
///
/// Unlike the workers, a failed fill is not retried.
pub async fn prepare_select_source<B: Backend>(
    backend: &B,
    config: &WorkloadConfig,
) -> Result<u64, MySQLWorkloadError> {
    config.validate()?;
    let source = config.select_source_table();
    let mut session = ddl_session(backend).await?;
    execute_ddl(&mut session, &prepare_statements(config)).await?;

    let plan = BatchPlan::populate(config, source.clone());
    info!(
        "Filling {} with {} rows of {} bytes in {} statement(s)",
        source,
        plan.row_count(),
        config.row_size,
        plan.batch_count()
    );

    let start = Instant::now();
    let counters = GlobalCounters::new();
    let rows = TransactionRunner::new(config.mode, &counters, 0)
        .run(&mut session, &plan, &mut BatchBuilder::os(), None)
        .await
        .map_err(|source_err| MySQLWorkloadError::Prepare {
            table: source.clone(),
            source: source_err,
        })?;

    info!("Prepared {}: {} rows in {:?}", source, rows, start.elapsed());
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use loadtest_workload::testing::{Fault, MockBackend};
    use loadtest_workload::TxnError;

    fn config() -> WorkloadConfig {
        WorkloadConfig {
            row_size: 1024,
            batch_rows: 256,
            ..Default::default()
        }
        .with_txn_size_mb(1)
        .unwrap()
    }

    #[tokio::test]
    async fn test_prepare_fills_source_in_one_transaction() {
        let backend = MockBackend::new();

        let rows = prepare_select_source(&backend, &config()).await.unwrap();

        assert_eq!(rows, 1024);
        assert_eq!(backend.committed_rows("db_select.table_select_1"), 1024);
        let statements = backend.statements_for(0);
        assert_eq!(statements[2], "TRUNCATE TABLE db_select.table_select_1");
        assert_eq!(statements[3], "BEGIN PESSIMISTIC");
        assert_eq!(backend.count(None, "INSERT INTO db_select.table_select_1"), 4);
        assert_eq!(backend.count(None, "COMMIT"), 1);
    }

    #[tokio::test]
    async fn test_prepare_twice_keeps_one_copy() {
        let backend = MockBackend::new();
        prepare_select_source(&backend, &config()).await.unwrap();
        prepare_select_source(&backend, &config()).await.unwrap();
        assert_eq!(backend.committed_rows("db_select.table_select_1"), 1024);
    }

    #[tokio::test]
    async fn test_failed_fill_is_not_retried() {
        let backend = MockBackend::new().with_fault(Fault::on("COMMIT"));

        let err = prepare_select_source(&backend, &config()).await.unwrap_err();

        assert!(matches!(
            err,
            MySQLWorkloadError::Prepare {
                source: TxnError::Commit(_),
                ..
            }
        ));
        assert_eq!(backend.count(None, "BEGIN"), 1);
        assert_eq!(backend.committed_rows("db_select.table_select_1"), 0);
    }
}
