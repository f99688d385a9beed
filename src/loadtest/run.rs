//! Workload command runner.

use anyhow::Context;
use loadtest_workload::{Action, ConnectionPool, WorkloadConfig, WorkloadCoordinator, WorkloadKind};
use loadtest_workload_mysql::{
    bootstrap, mask_connection_password, parse_endpoints, prepare_select_source, split_dsns,
    MySQLWorkloadArgs,
};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::write_summary;

/// Run the selected action. `cancel` stops the workers (e.g. on Ctrl-C).
pub async fn run(args: MySQLWorkloadArgs, cancel: CancellationToken) -> anyhow::Result<()> {
    let config = args
        .common
        .to_config()
        .context("Invalid workload configuration")?;
    log_configuration(&args, &config);
    config
        .validate()
        .context("Invalid workload configuration")?;
    if args.common.action == Action::Prepare && config.kind != WorkloadKind::InsertSelect {
        anyhow::bail!("--action prepare only applies to --workload insert-select");
    }

    let endpoints = parse_endpoints(&args.dsn, args.ssl_ca.as_deref(), config.threads)
        .context("Failed to parse connection strings")?;

    if args.common.dry_run {
        info!(
            "[DRY-RUN] Would {} the {} workload on {} endpoint(s)",
            args.common.action,
            config.kind,
            endpoints.len()
        );
        if config.dropped_txns() > 0 {
            warn!(
                "[DRY-RUN] {} transactions are not divisible across {} workers and would not run",
                config.dropped_txns(),
                config.threads
            );
        }
        info!("[DRY-RUN] Configuration validated successfully");
        return Ok(());
    }

    let pool = ConnectionPool::new(endpoints)?;
    match args.common.action {
        Action::Prepare => {
            let result = prepare_select_source(pool.primary(), &config).await;
            pool.shutdown().await;
            result.context("Failed to prepare the insert-select source table")?;
        }
        Action::Run => {
            if let Err(e) = bootstrap(pool.primary(), &config, args.mem_quota_query).await {
                pool.shutdown().await;
                return Err(e).context("Failed to create schema");
            }
            if config.kind == WorkloadKind::InsertSelect {
                info!(
                    "Copying from {}; run with --action prepare first if it does not exist",
                    config.select_source_table()
                );
            }

            let summary = WorkloadCoordinator::new(config, pool)
                .with_cancellation(cancel)
                .run()
                .await
                .context("Workload failed")?;

            if let Some(path) = &args.common.metrics_output {
                write_summary(path, &summary)?;
            }
        }
    }
    Ok(())
}

fn log_configuration(args: &MySQLWorkloadArgs, config: &WorkloadConfig) {
    info!("Number of threads: {}", config.threads);
    info!("Row size (bytes): {}", config.row_size);
    info!("Transaction size (MB): {}", config.txn_size_mb());
    info!("Transaction mode: {}", config.mode);
    info!("Workload: {} ({})", config.kind, args.common.action);
    if config.target_txns == 0 {
        info!("Target transactions: unbounded");
    } else {
        info!("Target transactions: {}", config.target_txns);
    }
    for dsn in split_dsns(&args.dsn) {
        info!("Endpoint: {}", mask_connection_password(dsn));
    }
    if let Some(ca) = &args.ssl_ca {
        info!("TLS root CA: {:?}", ca);
    }
}
