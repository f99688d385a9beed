//! Command-line interface for txn-loadtest
//!
//! # Usage Examples
//!
//! ## Insert workload
//! ```bash
//! # 16 workers, 8 MB pessimistic transactions, until interrupted
//! txn-loadtest --threads 16 --dsn mysql://root@127.0.0.1:4000
//!
//! # Optimistic transactions across two TiDB servers, 1000 transactions total
//! txn-loadtest --threads 8 --mode optimistic --target-txns 1000 \
//!   --dsn mysql://root@tidb-0:4000,mysql://root@tidb-1:4000
//! ```
//!
//! ## Insert-select workload
//! ```bash
//! # Fill db_select.table_select_8 once
//! txn-loadtest --workload insert-select --action prepare
//!
//! # Copy it into every worker's table in each transaction
//! txn-loadtest --workload insert-select --threads 4 --metrics-output summary.json
//! ```

use clap::Parser;
use loadtest_workload_mysql::MySQLWorkloadArgs;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::fmt::writer::MakeWriterExt;

#[derive(Parser)]
#[command(name = "txn-loadtest")]
#[command(about = "Drive transactional write load against MySQL-protocol databases")]
#[command(version)]
struct Cli {
    #[command(flatten)]
    args: MySQLWorkloadArgs,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = run().await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}

async fn run() -> anyhow::Result<()> {
    // Initialize tracing: warnings and errors on stderr, progress on stdout
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(
            std::io::stderr
                .with_max_level(tracing::Level::WARN)
                .or_else(std::io::stdout),
        )
        .init();

    let cli = Cli::parse();

    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupted, stopping workers after their current transaction");
            interrupt.cancel();
        }
    });

    txn_loadtest::loadtest::run(cli.args, cancel).await
}
