//! Run summary output.

use anyhow::Context;
use loadtest_workload::WorkloadSummary;
use std::path::Path;
use tracing::info;

/// Write `summary` to `path` as pretty-printed JSON.
pub fn write_summary(path: &Path, summary: &WorkloadSummary) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(summary)?;
    std::fs::write(path, &json)
        .with_context(|| format!("Failed to write metrics to {path:?}"))?;
    info!("Metrics written to {:?}", path);
    Ok(())
}
