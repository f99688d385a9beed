//! One transaction attempt: begin, batches, commit, rollback on failure.

use crate::backend::Session;
use crate::batch::{BatchBuilder, BatchPlan};
use crate::config::TxnMode;
use crate::counters::GlobalCounters;
use crate::error::{error_chain, TxnError};
use crate::sampler::ThroughputSampler;
use rand::RngCore;
use tracing::{debug, warn};

/// Executes transactions of a fixed mode and records their outcome in the
/// shared counters.
pub struct TransactionRunner<'a> {
    mode: TxnMode,
    counters: &'a GlobalCounters,
    /// Worker index, for log lines only.
    worker: usize,
}

impl<'a> TransactionRunner<'a> {
    pub fn new(mode: TxnMode, counters: &'a GlobalCounters, worker: usize) -> Self {
        Self {
            mode,
            counters,
            worker,
        }
    }

    /// Run one transaction following `plan` and return the rows it committed,
    /// as reported affected by the session.
    ///
    /// On error nothing is added to the row or transaction totals and a
    /// best-effort ROLLBACK has been issued. `sampler` is polled after every
    /// batch and after the commit.
    pub async fn run<S, R>(
        &self,
        session: &mut S,
        plan: &BatchPlan,
        builder: &mut BatchBuilder<R>,
        mut sampler: Option<&mut ThroughputSampler>,
    ) -> Result<u64, TxnError>
    where
        S: Session + ?Sized,
        R: RngCore + Send,
    {
        let mut pending = 0u64;
        let result = self
            .attempt(session, plan, builder, &mut sampler, &mut pending)
            .await;

        match result {
            Ok(rows) => {
                self.counters.record_commit(rows, pending);
                if let Some(sampler) = sampler {
                    sampler.maybe_report(self.counters);
                }
                Ok(rows)
            }
            Err(e) => {
                self.counters.discard_pending(pending);
                if let Err(rollback_err) = session.execute("ROLLBACK").await {
                    warn!(
                        "Rollback failed on worker {} after {} error: {:#}",
                        self.worker,
                        e.kind(),
                        rollback_err
                    );
                }
                debug!(
                    "Worker {} rolled back: {}",
                    self.worker,
                    error_chain(&e)
                );
                Err(e)
            }
        }
    }

    async fn attempt<S, R>(
        &self,
        session: &mut S,
        plan: &BatchPlan,
        builder: &mut BatchBuilder<R>,
        sampler: &mut Option<&mut ThroughputSampler>,
        pending: &mut u64,
    ) -> Result<u64, TxnError>
    where
        S: Session + ?Sized,
        R: RngCore + Send,
    {
        session
            .execute(self.mode.begin_statement())
            .await
            .map_err(TxnError::Begin)?;

        let mut written = 0u64;
        for index in 0..plan.batch_count() {
            let batch = builder.build(plan, index).map_err(TxnError::Payload)?;
            let planned = batch.rows;
            let rows = session
                .execute(batch.statement)
                .await
                .map_err(|source| TxnError::Batch {
                    batch: index,
                    source,
                })?;
            if rows != planned {
                debug!(
                    "Worker {} batch {} affected {} rows, planned {}",
                    self.worker, index, rows, planned
                );
            }

            written += rows;
            *pending += rows;
            self.counters.add_pending(rows);
            if let Some(sampler) = sampler.as_deref_mut() {
                sampler.maybe_report(self.counters);
            }
        }

        session.execute("COMMIT").await.map_err(TxnError::Commit)?;
        Ok(written)
    }
}
