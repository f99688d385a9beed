//! Statement construction for one transaction.

use crate::config::{WorkloadConfig, WorkloadKind};
use crate::payload::PayloadGenerator;
use rand::rngs::OsRng;
use rand::RngCore;

/// What one transaction of a worker writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchPlan {
    /// `row_count` random values, `batch_rows` per INSERT statement.
    Values {
        table: String,
        row_count: u64,
        row_size: usize,
        batch_rows: usize,
    },
    /// A single `INSERT ... SELECT` copying `source`, which holds `row_count` rows.
    InsertSelect {
        table: String,
        source: String,
        row_count: u64,
    },
}

impl BatchPlan {
    /// The plan executed by worker `index` under `config`.
    pub fn for_worker(config: &WorkloadConfig, index: usize) -> Self {
        match config.kind {
            WorkloadKind::Insert => BatchPlan::Values {
                table: config.dest_table(index),
                row_count: config.row_count(),
                row_size: config.row_size,
                batch_rows: config.batch_rows,
            },
            WorkloadKind::InsertSelect => BatchPlan::InsertSelect {
                table: config.dest_table(index),
                source: config.select_source_table(),
                row_count: config.row_count(),
            },
        }
    }

    /// Fill `table` with `config.row_count()` random values. Used by the
    /// insert-select prepare action.
    pub fn populate(config: &WorkloadConfig, table: impl Into<String>) -> Self {
        BatchPlan::Values {
            table: table.into(),
            row_count: config.row_count(),
            row_size: config.row_size,
            batch_rows: config.batch_rows,
        }
    }

    pub fn table(&self) -> &str {
        match self {
            BatchPlan::Values { table, .. } | BatchPlan::InsertSelect { table, .. } => table,
        }
    }

    /// Rows written by a transaction following this plan.
    pub fn row_count(&self) -> u64 {
        match self {
            BatchPlan::Values { row_count, .. } | BatchPlan::InsertSelect { row_count, .. } => {
                *row_count
            }
        }
    }

    /// Number of statements per transaction, `ceil(row_count / batch_rows)`.
    pub fn batch_count(&self) -> usize {
        match self {
            BatchPlan::Values {
                row_count,
                batch_rows,
                ..
            } => {
                if *batch_rows == 0 {
                    return 0;
                }
                row_count.div_ceil(*batch_rows as u64) as usize
            }
            BatchPlan::InsertSelect { .. } => 1,
        }
    }

    /// Rows covered by statement `batch`.
    pub fn batch_rows(&self, batch: usize) -> u64 {
        match self {
            BatchPlan::Values {
                row_count,
                batch_rows,
                ..
            } => {
                let start = batch as u64 * *batch_rows as u64;
                row_count.saturating_sub(start).min(*batch_rows as u64)
            }
            BatchPlan::InsertSelect { row_count, .. } => {
                if batch == 0 {
                    *row_count
                } else {
                    0
                }
            }
        }
    }
}

/// One statement ready to be sent.
#[derive(Debug)]
pub struct Batch<'a> {
    pub statement: &'a str,
    pub rows: u64,
}

/// Builds statement text for a [`BatchPlan`], reusing its buffers between
/// batches.
pub struct BatchBuilder<R = OsRng> {
    payload: PayloadGenerator<R>,
    sql: String,
    row: Vec<u8>,
}

impl BatchBuilder<OsRng> {
    pub fn os() -> Self {
        Self::new(PayloadGenerator::os())
    }
}

impl<R: RngCore> BatchBuilder<R> {
    pub fn new(payload: PayloadGenerator<R>) -> Self {
        Self {
            payload,
            sql: String::new(),
            row: Vec::new(),
        }
    }

    /// Build statement `batch` of `plan`.
    ///
    /// Values are drawn fresh for every call, so a retried transaction never
    /// re-sends the values of a failed attempt.
    pub fn build(&mut self, plan: &BatchPlan, batch: usize) -> Result<Batch<'_>, rand::Error> {
        let rows = plan.batch_rows(batch);
        self.sql.clear();

        match plan {
            BatchPlan::Values {
                table, row_size, ..
            } => {
                self.row.resize(*row_size, 0);
                self.sql.reserve(64 + rows as usize * (2 * row_size + 5));
                self.sql.push_str("INSERT INTO ");
                self.sql.push_str(table);
                self.sql.push_str(" (v) VALUES ");
                for i in 0..rows {
                    if i > 0 {
                        self.sql.push(',');
                    }
                    self.payload.fill(&mut self.row)?;
                    self.sql.push_str("(0x");
                    self.sql.push_str(&hex::encode(&self.row));
                    self.sql.push(')');
                }
            }
            BatchPlan::InsertSelect { table, source, .. } => {
                self.sql.push_str("INSERT INTO ");
                self.sql.push_str(table);
                self.sql.push_str(" (v) SELECT v FROM ");
                self.sql.push_str(source);
            }
        }

        Ok(Batch {
            statement: &self.sql,
            rows,
        })
    }
}
