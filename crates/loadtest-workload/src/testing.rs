//! In-memory backend for exercising the engine without a database.
//!
//! [`MockBackend`] records every statement it receives, simulates per-table
//! row counts with transactional visibility (plus `TRUNCATE TABLE`), and fails
//! statements according to a script of [`Fault`]s.

use crate::backend::{Backend, Session};
use rand::RngCore;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// A statement received by a [`MockSession`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Executed {
    pub worker: usize,
    pub endpoint: String,
    pub statement: String,
    pub succeeded: bool,
}

/// Fail statements starting with `prefix`.
///
/// The first `skip` matching statements pass, the next `times` fail, and
/// everything after that passes again.
#[derive(Debug, Clone)]
pub struct Fault {
    prefix: String,
    worker: Option<usize>,
    skip: usize,
    times: usize,
    seen: usize,
}

impl Fault {
    pub fn on(prefix: &str) -> Self {
        Self {
            prefix: prefix.to_string(),
            worker: None,
            skip: 0,
            times: 1,
            seen: 0,
        }
    }

    pub fn for_worker(mut self, worker: usize) -> Self {
        self.worker = Some(worker);
        self
    }

    pub fn after(mut self, skip: usize) -> Self {
        self.skip = skip;
        self
    }

    pub fn times(mut self, times: usize) -> Self {
        self.times = times;
        self
    }

    pub fn always(self) -> Self {
        self.times(usize::MAX)
    }

    fn trips(&mut self, worker: usize, statement: &str) -> bool {
        if self.worker.is_some_and(|w| w != worker) || !statement.starts_with(&self.prefix) {
            return false;
        }
        self.seen += 1;
        self.seen > self.skip && self.seen - self.skip <= self.times
    }
}

#[derive(Debug, Default)]
struct MockState {
    log: Vec<Executed>,
    faults: Vec<Fault>,
    tables: HashMap<String, u64>,
}

/// Scripted in-memory endpoint. Clones share state.
#[derive(Debug, Clone)]
pub struct MockBackend {
    name: String,
    refuse: bool,
    state: Arc<Mutex<MockState>>,
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::named("mock")
    }
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            refuse: false,
            state: Arc::new(Mutex::new(MockState::default())),
        }
    }

    /// Every `connect` call fails.
    pub fn refuse_connections(mut self) -> Self {
        self.refuse = true;
        self
    }

    pub fn with_fault(self, fault: Fault) -> Self {
        self.state.lock().unwrap().faults.push(fault);
        self
    }

    /// Pre-populate `table` with `rows` committed rows.
    pub fn with_table(self, table: &str, rows: u64) -> Self {
        self.state
            .lock()
            .unwrap()
            .tables
            .insert(table.to_string(), rows);
        self
    }

    pub fn executed(&self) -> Vec<Executed> {
        self.state.lock().unwrap().log.clone()
    }

    /// Statements sent by `worker`, in order.
    pub fn statements_for(&self, worker: usize) -> Vec<String> {
        self.executed()
            .into_iter()
            .filter(|e| e.worker == worker)
            .map(|e| e.statement)
            .collect()
    }

    /// Number of statements starting with `prefix`, optionally for one worker.
    pub fn count(&self, worker: Option<usize>, prefix: &str) -> usize {
        self.state
            .lock()
            .unwrap()
            .log
            .iter()
            .filter(|e| worker.map_or(true, |w| w == e.worker) && e.statement.starts_with(prefix))
            .count()
    }

    /// Rows visible in `table`, i.e. written by committed transactions.
    pub fn committed_rows(&self, table: &str) -> u64 {
        self.state
            .lock()
            .unwrap()
            .tables
            .get(table)
            .copied()
            .unwrap_or(0)
    }
}

#[async_trait::async_trait]
impl Backend for MockBackend {
    type Session = MockSession;

    async fn connect(&self, worker: usize) -> anyhow::Result<MockSession> {
        if self.refuse {
            anyhow::bail!("connection refused by {}", self.name);
        }
        Ok(MockSession {
            worker,
            endpoint: self.name.clone(),
            state: Arc::clone(&self.state),
            open: Vec::new(),
        })
    }

    fn describe(&self) -> String {
        self.name.clone()
    }
}

/// Session of a [`MockBackend`]. Rows inserted inside a transaction only
/// become visible on COMMIT.
#[derive(Debug)]
pub struct MockSession {
    worker: usize,
    endpoint: String,
    state: Arc<Mutex<MockState>>,
    open: Vec<(String, u64)>,
}

#[async_trait::async_trait]
impl Session for MockSession {
    async fn execute(&mut self, statement: &str) -> anyhow::Result<u64> {
        // Real sessions always suspend; keep workers from monopolising the runtime.
        tokio::task::yield_now().await;

        let mut state = self.state.lock().unwrap();
        let worker = self.worker;
        let fail = state
            .faults
            .iter_mut()
            .fold(false, |tripped, fault| fault.trips(worker, statement) || tripped);

        state.log.push(Executed {
            worker,
            endpoint: self.endpoint.clone(),
            statement: statement.to_string(),
            succeeded: !fail,
        });

        if fail {
            anyhow::bail!("injected failure on `{}`", truncate(statement));
        }

        if statement.starts_with("BEGIN") || statement == "ROLLBACK" {
            self.open.clear();
        } else if statement == "COMMIT" {
            for (table, rows) in self.open.drain(..) {
                *state.tables.entry(table).or_default() += rows;
            }
        } else if let Some(table) = statement.strip_prefix("TRUNCATE TABLE ") {
            state.tables.insert(table.trim().to_string(), 0);
        } else if let Some((table, rows)) = inserted_rows(statement, &state.tables) {
            self.open.push((table, rows));
            return Ok(rows);
        }
        Ok(0)
    }
}

fn truncate(statement: &str) -> &str {
    match statement.char_indices().nth(48) {
        Some((idx, _)) => &statement[..idx],
        None => statement,
    }
}

/// Target table and row count of an INSERT statement.
fn inserted_rows(statement: &str, tables: &HashMap<String, u64>) -> Option<(String, u64)> {
    let rest = statement.strip_prefix("INSERT INTO ")?;
    let (table, rest) = rest.split_once(' ')?;
    let rows = if let Some(source) = rest.strip_prefix("(v) SELECT v FROM ") {
        tables.get(source.trim()).copied().unwrap_or(0)
    } else {
        rest.matches("(0x").count() as u64
    };
    Some((table.to_string(), rows))
}

/// An entropy source that always fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct FailingRng;

impl RngCore for FailingRng {
    fn next_u32(&mut self) -> u32 {
        0
    }

    fn next_u64(&mut self) -> u64 {
        0
    }

    fn fill_bytes(&mut self, _dest: &mut [u8]) {
        panic!("entropy source unavailable");
    }

    fn try_fill_bytes(&mut self, _dest: &mut [u8]) -> Result<(), rand::Error> {
        Err(rand::Error::new("entropy source unavailable"))
    }
}
