//! Backend abstraction the engine runs against.
//!
//! Implementations live in backend crates (see `loadtest-workload-mysql`);
//! the engine is generic over them and monomorphized once per binary.

use anyhow::Result;

/// A dedicated, long-lived connection owned by exactly one worker.
#[async_trait::async_trait]
pub trait Session: Send {
    /// Execute one statement, discard any result set and return the number
    /// of rows it affected.
    async fn execute(&mut self, statement: &str) -> Result<u64>;
}

/// One configured endpoint able to open sessions.
#[async_trait::async_trait]
pub trait Backend: Send + Sync {
    type Session: Session + 'static;

    /// Open the session used by worker `worker` for its whole lifetime.
    async fn connect(&self, worker: usize) -> Result<Self::Session>;

    /// Human-readable endpoint description for logs; must not leak secrets.
    fn describe(&self) -> String;

    /// Release backend resources once all sessions are gone.
    async fn shutdown(&self) -> Result<()> {
        Ok(())
    }
}
