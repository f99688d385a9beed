//! mysql_async implementation of the engine's backend traits.

use crate::endpoint::MySQLEndpoint;
use anyhow::Result;
use async_trait::async_trait;
use loadtest_workload::{Backend, Session};
use mysql_async::prelude::*;
use mysql_async::Conn;

/// A connection held by one worker for its whole lifetime.
pub struct MySQLSession {
    conn: Conn,
}

#[async_trait]
impl Session for MySQLSession {
    async fn execute(&mut self, statement: &str) -> Result<u64> {
        self.conn.query_drop(statement).await?;
        Ok(self.conn.affected_rows())
    }
}

#[async_trait]
impl Backend for MySQLEndpoint {
    type Session = MySQLSession;

    async fn connect(&self, _worker: usize) -> Result<MySQLSession> {
        let conn = self.pool().get_conn().await?;
        Ok(MySQLSession { conn })
    }

    fn describe(&self) -> String {
        self.label().to_string()
    }

    async fn shutdown(&self) -> Result<()> {
        self.pool().clone().disconnect().await?;
        Ok(())
    }
}
