//! Worker-to-endpoint assignment.

use crate::backend::Backend;
use crate::error::WorkloadError;
use tracing::{debug, warn};

/// The configured endpoints. Worker `i` always connects to endpoint
/// `i % endpoints.len()`, and keeps that session until it exits.
pub struct ConnectionPool<B> {
    endpoints: Vec<B>,
}

impl<B: Backend> ConnectionPool<B> {
    pub fn new(endpoints: Vec<B>) -> Result<Self, WorkloadError> {
        if endpoints.is_empty() {
            return Err(WorkloadError::Config(
                "at least one backend endpoint is required".to_string(),
            ));
        }
        Ok(Self { endpoints })
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    pub fn endpoint_index(&self, worker: usize) -> usize {
        worker % self.endpoints.len()
    }

    pub fn endpoint(&self, worker: usize) -> &B {
        &self.endpoints[self.endpoint_index(worker)]
    }

    /// First endpoint; used for bootstrap DDL.
    pub fn primary(&self) -> &B {
        &self.endpoints[0]
    }

    /// Open the dedicated session of `worker`.
    pub async fn acquire(&self, worker: usize) -> Result<B::Session, WorkloadError> {
        let endpoint = self.endpoint(worker);
        debug!(
            "Worker {} connecting to endpoint {} ({})",
            worker,
            self.endpoint_index(worker),
            endpoint.describe()
        );
        endpoint
            .connect(worker)
            .await
            .map_err(|source| WorkloadError::Connection {
                worker,
                endpoint: endpoint.describe(),
                source,
            })
    }

    /// Shut every endpoint down, logging failures.
    pub async fn shutdown(&self) {
        for endpoint in &self.endpoints {
            if let Err(e) = endpoint.shutdown().await {
                warn!("Failed to shut down endpoint {}: {:#}", endpoint.describe(), e);
            }
        }
    }
}
