//! Directory port for looking up worker records.

use crate::workflow::domain::{Role, Worker, WorkerId};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for worker directory operations.
pub type DirectoryResult<T> = Result<T, DirectoryError>;

/// Read-only view of the worker directory.
#[async_trait]
pub trait WorkerDirectory: Send + Sync {
    /// Returns every worker in directory order.
    async fn list_workers(&self) -> DirectoryResult<Vec<Worker>>;

    /// Finds a worker by stable identity.
    async fn find(&self, worker_id: &WorkerId) -> DirectoryResult<Option<Worker>>;

    /// Returns workers holding `role`, in directory order.
    async fn list_by_role(&self, role: Role) -> DirectoryResult<Vec<Worker>> {
        let workers = self.list_workers().await?;
        Ok(workers
            .into_iter()
            .filter(|worker| worker.role() == role)
            .collect())
    }
}

/// Errors returned by worker directory implementations.
#[derive(Debug, Clone, Error)]
pub enum DirectoryError {
    /// The backing service failed.
    #[error("worker directory unavailable: {0}")]
    Unavailable(Arc<dyn std::error::Error + Send + Sync>),
}

impl DirectoryError {
    /// Wraps a backing-service error.
    pub fn unavailable(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Unavailable(Arc::new(err))
    }
}
