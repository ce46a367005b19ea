//! In-memory worker directory.

use async_trait::async_trait;
use std::sync::{Arc, RwLock};

use crate::workflow::{
    domain::{Worker, WorkerId},
    ports::{DirectoryError, DirectoryResult, WorkerDirectory},
};

/// Thread-safe in-memory worker directory preserving insertion order.
#[derive(Debug, Clone, Default)]
pub struct InMemoryWorkerDirectory {
    workers: Arc<RwLock<Vec<Worker>>>,
}

impl InMemoryWorkerDirectory {
    /// Creates an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a directory holding the given workers.
    #[must_use]
    pub fn with_workers(workers: impl IntoIterator<Item = Worker>) -> Self {
        Self {
            workers: Arc::new(RwLock::new(workers.into_iter().collect())),
        }
    }

    /// Adds or replaces a worker record.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError::Unavailable`] when the lock is poisoned.
    pub fn upsert(&self, worker: Worker) -> DirectoryResult<()> {
        let mut workers = self.workers.write().map_err(|err| {
            DirectoryError::unavailable(std::io::Error::other(err.to_string()))
        })?;
        match workers.iter_mut().find(|existing| existing.id() == worker.id()) {
            Some(existing) => *existing = worker,
            None => workers.push(worker),
        }
        Ok(())
    }
}

#[async_trait]
impl WorkerDirectory for InMemoryWorkerDirectory {
    async fn list_workers(&self) -> DirectoryResult<Vec<Worker>> {
        let workers = self.workers.read().map_err(|err| {
            DirectoryError::unavailable(std::io::Error::other(err.to_string()))
        })?;
        Ok(workers.clone())
    }

    async fn find(&self, worker_id: &WorkerId) -> DirectoryResult<Option<Worker>> {
        let workers = self.workers.read().map_err(|err| {
            DirectoryError::unavailable(std::io::Error::other(err.to_string()))
        })?;
        Ok(workers.iter().find(|worker| worker.id() == worker_id).cloned())
    }
}
