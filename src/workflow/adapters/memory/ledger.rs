//! In-memory productivity ledger.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::workflow::{
    domain::WorkerId,
    ports::{LedgerError, LedgerResult, ProductivityLedger},
};

/// Thread-safe in-memory completed-task counters.
#[derive(Debug, Clone, Default)]
pub struct InMemoryProductivityLedger {
    counts: Arc<RwLock<HashMap<WorkerId, u64>>>,
}

impl InMemoryProductivityLedger {
    /// Creates a ledger with every counter at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn adjust(&self, worker_id: &WorkerId, step: impl FnOnce(u64) -> u64) -> LedgerResult<u64> {
        let mut counts = self
            .counts
            .write()
            .map_err(|err| LedgerError::unavailable(std::io::Error::other(err.to_string())))?;
        let count = counts.entry(worker_id.clone()).or_default();
        *count = step(*count);
        Ok(*count)
    }
}

#[async_trait]
impl ProductivityLedger for InMemoryProductivityLedger {
    async fn increment(&self, worker_id: &WorkerId) -> LedgerResult<u64> {
        self.adjust(worker_id, |count| count.saturating_add(1))
    }

    async fn decrement(&self, worker_id: &WorkerId) -> LedgerResult<u64> {
        self.adjust(worker_id, |count| count.saturating_sub(1))
    }

    async fn completed_count(&self, worker_id: &WorkerId) -> LedgerResult<u64> {
        let counts = self
            .counts
            .read()
            .map_err(|err| LedgerError::unavailable(std::io::Error::other(err.to_string())))?;
        Ok(counts.get(worker_id).copied().unwrap_or_default())
    }
}
