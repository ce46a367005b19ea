//! Ledger port for the per-worker completed-task counter.

use crate::workflow::domain::WorkerId;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for productivity ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Persistent per-worker count of completed tasks.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProductivityLedger: Send + Sync {
    /// Adds one completed task to the worker's count and returns the new
    /// value.
    async fn increment(&self, worker_id: &WorkerId) -> LedgerResult<u64>;

    /// Removes one completed task from the worker's count and returns the new
    /// value. The count never drops below zero.
    async fn decrement(&self, worker_id: &WorkerId) -> LedgerResult<u64>;

    /// Returns the worker's current count.
    async fn completed_count(&self, worker_id: &WorkerId) -> LedgerResult<u64>;
}

/// Errors returned by productivity ledger implementations.
#[derive(Debug, Clone, Error)]
pub enum LedgerError {
    /// The backing service failed.
    #[error("productivity ledger unavailable: {0}")]
    Unavailable(Arc<dyn std::error::Error + Send + Sync>),
}

impl LedgerError {
    /// Wraps a backing-service error.
    pub fn unavailable(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Unavailable(Arc::new(err))
    }
}
