//! Completed-task counter reconciliation.

use std::sync::Arc;

use crate::workflow::{
    domain::{TaskStatus, WorkerId},
    ports::ProductivityLedger,
};

use super::WorkflowResult;

/// Counter change implied by a status transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterDelta {
    /// The task entered `completed`.
    Increment,
    /// The task left `completed`.
    Decrement,
    /// Neither side of the transition is `completed`, or both are.
    Unchanged,
}

impl CounterDelta {
    /// Returns the signed change to the counter.
    #[must_use]
    pub const fn as_i64(self) -> i64 {
        match self {
            Self::Increment => 1,
            Self::Decrement => -1,
            Self::Unchanged => 0,
        }
    }
}

/// Returns the counter change for a move from `previous` to `next`.
#[must_use]
pub fn counter_delta(previous: TaskStatus, next: TaskStatus) -> CounterDelta {
    match (previous == TaskStatus::Completed, next == TaskStatus::Completed) {
        (false, true) => CounterDelta::Increment,
        (true, false) => CounterDelta::Decrement,
        _ => CounterDelta::Unchanged,
    }
}

/// Applies counter changes to the productivity ledger.
///
/// Must only be driven by the transition path that committed the status
/// write; change-feed echoes never reach it.
pub struct ProductivityReconciler<L>
where
    L: ProductivityLedger,
{
    ledger: Arc<L>,
}

impl<L> ProductivityReconciler<L>
where
    L: ProductivityLedger,
{
    /// Creates a reconciler over the ledger.
    #[must_use]
    pub const fn new(ledger: Arc<L>) -> Self {
        Self { ledger }
    }

    /// Adjusts the worker's counter for one committed transition.
    ///
    /// # Errors
    ///
    /// Returns [`super::WorkflowError::CollaboratorUnavailable`] when the
    /// ledger write fails.
    pub async fn reconcile(
        &self,
        previous: TaskStatus,
        next: TaskStatus,
        worker_id: &WorkerId,
    ) -> WorkflowResult<CounterDelta> {
        let delta = counter_delta(previous, next);
        let count = match delta {
            CounterDelta::Increment => self.ledger.increment(worker_id).await?,
            CounterDelta::Decrement => self.ledger.decrement(worker_id).await?,
            CounterDelta::Unchanged => return Ok(delta),
        };
        tracing::debug!(%worker_id, ?delta, count, "productivity counter adjusted");
        Ok(delta)
    }

    /// Moves the credit for a completed task from `from` to `to`.
    ///
    /// Returns `false` without touching the ledger when the task is not
    /// completed or the assignee is unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`super::WorkflowError::CollaboratorUnavailable`] when either
    /// ledger write fails.
    pub async fn transfer_credit(
        &self,
        status: TaskStatus,
        from: &WorkerId,
        to: &WorkerId,
    ) -> WorkflowResult<bool> {
        if status != TaskStatus::Completed || from == to {
            return Ok(false);
        }
        self.ledger.decrement(from).await?;
        self.ledger.increment(to).await?;
        tracing::debug!(%from, %to, "completion credit moved with reassignment");
        Ok(true)
    }
}
