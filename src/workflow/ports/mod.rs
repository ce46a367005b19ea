//! Port contracts for the order workflow.
//!
//! Ports define infrastructure-agnostic interfaces used by workflow services.

pub mod directory;
pub mod ledger;
pub mod store;

pub use directory::{DirectoryError, DirectoryResult, WorkerDirectory};
pub use ledger::{LedgerError, LedgerResult, ProductivityLedger};
pub use store::{
    ChangeEvent, ChangeKind, TaskFilter, TaskOrder, TaskStore, TaskStoreError, TaskStoreResult,
};
