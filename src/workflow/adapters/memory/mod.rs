//! In-memory adapters for tests and embedding.

mod directory;
mod ledger;
mod store;

pub use directory::InMemoryWorkerDirectory;
pub use ledger::InMemoryProductivityLedger;
pub use store::InMemoryTaskStore;
