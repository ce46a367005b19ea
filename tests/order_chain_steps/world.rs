//! Shared world state for order chain BDD scenarios.

use std::sync::Arc;

use mockable::DefaultClock;
use orderflow::workflow::{
    adapters::memory::{InMemoryProductivityLedger, InMemoryTaskStore, InMemoryWorkerDirectory},
    domain::{Actor, Role, Task, Worker, WorkerId},
    ports::WorkerDirectory,
    services::{TransitionOutcome, WorkflowError, WorkflowService},
};
use rstest::fixture;

/// Service type used by the BDD world.
pub type TestWorkflowService = WorkflowService<
    InMemoryTaskStore,
    InMemoryWorkerDirectory,
    InMemoryProductivityLedger,
    DefaultClock,
>;

/// Scenario world for order chain behaviour tests.
pub struct OrderChainWorld {
    pub store: Arc<InMemoryTaskStore>,
    pub directory: Arc<InMemoryWorkerDirectory>,
    pub ledger: Arc<InMemoryProductivityLedger>,
    pub service: TestWorkflowService,
    pub current_task: Option<Task>,
    pub last_transition: Option<Result<TransitionOutcome, WorkflowError>>,
}

impl OrderChainWorld {
    /// Creates a world with an empty roster.
    #[must_use]
    pub fn new() -> Self {
        let store = Arc::new(InMemoryTaskStore::new());
        let directory = Arc::new(InMemoryWorkerDirectory::new());
        let ledger = Arc::new(InMemoryProductivityLedger::new());
        let service = WorkflowService::new(
            Arc::clone(&store),
            Arc::clone(&directory),
            Arc::clone(&ledger),
            Arc::new(DefaultClock),
        );

        Self {
            store,
            directory,
            ledger,
            service,
            current_task: None,
            last_transition: None,
        }
    }

    /// Adds a worker to the roster.
    ///
    /// # Errors
    ///
    /// Returns an error when the id is blank or the directory rejects it.
    pub fn hire(&self, id: &str, name: &str, role: Role) -> Result<(), eyre::Report> {
        let worker = Worker::new(WorkerId::new(id)?, name, role);
        self.directory.upsert(worker)?;
        Ok(())
    }

    /// Looks up the acting identity of a rostered worker.
    ///
    /// # Errors
    ///
    /// Returns an error when the worker is not on the roster.
    pub fn actor(&self, id: &str) -> Result<Actor, eyre::Report> {
        let worker_id = WorkerId::new(id)?;
        let worker = run_async(self.directory.find(&worker_id))?
            .ok_or_else(|| eyre::eyre!("worker {id} is not on the roster"))?;
        Ok(Actor::from(&worker))
    }

    /// Returns the task the scenario is following.
    ///
    /// # Errors
    ///
    /// Returns an error when no task was created yet.
    pub fn current(&self) -> Result<&Task, eyre::Report> {
        self.current_task
            .as_ref()
            .ok_or_else(|| eyre::eyre!("missing current task in scenario world"))
    }
}

impl Default for OrderChainWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixture that creates a new scenario world.
#[fixture]
pub fn world() -> OrderChainWorld {
    OrderChainWorld::default()
}

/// Runs an async operation within sync step definitions.
pub fn run_async<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}
