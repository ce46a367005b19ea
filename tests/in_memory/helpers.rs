//! Shared fixtures for in-memory integration tests.

use chrono::{DateTime, Duration, Local, NaiveDate, TimeZone, Utc};
use mockable::Clock;
use orderflow::workflow::{
    adapters::memory::{InMemoryProductivityLedger, InMemoryTaskStore, InMemoryWorkerDirectory},
    domain::{Actor, Role, Worker, WorkerId},
    services::WorkflowService,
};
use rstest::fixture;
use std::sync::{Arc, Mutex, PoisonError};

/// Clock that only moves when a test moves it.
#[derive(Debug)]
pub struct SteppedClock {
    now: Mutex<DateTime<Utc>>,
}

impl SteppedClock {
    /// Creates a clock stopped at `now`.
    #[must_use]
    pub const fn at(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    /// Moves the clock forward.
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now += by;
    }
}

impl Clock for SteppedClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Monday morning in the print shop.
#[must_use]
pub fn opening_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 2, 8, 30, 0)
        .single()
        .expect("fixed instant should be valid")
}

/// Due date used by every order in these tests.
#[must_use]
pub fn order_due_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 4).expect("fixed date should be valid")
}

/// Parses a fixture worker id.
#[must_use]
pub fn id(value: &str) -> WorkerId {
    WorkerId::new(value).expect("worker id should be valid")
}

/// One worker per role, two printers.
#[must_use]
pub fn shop_roster() -> Vec<Worker> {
    vec![
        Worker::new(id("mia"), "Mia Manager", Role::Manager),
        Worker::new(id("dana"), "Dana Designer", Role::GraphicDesigner),
        Worker::new(id("pete"), "Pete Printer", Role::PrintingTechnician),
        Worker::new(id("paula"), "Paula Printer", Role::PrintingTechnician),
        Worker::new(id("dave"), "Dave Driver", Role::DeliverySupervisor),
    ]
}

/// Returns the acting identity of a rostered worker.
#[must_use]
pub fn acting_as(worker_id: &str) -> Actor {
    shop_roster()
        .iter()
        .find(|worker| worker.id().as_str() == worker_id)
        .map(Actor::from)
        .expect("roster should hold the worker")
}

/// Workflow service over in-memory adapters.
pub type ShopService = WorkflowService<
    InMemoryTaskStore,
    InMemoryWorkerDirectory,
    InMemoryProductivityLedger,
    SteppedClock,
>;

/// In-memory print shop with handles on every collaborator.
pub struct Shop {
    pub store: Arc<InMemoryTaskStore>,
    pub directory: Arc<InMemoryWorkerDirectory>,
    pub ledger: Arc<InMemoryProductivityLedger>,
    pub clock: Arc<SteppedClock>,
    pub service: ShopService,
}

/// Provides a fresh print shop for each test.
#[fixture]
pub fn shop() -> Shop {
    let store = Arc::new(InMemoryTaskStore::new());
    let directory = Arc::new(InMemoryWorkerDirectory::with_workers(shop_roster()));
    let ledger = Arc::new(InMemoryProductivityLedger::new());
    let clock = Arc::new(SteppedClock::at(opening_time()));
    let service = WorkflowService::new(
        Arc::clone(&store),
        Arc::clone(&directory),
        Arc::clone(&ledger),
        Arc::clone(&clock),
    );
    Shop {
        store,
        directory,
        ledger,
        clock,
        service,
    }
}
