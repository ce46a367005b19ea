//! Shared fixtures for workflow unit tests.

use chrono::{DateTime, Duration, Local, NaiveDate, TimeZone, Utc};
use mockable::Clock;
use std::sync::{Mutex, PoisonError};

use crate::workflow::domain::{Actor, Role, Task, TaskDraft, TaskType, Worker, WorkerId};

/// Clock that only moves when a test moves it.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn at(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now += by;
    }
}

impl Clock for ManualClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

pub fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0)
        .single()
        .expect("fixed start instant should be valid")
}

pub fn due_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 5).expect("fixed due date should be valid")
}

pub fn worker_id(value: &str) -> WorkerId {
    WorkerId::new(value).expect("worker id should be valid")
}

pub fn worker(id: &str, name: &str, role: Role) -> Worker {
    Worker::new(worker_id(id), name, role)
}

pub fn actor(worker: &Worker) -> Actor {
    Actor::from(worker)
}

/// Two designers, two printers, one delivery supervisor, and two
/// supervisors.
pub fn roster() -> Vec<Worker> {
    vec![
        worker("admin", "Ada Admin", Role::Admin),
        worker("mia", "Mia Manager", Role::Manager),
        worker("dana", "Dana Designer", Role::GraphicDesigner),
        worker("dora", "Dora Designer", Role::GraphicDesigner),
        worker("pete", "Pete Printer", Role::PrintingTechnician),
        worker("paula", "Paula Printer", Role::PrintingTechnician),
        worker("dave", "Dave Driver", Role::DeliverySupervisor),
    ]
}

/// Builds a stored-shape task of `task_type` assigned to `assignee`.
pub fn task_for(
    task_type: Option<TaskType>,
    assignee: &Worker,
    clock: &impl Clock,
) -> Task {
    let mut draft = TaskDraft::new(
        "Shop banner",
        assignee.id().clone(),
        assignee.display_name(),
        worker_id("mia"),
        due_date(),
    );
    if let Some(stage) = task_type {
        draft = draft.with_task_type(stage);
    }
    Task::new(draft, clock).expect("fixture task should be valid")
}
