//! Unit tests for worker selection and the creation gate.

use chrono::Duration;
use mockable::Clock;
use rstest::{fixture, rstest};
use std::sync::Arc;

use super::support::{ManualClock, actor, roster, start, task_for, worker, worker_id};
use crate::workflow::{
    adapters::memory::{InMemoryTaskStore, InMemoryWorkerDirectory},
    domain::{Role, TaskPatch, TaskStatus, TaskType, Worker},
    ports::TaskStore,
    services::{
        AssignmentOutcome, AssignmentResolver, TieBreak, WorkflowError, WorkloadIndex,
        authorize_creation, pick_least_loaded,
    },
};

type Resolver = AssignmentResolver<InMemoryTaskStore, InMemoryWorkerDirectory>;

struct Harness {
    store: Arc<InMemoryTaskStore>,
    resolver: Resolver,
    clock: ManualClock,
}

impl Harness {
    fn new(workers: Vec<Worker>, tie_break: TieBreak) -> Self {
        let store = Arc::new(InMemoryTaskStore::new());
        let directory = Arc::new(InMemoryWorkerDirectory::with_workers(workers));
        let workload = Arc::new(WorkloadIndex::new(
            Arc::clone(&store),
            Arc::clone(&directory),
            Duration::seconds(30),
        ));
        Self {
            store,
            resolver: AssignmentResolver::new(directory, workload, tie_break),
            clock: ManualClock::at(start()),
        }
    }

    async fn give(&self, assignee: &Worker, count: usize) {
        for _ in 0..count {
            self.store
                .create(task_for(Some(TaskType::Printing), assignee, &self.clock))
                .await
                .expect("seed task should be stored");
        }
    }
}

#[fixture]
fn harness() -> Harness {
    Harness::new(roster(), TieBreak::WorkerId)
}

#[rstest]
fn least_loaded_picks_the_smallest_count() {
    let a = worker("a", "A", Role::PrintingTechnician);
    let b = worker("b", "B", Role::PrintingTechnician);
    let c = worker("c", "C", Role::PrintingTechnician);

    let chosen = pick_least_loaded([(&a, 3), (&b, 1), (&c, 2)]);

    assert_eq!(chosen.map(Worker::id), Some(b.id()));
}

#[rstest]
fn least_loaded_tie_goes_to_first_candidate() {
    let a = worker("a", "A", Role::PrintingTechnician);
    let b = worker("b", "B", Role::PrintingTechnician);

    let chosen = pick_least_loaded([(&a, 2), (&b, 2)]);

    assert_eq!(chosen.map(Worker::id), Some(a.id()));
}

#[rstest]
fn least_loaded_of_nothing_is_none() {
    assert!(pick_least_loaded(std::iter::empty()).is_none());
}

#[rstest]
#[case(Role::Admin, Some(TaskType::Printing), "pete")]
#[case(Role::Manager, Some(TaskType::Delivery), "dave")]
#[case(Role::Manager, None, "pete")]
#[case(Role::GraphicDesigner, Some(TaskType::Designing), "self")]
fn creation_gate_allows(
    #[case] role: Role,
    #[case] task_type: Option<TaskType>,
    #[case] assignee: &str,
) {
    let creator = actor(&worker("self", "Creator", role));
    let assignee_id = worker_id(assignee);

    assert!(authorize_creation(&creator, task_type, Some(&assignee_id)).is_ok());
}

#[rstest]
#[case(Role::GraphicDesigner, Some(TaskType::Printing), Some("self"))]
#[case(Role::GraphicDesigner, Some(TaskType::Designing), Some("dora"))]
#[case(Role::GraphicDesigner, Some(TaskType::Designing), None)]
#[case(Role::GraphicDesigner, None, Some("self"))]
#[case(Role::PrintingTechnician, Some(TaskType::Printing), Some("self"))]
#[case(Role::DeliverySupervisor, Some(TaskType::Delivery), Some("self"))]
fn creation_gate_refuses(
    #[case] role: Role,
    #[case] task_type: Option<TaskType>,
    #[case] assignee: Option<&str>,
) {
    let creator = actor(&worker("self", "Creator", role));
    let assignee_id = assignee.map(worker_id);

    let result = authorize_creation(&creator, task_type, assignee_id.as_ref());

    assert!(matches!(result, Err(WorkflowError::NotPermitted { .. })));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn automatic_assignment_prefers_least_loaded(harness: Harness) {
    harness.give(&worker("paula", "Paula Printer", Role::PrintingTechnician), 2).await;
    harness.give(&worker("pete", "Pete Printer", Role::PrintingTechnician), 1).await;

    let outcome = harness
        .resolver
        .resolve_automatic(TaskType::Printing, harness.clock.utc())
        .await
        .expect("assignment should succeed");

    assert!(matches!(outcome, AssignmentOutcome::Assigned(ref chosen) if chosen.id().as_str() == "pete"));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn automatic_assignment_tie_breaks_on_worker_id(harness: Harness) {
    let outcome = harness
        .resolver
        .resolve_automatic(TaskType::Printing, harness.clock.utc())
        .await
        .expect("assignment should succeed");

    assert!(matches!(outcome, AssignmentOutcome::Assigned(ref chosen) if chosen.id().as_str() == "paula"));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn directory_order_tie_break_keeps_roster_order() {
    let harness = Harness::new(roster(), TieBreak::DirectoryOrder);

    let outcome = harness
        .resolver
        .resolve_automatic(TaskType::Printing, harness.clock.utc())
        .await
        .expect("assignment should succeed");

    assert!(matches!(outcome, AssignmentOutcome::Assigned(ref chosen) if chosen.id().as_str() == "pete"));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn closed_tasks_do_not_count_towards_load(harness: Harness) {
    let pete = worker("pete", "Pete Printer", Role::PrintingTechnician);
    let task = harness
        .store
        .create(task_for(Some(TaskType::Printing), &pete, &harness.clock))
        .await
        .expect("seed task should be stored");
    harness
        .store
        .update(
            task.id(),
            TaskPatch::status(TaskStatus::Completed, start()),
        )
        .await
        .expect("status should update");
    harness.give(&worker("paula", "Paula Printer", Role::PrintingTechnician), 1).await;

    let outcome = harness
        .resolver
        .resolve_automatic(TaskType::Printing, harness.clock.utc())
        .await
        .expect("assignment should succeed");

    assert!(matches!(outcome, AssignmentOutcome::Assigned(ref chosen) if chosen.id().as_str() == "pete"));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn empty_role_yields_no_eligible_worker() {
    let harness = Harness::new(
        vec![worker("pete", "Pete Printer", Role::PrintingTechnician)],
        TieBreak::WorkerId,
    );

    let outcome = harness
        .resolver
        .resolve_automatic(TaskType::Delivery, harness.clock.utc())
        .await
        .expect("lookup should succeed");

    assert_eq!(outcome, AssignmentOutcome::NoEligibleWorker(TaskType::Delivery));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn manual_assignment_rejects_wrong_role(harness: Harness) {
    let result = harness
        .resolver
        .resolve_manual(Some(TaskType::Printing), &worker_id("dana"))
        .await;

    assert!(matches!(result, Err(WorkflowError::InvalidAssignee { .. })));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn manual_assignment_rejects_unknown_worker(harness: Harness) {
    let result = harness
        .resolver
        .resolve_manual(Some(TaskType::Printing), &worker_id("ghost"))
        .await;

    assert!(matches!(result, Err(WorkflowError::InvalidAssignee { .. })));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn manual_assignment_of_ad_hoc_task_accepts_anyone(harness: Harness) {
    let chosen = harness
        .resolver
        .resolve_manual(None, &worker_id("dave"))
        .await
        .expect("anyone may own an ad-hoc task");

    assert_eq!(chosen.id().as_str(), "dave");
}
