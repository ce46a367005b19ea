//! Orders moving through design, printing, and delivery.

use super::helpers::{Shop, acting_as, id, order_due_date, shop};
use chrono::Duration;
use orderflow::workflow::{
    domain::{Priority, TaskId, TaskStatus, TaskType},
    ports::{ProductivityLedger, TaskFilter, TaskStore},
    services::{
        AssigneeChoice, CreateTaskRequest, HandoffOutcome, NextStageRequest, TransitionOutcome,
    },
};
use rstest::rstest;

async fn advance(shop: &Shop, by: &str, task_id: TaskId, status: TaskStatus) -> TransitionOutcome {
    shop.clock.advance(Duration::minutes(5));
    shop.service
        .apply_transition(&acting_as(by), task_id, status)
        .await
        .expect("transition should succeed")
}

async fn completed(shop: &Shop, worker: &str) -> u64 {
    shop.ledger
        .completed_count(&id(worker))
        .await
        .expect("ledger should answer")
}

async fn deliveries_for(shop: &Shop, source: TaskId) -> usize {
    shop.store
        .list(&TaskFilter::all().with_parent(source).of_type(TaskType::Delivery))
        .await
        .expect("listing should succeed")
        .len()
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn order_flows_from_design_to_delivery(shop: Shop) {
    let design = shop
        .service
        .create_task(
            &acting_as("mia"),
            CreateTaskRequest::new("Cafe menu board", AssigneeChoice::Worker(id("dana")), order_due_date())
                .with_task_type(TaskType::Designing)
                .with_order_number("ORD-7")
                .with_priority(Priority::High)
                .with_customer_contact("cafe@example.com"),
        )
        .await
        .expect("design task should be created");
    advance(&shop, "dana", design.id(), TaskStatus::InProgress).await;
    advance(&shop, "dana", design.id(), TaskStatus::Completed).await;

    let printing = shop
        .service
        .assign_next_stage(
            &acting_as("dana"),
            NextStageRequest::new(design.id(), id("pete")).with_printing_type("large format"),
        )
        .await
        .expect("hand-off to printing should succeed");
    let printed = advance(&shop, "pete", printing.id(), TaskStatus::Completed).await;
    let TransitionOutcome::Applied(report) = printed else {
        panic!("printing completion should apply");
    };
    let HandoffOutcome::Created(delivery) = report.handoff else {
        panic!("delivery should be created automatically");
    };

    let chain = shop
        .service
        .trace_provenance(delivery.id())
        .await
        .expect("provenance should trace");
    advance(&shop, "dave", delivery.id(), TaskStatus::Completed).await;
    let confirmed = advance(&shop, "dave", delivery.id(), TaskStatus::Delivered).await;

    assert_eq!(delivery.assignee_id().as_str(), "dave");
    assert_eq!(delivery.order_number(), Some("ORD-7"));
    assert_eq!(delivery.customer_contact(), Some("cafe@example.com"));
    assert_eq!(delivery.priority(), Priority::High);
    assert_eq!(delivery.original_order_id(), Some(design.id()));
    assert_eq!(chain.links().len(), 3);
    assert_eq!(chain.designer().map(|w| w.as_str()), Some("dana"));
    assert_eq!(chain.printer().map(|w| w.as_str()), Some("pete"));
    assert_eq!(confirmed, TransitionOutcome::Deleted(delivery.id()));
    assert_eq!(
        (
            completed(&shop, "dana").await,
            completed(&shop, "pete").await,
            completed(&shop, "dave").await,
        ),
        (1, 1, 1)
    );
    let remaining = shop
        .store
        .list(&TaskFilter::all())
        .await
        .expect("listing should succeed");
    assert_eq!(remaining.len(), 2);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn automatic_assignment_spreads_work(shop: Shop) {
    let manager = acting_as("mia");
    let mut assignees = Vec::new();
    for n in 1..=4 {
        let task = shop
            .service
            .create_task(
                &manager,
                CreateTaskRequest::new(format!("Flyer batch {n}"), AssigneeChoice::Automatic, order_due_date())
                    .with_task_type(TaskType::Printing),
            )
            .await
            .expect("automatic creation should succeed");
        assignees.push(task.assignee_id().as_str().to_owned());
    }

    assert_eq!(assignees, ["paula", "pete", "paula", "pete"]);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn concurrent_completion_counts_once(shop: Shop) {
    let task = shop
        .service
        .create_task(
            &acting_as("mia"),
            CreateTaskRequest::new("Window decals", AssigneeChoice::Worker(id("pete")), order_due_date())
                .with_task_type(TaskType::Printing),
        )
        .await
        .expect("task should be created");
    let printer = acting_as("pete");

    let (first, second) = tokio::join!(
        shop.service.apply_transition(&printer, task.id(), TaskStatus::Completed),
        shop.service.apply_transition(&printer, task.id(), TaskStatus::Completed),
    );

    let outcomes = [
        first.expect("first completion should succeed"),
        second.expect("second completion should succeed"),
    ];
    let applied = outcomes
        .iter()
        .filter(|outcome| matches!(outcome, TransitionOutcome::Applied(_)))
        .count();
    assert_eq!(applied, 1);
    assert_eq!(completed(&shop, "pete").await, 1);
    assert_eq!(deliveries_for(&shop, task.id()).await, 1);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn reopened_printing_keeps_one_delivery(shop: Shop) {
    let task = shop
        .service
        .create_task(
            &acting_as("mia"),
            CreateTaskRequest::new("Shop sign", AssigneeChoice::Worker(id("paula")), order_due_date())
                .with_task_type(TaskType::Printing),
        )
        .await
        .expect("task should be created");

    advance(&shop, "paula", task.id(), TaskStatus::Completed).await;
    advance(&shop, "paula", task.id(), TaskStatus::InProgress).await;
    let again = advance(&shop, "paula", task.id(), TaskStatus::Completed).await;

    let TransitionOutcome::Applied(report) = again else {
        panic!("second completion should apply");
    };
    assert!(matches!(report.handoff, HandoffOutcome::AlreadyProgressed(_)));
    assert_eq!(completed(&shop, "paula").await, 1);
    assert_eq!(deliveries_for(&shop, task.id()).await, 1);
}
