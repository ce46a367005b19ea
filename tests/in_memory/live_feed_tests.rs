//! Store changes reaching a viewer's notification sink through a live feed.

use super::helpers::{Shop, acting_as, id, order_due_date, shop};
use chrono::{Duration, NaiveDate};
use orderflow::notification::{
    adapters::memory::RecordingSink,
    domain::{NotificationKind, NotificationSignal},
    services::{
        DEFAULT_DEDUPE_WINDOW_SECS, EventNormalizer, FeedSettings, LiveFeed, LiveFeedHandle,
        NotificationDispatcher, NotificationTemplates,
    },
};
use orderflow::workflow::{
    domain::{Role, Task, TaskStatus, TaskType, Worker},
    ports::ChangeEvent,
    services::{AssigneeChoice, CreateTaskRequest, HandoffOutcome, TransitionOutcome},
};
use rstest::rstest;
use std::sync::Arc;
use std::time::Duration as StdDuration;

const WAIT_LIMIT: StdDuration = StdDuration::from_secs(5);

/// Starts a session for `viewer` once an overdue marker task exists, and
/// returns after the seeding reload has reached the sink.
async fn start_session(shop: &Shop, viewer: &str) -> (LiveFeedHandle, Arc<RecordingSink>, Task) {
    let marker = shop
        .service
        .create_task(
            &acting_as("mia"),
            CreateTaskRequest::new(
                "Restock paper",
                AssigneeChoice::Worker(id(viewer)),
                NaiveDate::from_ymd_opt(2026, 3, 1).expect("fixed date should be valid"),
            ),
        )
        .await
        .expect("marker task should be created");
    let sink = Arc::new(RecordingSink::new());
    let dispatcher = NotificationDispatcher::new(
        EventNormalizer::new(
            acting_as(viewer),
            NotificationTemplates::default(),
            Duration::seconds(DEFAULT_DEDUPE_WINDOW_SECS),
        ),
        shop.service.workload(),
        Arc::clone(&sink),
        Arc::clone(&shop.clock),
    );
    let handle = LiveFeed::spawn(
        Arc::clone(&shop.store),
        dispatcher,
        FeedSettings {
            queue_capacity: 16,
            reload_interval: StdDuration::from_secs(3600),
        },
    );
    wait_for(&sink, "seeding reload", |signals| !signals.is_empty()).await;
    (handle, sink, marker)
}

async fn wait_for(
    sink: &RecordingSink,
    what: &str,
    ready: impl Fn(&[NotificationSignal]) -> bool,
) {
    let polled = tokio::time::timeout(WAIT_LIMIT, async {
        loop {
            let signals = sink.signals().expect("sink log should be readable");
            if ready(&signals) {
                break;
            }
            tokio::time::sleep(StdDuration::from_millis(10)).await;
        }
    })
    .await;
    assert!(polled.is_ok(), "timed out waiting for {what}");
}

fn count(signals: &[NotificationSignal], task: &Task, kind: NotificationKind) -> usize {
    signals
        .iter()
        .filter(|signal| signal.task_id() == task.id() && signal.kind() == kind)
        .count()
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn seeding_reports_overdue_work_but_not_old_assignments(shop: Shop) {
    let (handle, sink, marker) = start_session(&shop, "pete").await;

    handle.shutdown().await.expect("feed should stop cleanly");

    let signals = sink.signals().expect("sink log should be readable");
    assert_eq!(signals.len(), 1);
    assert_eq!(count(&signals, &marker, NotificationKind::Overdue), 1);
    assert_eq!(count(&signals, &marker, NotificationKind::NewTask), 0);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn redelivered_assignment_alerts_once(shop: Shop) {
    let (handle, sink, marker) = start_session(&shop, "pete").await;
    let task = shop
        .service
        .create_task(
            &acting_as("mia"),
            CreateTaskRequest::new("Poster run", AssigneeChoice::Worker(id("pete")), order_due_date())
                .with_task_type(TaskType::Printing),
        )
        .await
        .expect("task should be created");
    wait_for(&sink, "new task alert", |signals| {
        count(signals, &task, NotificationKind::NewTask) == 1
    })
    .await;

    shop.store.publish(ChangeEvent::insert(task.clone()));
    shop.clock.advance(Duration::minutes(1));
    shop.service
        .apply_transition(&acting_as("pete"), marker.id(), TaskStatus::Completed)
        .await
        .expect("marker should complete");
    wait_for(&sink, "overdue retraction", |signals| {
        signals.iter().any(|signal| {
            matches!(signal, NotificationSignal::Retract { task_id, .. } if *task_id == marker.id())
        })
    })
    .await;
    handle.shutdown().await.expect("feed should stop cleanly");

    let signals = sink.signals().expect("sink log should be readable");
    assert_eq!(count(&signals, &task, NotificationKind::NewTask), 1);
    let outstanding = sink.outstanding().expect("sink should be readable");
    assert_eq!(outstanding.len(), 1);
    assert_eq!(outstanding.first().map(|alert| alert.task_id()), Some(task.id()));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn confirmed_delivery_withdraws_the_alert(shop: Shop) {
    let (handle, sink, _marker) = start_session(&shop, "dave").await;
    let printing = shop
        .service
        .create_task(
            &acting_as("mia"),
            CreateTaskRequest::new("Banner", AssigneeChoice::Worker(id("pete")), order_due_date())
                .with_task_type(TaskType::Printing),
        )
        .await
        .expect("printing task should be created");
    let outcome = shop
        .service
        .apply_transition(&acting_as("pete"), printing.id(), TaskStatus::Completed)
        .await
        .expect("printing should complete");
    let TransitionOutcome::Applied(report) = outcome else {
        panic!("printing completion should apply");
    };
    let HandoffOutcome::Created(delivery) = report.handoff else {
        panic!("delivery should be created");
    };
    wait_for(&sink, "delivery alert", |signals| {
        count(signals, &delivery, NotificationKind::NewTask) == 1
    })
    .await;

    let supervisor = acting_as("dave");
    shop.service
        .apply_transition(&supervisor, delivery.id(), TaskStatus::Completed)
        .await
        .expect("delivery should complete");
    shop.service
        .apply_transition(&supervisor, delivery.id(), TaskStatus::Delivered)
        .await
        .expect("delivery should be confirmed");
    wait_for(&sink, "delivery retraction", |signals| {
        signals.iter().any(|signal| {
            matches!(signal, NotificationSignal::Retract { task_id, .. } if *task_id == delivery.id())
        })
    })
    .await;
    handle.shutdown().await.expect("feed should stop cleanly");

    assert_eq!(
        count(
            &sink.signals().expect("sink log should be readable"),
            &printing,
            NotificationKind::NewTask
        ),
        0
    );
    assert_eq!(shop.service.workload().open_count_for(&id("dave")), 1);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn supervisor_hears_about_new_roster_members(shop: Shop) {
    let (handle, sink, _marker) = start_session(&shop, "mia").await;
    shop.directory
        .upsert(Worker::new(id("dina"), "Dina Driver", Role::DeliverySupervisor))
        .expect("directory should accept the worker");
    let task = shop
        .service
        .create_task(
            &acting_as("mia"),
            CreateTaskRequest::new("Van run", AssigneeChoice::Worker(id("dina")), order_due_date())
                .with_task_type(TaskType::Delivery),
        )
        .await
        .expect("task for new worker should be created");

    handle.request_reload();
    wait_for(&sink, "supervisor alert", |signals| {
        count(signals, &task, NotificationKind::NewTask) == 1
    })
    .await;
    handle.shutdown().await.expect("feed should stop cleanly");

    assert_eq!(shop.service.workload().open_count_for(&id("dina")), 1);
}
