//! Then steps for order chain BDD scenarios.

use super::world::{OrderChainWorld, run_async};
use orderflow::workflow::{
    domain::{TaskStatus, TaskType, WorkerId},
    ports::{ProductivityLedger, TaskFilter, TaskStore},
    services::{HandoffOutcome, TransitionOutcome, WorkflowError},
};
use rstest_bdd_macros::then;

fn last_outcome(world: &OrderChainWorld) -> Result<&TransitionOutcome, eyre::Report> {
    match world.last_transition.as_ref() {
        Some(Ok(outcome)) => Ok(outcome),
        Some(Err(err)) => Err(eyre::eyre!("transition failed unexpectedly: {err}")),
        None => Err(eyre::eyre!("missing transition result")),
    }
}

#[then(r#"a delivery task is assigned to "{worker}""#)]
fn delivery_assigned_to(world: &OrderChainWorld, worker: String) -> Result<(), eyre::Report> {
    let TransitionOutcome::Applied(report) = last_outcome(world)? else {
        return Err(eyre::eyre!("expected an applied transition"));
    };
    let HandoffOutcome::Created(delivery) = &report.handoff else {
        return Err(eyre::eyre!("expected a delivery task, got {:?}", report.handoff));
    };
    let source = world.current()?;

    eyre::ensure!(
        delivery.assignee_id().as_str() == worker,
        "expected delivery for {worker}, found {}",
        delivery.assignee_id()
    );
    eyre::ensure!(
        delivery.parent_task_id() == Some(source.id()),
        "delivery task is not linked to its printing task"
    );
    eyre::ensure!(
        delivery.title() == format!("Delivery: {}", source.title()),
        "unexpected delivery title {}",
        delivery.title()
    );
    Ok(())
}

#[then("no delivery task exists")]
fn no_delivery_task(world: &OrderChainWorld) -> Result<(), eyre::Report> {
    let deliveries = run_async(
        world
            .store
            .list(&TaskFilter::all().of_type(TaskType::Delivery)),
    )?;
    eyre::ensure!(
        deliveries.is_empty(),
        "expected no delivery task, found {}",
        deliveries.len()
    );
    Ok(())
}

#[then(r#"the task status is "{status}""#)]
fn task_status_is(world: &OrderChainWorld, status: String) -> Result<(), eyre::Report> {
    let expected = TaskStatus::try_from(status.as_str())
        .map_err(|err| eyre::eyre!("invalid expected status in scenario: {err}"))?;
    let task_id = world.current()?.id();
    let stored = run_async(world.store.get(task_id))?
        .ok_or_else(|| eyre::eyre!("task {task_id} is missing from the store"))?;

    eyre::ensure!(
        stored.status() == expected,
        "expected status {expected}, found {}",
        stored.status()
    );
    Ok(())
}

#[then("the transition is rejected as illegal")]
fn transition_rejected(world: &OrderChainWorld) -> Result<(), eyre::Report> {
    let result = world
        .last_transition
        .as_ref()
        .ok_or_else(|| eyre::eyre!("missing transition result"))?;

    if !matches!(result, Err(WorkflowError::IllegalTransition { .. })) {
        return Err(eyre::eyre!(
            "expected IllegalTransition error, got {result:?}"
        ));
    }
    Ok(())
}

#[then("the task no longer exists")]
fn task_is_gone(world: &OrderChainWorld) -> Result<(), eyre::Report> {
    let outcome = last_outcome(world)?;
    let task_id = world.current()?.id();

    eyre::ensure!(
        *outcome == TransitionOutcome::Deleted(task_id),
        "expected the task to be consumed, got {outcome:?}"
    );
    eyre::ensure!(
        run_async(world.store.get(task_id))?.is_none(),
        "task {task_id} is still stored"
    );
    Ok(())
}

#[then(r#""{worker}" has {count:u64} completed tasks"#)]
fn completed_count_is(
    world: &OrderChainWorld,
    worker: String,
    count: u64,
) -> Result<(), eyre::Report> {
    let worker_id = WorkerId::new(worker)?;
    let recorded = run_async(world.ledger.completed_count(&worker_id))?;

    eyre::ensure!(
        recorded == count,
        "expected {count} completed tasks for {worker_id}, found {recorded}"
    );
    Ok(())
}
