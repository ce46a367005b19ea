//! Given steps for order chain BDD scenarios.

use super::world::{OrderChainWorld, run_async};
use chrono::{Duration, Utc};
use eyre::WrapErr;
use orderflow::workflow::{
    domain::{Role, TaskStatus, TaskType, WorkerId},
    services::{AssigneeChoice, CreateTaskRequest},
};
use rstest_bdd_macros::given;

fn hire_core_staff(world: &OrderChainWorld) -> Result<(), eyre::Report> {
    world.hire("mia", "Mia Manager", Role::Manager)?;
    world.hire("pete", "Pete Printer", Role::PrintingTechnician)
}

#[given("a print shop with a delivery supervisor")]
fn shop_with_supervisor(world: &mut OrderChainWorld) -> Result<(), eyre::Report> {
    hire_core_staff(world)?;
    world.hire("dave", "Dave Driver", Role::DeliverySupervisor)
}

#[given("a print shop without a delivery supervisor")]
fn shop_without_supervisor(world: &mut OrderChainWorld) -> Result<(), eyre::Report> {
    hire_core_staff(world)
}

#[given(r#"a {stage} task "{title}" assigned to "{worker}""#)]
fn task_assigned_to(
    world: &mut OrderChainWorld,
    stage: String,
    title: String,
    worker: String,
) -> Result<(), eyre::Report> {
    let task_type = TaskType::try_from(stage.as_str())
        .map_err(|err| eyre::eyre!("invalid stage in scenario: {err}"))?;
    let manager = world.actor("mia")?;
    let due_date = (Utc::now() + Duration::days(3)).date_naive();
    let request = CreateTaskRequest::new(
        title,
        AssigneeChoice::Worker(WorkerId::new(worker)?),
        due_date,
    )
    .with_task_type(task_type);
    let created = run_async(world.service.create_task(&manager, request))
        .wrap_err("create task for order chain scenario")?;
    world.current_task = Some(created);
    Ok(())
}

#[given(r#""{worker}" has moved the task to "{status}""#)]
fn task_has_been_moved(
    world: &mut OrderChainWorld,
    worker: String,
    status: String,
) -> Result<(), eyre::Report> {
    let target = TaskStatus::try_from(status.as_str())
        .map_err(|err| eyre::eyre!("invalid status in scenario: {err}"))?;
    let actor = world.actor(&worker)?;
    let task_id = world.current()?.id();
    let outcome = run_async(world.service.apply_transition(&actor, task_id, target))
        .wrap_err("transition task in scenario setup")?;
    if let Some(task) = outcome.task() {
        world.current_task = Some(task.clone());
    }
    Ok(())
}
