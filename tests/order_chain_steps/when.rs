//! When steps for order chain BDD scenarios.

use super::world::{OrderChainWorld, run_async};
use orderflow::workflow::domain::TaskStatus;
use rstest_bdd_macros::when;

#[when(r#""{worker}" moves the task to "{status}""#)]
fn move_task(
    world: &mut OrderChainWorld,
    worker: String,
    status: String,
) -> Result<(), eyre::Report> {
    let target = TaskStatus::try_from(status.as_str())
        .map_err(|err| eyre::eyre!("invalid status in scenario: {err}"))?;
    let actor = world.actor(&worker)?;
    let task_id = world.current()?.id();

    let result = run_async(world.service.apply_transition(&actor, task_id, target));
    if let Ok(outcome) = &result
        && let Some(task) = outcome.task()
    {
        world.current_task = Some(task.clone());
    }
    world.last_transition = Some(result);
    Ok(())
}
