//! Given/when steps for readiness wait scenarios.

use std::sync::Arc;
use std::time::Duration;

use harbor::engine::Engine;
use harbor::error::{HarborError, WaitError};
use harbor::model::{Container, ContainerStatus};
use harbor::wait::{CancelToken, LogContains, WaitCondition, WaitOptions, running};
use rstest_bdd_macros::{given, when};

use super::StepResult;
use super::state::{WaitOutcome, WaitState};
use crate::support::{FakeRuntime, inspect_json};

pub(crate) fn runtime(wait_state: &WaitState) -> StepResult<Arc<FakeRuntime>> {
    wait_state
        .runtime
        .get()
        .ok_or_else(|| String::from("runtime should be configured"))
}

#[given("container {id} reports statuses {statuses}")]
fn given_statuses(wait_state: &WaitState, id: String, statuses: String) -> StepResult<()> {
    let fake = runtime(wait_state)?;
    for status in statuses.split(',') {
        fake.succeed("inspect", &inspect_json(&id, "service", status.trim()));
    }
    wait_state.container_id.set(id);
    Ok(())
}

#[given("the container logs show {needle} on the second check")]
fn given_logs_show_late(wait_state: &WaitState, needle: String) -> StepResult<()> {
    let fake = runtime(wait_state)?;
    fake.succeed("logs", "booting\n");
    fake.succeed("logs", &format!("booting\n{needle}\n"));
    Ok(())
}

#[given("a poll interval of {interval} ms and a timeout of {timeout} ms")]
fn given_bounds(wait_state: &WaitState, interval: u64, timeout: u64) {
    wait_state.options.set(WaitOptions::new(
        Duration::from_millis(interval),
        Duration::from_millis(timeout),
    ));
}

#[given("the wait is cancelled before it starts")]
fn given_cancelled(wait_state: &WaitState) {
    let token = CancelToken::new();
    token.cancel();
    wait_state.cancel.set(token);
}

fn wait_with<C>(wait_state: &WaitState, condition: C) -> StepResult<()>
where
    for<'a> C: WaitCondition<&'a FakeRuntime>,
{
    let fake = runtime(wait_state)?;
    let id = wait_state
        .container_id
        .get()
        .ok_or_else(|| String::from("container id should be set"))?;
    let mut options = wait_state
        .options
        .get()
        .ok_or_else(|| String::from("wait options should be set"))?;
    if let Some(token) = wait_state.cancel.get() {
        options = options.with_cancel(token);
    }

    let engine = Engine::new(fake.as_ref(), "docker");
    let container = Container::new(id, "service", ContainerStatus::Created, "alpine:3.20");
    let outcome = match engine.wait_for(&container, condition, &options) {
        Ok(readiness) => WaitOutcome::Ready {
            attempts: readiness.attempts,
        },
        Err(HarborError::Wait(WaitError::TimedOut(timeout))) => WaitOutcome::TimedOut {
            last_status: timeout.last_status,
        },
        Err(HarborError::Wait(WaitError::Cancelled { .. })) => WaitOutcome::Cancelled,
        Err(error) => WaitOutcome::Failed(error.to_string()),
    };
    wait_state.outcome.set(outcome);
    Ok(())
}

#[when("waiting for the container to run")]
fn when_waiting_for_running(wait_state: &WaitState) -> StepResult<()> {
    wait_with(wait_state, running())
}

#[when("waiting for the log line {needle}")]
fn when_waiting_for_log(wait_state: &WaitState, needle: String) -> StepResult<()> {
    wait_with(wait_state, LogContains::new(needle))
}
