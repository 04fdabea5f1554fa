//! Given/when steps for engine verb scenarios.

use std::sync::Arc;

use harbor::engine::{Engine, ExecOptions, KillOptions, ListOptions, PullOptions, RemoveOptions};
use harbor::error::{HarborError, InputValidationError, ProcessError};
use harbor::model::{Container, ContainerStatus};
use rstest_bdd_macros::{given, when};

use super::StepResult;
use super::state::{VerbFailure, VerbOutcome, VerbState};
use crate::support::FakeRuntime;

pub(crate) fn runtime(verb_state: &VerbState) -> StepResult<Arc<FakeRuntime>> {
    verb_state
        .runtime
        .get()
        .ok_or_else(|| String::from("runtime should be configured"))
}

fn container(id: &str) -> Container {
    Container::new(id, "service", ContainerStatus::Running, "alpine:3.20")
}

/// Run `operation` against an engine over the scripted runtime and store
/// what it returned.
fn invoke<T, F, M>(verb_state: &VerbState, operation: F, into_outcome: M) -> StepResult<()>
where
    F: FnOnce(&Engine<&FakeRuntime>) -> harbor::error::Result<T>,
    M: FnOnce(T) -> VerbOutcome,
{
    let fake = runtime(verb_state)?;
    let engine = Engine::new(fake.as_ref(), "docker");
    let outcome = match operation(&engine) {
        Ok(value) => into_outcome(value),
        Err(HarborError::InputValidation(InputValidationError::UnknownSignal { .. })) => {
            VerbOutcome::Failed(VerbFailure::UnknownSignal)
        }
        Err(HarborError::Process(ProcessError::NonZeroExit { code, .. })) => {
            VerbOutcome::Failed(VerbFailure::NonZeroExit(code))
        }
        Err(error) => VerbOutcome::Failed(VerbFailure::Other(error.to_string())),
    };
    verb_state.outcome.set(outcome);
    Ok(())
}

#[given("the registry serves image {repository} with id {id}")]
fn given_registry_serves(verb_state: &VerbState, repository: String, id: String) -> StepResult<()> {
    let fake = runtime(verb_state)?;
    fake.succeed("pull", &format!("latest: Pulling from library/{repository}\n"));
    fake.succeed("image", &format!("{{\"Id\":\"{id}\"}}\n"));
    Ok(())
}

#[given("the runtime lists containers {first} and {second}")]
fn given_runtime_lists(verb_state: &VerbState, first: String, second: String) -> StepResult<()> {
    let listing = format!(
        concat!(
            r#"{{"ID":"aaa111","Names":"{first}","Image":"nginx:1.27","State":"running"}}"#,
            "\n",
            r#"{{"Id":"bbb222","Names":["{second}"],"Image":"postgres:16","State":"exited"}}"#,
            "\n"
        ),
        first = first,
        second = second,
    );
    runtime(verb_state)?.succeed("ps", &listing);
    Ok(())
}

#[given("the runtime refuses to remove running containers")]
fn given_remove_refused(verb_state: &VerbState) -> StepResult<()> {
    runtime(verb_state)?.fail(
        "rm",
        1,
        "Error response from daemon: cannot remove container: container is running",
    );
    Ok(())
}

#[given("commands in the container exit with status {code}")]
fn given_exec_exit(verb_state: &VerbState, code: i32) -> StepResult<()> {
    runtime(verb_state)?.reply("exec", code, "", "");
    Ok(())
}

#[when("the image {repository} is pulled")]
fn when_pulled(verb_state: &VerbState, repository: String) -> StepResult<()> {
    invoke(
        verb_state,
        |engine| engine.pull(&repository, &PullOptions::default()),
        VerbOutcome::Pulled,
    )
}

#[when("containers are listed")]
fn when_listed(verb_state: &VerbState) -> StepResult<()> {
    invoke(
        verb_state,
        |engine| engine.list_containers(&ListOptions { all: true }),
        VerbOutcome::Listed,
    )
}

#[when("container {id} is killed with {signal}")]
fn when_killed(verb_state: &VerbState, id: String, signal: String) -> StepResult<()> {
    invoke(
        verb_state,
        |engine| engine.kill(&container(&id), &KillOptions::signal(signal)),
        VerbOutcome::Acknowledged,
    )
}

#[when("container {id} is removed")]
fn when_removed(verb_state: &VerbState, id: String) -> StepResult<()> {
    invoke(
        verb_state,
        |engine| engine.remove(&container(&id), &RemoveOptions::default()),
        VerbOutcome::Acknowledged,
    )
}

#[when("{command} is executed in container {id}")]
fn when_executed(verb_state: &VerbState, command: String, id: String) -> StepResult<()> {
    invoke(
        verb_state,
        |engine| engine.exec(&container(&id), command.split_whitespace(), &ExecOptions::default()),
        |output| VerbOutcome::Executed(output.exit_code),
    )
}
