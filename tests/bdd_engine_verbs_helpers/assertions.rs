//! Assertion steps for engine verb scenarios.

use harbor::model::ContainerStatus;
use rstest_bdd_macros::then;

use super::StepResult;
use super::state::{VerbFailure, VerbOutcome, VerbState};
use super::steps::runtime;

fn outcome(verb_state: &VerbState) -> StepResult<VerbOutcome> {
    verb_state
        .outcome
        .get()
        .ok_or_else(|| String::from("outcome should be set"))
}

#[then("the pulled image is {reference} with id {id}")]
fn pulled_image_is(verb_state: &VerbState, reference: String, id: String) -> StepResult<()> {
    match outcome(verb_state)? {
        VerbOutcome::Pulled(image) if image.reference() == reference && image.id() == id => Ok(()),
        other => Err(format!("expected image {reference} ({id}), got {other:?}")),
    }
}

#[then("the runtime saw verbs {verbs}")]
fn runtime_saw_verbs(verb_state: &VerbState, verbs: String) -> StepResult<()> {
    let seen = runtime(verb_state)?.verbs().join(",");
    if seen == verbs {
        Ok(())
    } else {
        Err(format!("expected verbs {verbs}, got {seen}"))
    }
}

#[then("{count} containers are returned")]
fn containers_returned(verb_state: &VerbState, count: usize) -> StepResult<()> {
    match outcome(verb_state)? {
        VerbOutcome::Listed(containers) if containers.len() == count => Ok(()),
        other => Err(format!("expected {count} containers, got {other:?}")),
    }
}

#[then("container {name} is exited")]
fn container_is_exited(verb_state: &VerbState, name: String) -> StepResult<()> {
    let VerbOutcome::Listed(containers) = outcome(verb_state)? else {
        return Err(String::from("expected a container listing"));
    };
    let found = containers
        .iter()
        .find(|container| container.name() == name)
        .ok_or_else(|| format!("container {name} should be listed"))?;
    if found.status() == ContainerStatus::Exited {
        Ok(())
    } else {
        Err(format!("expected {name} to be exited, got {}", found.status()))
    }
}

#[then("the operation fails with an unknown signal error")]
fn fails_with_unknown_signal(verb_state: &VerbState) -> StepResult<()> {
    match outcome(verb_state)? {
        VerbOutcome::Failed(VerbFailure::UnknownSignal) => Ok(()),
        other => Err(format!("expected an unknown signal error, got {other:?}")),
    }
}

#[then("the operation fails with exit status {code}")]
fn fails_with_exit_status(verb_state: &VerbState, code: i32) -> StepResult<()> {
    match outcome(verb_state)? {
        VerbOutcome::Failed(VerbFailure::NonZeroExit(actual)) if actual == code => Ok(()),
        other => Err(format!("expected exit status {code}, got {other:?}")),
    }
}

#[then("the runtime was not invoked")]
fn runtime_not_invoked(verb_state: &VerbState) -> StepResult<()> {
    let calls = runtime(verb_state)?.calls();
    if calls.is_empty() {
        Ok(())
    } else {
        Err(format!("expected no invocations, got {calls:?}"))
    }
}

#[then("the command exit code is {code}")]
fn command_exit_code(verb_state: &VerbState, code: i32) -> StepResult<()> {
    match outcome(verb_state)? {
        VerbOutcome::Executed(actual) if actual == code => Ok(()),
        other => Err(format!("expected exit code {code}, got {other:?}")),
    }
}
