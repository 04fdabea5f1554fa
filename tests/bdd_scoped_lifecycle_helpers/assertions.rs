//! Assertion steps for scoped lifecycle scenarios.

use harbor::error::CleanupStage;
use rstest_bdd_macros::then;

use super::StepResult;
use super::state::{LifecycleOutcome, LifecycleState};
use super::steps::runtime;

fn outcome(lifecycle_state: &LifecycleState) -> StepResult<LifecycleOutcome> {
    lifecycle_state
        .outcome
        .get()
        .ok_or_else(|| String::from("outcome should be set"))
}

#[then("the work returned container {id}")]
fn work_returned_container(lifecycle_state: &LifecycleState, id: String) -> StepResult<()> {
    match outcome(lifecycle_state)? {
        LifecycleOutcome::Completed(returned) if returned == id => Ok(()),
        other => Err(format!("expected container {id}, got {other:?}")),
    }
}

#[then("the work error {message} is returned")]
fn work_error_returned(lifecycle_state: &LifecycleState, message: String) -> StepResult<()> {
    match outcome(lifecycle_state)? {
        LifecycleOutcome::WorkFailed(text) if text == message => Ok(()),
        other => Err(format!("expected work error '{message}', got {other:?}")),
    }
}

#[then("a cleanup error for the remove step is reported")]
fn cleanup_error_for_remove(lifecycle_state: &LifecycleState) -> StepResult<()> {
    match outcome(lifecycle_state)? {
        LifecycleOutcome::Cleanup(CleanupStage::Remove) => Ok(()),
        other => Err(format!("expected a remove cleanup error, got {other:?}")),
    }
}

#[then("the work did not run")]
fn work_did_not_run(lifecycle_state: &LifecycleState) -> StepResult<()> {
    if lifecycle_state.work_ran.get().unwrap_or(false) {
        return Err(String::from("work should not have run"));
    }
    match outcome(lifecycle_state)? {
        LifecycleOutcome::Failed(_) => Ok(()),
        other => Err(format!("expected the run failure, got {other:?}")),
    }
}

#[then("the runtime saw verbs {verbs}")]
fn runtime_saw_verbs(lifecycle_state: &LifecycleState, verbs: String) -> StepResult<()> {
    let seen = runtime(lifecycle_state)?.verbs().join(",");
    if seen == verbs {
        Ok(())
    } else {
        Err(format!("expected verbs {verbs}, got {seen}"))
    }
}
