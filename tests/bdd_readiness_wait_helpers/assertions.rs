//! Assertion steps for readiness wait scenarios.

use harbor::model::ContainerStatus;
use rstest_bdd_macros::then;

use super::StepResult;
use super::state::{WaitOutcome, WaitState};
use super::steps::runtime;

fn outcome(wait_state: &WaitState) -> StepResult<WaitOutcome> {
    wait_state
        .outcome
        .get()
        .ok_or_else(|| String::from("outcome should be set"))
}

#[then("the wait succeeds after {expected} checks")]
fn wait_succeeds(wait_state: &WaitState, expected: u32) -> StepResult<()> {
    match outcome(wait_state)? {
        WaitOutcome::Ready { attempts } if attempts == expected => Ok(()),
        other => Err(format!("expected readiness after {expected} checks, got {other:?}")),
    }
}

#[then("the wait times out with last status {status}")]
fn wait_times_out(wait_state: &WaitState, status: String) -> StepResult<()> {
    let expected = ContainerStatus::from_runtime(&status);
    match outcome(wait_state)? {
        WaitOutcome::TimedOut { last_status } if last_status == expected => Ok(()),
        other => Err(format!("expected a timeout at status {expected}, got {other:?}")),
    }
}

#[then("the wait is cancelled")]
fn wait_is_cancelled(wait_state: &WaitState) -> StepResult<()> {
    match outcome(wait_state)? {
        WaitOutcome::Cancelled => Ok(()),
        other => Err(format!("expected cancellation, got {other:?}")),
    }
}

#[then("the runtime was not asked to inspect")]
fn runtime_not_inspected(wait_state: &WaitState) -> StepResult<()> {
    let verbs = runtime(wait_state)?.verbs();
    if verbs.iter().any(|verb| verb == "inspect") {
        return Err(format!("expected no inspect, got {verbs:?}"));
    }
    Ok(())
}
