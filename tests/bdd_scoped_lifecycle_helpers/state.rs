//! Scenario state for scoped lifecycle behavioural tests.

use std::sync::Arc;

use harbor::error::CleanupStage;
use rstest::fixture;
use rstest_bdd::Slot;
use rstest_bdd_macros::ScenarioState;

use crate::support::FakeRuntime;

/// How a scoped run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum LifecycleOutcome {
    /// The work returned this container id.
    Completed(String),
    /// The work's own error came back.
    WorkFailed(String),
    /// Teardown failed at this stage after successful work.
    Cleanup(CleanupStage),
    /// Any other error.
    Failed(String),
}

#[derive(Default, ScenarioState)]
pub(crate) struct LifecycleState {
    pub(crate) runtime: Slot<Arc<FakeRuntime>>,
    pub(crate) work_ran: Slot<bool>,
    pub(crate) outcome: Slot<LifecycleOutcome>,
}

#[fixture]
pub(crate) fn lifecycle_state() -> LifecycleState {
    let state = LifecycleState::default();
    state.runtime.set(Arc::new(FakeRuntime::default()));
    state.work_ran.set(false);
    state
}
