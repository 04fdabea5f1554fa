//! Scenario state for readiness wait behavioural tests.

use std::sync::Arc;
use std::time::Duration;

use harbor::model::ContainerStatus;
use harbor::wait::{CancelToken, WaitOptions};
use rstest::fixture;
use rstest_bdd::Slot;
use rstest_bdd_macros::ScenarioState;

use crate::support::FakeRuntime;

/// How a wait ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum WaitOutcome {
    /// The condition held after this many checks.
    Ready { attempts: u32 },
    /// The deadline passed with this status observed last.
    TimedOut { last_status: ContainerStatus },
    /// The token stopped the wait.
    Cancelled,
    /// Any other error.
    Failed(String),
}

#[derive(Default, ScenarioState)]
pub(crate) struct WaitState {
    pub(crate) runtime: Slot<Arc<FakeRuntime>>,
    pub(crate) container_id: Slot<String>,
    pub(crate) options: Slot<WaitOptions>,
    pub(crate) cancel: Slot<CancelToken>,
    pub(crate) outcome: Slot<WaitOutcome>,
}

#[fixture]
pub(crate) fn wait_state() -> WaitState {
    let state = WaitState::default();
    state.runtime.set(Arc::new(FakeRuntime::default()));
    state.container_id.set(String::from("c0ffee"));
    state.options.set(WaitOptions::new(
        Duration::from_millis(20),
        Duration::from_secs(2),
    ));
    state
}
