//! Readiness waiting.
//!
//! [`Engine::wait_for`] polls a [`WaitCondition`] against fresh observations
//! of a container until the condition holds, the deadline passes, the caller
//! cancels, or fetching or evaluating fails.
//!
//! The loop is a small state machine:
//!
//! ```text
//! Pending -> Polling -> Satisfied
//!                    -> TimedOut   (condition false at or after the deadline)
//!                    -> Cancelled  (token set before a tick or after a sleep)
//!                    -> Errored    (inspect or condition failed)
//! ```
//!
//! The condition is always evaluated at least once, and the last sleep is
//! clamped to the time remaining so one evaluation lands at the deadline.

mod conditions;


use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use smart_default::SmartDefault;
use tracing::{debug, info, warn};

pub use conditions::{ExecSucceeds, FnCondition, Healthy, LogContains, StatusIs, from_fn, running};

use crate::config::WaitConfig;
use crate::engine::Engine;
use crate::error::{InputValidationError, Result, WaitError, WaitTimeoutError};
use crate::model::{Container, ContainerStatus, InspectRecord};
use crate::process::ProcessRunner;

/// A cloneable flag that asks a running wait to stop.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    /// Create a token that is not cancelled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Every clone observes it.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Return whether cancellation was requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Bounds of a readiness wait.
#[derive(Debug, Clone, SmartDefault)]
pub struct WaitOptions {
    /// Pause between evaluations. Defaults to 250 ms.
    #[default(Duration::from_millis(250))]
    pub poll_interval: Duration,

    /// Total time allowed. Defaults to 60 s.
    #[default(Duration::from_secs(60))]
    pub timeout: Duration,

    /// Optional cancellation token.
    pub cancel: Option<CancelToken>,
}

impl WaitOptions {
    /// Build options with the given interval and timeout and no token.
    #[must_use]
    pub const fn new(poll_interval: Duration, timeout: Duration) -> Self {
        Self {
            poll_interval,
            timeout,
            cancel: None,
        }
    }

    /// Attach a cancellation token.
    #[must_use]
    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Reject zero durations.
    ///
    /// # Errors
    ///
    /// Returns `InputValidationError::InvalidValue` when either duration is
    /// zero.
    pub fn validate(&self) -> std::result::Result<(), InputValidationError> {
        for (field, value) in [
            ("poll_interval", self.poll_interval),
            ("timeout", self.timeout),
        ] {
            if value.is_zero() {
                return Err(InputValidationError::InvalidValue {
                    field: String::from(field),
                    reason: String::from("must be greater than zero"),
                });
            }
        }
        Ok(())
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancelToken::is_cancelled)
    }
}

impl From<&WaitConfig> for WaitOptions {
    fn from(config: &WaitConfig) -> Self {
        Self::new(
            Duration::from_millis(config.poll_interval_ms),
            Duration::from_secs(config.timeout_secs),
        )
    }
}

/// What a condition sees on one tick.
#[derive(Debug, Clone)]
pub struct Observation {
    container: Container,
    record: InspectRecord,
}

impl Observation {
    /// Build an observation from an inspect document.
    ///
    /// # Errors
    ///
    /// Returns `DecodeError` when the document lacks the snapshot fields.
    pub fn from_record(record: InspectRecord) -> Result<Self> {
        let container = Container::from_inspect(&record)?;
        Ok(Self { container, record })
    }

    /// Return the fresh snapshot.
    #[must_use]
    pub const fn container(&self) -> &Container {
        &self.container
    }

    /// Return the fresh inspect document.
    #[must_use]
    pub const fn record(&self) -> &InspectRecord {
        &self.record
    }

    /// Return the observed status.
    #[must_use]
    pub const fn status(&self) -> ContainerStatus {
        self.container.status()
    }
}

/// A successful wait.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Readiness {
    /// The snapshot on which the condition held.
    pub container: Container,
    /// How many times the condition was evaluated.
    pub attempts: u32,
    /// Time from the start of the wait to the satisfying evaluation.
    pub elapsed: Duration,
}

/// A readiness predicate.
///
/// Conditions receive the engine so they can run further verbs, such as
/// reading logs or executing a command.
pub trait WaitCondition<R: ProcessRunner> {
    /// Evaluate the condition against one observation.
    ///
    /// # Errors
    ///
    /// Any error ends the wait immediately and is returned to the caller.
    fn is_satisfied(&mut self, engine: &Engine<R>, observation: &Observation) -> Result<bool>;

    /// Describe the condition for logs.
    fn describe(&self) -> String {
        String::from("custom condition")
    }
}

impl<R, F> WaitCondition<R> for F
where
    R: ProcessRunner,
    F: FnMut(&Observation) -> Result<bool>,
{
    fn is_satisfied(&mut self, _engine: &Engine<R>, observation: &Observation) -> Result<bool> {
        self(observation)
    }
}

impl<R: ProcessRunner> Engine<R> {
    /// Wait until `condition` holds for `container`.
    ///
    /// # Errors
    ///
    /// Returns `InputValidationError` for zero durations,
    /// `WaitError::TimedOut` when the deadline passes,
    /// `WaitError::Cancelled` when the token is set, and any error raised
    /// while inspecting the container or evaluating the condition.
    pub fn wait_for<C: WaitCondition<R>>(
        &self,
        container: &Container,
        mut condition: C,
        options: &WaitOptions,
    ) -> Result<Readiness> {
        options.validate()?;
        let started = Instant::now();
        let deadline = started.checked_add(options.timeout);
        let description = condition.describe();
        info!(
            container = container.id(),
            condition = %description,
            timeout = ?options.timeout,
            "waiting for container"
        );

        let mut attempts: u32 = 0;
        loop {
            if options.is_cancelled() {
                return Err(cancelled(container, started));
            }

            attempts = attempts.saturating_add(1);
            let observation = Observation::from_record(self.inspect(container)?)?;
            let satisfied = condition.is_satisfied(self, &observation)?;
            let elapsed = started.elapsed();

            if satisfied {
                info!(
                    container = container.id(),
                    condition = %description,
                    attempts,
                    elapsed = ?elapsed,
                    "container ready"
                );
                return Ok(Readiness {
                    container: observation.container,
                    attempts,
                    elapsed,
                });
            }

            let remaining = deadline.map_or(options.poll_interval, |limit| {
                limit.saturating_duration_since(Instant::now())
            });
            if remaining.is_zero() {
                warn!(
                    container = container.id(),
                    condition = %description,
                    attempts,
                    status = %observation.status(),
                    "timed out waiting for container"
                );
                return Err(WaitTimeoutError {
                    container_id: String::from(container.id()),
                    elapsed,
                    attempts,
                    last_status: observation.status(),
                }
                .into());
            }

            let pause = options.poll_interval.min(remaining);
            debug!(
                container = container.id(),
                attempts,
                status = %observation.status(),
                pause = ?pause,
                "condition not yet satisfied"
            );
            std::thread::sleep(pause);

            if options.is_cancelled() {
                return Err(cancelled(container, started));
            }
        }
    }
}

fn cancelled(container: &Container, started: Instant) -> crate::error::HarborError {
    let elapsed = started.elapsed();
    info!(container = container.id(), elapsed = ?elapsed, "wait cancelled");
    WaitError::Cancelled {
        container_id: String::from(container.id()),
        elapsed,
    }
    .into()
}
