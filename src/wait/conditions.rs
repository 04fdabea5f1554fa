//! Built-in readiness conditions.

use super::{Observation, WaitCondition};
use crate::engine::{Engine, ExecOptions, LogsOptions};
use crate::error::Result;
use crate::model::ContainerStatus;
use crate::process::ProcessRunner;

/// Holds when the container reaches a given status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusIs(pub ContainerStatus);

/// Holds when the container is running.
#[must_use]
pub const fn running() -> StatusIs {
    StatusIs(ContainerStatus::Running)
}

impl<R: ProcessRunner> WaitCondition<R> for StatusIs {
    fn is_satisfied(&mut self, _engine: &Engine<R>, observation: &Observation) -> Result<bool> {
        Ok(observation.status() == self.0)
    }

    fn describe(&self) -> String {
        format!("status is {}", self.0)
    }
}

/// Holds when the container's log history contains `needle` at least
/// `occurrences` times.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogContains {
    needle: String,
    occurrences: usize,
}

impl LogContains {
    /// Wait for one occurrence of `needle`.
    #[must_use]
    pub fn new(needle: impl Into<String>) -> Self {
        Self {
            needle: needle.into(),
            occurrences: 1,
        }
    }

    /// Wait for `occurrences` occurrences instead of one.
    #[must_use]
    pub const fn times(mut self, occurrences: usize) -> Self {
        self.occurrences = occurrences;
        self
    }
}

impl<R: ProcessRunner> WaitCondition<R> for LogContains {
    fn is_satisfied(&mut self, engine: &Engine<R>, observation: &Observation) -> Result<bool> {
        let logs = engine.logs(observation.container(), &LogsOptions::default())?;
        let seen = logs
            .snapshot()
            .map_or(0, |text| text.matches(self.needle.as_str()).count());
        Ok(seen >= self.occurrences)
    }

    fn describe(&self) -> String {
        format!("logs contain {:?} {} time(s)", self.needle, self.occurrences)
    }
}

/// Holds when the image's health check reports `healthy`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Healthy;

impl<R: ProcessRunner> WaitCondition<R> for Healthy {
    fn is_satisfied(&mut self, _engine: &Engine<R>, observation: &Observation) -> Result<bool> {
        Ok(observation.record().health_status() == Some("healthy"))
    }

    fn describe(&self) -> String {
        String::from("health check reports healthy")
    }
}

/// Holds when a readiness command exits with status zero inside the running
/// container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecSucceeds {
    command: Vec<String>,
}

impl ExecSucceeds {
    /// Probe with `command`.
    #[must_use]
    pub fn new<I, S>(command: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            command: command.into_iter().map(Into::into).collect(),
        }
    }
}

impl<R: ProcessRunner> WaitCondition<R> for ExecSucceeds {
    fn is_satisfied(&mut self, engine: &Engine<R>, observation: &Observation) -> Result<bool> {
        if !observation.container().is_running() {
            return Ok(false);
        }
        let output = engine.exec(
            observation.container(),
            self.command.iter().cloned(),
            &ExecOptions::default(),
        )?;
        Ok(output.succeeded())
    }

    fn describe(&self) -> String {
        format!("`{}` succeeds", self.command.join(" "))
    }
}

/// A named closure condition.
///
/// [`from_fn`] builds one; the name shows up in wait logs.
pub struct FnCondition<F> {
    description: String,
    predicate: F,
}

impl<F> std::fmt::Debug for FnCondition<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnCondition")
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

/// Wrap a closure as a described condition.
#[must_use]
pub fn from_fn<F>(description: impl Into<String>, predicate: F) -> FnCondition<F>
where
    F: FnMut(&Observation) -> Result<bool>,
{
    FnCondition {
        description: description.into(),
        predicate,
    }
}

impl<R, F> WaitCondition<R> for FnCondition<F>
where
    R: ProcessRunner,
    F: FnMut(&Observation) -> Result<bool>,
{
    fn is_satisfied(&mut self, _engine: &Engine<R>, observation: &Observation) -> Result<bool> {
        (self.predicate)(observation)
    }

    fn describe(&self) -> String {
        self.description.clone()
    }
}
