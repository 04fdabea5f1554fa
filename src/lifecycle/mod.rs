//! Scoped container lifecycle.
//!
//! A scoped container is run, handed to caller work, and then always stopped
//! and removed. Two forms are offered:
//!
//! - [`Engine::with_container`] takes the work as a closure and reports the
//!   work's result, or a teardown failure when the work succeeded.
//! - [`Engine::scoped`] returns a [`ScopedContainer`] guard that tears down on
//!   drop, including during unwinding, or explicitly via
//!   [`ScopedContainer::finish`].


use tracing::{info, warn};

use crate::config::TeardownConfig;
use crate::engine::{Engine, RemoveOptions, RunOptions, StopOptions};
use crate::error::{CleanupStage, HarborError, LifecycleCleanupError, Result};
use crate::model::{Container, Image};
use crate::process::ProcessRunner;

/// How a scoped container is torn down.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TeardownOptions {
    /// Options for the stop step. Defaults to a 10 second grace period.
    pub stop: StopOptions,
    /// Options for the remove step. Defaults to no forced removal.
    pub remove: RemoveOptions,
}

impl From<&TeardownConfig> for TeardownOptions {
    fn from(config: &TeardownConfig) -> Self {
        Self {
            stop: StopOptions {
                timeout_secs: config.stop_timeout_secs,
            },
            remove: RemoveOptions {
                force: config.force_remove,
                volumes: false,
            },
        }
    }
}

/// How a scoped container is started and torn down.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScopeOptions {
    /// Options passed to `run`.
    pub run: RunOptions,
    /// Options for the stop-then-remove teardown.
    pub teardown: TeardownOptions,
}

/// A running container that is stopped and removed when the guard goes away.
///
/// Dropping the guard logs teardown failures at `warn` level. Call
/// [`ScopedContainer::finish`] to observe them instead.
#[derive(Debug)]
pub struct ScopedContainer<'a, R: ProcessRunner> {
    engine: &'a Engine<R>,
    container: Container,
    teardown: TeardownOptions,
    finished: bool,
}

impl<R: ProcessRunner> ScopedContainer<'_, R> {
    /// Return the container snapshot taken when it started.
    #[must_use]
    pub const fn container(&self) -> &Container {
        &self.container
    }

    /// Tear the container down now and report the first failure.
    ///
    /// # Errors
    ///
    /// Returns `HarborError::Cleanup` naming the step that failed.
    pub fn finish(mut self) -> Result<()> {
        self.finished = true;
        Ok(self.engine.teardown(&self.container, &self.teardown)?)
    }
}

impl<R: ProcessRunner> Drop for ScopedContainer<'_, R> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        if let Err(error) = self.engine.teardown(&self.container, &self.teardown) {
            warn!(
                container = self.container.id(),
                %error,
                "teardown of dropped scoped container failed"
            );
        }
    }
}

impl<R: ProcessRunner> Engine<R> {
    /// Run `image` and return a guard that tears the container down.
    ///
    /// # Errors
    ///
    /// Returns any error from `run`; nothing needs tearing down in that case.
    pub fn scoped(&self, image: &Image, options: &ScopeOptions) -> Result<ScopedContainer<'_, R>> {
        let container = self.run(image, &options.run)?;
        Ok(ScopedContainer {
            engine: self,
            container,
            teardown: options.teardown,
            finished: false,
        })
    }

    /// Run `image`, hand the container to `work`, then stop and remove it.
    ///
    /// Teardown runs whether `work` succeeds, fails, or panics. When `work`
    /// fails its error is returned unchanged and teardown failures are only
    /// logged. When `work` succeeds but teardown fails, the teardown failure
    /// is returned.
    ///
    /// # Errors
    ///
    /// Returns the run failure (with no teardown), the work's error, or
    /// `HarborError::Cleanup` converted into `E`.
    pub fn with_container<T, E, F>(
        &self,
        image: &Image,
        options: &ScopeOptions,
        work: F,
    ) -> std::result::Result<T, E>
    where
        F: FnOnce(&Container) -> std::result::Result<T, E>,
        E: From<HarborError>,
    {
        let guard = self.scoped(image, options)?;
        match work(guard.container()) {
            Ok(value) => {
                guard.finish()?;
                Ok(value)
            }
            Err(error) => {
                // Dropping the guard tears down and logs any failure.
                drop(guard);
                Err(error)
            }
        }
    }

    /// Stop then remove `container`, attempting removal even when stopping
    /// failed. The first failure is reported.
    pub(crate) fn teardown(
        &self,
        container: &Container,
        options: &TeardownOptions,
    ) -> std::result::Result<(), LifecycleCleanupError> {
        let stopped = self.stop(container, &options.stop);
        let removed = self.remove(container, &options.remove);

        let failure = match (stopped, removed) {
            (Ok(_), Ok(_)) => None,
            (Err(stop_error), Ok(_)) => Some((CleanupStage::Stop, stop_error)),
            (Ok(_), Err(remove_error)) => Some((CleanupStage::Remove, remove_error)),
            (Err(stop_error), Err(remove_error)) => {
                warn!(
                    container = container.id(),
                    error = %remove_error,
                    "remove also failed during teardown"
                );
                Some((CleanupStage::Stop, stop_error))
            }
        };

        match failure {
            None => {
                info!(container = container.id(), "scoped container torn down");
                Ok(())
            }
            Some((stage, source)) => Err(LifecycleCleanupError {
                container_id: String::from(container.id()),
                stage,
                source: Box::new(source),
            }),
        }
    }
}
