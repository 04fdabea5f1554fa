//! Typed runtime verbs over a container runtime CLI.
//!
//! [`Engine`] exposes one method per runtime verb. Each method validates its
//! options, builds an argument vector, hands it to a [`ProcessRunner`], and
//! decodes the output with an explicit per-verb schema.
//!
//! The runtime binary is resolved through a priority-based fallback chain:
//!
//! 1. Explicit configuration (`runtime` in TOML or `HARBOR_RUNTIME`)
//! 2. `CONTAINER_RUNTIME` environment variable
//! 3. `docker`

mod containers;
mod images;
mod mapping;
mod options;
mod signal;


use std::time::Duration;

use tracing::debug;

pub use containers::{ExecOutput, Logs};
pub use mapping::{PortMapping, Protocol, VolumeMount};
pub use options::{
    ExecOptions, KillOptions, ListOptions, LogsOptions, PullOptions, RemoveImageOptions,
    RemoveOptions, RestartOptions, RunOptions, StopOptions, Tail,
};
pub use signal::Signal;

use crate::config::HarborConfig;
use crate::error::Result;
use crate::process::{CommandOutput, CommandRequest, ProcessRunner, SystemProcessRunner};

/// Environment variable consulted when no runtime is configured.
const RUNTIME_ENV_VAR: &str = "CONTAINER_RUNTIME";

/// Runtime binary used when nothing else is configured.
const DEFAULT_RUNTIME: &str = "docker";

/// Resolves the runtime binary from configuration and the environment.
///
/// # Type Parameters
///
/// * `E` - An environment provider implementing the `mockable::Env` trait,
///   allowing for testable environment variable access.
///
/// # Example
///
/// ```ignore
/// use mockable::DefaultEnv;
/// use harbor::engine::RuntimeResolver;
///
/// let env = DefaultEnv::new();
/// let binary = RuntimeResolver::new(&env).resolve(None);
/// ```
pub struct RuntimeResolver<'a, E: mockable::Env> {
    env: &'a E,
}

impl<'a, E: mockable::Env> RuntimeResolver<'a, E> {
    /// Creates a new runtime resolver with the given environment provider.
    #[must_use]
    pub const fn new(env: &'a E) -> Self {
        Self { env }
    }

    /// Resolve the runtime binary.
    ///
    /// A non-blank configured value wins, then a non-blank
    /// `CONTAINER_RUNTIME`, then `docker`.
    #[must_use]
    pub fn resolve(&self, configured: Option<&str>) -> String {
        configured
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(String::from)
            .or_else(|| self.resolve_from_env())
            .unwrap_or_else(|| String::from(Self::default_runtime()))
    }

    /// Resolve the runtime binary from `CONTAINER_RUNTIME` alone.
    #[must_use]
    pub fn resolve_from_env(&self) -> Option<String> {
        self.env
            .string(RUNTIME_ENV_VAR)
            .map(|value| String::from(value.trim()))
            .filter(|value| !value.is_empty())
    }

    /// Returns the fallback runtime binary, `docker`.
    #[must_use]
    pub const fn default_runtime() -> &'static str {
        DEFAULT_RUNTIME
    }
}

/// Typed access to a container runtime.
///
/// `Engine` holds no container state; every method re-queries the runtime.
/// It is `Send + Sync` whenever the runner is, so one engine can serve
/// several threads.
#[derive(Debug, Clone)]
pub struct Engine<R = SystemProcessRunner> {
    runner: R,
    binary: String,
    command_timeout: Option<Duration>,
}

impl Engine<SystemProcessRunner> {
    /// Create an engine that runs `docker` as a real process with no command
    /// timeout.
    #[must_use]
    pub fn system() -> Self {
        Self::new(SystemProcessRunner::new(), DEFAULT_RUNTIME)
    }

    /// Create a system engine from loaded configuration.
    ///
    /// The runtime binary is resolved with [`RuntimeResolver`]; a configured
    /// command timeout of zero means no timeout.
    #[must_use]
    pub fn from_config<E: mockable::Env>(config: &HarborConfig, env: &E) -> Self {
        let binary = RuntimeResolver::new(env).resolve(config.runtime.as_deref());
        let timeout = config.command_timeout();
        Self::new(SystemProcessRunner::new(), binary).with_command_timeout(timeout)
    }
}

impl<R: ProcessRunner> Engine<R> {
    /// Create an engine that invokes `binary` through `runner`.
    #[must_use]
    pub fn new(runner: R, binary: impl Into<String>) -> Self {
        Self {
            runner,
            binary: binary.into(),
            command_timeout: None,
        }
    }

    /// Bound every non-streaming invocation by `timeout`.
    #[must_use]
    pub const fn with_command_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.command_timeout = timeout;
        self
    }

    /// Return the runtime binary.
    #[must_use]
    pub fn binary(&self) -> &str {
        &self.binary
    }

    /// Return the per-invocation timeout, if any.
    #[must_use]
    pub const fn command_timeout(&self) -> Option<Duration> {
        self.command_timeout
    }

    /// Borrow the process runner.
    #[must_use]
    pub const fn runner(&self) -> &R {
        &self.runner
    }

    fn request(&self, args: Vec<String>) -> CommandRequest {
        CommandRequest::new(self.binary.clone(), args).with_timeout(self.command_timeout)
    }

    /// Run a verb and return its output whatever the exit code.
    fn invoke_raw(&self, args: Vec<String>) -> Result<CommandOutput> {
        let request = self.request(args);
        debug!(
            program = request.program(),
            args = ?request.args(),
            "invoking runtime"
        );
        Ok(self.runner.run(&request)?)
    }

    /// Run a verb and require a zero exit.
    fn invoke(&self, args: Vec<String>) -> Result<CommandOutput> {
        Ok(self.invoke_raw(args)?.ensure_success()?)
    }
}

/// Build an owned argument vector from string slices.
fn args<const N: usize>(parts: [&str; N]) -> Vec<String> {
    parts.into_iter().map(String::from).collect()
}
