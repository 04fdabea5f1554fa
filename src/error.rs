//! Semantic error types for harbor.
//!
//! Every condition a caller might inspect, retry, or branch on has its own
//! `thiserror` enum. [`HarborError`] aggregates them so engine operations can
//! share one [`Result`] alias, while applications are free to convert into an
//! opaque report type (such as `eyre::Report`) at their own boundary.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::model::ContainerStatus;

/// Errors that can occur during configuration loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file was not found at the expected path.
    #[error("configuration file not found: {path}")]
    FileNotFound {
        /// The path where the configuration file was expected.
        path: PathBuf,
    },

    /// The configuration file could not be parsed.
    #[error("failed to parse configuration file: {message}")]
    ParseError {
        /// A description of the parse error.
        message: String,
    },

    /// A configuration value failed validation.
    #[error("invalid configuration value for '{field}': {reason}")]
    InvalidValue {
        /// The name of the invalid field.
        field: String,
        /// The reason the value is invalid.
        reason: String,
    },

    /// The `OrthoConfig` library returned an error during configuration loading.
    ///
    /// This wraps errors from the layered configuration system, including
    /// file parsing errors and post-merge validation failures.
    #[error("configuration loading failed: {0}")]
    OrthoConfig(Arc<ortho_config::OrthoError>),
}

/// Failures of the process-execution boundary.
///
/// These describe why an external runtime invocation could not run or did not
/// finish cleanly. None of them is retried by the executor.
#[derive(Debug, Error)]
pub enum ProcessError {
    /// The runtime binary could not be located.
    #[error("runtime binary '{program}' was not found")]
    NotFound {
        /// The program that was requested.
        program: String,
    },

    /// The process could not be spawned for a reason other than a missing binary.
    #[error("failed to spawn '{program}': {message}")]
    SpawnFailed {
        /// The program that was requested.
        program: String,
        /// A description of the spawn failure.
        message: String,
    },

    /// The invocation outlived its timeout and was terminated.
    #[error("'{program}' timed out after {timeout:?}")]
    TimedOut {
        /// The program that was terminated.
        program: String,
        /// The limit that was exceeded.
        timeout: Duration,
    },

    /// The process was terminated by a signal.
    #[error("'{program}' was killed by {}", describe_signal(*signal))]
    Killed {
        /// The program that was terminated.
        program: String,
        /// The terminating signal number, when the platform reports one.
        signal: Option<i32>,
    },

    /// The process exited with a non-zero status.
    #[error("'{program} {verb}' exited with status {code}: {stderr}")]
    NonZeroExit {
        /// The program that failed.
        program: String,
        /// The runtime verb (first argument) that failed.
        verb: String,
        /// The exit code reported by the process.
        code: i32,
        /// Trimmed standard error output.
        stderr: String,
    },

    /// Reading the output of the process failed.
    #[error("I/O error while running '{program}': {message}")]
    Io {
        /// The program being run.
        program: String,
        /// A description of the I/O failure.
        message: String,
    },

    /// The async runtime used to supervise the process could not be created.
    #[error("failed to create process supervision runtime: {message}")]
    RuntimeUnavailable {
        /// A description of the runtime creation failure.
        message: String,
    },
}

fn describe_signal(signal: Option<i32>) -> String {
    signal.map_or_else(
        || String::from("an unknown signal"),
        |number| format!("signal {number}"),
    )
}

/// Runtime output did not match the shape a verb expects.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("failed to decode {expected}: {reason} (offending output: {fragment:?})")]
pub struct DecodeError {
    /// The shape the decoder expected, for example `"container id"`.
    pub expected: &'static str,
    /// Why the fragment was rejected.
    pub reason: String,
    /// The raw output fragment that failed to decode.
    pub fragment: String,
}

impl DecodeError {
    /// Build a decode error for the given expected shape and fragment.
    #[must_use]
    pub fn new(
        expected: &'static str,
        reason: impl Into<String>,
        fragment: impl Into<String>,
    ) -> Self {
        Self {
            expected,
            reason: reason.into(),
            fragment: fragment.into(),
        }
    }
}

/// Caller-supplied parameters that can never succeed.
///
/// These are detected before the runtime is invoked.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputValidationError {
    /// A required value is missing or blank.
    #[error("missing required value: {field}")]
    MissingRequired {
        /// The name of the missing field.
        field: String,
    },

    /// A value is structurally invalid.
    #[error("invalid value for '{field}': {reason}")]
    InvalidValue {
        /// The name of the invalid field.
        field: String,
        /// The reason the value is invalid.
        reason: String,
    },

    /// The signal name or number is not recognised.
    #[error("unknown signal: {signal}")]
    UnknownSignal {
        /// The rejected signal text.
        signal: String,
    },

    /// A port mapping could not be parsed.
    #[error("malformed port mapping '{mapping}': {reason}")]
    MalformedPortMapping {
        /// The rejected mapping text.
        mapping: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Two port mappings bind the same host port.
    #[error("host port {port} is mapped more than once")]
    DuplicateHostPort {
        /// The duplicated host port.
        port: u16,
    },
}

/// The readiness deadline passed without the condition holding.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error(
    "container '{container_id}' was not ready after {elapsed:?} ({attempts} checks); last observed status: {last_status}"
)]
pub struct WaitTimeoutError {
    /// The container being waited on.
    pub container_id: String,
    /// Time spent waiting.
    pub elapsed: Duration,
    /// How many times the condition was evaluated.
    pub attempts: u32,
    /// The status seen on the final check.
    pub last_status: ContainerStatus,
}

/// Non-satisfied endings of a readiness wait.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WaitError {
    /// The deadline passed.
    #[error(transparent)]
    TimedOut(#[from] WaitTimeoutError),

    /// The caller cancelled the wait.
    #[error("wait on container '{container_id}' was cancelled after {elapsed:?}")]
    Cancelled {
        /// The container being waited on.
        container_id: String,
        /// Time spent waiting before cancellation was observed.
        elapsed: Duration,
    },
}

/// The teardown step that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleanupStage {
    /// Stopping the container.
    Stop,
    /// Removing the container.
    Remove,
}

impl std::fmt::Display for CleanupStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Stop => f.write_str("stop"),
            Self::Remove => f.write_str("remove"),
        }
    }
}

/// A secondary failure while tearing down a scoped container.
#[derive(Debug, Error)]
#[error("failed to {stage} container '{container_id}' during teardown: {source}")]
pub struct LifecycleCleanupError {
    /// The container being torn down.
    pub container_id: String,
    /// The teardown step that failed.
    pub stage: CleanupStage,
    /// The underlying failure.
    pub source: Box<HarborError>,
}

/// Top-level error type for harbor.
///
/// This enum aggregates all domain-specific errors into a single type that can
/// be used throughout the crate. Applications typically convert it into an
/// opaque report at their boundary.
#[derive(Debug, Error)]
pub enum HarborError {
    /// An error occurred during configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The runtime invocation failed.
    #[error(transparent)]
    Process(#[from] ProcessError),

    /// Runtime output could not be decoded.
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// Caller parameters were rejected before invocation.
    #[error(transparent)]
    InputValidation(#[from] InputValidationError),

    /// A readiness wait did not succeed.
    #[error(transparent)]
    Wait(#[from] WaitError),

    /// Scoped teardown failed after successful work.
    #[error(transparent)]
    Cleanup(#[from] LifecycleCleanupError),
}

impl From<WaitTimeoutError> for HarborError {
    fn from(error: WaitTimeoutError) -> Self {
        Self::Wait(WaitError::TimedOut(error))
    }
}

/// A specialised `Result` type for harbor operations.
pub type Result<T> = std::result::Result<T, HarborError>;
