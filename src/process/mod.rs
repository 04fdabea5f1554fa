//! Process execution boundary for runtime invocations.
//!
//! The engine never spawns processes directly. It hands a [`CommandRequest`]
//! to a [`ProcessRunner`], which keeps verb logic testable against a fake
//! backend. [`SystemProcessRunner`] is the real implementation: it supervises
//! each invocation with Tokio so a timeout can terminate the whole process
//! group before the call returns.

mod stream;
mod supervise;

use std::time::Duration;

pub use stream::LineStream;

use crate::error::ProcessError;

/// One external command invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandRequest {
    program: String,
    args: Vec<String>,
    timeout: Option<Duration>,
}

impl CommandRequest {
    /// Create a request with no timeout.
    #[must_use]
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            timeout: None,
        }
    }

    /// Bound the invocation by an optional timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Return the program to run.
    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Return the ordered argument list.
    #[must_use]
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Return the runtime verb, the first argument.
    #[must_use]
    pub fn verb(&self) -> &str {
        self.args.first().map_or("", String::as_str)
    }

    /// Return the timeout, if any.
    #[must_use]
    pub const fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

/// Captured result of a finished invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    program: String,
    verb: String,
    exit_code: i32,
    stdout: String,
    stderr: String,
    duration: Duration,
}

impl CommandOutput {
    /// Build an output value for `request`.
    ///
    /// Fake runners use this to script runtime responses.
    #[must_use]
    pub fn new(
        request: &CommandRequest,
        exit_code: i32,
        stdout: impl Into<String>,
        stderr: impl Into<String>,
        duration: Duration,
    ) -> Self {
        Self {
            program: String::from(request.program()),
            verb: String::from(request.verb()),
            exit_code,
            stdout: stdout.into(),
            stderr: stderr.into(),
            duration,
        }
    }

    /// Build a successful output carrying `stdout`.
    #[must_use]
    pub fn success(request: &CommandRequest, stdout: impl Into<String>) -> Self {
        Self::new(request, 0, stdout, "", Duration::ZERO)
    }

    /// Build a failed output carrying `stderr`.
    #[must_use]
    pub fn failure(request: &CommandRequest, exit_code: i32, stderr: impl Into<String>) -> Self {
        Self::new(request, exit_code, "", stderr, Duration::ZERO)
    }

    /// Return the process exit code.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        self.exit_code
    }

    /// Return captured standard output.
    #[must_use]
    pub fn stdout(&self) -> &str {
        &self.stdout
    }

    /// Return captured standard error.
    #[must_use]
    pub fn stderr(&self) -> &str {
        &self.stderr
    }

    /// Return how long the invocation took.
    #[must_use]
    pub const fn duration(&self) -> Duration {
        self.duration
    }

    /// Return whether the process exited with status zero.
    #[must_use]
    pub const fn succeeded(&self) -> bool {
        self.exit_code == 0
    }

    /// Consume the output, returning standard output.
    #[must_use]
    pub fn into_stdout(self) -> String {
        self.stdout
    }

    /// Convert a non-zero exit into [`ProcessError::NonZeroExit`].
    ///
    /// # Errors
    ///
    /// Returns `ProcessError::NonZeroExit` carrying the trimmed standard error
    /// when the exit code is not zero.
    pub fn ensure_success(self) -> Result<Self, ProcessError> {
        if self.succeeded() {
            return Ok(self);
        }

        Err(ProcessError::NonZeroExit {
            program: self.program,
            verb: self.verb,
            code: self.exit_code,
            stderr: String::from(self.stderr.trim()),
        })
    }
}

/// Behaviour required to run runtime commands.
///
/// This abstraction keeps verb logic testable without a live runtime.
pub trait ProcessRunner {
    /// Run `request` to completion or timeout and capture its output.
    ///
    /// A non-zero exit is not an error at this level; callers decide via
    /// [`CommandOutput::ensure_success`].
    ///
    /// # Errors
    ///
    /// Returns `ProcessError` when the process cannot be spawned, times out,
    /// is killed by a signal, or its output cannot be read.
    fn run(&self, request: &CommandRequest) -> Result<CommandOutput, ProcessError>;

    /// Start `request` and stream its output line by line.
    ///
    /// The process keeps running until it exits or the stream is dropped.
    ///
    /// # Errors
    ///
    /// Returns `ProcessError` when the process cannot be spawned.
    fn stream_lines(&self, request: &CommandRequest) -> Result<LineStream, ProcessError>;
}

impl<T: ProcessRunner + ?Sized> ProcessRunner for &T {
    fn run(&self, request: &CommandRequest) -> Result<CommandOutput, ProcessError> {
        (**self).run(request)
    }

    fn stream_lines(&self, request: &CommandRequest) -> Result<LineStream, ProcessError> {
        (**self).stream_lines(request)
    }
}

/// Runs commands as real child processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemProcessRunner;

impl SystemProcessRunner {
    /// Create a system runner.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl ProcessRunner for SystemProcessRunner {
    fn run(&self, request: &CommandRequest) -> Result<CommandOutput, ProcessError> {
        supervise::run_blocking(request)
    }

    fn stream_lines(&self, request: &CommandRequest) -> Result<LineStream, ProcessError> {
        stream::spawn(request)
    }
}

pub(crate) fn spawn_error(program: &str, error: &std::io::Error) -> ProcessError {
    if error.kind() == std::io::ErrorKind::NotFound {
        return ProcessError::NotFound {
            program: String::from(program),
        };
    }

    ProcessError::SpawnFailed {
        program: String::from(program),
        message: error.to_string(),
    }
}

/// Send `SIGKILL` to the process group led by `pid`.
#[cfg(unix)]
pub(crate) fn kill_process_group(pid: u32) {
    use nix::sys::signal::{Signal, killpg};
    use nix::unistd::Pid;

    let Ok(group) = i32::try_from(pid) else {
        return;
    };
    if let Err(error) = killpg(Pid::from_raw(group), Signal::SIGKILL) {
        tracing::debug!(pid, %error, "process group already gone");
    }
}
