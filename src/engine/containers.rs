//! Container verbs.

use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{debug, info, warn};

use super::options::{
    ExecOptions, KillOptions, ListOptions, LogsOptions, RemoveOptions, RestartOptions, RunOptions,
    StopOptions,
};
use super::{Engine, args};
use crate::decode::{
    PsRecord, acknowledges, decode_id_lines, decode_json_document, decode_json_lines,
    decode_single_id,
};
use crate::error::{InputValidationError, ProcessError, Result};
use crate::model::{Container, Image, InspectRecord};
use crate::process::{CommandOutput, CommandRequest, LineStream, ProcessRunner};

/// Exit code the runtime CLI uses for its own failures.
const RUNTIME_FAILURE_EXIT: i32 = 125;

/// Stderr prefix Docker puts on daemon-side failures. Podman reports its own
/// failures with [`RUNTIME_FAILURE_EXIT`]; a bare `Error:` may come from the
/// command inside the container.
const DAEMON_ERROR_PREFIX: &str = "Error response from daemon";

static GENERATED_NAMES: AtomicU64 = AtomicU64::new(0);

/// Output of `logs`.
#[derive(Debug)]
pub enum Logs {
    /// The whole requested history: standard output followed by standard
    /// error.
    Snapshot(String),
    /// Live lines from a followed log. Dropping the stream stops following.
    Following(LineStream),
}

impl Logs {
    /// Return the snapshot text, or `None` for a followed log.
    #[must_use]
    pub fn snapshot(&self) -> Option<&str> {
        match self {
            Self::Snapshot(text) => Some(text),
            Self::Following(_) => None,
        }
    }
}

/// Result of a command run inside a container.
///
/// A non-zero `exit_code` is the command's own result, not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecOutput {
    /// Exit code of the command.
    pub exit_code: i32,
    /// Captured standard output.
    pub stdout: String,
    /// Captured standard error.
    pub stderr: String,
}

impl ExecOutput {
    /// Return whether the command exited with status zero.
    #[must_use]
    pub const fn succeeded(&self) -> bool {
        self.exit_code == 0
    }
}

impl From<CommandOutput> for ExecOutput {
    fn from(output: CommandOutput) -> Self {
        Self {
            exit_code: output.exit_code(),
            stdout: String::from(output.stdout()),
            stderr: String::from(output.stderr()),
        }
    }
}

impl<R: ProcessRunner> Engine<R> {
    /// List container ids.
    ///
    /// # Errors
    ///
    /// Returns `ProcessError` when the runtime fails and `DecodeError` when a
    /// line is not a single id.
    pub fn list_container_ids(&self, options: &ListOptions) -> Result<Vec<String>> {
        let mut argv = args(["ps", "-q", "--no-trunc"]);
        if options.all {
            argv.push(String::from("--all"));
        }
        let output = self.invoke(argv)?;
        Ok(decode_id_lines(output.stdout())?)
    }

    /// List containers as snapshots.
    ///
    /// # Errors
    ///
    /// Returns `ProcessError` when the runtime fails and `DecodeError` when any
    /// line is not a container record.
    pub fn list_containers(&self, options: &ListOptions) -> Result<Vec<Container>> {
        let mut argv = args(["ps", "--no-trunc", "--format", "{{json .}}"]);
        if options.all {
            argv.push(String::from("--all"));
        }
        let output = self.invoke(argv)?;
        let records: Vec<PsRecord> = decode_json_lines("container record", output.stdout())?;
        Ok(records.into_iter().map(Container::from).collect())
    }

    /// Create and start a container from `image`.
    ///
    /// Detached runs return once the container has started. Attached runs
    /// block until the container exits; the container's output is logged at
    /// debug level and a non-zero exit of the container itself is reported
    /// through the returned snapshot rather than as an error.
    ///
    /// # Errors
    ///
    /// Returns `InputValidationError` for invalid options before the runtime
    /// is invoked, `ProcessError` when the runtime fails, and `DecodeError`
    /// when the output or the follow-up inspect cannot be decoded.
    pub fn run(&self, image: &Image, options: &RunOptions) -> Result<Container> {
        options.validate()?;

        let name = match (&options.name, options.detach) {
            (Some(name), _) => Some(name.clone()),
            (None, true) => None,
            (None, false) => Some(generated_name()),
        };
        let argv = run_args(image, options, name.as_deref());

        let container = if options.detach {
            let output = self.invoke(argv)?;
            let id = decode_single_id(output.stdout())?;
            self.refresh_ref(&id)?
        } else {
            let output = require_runtime_success(self.invoke_raw(argv)?)?;
            debug!(
                exit_code = output.exit_code(),
                stdout = output.stdout(),
                stderr = output.stderr(),
                "attached container output"
            );
            let reference = name.unwrap_or_default();
            self.refresh_ref(&reference)?
        };

        info!(
            container = container.id(),
            name = container.name(),
            image = %image.reference(),
            status = %container.status(),
            "container started"
        );
        Ok(container)
    }

    /// Start a stopped container and return a fresh snapshot.
    ///
    /// # Errors
    ///
    /// Returns `ProcessError` when the runtime fails and `DecodeError` when the
    /// follow-up inspect cannot be decoded.
    pub fn start(&self, container: &Container) -> Result<Container> {
        self.invoke(args(["start", container.id()]))?;
        self.refresh(container)
    }

    /// Stop a container and return a fresh snapshot.
    ///
    /// # Errors
    ///
    /// Returns `ProcessError` when the runtime fails and `DecodeError` when the
    /// follow-up inspect cannot be decoded.
    pub fn stop(&self, container: &Container, options: &StopOptions) -> Result<Container> {
        let time = format!("--time={}", options.timeout_secs);
        self.invoke(args(["stop", &time, container.id()]))?;
        let stopped = self.refresh(container)?;
        info!(container = container.id(), status = %stopped.status(), "container stopped");
        Ok(stopped)
    }

    /// Restart a container and return a fresh snapshot.
    ///
    /// # Errors
    ///
    /// Returns `ProcessError` when the runtime fails and `DecodeError` when the
    /// follow-up inspect cannot be decoded.
    pub fn restart(&self, container: &Container, options: &RestartOptions) -> Result<Container> {
        let time = format!("--time={}", options.timeout_secs);
        self.invoke(args(["restart", &time, container.id()]))?;
        self.refresh(container)
    }

    /// Send a signal to a container.
    ///
    /// Returns `true` when the runtime echoes the container id back.
    ///
    /// # Errors
    ///
    /// Returns `InputValidationError::UnknownSignal` before invoking the
    /// runtime and `ProcessError` when the runtime fails.
    pub fn kill(&self, container: &Container, options: &KillOptions) -> Result<bool> {
        let signal = format!("--signal={}", options.resolve()?);
        let output = self.invoke(args(["kill", &signal, container.id()]))?;
        let acknowledged = acknowledges(output.stdout(), container.id());
        if !acknowledged {
            warn!(container = container.id(), "runtime did not acknowledge kill");
        }
        Ok(acknowledged)
    }

    /// Remove a container.
    ///
    /// Returns `true` when the runtime echoes the container id back. A
    /// running container is only removed with `force`; the call is never
    /// retried with force on its own.
    ///
    /// # Errors
    ///
    /// Returns `ProcessError` when the runtime refuses.
    pub fn remove(&self, container: &Container, options: &RemoveOptions) -> Result<bool> {
        let mut argv = args(["rm"]);
        if options.force {
            argv.push(String::from("--force"));
        }
        if options.volumes {
            argv.push(String::from("--volumes"));
        }
        argv.push(String::from(container.id()));

        let output = self.invoke(argv)?;
        let acknowledged = acknowledges(output.stdout(), container.id());
        info!(container = container.id(), acknowledged, "container removed");
        Ok(acknowledged)
    }

    /// Return the runtime's inspect document for a container.
    ///
    /// # Errors
    ///
    /// Returns `ProcessError::NonZeroExit` when the container does not exist
    /// and `DecodeError` when the output is not exactly one document.
    pub fn inspect(&self, container: &Container) -> Result<InspectRecord> {
        self.inspect_ref(container.id())
    }

    /// Return a fresh snapshot of a container.
    ///
    /// # Errors
    ///
    /// As for [`Engine::inspect`], plus `DecodeError` when the document lacks
    /// the snapshot fields.
    pub fn refresh(&self, container: &Container) -> Result<Container> {
        self.refresh_ref(container.id())
    }

    /// Fetch container logs.
    ///
    /// Without `follow` the call returns the requested history as one text,
    /// standard output first. With `follow` it returns a live line stream.
    ///
    /// # Errors
    ///
    /// Returns `ProcessError` when the runtime fails or cannot be spawned.
    pub fn logs(&self, container: &Container, options: &LogsOptions) -> Result<Logs> {
        let mut argv = args(["logs"]);
        if options.follow {
            argv.push(String::from("--follow"));
        }
        argv.push(format!("--tail={}", options.tail.to_arg()));
        argv.push(String::from(container.id()));

        if options.follow {
            let request = CommandRequest::new(self.binary.clone(), argv);
            debug!(program = request.program(), args = ?request.args(), "following runtime output");
            return Ok(Logs::Following(self.runner.stream_lines(&request)?));
        }

        let output = self.invoke(argv)?;
        let mut text = String::from(output.stdout());
        text.push_str(output.stderr());
        Ok(Logs::Snapshot(text))
    }

    /// Run a command inside a running container.
    ///
    /// # Errors
    ///
    /// Returns `InputValidationError::MissingRequired` for an empty command.
    /// Returns `ProcessError` only when the runtime itself fails (exit 125 or
    /// a daemon error message); the command's own failures are reported in
    /// [`ExecOutput::exit_code`].
    pub fn exec<I, S>(
        &self,
        container: &Container,
        command: I,
        options: &ExecOptions,
    ) -> Result<ExecOutput>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let words: Vec<String> = command.into_iter().map(Into::into).collect();
        if words.is_empty() {
            return Err(InputValidationError::MissingRequired {
                field: String::from("command"),
            }
            .into());
        }

        let mut argv = args(["exec"]);
        if options.detach {
            argv.push(String::from("--detach"));
        }
        argv.push(String::from(container.id()));
        argv.extend(words);

        let output = require_runtime_success(self.invoke_raw(argv)?)?;
        Ok(ExecOutput::from(output))
    }

    fn inspect_ref(&self, reference: &str) -> Result<InspectRecord> {
        let output = self.invoke(args(["inspect", "--type", "container", reference]))?;
        Ok(decode_json_document(output.stdout())?)
    }

    fn refresh_ref(&self, reference: &str) -> Result<Container> {
        let record = self.inspect_ref(reference)?;
        Ok(Container::from_inspect(&record)?)
    }
}

fn run_args(image: &Image, options: &RunOptions, name: Option<&str>) -> Vec<String> {
    let mut argv = args(["run"]);
    if options.detach {
        argv.push(String::from("-d"));
    }
    if let Some(container_name) = name {
        argv.push(String::from("--name"));
        argv.push(String::from(container_name));
    }
    for mapping in &options.ports {
        argv.push(String::from("-p"));
        argv.push(mapping.to_arg());
    }
    for mount in &options.volumes {
        argv.push(String::from("-v"));
        argv.push(mount.to_arg());
    }
    for (key, value) in &options.env {
        argv.push(String::from("-e"));
        argv.push(format!("{key}={value}"));
    }
    argv.push(image.reference());
    if let Some(command) = &options.command {
        argv.extend(command.iter().cloned());
    }
    argv
}

/// Fail when the runtime itself failed, pass the command's own exit through.
fn require_runtime_success(
    output: CommandOutput,
) -> std::result::Result<CommandOutput, ProcessError> {
    let daemon_failed =
        !output.succeeded() && output.stderr().trim_start().starts_with(DAEMON_ERROR_PREFIX);
    let runtime_failed = output.exit_code() == RUNTIME_FAILURE_EXIT || daemon_failed;
    if runtime_failed {
        return output.ensure_success();
    }
    Ok(output)
}

fn generated_name() -> String {
    let sequence = GENERATED_NAMES.fetch_add(1, Ordering::Relaxed);
    format!("harbor-{}-{sequence}", std::process::id())
}
