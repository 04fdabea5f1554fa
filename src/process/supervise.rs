//! Timed supervision of a single child process.

use std::process::{ExitStatus, Stdio};
use std::time::Instant;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tracing::debug;

use super::{CommandOutput, CommandRequest, spawn_error};
use crate::error::ProcessError;

/// Run `request` on a dedicated current-thread runtime.
///
/// Each call owns its runtime, so concurrent callers on different threads
/// never contend for a shared executor and nothing outlives the call.
pub(super) fn run_blocking(request: &CommandRequest) -> Result<CommandOutput, ProcessError> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|error| ProcessError::RuntimeUnavailable {
            message: error.to_string(),
        })?;
    runtime.block_on(run_async(request))
}

async fn run_async(request: &CommandRequest) -> Result<CommandOutput, ProcessError> {
    let started = Instant::now();
    let mut child = build_command(request)
        .spawn()
        .map_err(|error| spawn_error(request.program(), &error))?;
    let pid = child.id();
    let stdout_pipe = child.stdout.take();
    let stderr_pipe = child.stderr.take();

    let completion = async {
        let (status, stdout, stderr) =
            tokio::join!(child.wait(), drain(stdout_pipe), drain(stderr_pipe));
        Ok::<_, std::io::Error>((status?, stdout?, stderr?))
    };

    let finished = match request.timeout() {
        Some(limit) => tokio::time::timeout(limit, completion).await.ok(),
        None => Some(completion.await),
    };

    let Some(result) = finished else {
        terminate(&mut child, pid).await;
        return Err(ProcessError::TimedOut {
            program: String::from(request.program()),
            timeout: request.timeout().unwrap_or_default(),
        });
    };

    let (status, stdout, stderr) = result.map_err(|error| ProcessError::Io {
        program: String::from(request.program()),
        message: error.to_string(),
    })?;
    let duration = started.elapsed();
    let exit_code = exit_code(request, status)?;

    debug!(
        program = request.program(),
        verb = request.verb(),
        exit_code,
        elapsed_ms = duration.as_millis(),
        "runtime invocation finished"
    );

    Ok(CommandOutput::new(
        request,
        exit_code,
        String::from_utf8_lossy(&stdout),
        String::from_utf8_lossy(&stderr),
        duration,
    ))
}

fn build_command(request: &CommandRequest) -> Command {
    let mut base = std::process::Command::new(request.program());
    base.args(request.args())
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        base.process_group(0);
    }

    let mut command = Command::from(base);
    command.kill_on_drop(true);
    command
}

async fn drain<R: AsyncRead + Unpin>(pipe: Option<R>) -> std::io::Result<Vec<u8>> {
    let mut buffer = Vec::new();
    if let Some(mut reader) = pipe {
        reader.read_to_end(&mut buffer).await?;
    }
    Ok(buffer)
}

/// Kill the child and every descendant sharing its process group, then reap it.
async fn terminate(child: &mut Child, pid: Option<u32>) {
    #[cfg(unix)]
    if let Some(leader) = pid {
        super::kill_process_group(leader);
    }
    #[cfg(not(unix))]
    let _ = pid;

    if let Err(error) = child.kill().await {
        debug!(%error, "child already exited before termination");
    }
}

fn exit_code(request: &CommandRequest, status: ExitStatus) -> Result<i32, ProcessError> {
    if let Some(code) = status.code() {
        return Ok(code);
    }

    #[cfg(unix)]
    let signal = {
        use std::os::unix::process::ExitStatusExt;
        status.signal()
    };
    #[cfg(not(unix))]
    let signal = None;

    Err(ProcessError::Killed {
        program: String::from(request.program()),
        signal,
    })
}
