//! Line streaming from long-running invocations such as followed logs.

use std::fmt;
use std::io::{BufRead, BufReader, Read};
use std::process::{Child, Command, Stdio};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::JoinHandle;

use tracing::debug;

use super::{CommandRequest, spawn_error};
use crate::error::ProcessError;

/// Output lines from a running process.
///
/// Standard output and standard error are interleaved in arrival order. The
/// iterator ends when the process closes both pipes. Dropping the stream
/// terminates the process group and reaps the child.
pub struct LineStream {
    source: LineSource,
}

enum LineSource {
    Scripted(std::vec::IntoIter<String>),
    Process {
        program: String,
        receiver: Receiver<std::io::Result<String>>,
        _process: StreamingProcess,
    },
}

impl LineStream {
    /// Build a stream that yields the given lines and then ends.
    ///
    /// Fake runners use this to script followed output.
    #[must_use]
    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let collected: Vec<String> = lines.into_iter().map(Into::into).collect();
        Self {
            source: LineSource::Scripted(collected.into_iter()),
        }
    }
}

impl Iterator for LineStream {
    type Item = Result<String, ProcessError>;

    fn next(&mut self) -> Option<Self::Item> {
        match &mut self.source {
            LineSource::Scripted(lines) => lines.next().map(Ok),
            LineSource::Process {
                program, receiver, ..
            } => receiver.recv().ok().map(|line| {
                line.map_err(|error| ProcessError::Io {
                    program: program.clone(),
                    message: error.to_string(),
                })
            }),
        }
    }
}

impl fmt::Debug for LineStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match &self.source {
            LineSource::Scripted(_) => "scripted",
            LineSource::Process { .. } => "process",
        };
        f.debug_struct("LineStream").field("source", &kind).finish()
    }
}

struct StreamingProcess {
    child: Child,
    readers: Vec<JoinHandle<()>>,
}

impl Drop for StreamingProcess {
    fn drop(&mut self) {
        #[cfg(unix)]
        super::kill_process_group(self.child.id());
        if let Err(error) = self.child.kill() {
            debug!(%error, "streaming process already exited");
        }
        if let Err(error) = self.child.wait() {
            debug!(%error, "failed to reap streaming process");
        }
        for reader in self.readers.drain(..) {
            if reader.join().is_err() {
                debug!("pipe reader thread panicked");
            }
        }
    }
}

pub(super) fn spawn(request: &CommandRequest) -> Result<LineStream, ProcessError> {
    let mut command = Command::new(request.program());
    command
        .args(request.args())
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        command.process_group(0);
    }

    let mut child = command
        .spawn()
        .map_err(|error| spawn_error(request.program(), &error))?;

    let (sender, receiver) = mpsc::channel();
    let mut readers = Vec::with_capacity(2);
    if let Some(stdout) = child.stdout.take() {
        readers.push(spawn_reader(stdout, sender.clone()));
    }
    if let Some(stderr) = child.stderr.take() {
        readers.push(spawn_reader(stderr, sender));
    }

    debug!(
        program = request.program(),
        verb = request.verb(),
        "streaming runtime output"
    );

    Ok(LineStream {
        source: LineSource::Process {
            program: String::from(request.program()),
            receiver,
            _process: StreamingProcess { child, readers },
        },
    })
}

fn spawn_reader<R: Read + Send + 'static>(
    pipe: R,
    sender: Sender<std::io::Result<String>>,
) -> JoinHandle<()> {
    std::thread::spawn(move || {
        for line in BufReader::new(pipe).lines() {
            let failed = line.is_err();
            // The receiver disappears when the stream is dropped.
            if sender.send(line).is_err() || failed {
                break;
            }
        }
    })
}
