//! Scripted container runtime shared by the behavioural tests.
//!
//! [`FakeRuntime`] answers each runtime verb from a queue of scripted replies
//! and records every argument list it receives. The last reply queued for a
//! verb repeats forever, so a single reply scripts a steady state.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, PoisonError};

use harbor::error::ProcessError;
use harbor::process::{CommandOutput, CommandRequest, LineStream, ProcessRunner};

/// One scripted answer to a runtime invocation.
#[derive(Debug, Clone)]
struct Reply {
    code: i32,
    stdout: String,
    stderr: String,
}

/// A runtime whose replies are scripted per verb.
#[derive(Debug, Default)]
pub struct FakeRuntime {
    replies: Mutex<HashMap<String, VecDeque<Reply>>>,
    calls: Mutex<Vec<Vec<String>>>,
}

impl FakeRuntime {
    /// Queue a reply for `verb`.
    pub fn reply(&self, verb: &str, code: i32, stdout: &str, stderr: &str) {
        self.replies
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(String::from(verb))
            .or_default()
            .push_back(Reply {
                code,
                stdout: String::from(stdout),
                stderr: String::from(stderr),
            });
    }

    /// Queue a successful reply for `verb`.
    pub fn succeed(&self, verb: &str, stdout: &str) {
        self.reply(verb, 0, stdout, "");
    }

    /// Queue a failed reply for `verb`.
    pub fn fail(&self, verb: &str, code: i32, stderr: &str) {
        self.reply(verb, code, "", stderr);
    }

    /// Return every argument list received, in order.
    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Return the verb of every invocation received, in order.
    pub fn verbs(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|args| args.into_iter().next())
            .collect()
    }

    fn next_reply(&self, verb: &str) -> Option<Reply> {
        let mut replies = self.replies.lock().unwrap_or_else(PoisonError::into_inner);
        let queue = replies.get_mut(verb)?;
        if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        }
    }
}

impl ProcessRunner for FakeRuntime {
    fn run(&self, request: &CommandRequest) -> Result<CommandOutput, ProcessError> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request.args().to_vec());

        let output = match self.next_reply(request.verb()) {
            Some(reply) => CommandOutput::new(
                request,
                reply.code,
                reply.stdout,
                reply.stderr,
                std::time::Duration::ZERO,
            ),
            None => CommandOutput::failure(
                request,
                1,
                format!("Error: unscripted verb '{}'", request.verb()),
            ),
        };
        Ok(output)
    }

    fn stream_lines(&self, request: &CommandRequest) -> Result<LineStream, ProcessError> {
        let output = self.run(request)?;
        Ok(LineStream::from_lines(
            output.stdout().lines().map(String::from).collect::<Vec<_>>(),
        ))
    }
}

/// Render a single-element `inspect` document for a container.
pub fn inspect_json(id: &str, name: &str, status: &str) -> String {
    format!(
        r#"[{{"Id":"{id}","Name":"/{name}","State":{{"Status":"{status}"}},"Config":{{"Image":"alpine:3.20"}}}}]"#
    )
}
