//! Child process runner backed by tokio

use crate::error::{PyCacheError, PyCacheResult};
use crate::tools::runner::{CommandRunner, Completed, Invocation};
use crate::tools::{stream_child_output, Stream};
use async_trait::async_trait;
use std::io::Write;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

/// Runs invocations as real child processes, relaying their output
pub struct ProcessRunner;

impl ProcessRunner {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ProcessRunner {
    fn default() -> Self {
        Self::new()
    }
}

/// Forward a child's line to our own stdout or stderr
fn relay(stream: Stream, line: &str) {
    match stream {
        Stream::Stdout => {
            let mut out = std::io::stdout().lock();
            let _ = writeln!(out, "{}", line);
        }
        Stream::Stderr => {
            let mut err = std::io::stderr().lock();
            let _ = writeln!(err, "{}", line);
        }
    }
}

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(&self, invocation: &Invocation) -> PyCacheResult<Completed> {
        debug!("Executing: {}", invocation);

        let mut child = Command::new(&invocation.program)
            .args(&invocation.args)
            .envs(invocation.envs.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| PyCacheError::command_failed(invocation.to_string(), e))?;

        let output = if invocation.quiet {
            stream_child_output(&mut child, &|_, _| {}).await
        } else {
            stream_child_output(&mut child, &relay).await
        };

        let status = child
            .wait()
            .await
            .map_err(|e| PyCacheError::command_failed(invocation.to_string(), e))?;

        match status.code() {
            Some(code) => {
                debug!("{} exited with {}", invocation, code);
                Ok(Completed { code, output })
            }
            None => Err(PyCacheError::ProcessSignaled {
                command: invocation.to_string(),
            }),
        }
    }
}
