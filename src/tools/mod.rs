//! External tool invocation
//!
//! Every external program (the cache CLI, mise, uv, installer scripts) is
//! run through the [`CommandRunner`] trait:
//! - [`ProcessRunner`] spawns real child processes
//! - tests substitute a recording fake

pub mod boringcache;
pub mod mise;
mod process;
mod runner;
pub mod uv;

pub use boringcache::{CacheCli, CacheEntry, RestoreOutcome, SaveOptions};
pub use mise::{InterpreterAction, Mise};
pub use process::ProcessRunner;
pub use runner::{run_checked, CommandRunner, Completed, Invocation};

use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};

/// Which stream a relayed line came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Stream {
    Stdout,
    Stderr,
}

/// Read one line, decoding invalid UTF-8 lossily so the pipe keeps draining.
///
/// `buf` must outlive a cancelled call: bytes already consumed stay in it
/// and the next call continues the same line. Returns `None` at end of
/// stream or on a read error.
async fn next_lossy_line<R>(reader: Option<&mut R>, buf: &mut Vec<u8>) -> Option<String>
where
    R: AsyncBufRead + Unpin,
{
    let reader = reader?;
    match reader.read_until(b'\n', buf).await {
        Ok(0) | Err(_) => None,
        Ok(_) => {
            let mut line = std::mem::take(buf);
            if line.ends_with(b"\n") {
                line.pop();
                if line.ends_with(b"\r") {
                    line.pop();
                }
            }
            Some(String::from_utf8_lossy(&line).into_owned())
        }
    }
}

/// Stream stdout+stderr from a child process, calling `on_output` for each line.
///
/// Returns all collected output lines. A stream that was not piped counts as
/// already finished.
pub(crate) async fn stream_child_output(
    child: &mut tokio::process::Child,
    on_output: &(dyn Fn(Stream, &str) + Send + Sync),
) -> Vec<String> {
    let mut all_output = Vec::new();

    let mut stderr_reader = child.stderr.take().map(BufReader::new);
    let mut stdout_reader = child.stdout.take().map(BufReader::new);
    let mut stderr_done = stderr_reader.is_none();
    let mut stdout_done = stdout_reader.is_none();
    let mut stderr_buf = Vec::new();
    let mut stdout_buf = Vec::new();

    while !stderr_done || !stdout_done {
        tokio::select! {
            line = next_lossy_line(stderr_reader.as_mut(), &mut stderr_buf), if !stderr_done => {
                match line {
                    Some(line) => {
                        on_output(Stream::Stderr, &line);
                        all_output.push(line);
                    }
                    None => stderr_done = true,
                }
            }
            line = next_lossy_line(stdout_reader.as_mut(), &mut stdout_buf), if !stdout_done => {
                match line {
                    Some(line) => {
                        on_output(Stream::Stdout, &line);
                        all_output.push(line);
                    }
                    None => stdout_done = true,
                }
            }
        }
    }

    all_output
}
