//! Command runner abstraction

use crate::error::{PyCacheError, PyCacheResult};
use async_trait::async_trait;
use std::fmt;
use std::path::PathBuf;

/// A single external command to run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Program name or path
    pub program: PathBuf,
    /// Arguments
    pub args: Vec<String>,
    /// Extra environment variables for the child
    pub envs: Vec<(String, String)>,
    /// Collect output without relaying it to the job log
    pub quiet: bool,
}

impl Invocation {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            envs: Vec::new(),
            quiet: false,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.envs.push((key.into(), value.into()));
        self
    }

    pub fn quiet(mut self) -> Self {
        self.quiet = true;
        self
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Result of a finished command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Completed {
    /// Process exit code
    pub code: i32,
    /// Combined stdout and stderr lines
    pub output: Vec<String>,
}

impl Completed {
    pub fn success(&self) -> bool {
        self.code == 0
    }
}

/// Runs external commands to completion
///
/// Implementations return `Err` only when the command could not run at
/// all (spawn failure, signal); a non-zero exit is reported in
/// [`Completed::code`] and interpreted by the caller.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, invocation: &Invocation) -> PyCacheResult<Completed>;
}

/// Run a command and treat any non-zero exit as an error
pub async fn run_checked(
    runner: &dyn CommandRunner,
    invocation: &Invocation,
) -> PyCacheResult<Completed> {
    let completed = runner.run(invocation).await?;
    if completed.success() {
        Ok(completed)
    } else {
        Err(PyCacheError::ToolFailed {
            command: invocation.to_string(),
            code: completed.code,
        })
    }
}
