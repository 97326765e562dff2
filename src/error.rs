//! Error types for pycache
//!
//! All modules use `PyCacheResult<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for pycache operations
pub type PyCacheResult<T> = Result<T, PyCacheError>;

/// All errors that can occur in pycache
#[derive(Error, Debug)]
pub enum PyCacheError {
    // Configuration errors
    #[error("Workspace required. Set the workspace input or BORINGCACHE_DEFAULT_WORKSPACE")]
    WorkspaceRequired,

    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Invalid state file {path}: {reason}")]
    StateInvalid { path: PathBuf, reason: String },

    // Process errors
    #[error("Command failed: {command}")]
    CommandFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{command} exited with code {code}")]
    ToolFailed { command: String, code: i32 },

    #[error("{command} terminated by signal")]
    ProcessSignaled { command: String },

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // Phase errors
    #[error("Python setup failed: {0}")]
    SetupFailed(Box<PyCacheError>),
}

impl PyCacheError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a command failed error
    pub fn command_failed(command: impl Into<String>, source: std::io::Error) -> Self {
        Self::CommandFailed {
            command: command.into(),
            source,
        }
    }

    /// Wrap an error raised while setting up the toolchain
    pub fn setup_failed(source: PyCacheError) -> Self {
        match source {
            already @ Self::SetupFailed(_) => already,
            other => Self::SetupFailed(Box::new(other)),
        }
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::WorkspaceRequired => Some("Pass --workspace <owner>/<name>"),
            Self::CommandFailed { command, .. } if command.starts_with("boringcache") => {
                Some("Install the boringcache CLI or drop --cli-version skip")
            }
            Self::CommandFailed { command, .. } if command.contains("mise") => {
                Some("Check that ~/.local/bin is writable and curl is installed")
            }
            Self::SetupFailed(inner) => inner.hint(),
            _ => None,
        }
    }
}
