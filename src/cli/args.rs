//! CLI argument definitions using clap derive
//!
//! Every job input can also be supplied through the `INPUT_<NAME>`
//! variable a GitHub Actions runner sets for action inputs.

use crate::phase::{RestoreInputs, SaveInputs};
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// pycache - Python toolchain cache for CI
///
/// Restores the Python interpreter, pip and uv caches before a job and
/// saves them afterwards, using the boringcache CLI for storage.
#[derive(Parser, Debug)]
#[command(name = "pycache")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Log output format
    #[arg(long, global = true, env = "PYCACHE_LOG_FORMAT", default_value = "text")]
    pub log_format: LogFormat,

    /// Configuration file path
    #[arg(short, long, global = true, env = "PYCACHE_CONFIG")]
    pub config: Option<PathBuf>,

    /// File carrying state from restore to save
    #[arg(long, global = true, env = "PYCACHE_STATE_FILE")]
    pub state_file: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Restore caches and set up Python (run before the build)
    Restore(RestoreArgs),

    /// Save caches recorded by restore (run after the build)
    Save(SaveArgs),
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

/// Inputs shared by both phases
#[derive(Args, Debug)]
pub struct CommonArgs {
    /// boringcache CLI version to ensure ("skip" to use the installed one)
    #[arg(long, env = "INPUT_CLI-VERSION", default_value = "")]
    pub cli_version: String,

    /// Workspace (<owner>/<name>); bare names get a "default/" namespace
    #[arg(short, long, env = "INPUT_WORKSPACE", default_value = "")]
    pub workspace: String,
}

/// Arguments for the restore command
#[derive(Args, Debug)]
pub struct RestoreArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Python version (defaults to .python-version, .tool-versions, then 3.12)
    #[arg(long, env = "INPUT_PYTHON-VERSION", default_value = "")]
    pub python_version: String,

    /// Directory containing the version pin files
    #[arg(long, env = "INPUT_WORKING-DIRECTORY", default_value = ".")]
    pub working_directory: String,

    /// Cache tag prefix (defaults to the repository name)
    #[arg(long, env = "INPUT_CACHE-TAG", default_value = "")]
    pub cache_tag: String,

    /// Cache the Python installation
    #[arg(long, env = "INPUT_CACHE-PYTHON", default_value = "true", value_parser = parse_enabled, action = ArgAction::Set)]
    pub cache_python: bool,

    /// Cache pip's download cache
    #[arg(long, env = "INPUT_CACHE-PIP", default_value = "true", value_parser = parse_enabled, action = ArgAction::Set)]
    pub cache_pip: bool,

    /// Cache uv's cache
    #[arg(long, env = "INPUT_CACHE-UV", default_value = "true", value_parser = parse_enabled, action = ArgAction::Set)]
    pub cache_uv: bool,

    /// Pass --verbose to the cache CLI
    #[arg(long, env = "INPUT_VERBOSE", default_value = "false", value_parser = parse_opt_in, action = ArgAction::Set)]
    pub cache_verbose: bool,

    /// Path pattern excluded when saving pip and uv caches
    #[arg(long, env = "INPUT_EXCLUDE", default_value = "")]
    pub exclude: String,
}

impl RestoreArgs {
    pub fn into_inputs(self) -> RestoreInputs {
        let working_directory = match self.working_directory.trim() {
            "" => ".",
            dir => dir,
        };

        RestoreInputs {
            cli_version: self.common.cli_version,
            workspace: self.common.workspace,
            python_version: self.python_version,
            working_directory: PathBuf::from(working_directory),
            cache_tag: self.cache_tag,
            cache_python: self.cache_python,
            cache_pip: self.cache_pip,
            cache_uv: self.cache_uv,
            verbose: self.cache_verbose,
            exclude: self.exclude,
        }
    }
}

/// Arguments for the save command
#[derive(Args, Debug)]
pub struct SaveArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Set to false to skip saving the pip cache
    #[arg(long, env = "INPUT_CACHE-PIP", value_parser = parse_enabled, action = ArgAction::Set)]
    pub cache_pip: Option<bool>,

    /// Set to false to skip saving the uv cache
    #[arg(long, env = "INPUT_CACHE-UV", value_parser = parse_enabled, action = ArgAction::Set)]
    pub cache_uv: Option<bool>,
}

impl SaveArgs {
    pub fn into_inputs(self) -> SaveInputs {
        SaveInputs {
            cli_version: self.common.cli_version,
            workspace: self.common.workspace,
            cache_pip: self.cache_pip,
            cache_uv: self.cache_uv,
        }
    }
}

/// Enabled unless the value is literally "false"
fn parse_enabled(s: &str) -> Result<bool, String> {
    Ok(!s.trim().eq_ignore_ascii_case("false"))
}

/// Enabled only when the value is literally "true"
fn parse_opt_in(s: &str) -> Result<bool, String> {
    Ok(s.trim().eq_ignore_ascii_case("true"))
}
