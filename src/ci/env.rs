//! Environment snapshot
//!
//! Every derivation in pycache reads the environment through a `CiEnv`
//! captured once at startup, so tag and directory resolution stay pure.

use std::env;
use std::path::PathBuf;

/// Environment values consumed by the restore and save phases
#[derive(Debug, Clone, Default)]
pub struct CiEnv {
    /// User home directory
    pub home: Option<PathBuf>,

    /// `GITHUB_REPOSITORY` (`owner/name`), used for the tag prefix fallback
    pub github_repository: Option<String>,

    /// `BORINGCACHE_DEFAULT_WORKSPACE`
    pub default_workspace: Option<String>,

    /// `PIP_CACHE_DIR` override
    pub pip_cache_dir: Option<PathBuf>,

    /// `UV_CACHE_DIR` override
    pub uv_cache_dir: Option<PathBuf>,

    /// `MISE_DATA_DIR` override
    pub mise_data_dir: Option<PathBuf>,

    /// `LOCALAPPDATA` (Windows)
    pub local_app_data: Option<PathBuf>,

    /// `MISE_VERSION` release override
    pub mise_version: Option<String>,

    /// `RUNNER_TEMP`, job-scoped scratch directory
    pub runner_temp: Option<PathBuf>,

    /// `GITHUB_OUTPUT` step output file
    pub github_output: Option<PathBuf>,

    /// `GITHUB_PATH` file for PATH additions in later steps
    pub github_path: Option<PathBuf>,

    /// Running under GitHub Actions
    pub github_actions: bool,

    /// `RUNNER_DEBUG=1`
    pub runner_debug: bool,
}

impl CiEnv {
    /// Capture the current process environment
    pub fn capture() -> Self {
        Self {
            home: dirs::home_dir(),
            github_repository: var("GITHUB_REPOSITORY"),
            default_workspace: var("BORINGCACHE_DEFAULT_WORKSPACE"),
            pip_cache_dir: var("PIP_CACHE_DIR").map(PathBuf::from),
            uv_cache_dir: var("UV_CACHE_DIR").map(PathBuf::from),
            mise_data_dir: var("MISE_DATA_DIR").map(PathBuf::from),
            local_app_data: var("LOCALAPPDATA")
                .or_else(|| var("LocalAppData"))
                .map(PathBuf::from),
            mise_version: var("MISE_VERSION"),
            runner_temp: var("RUNNER_TEMP").map(PathBuf::from),
            github_output: var("GITHUB_OUTPUT").map(PathBuf::from),
            github_path: var("GITHUB_PATH").map(PathBuf::from),
            github_actions: var("GITHUB_ACTIONS").is_some_and(|v| v == "true"),
            runner_debug: var("RUNNER_DEBUG").is_some_and(|v| v == "1"),
        }
    }

    /// Home directory, or the current directory when none is known
    pub fn home_dir(&self) -> PathBuf {
        self.home.clone().unwrap_or_else(|| PathBuf::from("."))
    }
}

/// Read a variable, treating empty values as unset
fn var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}
