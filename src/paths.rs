//! Default cache and tool directories per platform
//!
//! Pure functions of a captured [`CiEnv`] and a [`Platform`]. Explicit
//! environment overrides always win over platform conventions.

use crate::ci::CiEnv;
use std::path::PathBuf;

/// Detected platform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Linux,
    MacOS,
    Windows,
}

impl Platform {
    /// Detect the current platform
    pub fn detect() -> Self {
        match std::env::consts::OS {
            "macos" => Platform::MacOS,
            "windows" => Platform::Windows,
            _ => Platform::Linux,
        }
    }

    /// Get a human-readable platform name
    pub fn name(&self) -> &'static str {
        match self {
            Platform::Linux => "Linux",
            Platform::MacOS => "macOS",
            Platform::Windows => "Windows",
        }
    }

    pub fn is_windows(&self) -> bool {
        matches!(self, Platform::Windows)
    }
}

/// `%LOCALAPPDATA%`, falling back to `~/AppData/Local`
fn local_app_data(env: &CiEnv) -> PathBuf {
    env.local_app_data
        .clone()
        .unwrap_or_else(|| env.home_dir().join("AppData").join("Local"))
}

/// Path of the mise binary installed by the bootstrap script
pub fn mise_bin_path(env: &CiEnv, platform: Platform) -> PathBuf {
    let bin = if platform.is_windows() { "mise.exe" } else { "mise" };
    env.home_dir().join(".local").join("bin").join(bin)
}

/// Directory holding mise-managed installs; this is the interpreter cache
pub fn mise_data_dir(env: &CiEnv, platform: Platform) -> PathBuf {
    if let Some(dir) = &env.mise_data_dir {
        return dir.clone();
    }

    match platform {
        Platform::Windows => local_app_data(env).join("mise"),
        _ => env.home_dir().join(".local").join("share").join("mise"),
    }
}

/// Directory of mise shims added to PATH
pub fn mise_shims_dir(env: &CiEnv, platform: Platform) -> PathBuf {
    mise_data_dir(env, platform).join("shims")
}

/// pip's HTTP/wheel cache
pub fn pip_cache_dir(env: &CiEnv, platform: Platform) -> PathBuf {
    if let Some(dir) = &env.pip_cache_dir {
        return dir.clone();
    }

    match platform {
        Platform::MacOS => env.home_dir().join("Library").join("Caches").join("pip"),
        Platform::Windows => local_app_data(env).join("pip").join("Cache"),
        Platform::Linux => env.home_dir().join(".cache").join("pip"),
    }
}

/// uv's cache; macOS follows the XDG layout like Linux
pub fn uv_cache_dir(env: &CiEnv, platform: Platform) -> PathBuf {
    if let Some(dir) = &env.uv_cache_dir {
        return dir.clone();
    }

    match platform {
        Platform::Windows => local_app_data(env).join("uv").join("cache"),
        _ => env.home_dir().join(".cache").join("uv"),
    }
}
