//! Workspace identity, tag prefix and Python version resolution
//!
//! Cache tags are plain strings derived from a prefix and the resolved
//! Python version. Both phases derive them the same way, so restore and
//! save address the same cache slots.

use crate::ci::CiEnv;
use crate::error::{PyCacheError, PyCacheResult};
use std::path::Path;
use tokio::fs;
use tracing::debug;

/// Python version used when nothing pins one
pub const DEFAULT_PYTHON_VERSION: &str = "3.12";

/// Tag prefix used when neither an input nor a repository name exists
pub const FALLBACK_TAG_PREFIX: &str = "python";

/// Namespace prepended to bare workspace names
const DEFAULT_NAMESPACE: &str = "default";

/// Tags for the three cached artifacts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheTags {
    pub python: String,
    pub pip: String,
    pub uv: String,
}

impl CacheTags {
    pub fn new(prefix: &str, python_version: &str) -> Self {
        Self {
            python: format!("{}-python-{}", prefix, python_version),
            pip: format!("{}-pip", prefix),
            uv: format!("{}-uv", prefix),
        }
    }
}

/// Resolve the workspace from the input, then `BORINGCACHE_DEFAULT_WORKSPACE`
pub fn resolve_workspace(input: &str, env: &CiEnv) -> PyCacheResult<String> {
    let input = input.trim();
    let chosen = if !input.is_empty() {
        input
    } else {
        env.default_workspace
            .as_deref()
            .map(str::trim)
            .filter(|w| !w.is_empty())
            .ok_or(PyCacheError::WorkspaceRequired)?
    };

    Ok(normalize_workspace(chosen))
}

/// Qualify a bare name with the default namespace
pub fn normalize_workspace(workspace: &str) -> String {
    if workspace.contains('/') {
        workspace.to_string()
    } else {
        format!("{}/{}", DEFAULT_NAMESPACE, workspace)
    }
}

/// Resolve the stable prefix used by every cache tag
pub fn resolve_cache_tag_prefix(input: &str, env: &CiEnv, fallback: &str) -> String {
    let input = input.trim();
    if !input.is_empty() {
        return input.to_string();
    }

    env.github_repository
        .as_deref()
        .and_then(|repo| repo.rsplit('/').find(|segment| !segment.is_empty()))
        .unwrap_or(fallback)
        .to_string()
}

/// Resolve the Python version from the input or the project's pin files
pub async fn resolve_python_version(input: &str, working_dir: &Path, default: &str) -> String {
    let input = input.trim();
    if !input.is_empty() {
        return input.to_string();
    }

    let pin_file = working_dir.join(".python-version");
    if let Ok(content) = fs::read_to_string(&pin_file).await {
        if let Some(version) = parse_python_version_file(&content) {
            debug!("Python {} pinned by {}", version, pin_file.display());
            return version;
        }
    }

    let tool_versions = working_dir.join(".tool-versions");
    if let Ok(content) = fs::read_to_string(&tool_versions).await {
        if let Some(version) = parse_tool_versions(&content) {
            debug!("Python {} pinned by {}", version, tool_versions.display());
            return version;
        }
    }

    default.to_string()
}

/// First non-blank, non-comment line of a `.python-version` file
fn parse_python_version_file(content: &str) -> Option<String> {
    content
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
}

/// Version from the first `python <version>` line of a `.tool-versions` file
fn parse_tool_versions(content: &str) -> Option<String> {
    content
        .lines()
        .filter_map(|line| line.strip_prefix("python "))
        .find_map(|rest| rest.split_whitespace().next())
        .map(str::to_string)
}
