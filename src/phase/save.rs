//! Save phase
//!
//! Uploads the interpreter, pip and uv caches recorded by the restore
//! phase. Saving is best effort: the caller downgrades any error returned
//! here to a warning.

use crate::error::PyCacheResult;
use crate::paths;
use crate::phase::PhaseContext;
use crate::state::PhaseState;
use crate::tags::normalize_workspace;
use crate::tools::boringcache::bootstrap_requested;
use crate::tools::{uv, CacheEntry, SaveOptions};
use std::path::{Path, PathBuf};
use tracing::info;

/// Job inputs for the save phase
#[derive(Debug, Clone, Default)]
pub struct SaveInputs {
    pub cli_version: String,
    pub workspace: String,
    /// `Some(false)` disables the pip save even when restore enabled it
    pub cache_pip: Option<bool>,
    /// `Some(false)` disables the uv save even when restore enabled it
    pub cache_uv: Option<bool>,
}

/// What the save phase did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveReport {
    /// No workspace was available, nothing was attempted
    Skipped,
    /// Tags that were uploaded, in order
    Saved { tags: Vec<String> },
}

/// Run the save phase
pub async fn save(
    inputs: &SaveInputs,
    state: &PhaseState,
    ctx: &PhaseContext<'_>,
) -> PyCacheResult<SaveReport> {
    let workspace = match workspace(inputs, state) {
        Some(workspace) => workspace,
        None => {
            info!("No workspace found, skipping cache save");
            return Ok(SaveReport::Skipped);
        }
    };

    let cache = ctx.cache_cli();
    if bootstrap_requested(&inputs.cli_version) {
        cache.ensure(&inputs.cli_version).await?;
    }

    let cache_pip = inputs.cache_pip != Some(false) && state.pip_enabled();
    let cache_uv = inputs.cache_uv != Some(false) && state.uv_enabled();
    let exclude = Some(state.exclude.clone()).filter(|e| !e.is_empty());
    let mut saved = Vec::new();

    info!("Saving to BoringCache...");

    if state.python_enabled() && !state.python_tag.is_empty() {
        info!("Saving Python [{}]...", state.python_tag);
        let dir = dir_or_default(&state.mise_dir, || paths::mise_data_dir(ctx.env, ctx.platform));
        let options = SaveOptions {
            verbose: state.verbose,
            exclude: None,
        };
        cache
            .save(&workspace, &CacheEntry::new(&state.python_tag, dir), &options)
            .await?;
        saved.push(state.python_tag.clone());
    }

    let options = SaveOptions {
        verbose: state.verbose,
        exclude,
    };

    if cache_pip && !state.pip_tag.is_empty() {
        info!("Saving pip cache [{}]...", state.pip_tag);
        let dir = dir_or_default(&state.pip_cache_dir, || paths::pip_cache_dir(ctx.env, ctx.platform));
        cache
            .save(&workspace, &CacheEntry::new(&state.pip_tag, dir), &options)
            .await?;
        saved.push(state.pip_tag.clone());
    }

    if cache_uv && !state.uv_tag.is_empty() {
        uv::prune_cache(ctx.runner).await;
        info!("Saving uv cache [{}]...", state.uv_tag);
        let dir = dir_or_default(&state.uv_cache_dir, || paths::uv_cache_dir(ctx.env, ctx.platform));
        cache
            .save(&workspace, &CacheEntry::new(&state.uv_tag, dir), &options)
            .await?;
        saved.push(state.uv_tag.clone());
    }

    info!("Save complete");
    Ok(SaveReport::Saved { tags: saved })
}

/// Workspace from the input, else the one restore recorded
fn workspace(inputs: &SaveInputs, state: &PhaseState) -> Option<String> {
    [inputs.workspace.trim(), state.workspace.trim()]
        .into_iter()
        .find(|w| !w.is_empty())
        .map(normalize_workspace)
}

fn dir_or_default(recorded: &Path, default: impl FnOnce() -> PathBuf) -> PathBuf {
    if recorded.as_os_str().is_empty() {
        default()
    } else {
        recorded.to_path_buf()
    }
}
