//! Restore phase
//!
//! Order of operations:
//! 1. Bootstrap the cache CLI (unless the version input is `skip`)
//! 2. Resolve workspace, tag prefix, Python version and tags
//! 3. Restore the interpreter cache (if enabled)
//! 4. Install mise, then activate (hit) or install (miss) Python
//! 5. Restore the pip and uv caches (each if enabled)
//!
//! [`prepare`] covers steps 1-2 so the caller can publish the identity
//! outputs before anything that may fail; [`restore_caches`] does the rest.
//!
//! A miss never fails the phase. Anything else that goes wrong does.

use crate::error::PyCacheResult;
use crate::paths;
use crate::phase::PhaseContext;
use crate::state::PhaseState;
use crate::tags::{self, CacheTags};
use crate::tools::boringcache::bootstrap_requested;
use crate::tools::{CacheEntry, InterpreterAction};
use std::path::PathBuf;
use tracing::info;

/// Job inputs for the restore phase
#[derive(Debug, Clone)]
pub struct RestoreInputs {
    pub cli_version: String,
    pub workspace: String,
    pub python_version: String,
    pub working_directory: PathBuf,
    pub cache_tag: String,
    pub cache_python: bool,
    pub cache_pip: bool,
    pub cache_uv: bool,
    pub verbose: bool,
    pub exclude: String,
}

impl Default for RestoreInputs {
    fn default() -> Self {
        Self {
            cli_version: String::new(),
            workspace: String::new(),
            python_version: String::new(),
            working_directory: PathBuf::from("."),
            cache_tag: String::new(),
            cache_python: true,
            cache_pip: true,
            cache_uv: true,
            verbose: false,
            exclude: String::new(),
        }
    }
}

/// Workspace, version and tags resolved before any cache is touched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestoreIdentity {
    pub workspace: String,
    pub cache_tag_prefix: String,
    pub python_version: String,
    pub tags: CacheTags,
}

impl RestoreIdentity {
    /// Outputs available as soon as the identity is known
    pub fn outputs(&self) -> Vec<(&'static str, String)> {
        vec![
            ("workspace", self.workspace.clone()),
            ("python-version", self.python_version.clone()),
            ("python-tag", self.tags.python.clone()),
            ("pip-tag", self.tags.pip.clone()),
            ("uv-tag", self.tags.uv.clone()),
        ]
    }
}

/// Everything the restore phase resolved and observed
#[derive(Debug, Clone)]
pub struct RestoreReport {
    pub workspace: String,
    pub cache_tag_prefix: String,
    pub python_version: String,
    pub tags: CacheTags,

    pub mise_dir: PathBuf,
    pub pip_cache_dir: PathBuf,
    pub uv_cache_dir: PathBuf,

    /// `None` when the artifact was disabled
    pub python_hit: Option<bool>,
    pub pip_hit: Option<bool>,
    pub uv_hit: Option<bool>,

    pub interpreter: InterpreterAction,

    /// Directories later job steps need on PATH
    pub path_additions: Vec<PathBuf>,

    pub verbose: bool,
    pub exclude: String,
}

impl RestoreReport {
    /// Package cache hit; the interpreter cache does not count
    pub fn cache_hit(&self) -> bool {
        self.pip_hit.unwrap_or(false) || self.uv_hit.unwrap_or(false)
    }

    /// Step outputs, in the order they are emitted
    pub fn outputs(&self) -> Vec<(&'static str, String)> {
        let mut outputs = self.identity().outputs();
        outputs.extend(self.hit_outputs());
        outputs
    }

    /// Hit outputs for enabled artifacts, then the aggregate `cache-hit`
    pub fn hit_outputs(&self) -> Vec<(&'static str, String)> {
        let hits = [
            ("python-cache-hit", self.python_hit),
            ("pip-cache-hit", self.pip_hit),
            ("uv-cache-hit", self.uv_hit),
        ];
        let mut outputs: Vec<_> = hits
            .into_iter()
            .filter_map(|(name, hit)| hit.map(|hit| (name, hit.to_string())))
            .collect();

        outputs.push(("cache-hit", self.cache_hit().to_string()));
        outputs
    }

    pub fn identity(&self) -> RestoreIdentity {
        RestoreIdentity {
            workspace: self.workspace.clone(),
            cache_tag_prefix: self.cache_tag_prefix.clone(),
            python_version: self.python_version.clone(),
            tags: self.tags.clone(),
        }
    }

    /// State handed to the save phase
    pub fn phase_state(&self) -> PhaseState {
        PhaseState {
            workspace: self.workspace.clone(),
            cache_tag_prefix: self.cache_tag_prefix.clone(),
            python_version: self.python_version.clone(),
            python_tag: self.tags.python.clone(),
            pip_tag: self.tags.pip.clone(),
            uv_tag: self.tags.uv.clone(),
            mise_dir: self.mise_dir.clone(),
            pip_cache_dir: self.pip_cache_dir.clone(),
            uv_cache_dir: self.uv_cache_dir.clone(),
            cache_python: Some(self.python_hit.is_some()),
            cache_pip: Some(self.pip_hit.is_some()),
            cache_uv: Some(self.uv_hit.is_some()),
            verbose: self.verbose,
            exclude: self.exclude.clone(),
            saved_at: None,
        }
    }
}

/// Run the restore phase
pub async fn restore(inputs: &RestoreInputs, ctx: &PhaseContext<'_>) -> PyCacheResult<RestoreReport> {
    let identity = prepare(inputs, ctx).await?;
    restore_caches(inputs, identity, ctx).await
}

/// Steps 1-2: bootstrap the cache CLI and resolve the identity
pub async fn prepare(inputs: &RestoreInputs, ctx: &PhaseContext<'_>) -> PyCacheResult<RestoreIdentity> {
    if bootstrap_requested(&inputs.cli_version) {
        ctx.cache_cli().ensure(&inputs.cli_version).await?;
    }

    let workspace = tags::resolve_workspace(&inputs.workspace, ctx.env)?;
    let prefix = tags::resolve_cache_tag_prefix(
        &inputs.cache_tag,
        ctx.env,
        &ctx.config.python.tag_prefix_fallback,
    );
    let python_version = tags::resolve_python_version(
        &inputs.python_version,
        &inputs.working_directory,
        &ctx.config.python.default_version,
    )
    .await;
    let tags = CacheTags::new(&prefix, &python_version);
    info!("Workspace {} / Python {} / prefix {}", workspace, python_version, prefix);

    Ok(RestoreIdentity {
        workspace,
        cache_tag_prefix: prefix,
        python_version,
        tags,
    })
}

/// Steps 3-5: restore caches and install or activate the interpreter
pub async fn restore_caches(
    inputs: &RestoreInputs,
    identity: RestoreIdentity,
    ctx: &PhaseContext<'_>,
) -> PyCacheResult<RestoreReport> {
    let cache = ctx.cache_cli();
    let RestoreIdentity {
        workspace,
        cache_tag_prefix,
        python_version,
        tags,
    } = identity;

    let mise_dir = paths::mise_data_dir(ctx.env, ctx.platform);
    let pip_cache_dir = paths::pip_cache_dir(ctx.env, ctx.platform);
    let uv_cache_dir = paths::uv_cache_dir(ctx.env, ctx.platform);

    let python_hit = if inputs.cache_python {
        let entry = CacheEntry::new(&tags.python, &mise_dir);
        Some(cache.restore(&workspace, &entry, inputs.verbose).await?)
    } else {
        None
    };

    let mise = ctx.mise();
    let path_additions = mise.install_self().await?;

    let interpreter = InterpreterAction::after_restore(python_hit.is_some_and(|o| o.is_hit()));
    mise.apply(interpreter, &python_version).await?;

    let pip_hit = if inputs.cache_pip {
        let entry = CacheEntry::new(&tags.pip, &pip_cache_dir);
        Some(cache.restore(&workspace, &entry, inputs.verbose).await?)
    } else {
        None
    };

    let uv_hit = if inputs.cache_uv {
        let entry = CacheEntry::new(&tags.uv, &uv_cache_dir);
        Some(cache.restore(&workspace, &entry, inputs.verbose).await?)
    } else {
        None
    };

    Ok(RestoreReport {
        workspace,
        cache_tag_prefix,
        python_version,
        tags,
        mise_dir,
        pip_cache_dir,
        uv_cache_dir,
        python_hit: python_hit.map(|o| o.is_hit()),
        pip_hit: pip_hit.map(|o| o.is_hit()),
        uv_hit: uv_hit.map(|o| o.is_hit()),
        interpreter,
        path_additions,
        verbose: inputs.verbose,
        exclude: inputs.exclude.clone(),
    })
}
