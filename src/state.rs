//! State handed from the restore phase to the save phase
//!
//! Restore and save run as separate processes within one job. Restore
//! writes a [`PhaseState`] JSON file and save reads it back; the file lives
//! in the runner's job-scoped temp directory when there is one. Restore
//! clears any stale file before it starts and save consumes the file, so
//! state never carries over to another job.

use crate::ci::CiEnv;
use crate::config::ConfigManager;
use crate::error::{PyCacheError, PyCacheResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

const STATE_FILE_NAME: &str = "pycache-state.json";

/// Values the save phase needs from restore
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct PhaseState {
    pub workspace: String,
    pub cache_tag_prefix: String,
    pub python_version: String,

    pub python_tag: String,
    pub pip_tag: String,
    pub uv_tag: String,

    pub mise_dir: PathBuf,
    pub pip_cache_dir: PathBuf,
    pub uv_cache_dir: PathBuf,

    /// Unset when no restore ran; save then treats python caching as off
    pub cache_python: Option<bool>,
    /// Unset when no restore ran; save then treats pip caching as on
    pub cache_pip: Option<bool>,
    /// Unset when no restore ran; save then treats uv caching as on
    pub cache_uv: Option<bool>,

    pub verbose: bool,
    pub exclude: String,

    pub saved_at: Option<DateTime<Utc>>,
}

impl PhaseState {
    /// Python installs are saved only when restore recorded them as enabled
    pub fn python_enabled(&self) -> bool {
        self.cache_python == Some(true)
    }

    pub fn pip_enabled(&self) -> bool {
        self.cache_pip != Some(false)
    }

    pub fn uv_enabled(&self) -> bool {
        self.cache_uv != Some(false)
    }
}

/// Location of the state file shared by both phases
#[derive(Debug, Clone)]
pub struct StateFile {
    path: PathBuf,
}

impl StateFile {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Explicit path, else `$RUNNER_TEMP`, else the user state directory
    pub fn resolve(explicit: Option<PathBuf>, env: &CiEnv) -> Self {
        let path = explicit
            .or_else(|| env.runner_temp.as_ref().map(|dir| dir.join(STATE_FILE_NAME)))
            .unwrap_or_else(|| ConfigManager::state_dir().join(STATE_FILE_NAME));
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load state, returning empty state when restore never wrote any
    pub async fn load(&self) -> PyCacheResult<PhaseState> {
        if !self.path.exists() {
            debug!("No state file at {}", self.path.display());
            return Ok(PhaseState::default());
        }

        let content = fs::read_to_string(&self.path).await.map_err(|e| {
            PyCacheError::io(format!("reading state file {}", self.path.display()), e)
        })?;

        serde_json::from_str(&content).map_err(|e| PyCacheError::StateInvalid {
            path: self.path.clone(),
            reason: e.to_string(),
        })
    }

    /// Load state and remove the file, so a later job never sees it
    pub async fn take(&self) -> PyCacheResult<PhaseState> {
        let state = self.load().await;
        self.clear().await?;
        state
    }

    /// Remove any state left behind by an earlier run
    pub async fn clear(&self) -> PyCacheResult<()> {
        match fs::remove_file(&self.path).await {
            Ok(()) => {
                debug!("Removed state file {}", self.path.display());
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(PyCacheError::io(
                format!("removing state file {}", self.path.display()),
                e,
            )),
        }
    }

    /// Persist state, stamping the write time
    pub async fn save(&self, state: &PhaseState) -> PyCacheResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| PyCacheError::io("creating state directory", e))?;
        }

        let stamped = PhaseState {
            saved_at: Some(Utc::now()),
            ..state.clone()
        };
        let content = serde_json::to_string_pretty(&stamped)?;
        fs::write(&self.path, content).await.map_err(|e| {
            PyCacheError::io(format!("writing state file {}", self.path.display()), e)
        })?;

        debug!("Saved phase state to {}", self.path.display());
        Ok(())
    }
}
