//! mise version manager
//!
//! mise installs interpreters under its data directory, which doubles as
//! the interpreter cache. When that directory was restored from cache,
//! selecting the version is enough; otherwise mise downloads it first.

use crate::ci::CiEnv;
use crate::config::schema::MiseConfig;
use crate::error::{PyCacheError, PyCacheResult};
use crate::paths::{self, Platform};
use crate::tools::runner::{run_checked, CommandRunner, Invocation};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};
use uuid::Uuid;

/// What to do with the interpreter once the cache restore has run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterpreterAction {
    /// Interpreter came from cache: only select it globally
    Activate,
    /// Download and install, then select it globally
    Install,
}

impl InterpreterAction {
    /// A cache hit must never trigger a network install
    pub fn after_restore(cache_hit: bool) -> Self {
        if cache_hit {
            Self::Activate
        } else {
            Self::Install
        }
    }
}

/// Handle on the mise CLI
pub struct Mise<'a> {
    runner: &'a dyn CommandRunner,
    config: &'a MiseConfig,
    env: &'a CiEnv,
    platform: Platform,
}

impl<'a> Mise<'a> {
    pub fn new(
        runner: &'a dyn CommandRunner,
        config: &'a MiseConfig,
        env: &'a CiEnv,
        platform: Platform,
    ) -> Self {
        Self {
            runner,
            config,
            env,
            platform,
        }
    }

    /// Path of the mise binary
    pub fn bin_path(&self) -> PathBuf {
        paths::mise_bin_path(self.env, self.platform)
    }

    /// Release used for the Windows zip download
    fn release(&self) -> &str {
        self.env
            .mise_version
            .as_deref()
            .unwrap_or(&self.config.version)
    }

    /// Install mise itself and return the directories to put on PATH
    pub async fn install_self(&self) -> PyCacheResult<Vec<PathBuf>> {
        info!("Installing mise...");

        if self.platform.is_windows() {
            self.install_windows().await?;
        } else {
            let inv = Invocation::new("sh").args([
                "-c".to_string(),
                format!("curl {} | sh", self.config.install_script),
            ]);
            run_checked(self.runner, &inv).await?;
        }

        let bin_dir = self
            .bin_path()
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        Ok(vec![bin_dir, paths::mise_shims_dir(self.env, self.platform)])
    }

    async fn install_windows(&self) -> PyCacheResult<()> {
        let arch = if std::env::consts::ARCH == "aarch64" {
            "arm64"
        } else {
            "x64"
        };
        let release = self.release();
        let url = format!(
            "https://github.com/jdx/mise/releases/download/{0}/mise-{0}-windows-{1}.zip",
            release, arch
        );

        let bin_path = self.bin_path();
        if let Some(bin_dir) = bin_path.parent() {
            fs::create_dir_all(bin_dir)
                .await
                .map_err(|e| PyCacheError::io(format!("creating {}", bin_dir.display()), e))?;
        }

        let temp_dir = std::env::temp_dir().join(format!("mise-{}", Uuid::new_v4()));
        fs::create_dir_all(&temp_dir)
            .await
            .map_err(|e| PyCacheError::io("creating mise download directory", e))?;

        let result = self.unpack_release(&url, &temp_dir, &bin_path).await;

        if let Err(e) = fs::remove_dir_all(&temp_dir).await {
            debug!("Failed to clean up {}: {}", temp_dir.display(), e);
        }
        result
    }

    async fn unpack_release(&self, url: &str, temp_dir: &Path, bin_path: &Path) -> PyCacheResult<()> {
        let zip_path = temp_dir.join("mise.zip");
        let zip = zip_path.display().to_string();
        let dest = temp_dir.display().to_string();

        run_checked(
            self.runner,
            &Invocation::new("curl").args(["-fsSL", "-o", zip.as_str(), url]),
        )
        .await?;
        run_checked(
            self.runner,
            &Invocation::new("tar").args(["-xf", zip.as_str(), "-C", dest.as_str()]),
        )
        .await?;

        let extracted = temp_dir.join("mise").join("bin").join("mise.exe");
        fs::copy(&extracted, bin_path)
            .await
            .map_err(|e| PyCacheError::io(format!("copying {}", extracted.display()), e))?;
        Ok(())
    }

    /// Download and install a Python version, then select it
    pub async fn install(&self, version: &str) -> PyCacheResult<()> {
        let inv = Invocation::new(self.bin_path()).args(["install".to_string(), python_spec(version)]);
        run_checked(self.runner, &inv).await?;
        self.activate(version).await
    }

    /// Select an already-installed Python version globally
    pub async fn activate(&self, version: &str) -> PyCacheResult<()> {
        let inv = Invocation::new(self.bin_path()).args([
            "use".to_string(),
            "-g".to_string(),
            python_spec(version),
        ]);
        run_checked(self.runner, &inv).await?;
        Ok(())
    }

    /// Apply the activate/install decision
    pub async fn apply(&self, action: InterpreterAction, version: &str) -> PyCacheResult<()> {
        match action {
            InterpreterAction::Activate => {
                info!("Activating cached Python {}", version);
                self.activate(version).await
            }
            InterpreterAction::Install => {
                info!("Installing Python {}", version);
                self.install(version).await
            }
        }
    }
}

fn python_spec(version: &str) -> String {
    format!("python@{}", version)
}
