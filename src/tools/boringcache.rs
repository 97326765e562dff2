//! boringcache CLI wrapper
//!
//! The cache service is content-addressed and reached only through its CLI:
//!
//! ```text
//! boringcache restore <workspace> <tag>:<path> [--verbose]
//! boringcache save    <workspace> <tag>:<path> [--verbose] [--exclude <pattern>]
//! ```

use crate::config::schema::CacheCliConfig;
use crate::error::PyCacheResult;
use crate::paths::Platform;
use crate::tools::runner::{run_checked, CommandRunner, Invocation};
use semver::Version;
use std::fmt;
use std::path::PathBuf;
use tracing::{debug, info};

/// CLI version input that disables the bootstrap step
pub const SKIP_SENTINEL: &str = "skip";

/// Whether the bootstrap should run for this CLI version input
pub fn bootstrap_requested(cli_version: &str) -> bool {
    !cli_version.trim().eq_ignore_ascii_case(SKIP_SENTINEL)
}

/// One cache slot and the local directory it maps to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub tag: String,
    pub path: PathBuf,
}

impl CacheEntry {
    pub fn new(tag: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            tag: tag.into(),
            path: path.into(),
        }
    }
}

impl fmt::Display for CacheEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.tag, self.path.display())
    }
}

/// Outcome of a restore attempt
///
/// Genuine tool failures (the CLI could not run) surface as `Err` from
/// [`CacheCli::restore`]; only a completed run with a non-zero exit is a miss.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestoreOutcome {
    Hit,
    Miss { code: i32 },
}

impl RestoreOutcome {
    pub fn is_hit(&self) -> bool {
        matches!(self, Self::Hit)
    }
}

/// Flags forwarded to `boringcache save`
#[derive(Debug, Clone, Default)]
pub struct SaveOptions {
    pub verbose: bool,
    pub exclude: Option<String>,
}

/// Handle on the boringcache CLI
pub struct CacheCli<'a> {
    runner: &'a dyn CommandRunner,
    config: &'a CacheCliConfig,
    platform: Platform,
}

impl<'a> CacheCli<'a> {
    pub fn new(runner: &'a dyn CommandRunner, config: &'a CacheCliConfig, platform: Platform) -> Self {
        Self {
            runner,
            config,
            platform,
        }
    }

    fn command(&self) -> Invocation {
        Invocation::new(&self.config.binary)
    }

    /// Fetch a cache entry into its local directory
    pub async fn restore(
        &self,
        workspace: &str,
        entry: &CacheEntry,
        verbose: bool,
    ) -> PyCacheResult<RestoreOutcome> {
        let mut inv = self
            .command()
            .args(["restore", workspace])
            .arg(entry.to_string());
        if verbose {
            inv = inv.arg("--verbose");
        }

        let completed = self.runner.run(&inv).await?;
        if completed.success() {
            Ok(RestoreOutcome::Hit)
        } else {
            debug!("Restore of {} missed (exit {})", entry.tag, completed.code);
            Ok(RestoreOutcome::Miss {
                code: completed.code,
            })
        }
    }

    /// Upload a local directory under its tag
    pub async fn save(
        &self,
        workspace: &str,
        entry: &CacheEntry,
        options: &SaveOptions,
    ) -> PyCacheResult<()> {
        let mut inv = self
            .command()
            .args(["save", workspace])
            .arg(entry.to_string());
        if options.verbose {
            inv = inv.arg("--verbose");
        }
        if let Some(pattern) = options.exclude.as_deref().filter(|p| !p.is_empty()) {
            inv = inv.args(["--exclude", pattern]);
        }

        run_checked(self.runner, &inv).await?;
        Ok(())
    }

    /// Make sure the CLI is installed, at `version` when one is given
    pub async fn ensure(&self, version: &str) -> PyCacheResult<()> {
        let version = version.trim();

        if let Some(installed) = self.installed_version().await {
            if version_satisfied(&installed, version) {
                debug!("boringcache {} already installed", installed);
                return Ok(());
            }
            info!("boringcache {} installed, {} requested", installed, version);
        }

        info!("Installing boringcache {}", if version.is_empty() { "latest" } else { version });
        let script = &self.config.install_script;
        let mut inv = if self.platform.is_windows() {
            Invocation::new("powershell").args([
                "-NoProfile".to_string(),
                "-Command".to_string(),
                format!("irm {} | iex", script),
            ])
        } else {
            Invocation::new("sh").args(["-c".to_string(), format!("curl -fsSL {} | sh", script)])
        };
        if !version.is_empty() {
            inv = inv.env("BORINGCACHE_VERSION", version);
        }

        run_checked(self.runner, &inv).await?;
        Ok(())
    }

    /// Version reported by `boringcache --version`, if the CLI runs at all
    async fn installed_version(&self) -> Option<String> {
        let inv = self.command().arg("--version").quiet();
        match self.runner.run(&inv).await {
            Ok(completed) if completed.success() => completed
                .output
                .first()
                .and_then(|line| line.split_whitespace().last())
                .map(str::to_string),
            Ok(_) => None,
            Err(e) => {
                debug!("boringcache not available: {}", e);
                None
            }
        }
    }
}

/// Whether an installed version satisfies the requested one
fn version_satisfied(installed: &str, requested: &str) -> bool {
    if requested.is_empty() || requested.eq_ignore_ascii_case("latest") {
        return true;
    }

    let parse = |v: &str| Version::parse(v.trim_start_matches('v')).ok();
    match (parse(installed), parse(requested)) {
        (Some(have), Some(want)) => have == want,
        _ => installed.trim_start_matches('v') == requested.trim_start_matches('v'),
    }
}
