//! Restore and save phases
//!
//! Both phases are plain async functions over a [`PhaseContext`], which
//! carries the command runner, the captured environment and configuration.
//! The CLI commands supply a real process runner; tests supply a fake.

pub mod restore;
pub mod save;

pub use restore::{prepare, restore, restore_caches, RestoreIdentity, RestoreInputs, RestoreReport};
pub use save::{save, SaveInputs, SaveReport};

use crate::ci::CiEnv;
use crate::config::Config;
use crate::paths::Platform;
use crate::tools::{CacheCli, CommandRunner, Mise};

/// Collaborators shared by both phases
pub struct PhaseContext<'a> {
    pub runner: &'a dyn CommandRunner,
    pub env: &'a CiEnv,
    pub config: &'a Config,
    pub platform: Platform,
}

impl<'a> PhaseContext<'a> {
    pub fn new(
        runner: &'a dyn CommandRunner,
        env: &'a CiEnv,
        config: &'a Config,
        platform: Platform,
    ) -> Self {
        Self {
            runner,
            env,
            config,
            platform,
        }
    }

    pub fn cache_cli(&self) -> CacheCli<'a> {
        CacheCli::new(self.runner, &self.config.cache_cli, self.platform)
    }

    pub fn mise(&self) -> Mise<'a> {
        Mise::new(self.runner, &self.config.mise, self.env, self.platform)
    }
}
