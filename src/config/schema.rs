//! Configuration schema for pycache
//!
//! Configuration is read from `~/.config/pycache/config.toml` when present.
//! Every field has a default, so the file is optional in CI.

use crate::tags::{DEFAULT_PYTHON_VERSION, FALLBACK_TAG_PREFIX};
use serde::{Deserialize, Serialize};

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Cache CLI settings
    pub cache_cli: CacheCliConfig,

    /// mise version manager settings
    pub mise: MiseConfig,

    /// Python defaults
    pub python: PythonConfig,
}

/// boringcache CLI settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheCliConfig {
    /// Binary name or path
    pub binary: String,

    /// Installer script piped to a shell when the CLI is missing
    pub install_script: String,
}

impl Default for CacheCliConfig {
    fn default() -> Self {
        Self {
            binary: "boringcache".to_string(),
            install_script: "https://boringcache.com/install.sh".to_string(),
        }
    }
}

/// mise settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MiseConfig {
    /// Release downloaded on Windows (`MISE_VERSION` overrides)
    pub version: String,

    /// Installer script used on Unix
    pub install_script: String,
}

impl Default for MiseConfig {
    fn default() -> Self {
        Self {
            version: "v2026.2.8".to_string(),
            install_script: "https://mise.run".to_string(),
        }
    }
}

/// Python defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PythonConfig {
    /// Version used when no input or pin file names one
    pub default_version: String,

    /// Tag prefix used outside a repository context
    pub tag_prefix_fallback: String,
}

impl Default for PythonConfig {
    fn default() -> Self {
        Self {
            default_version: DEFAULT_PYTHON_VERSION.to_string(),
            tag_prefix_fallback: FALLBACK_TAG_PREFIX.to_string(),
        }
    }
}
