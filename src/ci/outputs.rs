//! Step outputs and PATH additions
//!
//! Outputs are appended to the runner's `GITHUB_OUTPUT` file. Outside a
//! runner they are printed as `name=value` lines so wrapper scripts can
//! still consume them.

use crate::ci::CiEnv;
use crate::error::{PyCacheError, PyCacheResult};
use std::path::{Path, PathBuf};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::debug;
use uuid::Uuid;

/// Writer for step outputs and job PATH entries
#[derive(Debug, Clone)]
pub struct StepOutputs {
    output_file: Option<PathBuf>,
    path_file: Option<PathBuf>,
}

impl StepOutputs {
    /// Create a writer targeting the runner files named in the environment
    pub fn from_env(env: &CiEnv) -> Self {
        Self {
            output_file: env.github_output.clone(),
            path_file: env.github_path.clone(),
        }
    }

    /// Set a single step output
    pub async fn set(&self, name: &str, value: &str) -> PyCacheResult<()> {
        let Some(file) = &self.output_file else {
            println!("{}={}", name, value);
            return Ok(());
        };

        debug!("Setting output {}={}", name, value);
        append(file, &format_output(name, value)).await
    }

    /// Set every output in order
    pub async fn set_all<'a, I>(&self, outputs: I) -> PyCacheResult<()>
    where
        I: IntoIterator<Item = (&'a str, String)>,
    {
        for (name, value) in outputs {
            self.set(name, &value).await?;
        }
        Ok(())
    }

    /// Prepend a directory to PATH for subsequent job steps
    pub async fn add_path(&self, dir: &Path) -> PyCacheResult<()> {
        match &self.path_file {
            Some(file) => append(file, &format!("{}\n", dir.display())).await,
            None => {
                debug!("No GITHUB_PATH file, not exporting {}", dir.display());
                Ok(())
            }
        }
    }
}

/// Render one output entry in the runner file format
fn format_output(name: &str, value: &str) -> String {
    if value.contains('\n') || value.contains('\r') {
        let delimiter = format!("ghadelimiter_{}", Uuid::new_v4());
        format!("{}<<{}\n{}\n{}\n", name, delimiter, value, delimiter)
    } else {
        format!("{}={}\n", name, value)
    }
}

async fn append(file: &Path, content: &str) -> PyCacheResult<()> {
    let mut handle = OpenOptions::new()
        .create(true)
        .append(true)
        .open(file)
        .await
        .map_err(|e| PyCacheError::io(format!("opening {}", file.display()), e))?;

    handle
        .write_all(content.as_bytes())
        .await
        .map_err(|e| PyCacheError::io(format!("writing {}", file.display()), e))
}
