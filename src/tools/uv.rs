//! uv cache maintenance

use crate::tools::runner::{CommandRunner, Invocation};
use tracing::{debug, info};

/// Drop cache entries that are cheap to rebuild before uploading
///
/// Best effort: a missing `uv` binary or a failed prune never stops the save.
pub async fn prune_cache(runner: &dyn CommandRunner) {
    let inv = Invocation::new("uv").args(["cache", "prune", "--ci"]).quiet();
    match runner.run(&inv).await {
        Ok(completed) if completed.success() => info!("Pruned uv cache for CI"),
        Ok(completed) => debug!("uv cache prune exited with {}", completed.code),
        Err(e) => debug!("uv cache prune failed: {}", e),
    }
}
