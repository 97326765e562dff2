//! Save command - upload caches recorded by restore

use crate::ci::{self, CiEnv};
use crate::cli::args::SaveArgs;
use crate::config::Config;
use crate::error::PyCacheResult;
use crate::paths::Platform;
use crate::phase::{self, PhaseContext, SaveInputs, SaveReport};
use crate::state::StateFile;
use crate::tools::ProcessRunner;
use crate::ui::{self, UiContext};
use std::path::PathBuf;
use tracing::warn;

/// Execute the save command
///
/// Never fails: a cache that could not be written must not fail an
/// otherwise successful build, so errors become warnings.
pub async fn execute(args: SaveArgs, config: &Config, state_file: Option<PathBuf>) -> PyCacheResult<()> {
    let env = CiEnv::capture();
    let ctx = UiContext::detect();
    let runner = ProcessRunner::new();
    let phase_ctx = PhaseContext::new(&runner, &env, config, Platform::detect());

    ui::intro(&ctx, "Python cache save");

    let state_file = StateFile::resolve(state_file, &env);
    match run(&args.into_inputs(), &state_file, &phase_ctx).await {
        Ok(SaveReport::Skipped) => {
            ui::step_info(&ctx, "No workspace found, skipping cache save");
        }
        Ok(SaveReport::Saved { tags }) => {
            for tag in &tags {
                ui::step_ok_detail(&ctx, "Saved", tag);
            }
            ui::outro_success(&ctx, "Save complete");
        }
        Err(e) => {
            let message = format!("Cache save failed: {}", e);
            warn!("{}", message);
            ci::annotate(&env, "warning", &message);
            ui::step_warn(&ctx, &message);
            ui::outro_warn(&ctx, "Caches were not saved");
        }
    }

    Ok(())
}

async fn run(
    inputs: &SaveInputs,
    state_file: &StateFile,
    phase_ctx: &PhaseContext<'_>,
) -> PyCacheResult<SaveReport> {
    let state = state_file.take().await?;
    phase::save(inputs, &state, phase_ctx).await
}
