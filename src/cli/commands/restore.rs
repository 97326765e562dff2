//! Restore command - restore caches and set up Python

use crate::ci::{CiEnv, StepOutputs};
use crate::cli::args::RestoreArgs;
use crate::config::Config;
use crate::error::{PyCacheError, PyCacheResult};
use crate::paths::Platform;
use crate::phase::{self, PhaseContext, RestoreInputs, RestoreReport};
use crate::state::StateFile;
use crate::tools::{InterpreterAction, ProcessRunner};
use crate::ui::{self, UiContext};
use std::path::PathBuf;
use tracing::debug;

/// Execute the restore command
///
/// Every failure is reported as "Python setup failed" so the job stops
/// before building against a broken toolchain.
pub async fn execute(
    args: RestoreArgs,
    config: &Config,
    state_file: Option<PathBuf>,
) -> PyCacheResult<()> {
    let env = CiEnv::capture();
    let ctx = UiContext::detect();
    let runner = ProcessRunner::new();
    let platform = Platform::detect();
    let phase_ctx = PhaseContext::new(&runner, &env, config, platform);

    ui::intro(&ctx, "Python cache restore");
    debug!("Platform: {}", platform.name());

    let state_file = StateFile::resolve(state_file, &env);
    let outputs = StepOutputs::from_env(&env);
    let inputs = args.into_inputs();

    let report = run(&inputs, &phase_ctx, &state_file, &outputs)
        .await
        .map_err(PyCacheError::setup_failed)?;

    print_summary(&ctx, &report, &state_file);
    Ok(())
}

async fn run(
    inputs: &RestoreInputs,
    phase_ctx: &PhaseContext<'_>,
    state_file: &StateFile,
    outputs: &StepOutputs,
) -> PyCacheResult<RestoreReport> {
    // A failed restore must not leave an older job's state for save to find
    state_file.clear().await?;

    let identity = phase::prepare(inputs, phase_ctx).await?;
    outputs.set_all(identity.outputs()).await?;

    let report = phase::restore_caches(inputs, identity, phase_ctx).await?;
    for dir in &report.path_additions {
        outputs.add_path(dir).await?;
    }
    outputs.set_all(report.hit_outputs()).await?;

    state_file.save(&report.phase_state()).await?;
    Ok(report)
}

fn print_summary(ctx: &UiContext, report: &RestoreReport, state_file: &StateFile) {
    ui::key_value(ctx, "workspace", &report.workspace);
    ui::key_value(ctx, "python", &report.python_version);
    ui::key_value(ctx, "state", &state_file.path().display().to_string());

    let artifacts = [
        ("Python install", &report.tags.python, report.python_hit),
        ("pip cache", &report.tags.pip, report.pip_hit),
        ("uv cache", &report.tags.uv, report.uv_hit),
    ];
    for (name, tag, hit) in artifacts {
        match hit {
            Some(true) => ui::step_ok_detail(ctx, &format!("{} restored", name), tag),
            Some(false) => ui::step_info(ctx, &format!("{} not cached yet [{}]", name, tag)),
            None => ui::step_info(ctx, &format!("{} caching disabled", name)),
        }
    }

    let how = match report.interpreter {
        InterpreterAction::Activate => "activated from cache",
        InterpreterAction::Install => "installed",
    };
    ui::outro_success(ctx, &format!("Python {} {}", report.python_version, how));
}
