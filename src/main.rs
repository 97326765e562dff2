//! pycache - Python toolchain cache for CI
//!
//! CLI entry point that dispatches to the restore and save phases.

use clap::Parser;
use console::style;
use pycache::ci::{self, CiEnv};
use pycache::cli::{Cli, Commands, LogFormat};
use pycache::config::{Config, ConfigManager};
use pycache::error::{PyCacheError, PyCacheResult};
use std::process::ExitCode;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            ci::annotate(&CiEnv::capture(), "error", &e.to_string());
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run() -> PyCacheResult<()> {
    let cli = Cli::parse();

    init_logging(&cli);

    let config = match load_config(&cli).await {
        Ok(config) => config,
        // A broken config file must not fail the save step either
        Err(e) if matches!(cli.command, Commands::Save(_)) => {
            warn!("Ignoring configuration: {}", e);
            Config::default()
        }
        Err(e) => return Err(PyCacheError::setup_failed(e)),
    };

    match cli.command {
        Commands::Restore(args) => {
            pycache::cli::commands::restore(args, &config, cli.state_file).await
        }
        Commands::Save(args) => pycache::cli::commands::save(args, &config, cli.state_file).await,
    }
}

/// 0 = warn, 1 = info, 2+ = debug; `RUNNER_DEBUG=1` forces debug
fn init_logging(cli: &Cli) {
    let level = if CiEnv::capture().runner_debug {
        2
    } else {
        cli.verbose
    };
    let filter = match level {
        0 => EnvFilter::new("pycache=warn"),
        1 => EnvFilter::new("pycache=info"),
        _ => EnvFilter::new("pycache=debug"),
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    match cli.log_format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.without_time().init(),
    }
}

async fn load_config(cli: &Cli) -> PyCacheResult<Config> {
    let manager = match &cli.config {
        Some(path) => ConfigManager::with_path(path.clone()),
        None => ConfigManager::new(),
    };
    debug!("Loading config from {}", manager.path().display());
    manager.load().await
}
