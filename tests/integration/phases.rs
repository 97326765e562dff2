//! Restore/save phase tests against a recording command runner

use async_trait::async_trait;
use pycache::ci::CiEnv;
use pycache::config::Config;
use pycache::paths::Platform;
use pycache::phase::{self, PhaseContext, RestoreInputs, SaveInputs, SaveReport};
use pycache::state::{PhaseState, StateFile};
use pycache::tools::{CommandRunner, Completed, InterpreterAction, Invocation};
use pycache::{PyCacheError, PyCacheResult};
use std::path::PathBuf;
use std::sync::Mutex;
use tempfile::TempDir;

/// Whether any argument contains `needle`
fn mentions(inv: &Invocation, needle: &str) -> bool {
    inv.args.iter().any(|a| a.contains(needle))
}

type Responder = Box<dyn Fn(&Invocation) -> i32 + Send + Sync>;

/// Records every invocation and answers with a configurable exit code
struct FakeRunner {
    calls: Mutex<Vec<Invocation>>,
    installed_cli: String,
    respond: Responder,
}

impl FakeRunner {
    fn all_hits() -> Self {
        Self::with(|_| 0)
    }

    fn with(respond: impl Fn(&Invocation) -> i32 + Send + Sync + 'static) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            installed_cli: "boringcache 1.8.0".to_string(),
            respond: Box::new(respond),
        }
    }

    /// Restores of these tags exit non-zero
    fn missing(tags: &'static [&'static str]) -> Self {
        Self::with(move |inv| {
            let is_restore = inv.args.first().is_some_and(|a| a == "restore");
            let missed = tags.iter().any(|t| mentions(inv, &format!("{}:", t)));
            if is_restore && missed {
                1
            } else {
                0
            }
        })
    }

    fn calls(&self) -> Vec<Invocation> {
        self.calls.lock().unwrap().clone()
    }

    /// `boringcache <subcommand> ...` invocations
    fn cache_calls(&self, subcommand: &str) -> Vec<Invocation> {
        self.calls()
            .into_iter()
            .filter(|inv| inv.program == PathBuf::from("boringcache"))
            .filter(|inv| inv.args.first().is_some_and(|a| a == subcommand))
            .collect()
    }

    fn mise_calls(&self) -> Vec<Vec<String>> {
        self.calls()
            .into_iter()
            .filter(|inv| inv.program.ends_with("mise"))
            .map(|inv| inv.args)
            .collect()
    }
}

#[async_trait]
impl CommandRunner for FakeRunner {
    async fn run(&self, invocation: &Invocation) -> PyCacheResult<Completed> {
        self.calls.lock().unwrap().push(invocation.clone());

        if invocation.program == PathBuf::from("boringcache") && invocation.args == ["--version"] {
            return Ok(Completed {
                code: 0,
                output: vec![self.installed_cli.clone()],
            });
        }

        Ok(Completed {
            code: (self.respond)(invocation),
            output: vec![],
        })
    }
}

fn runner_env() -> CiEnv {
    CiEnv {
        home: Some(PathBuf::from("/home/runner")),
        github_repository: Some("myorg/myrepo".to_string()),
        ..Default::default()
    }
}

fn restore_inputs(dir: &TempDir) -> RestoreInputs {
    RestoreInputs {
        cli_version: "v1.8.0".to_string(),
        workspace: "myorg/myproject".to_string(),
        python_version: "3.12".to_string(),
        working_directory: dir.path().to_path_buf(),
        ..Default::default()
    }
}

fn output<'a>(outputs: &'a [(&'static str, String)], name: &str) -> Option<&'a str> {
    outputs
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, v)| v.as_str())
}

#[tokio::test]
async fn full_round_trip() {
    let dir = TempDir::new().unwrap();
    let env = runner_env();
    let config = Config::default();

    let runner = FakeRunner::all_hits();
    let ctx = PhaseContext::new(&runner, &env, &config, Platform::Linux);
    let report = phase::restore(&restore_inputs(&dir), &ctx).await.unwrap();

    // CLI already at the requested version: probed, not reinstalled
    assert!(runner
        .calls()
        .iter()
        .any(|inv| inv.program == PathBuf::from("boringcache") && inv.args == ["--version"]));
    assert!(!runner.calls().iter().any(|inv| mentions(inv, "boringcache.com")));

    let restores = runner.cache_calls("restore");
    assert_eq!(restores.len(), 3);
    for (inv, tag) in restores.iter().zip(["myrepo-python-3.12:", "myrepo-pip:", "myrepo-uv:"]) {
        assert_eq!(inv.args[1], "myorg/myproject");
        assert!(inv.args[2].starts_with(tag), "{} should start with {}", inv.args[2], tag);
    }
    assert_eq!(
        restores[0].args[2],
        "myrepo-python-3.12:/home/runner/.local/share/mise"
    );

    assert!(runner.calls().iter().any(|inv| {
        inv.program == PathBuf::from("sh") && inv.args == ["-c", "curl https://mise.run | sh"]
    }));
    assert_eq!(runner.mise_calls(), vec![vec!["use", "-g", "python@3.12"]]);
    assert_eq!(report.interpreter, InterpreterAction::Activate);

    let outputs = report.outputs();
    assert_eq!(output(&outputs, "workspace"), Some("myorg/myproject"));
    assert_eq!(output(&outputs, "python-version"), Some("3.12"));
    assert_eq!(output(&outputs, "python-cache-hit"), Some("true"));
    assert_eq!(output(&outputs, "pip-cache-hit"), Some("true"));
    assert_eq!(output(&outputs, "uv-cache-hit"), Some("true"));
    assert_eq!(output(&outputs, "cache-hit"), Some("true"));
    assert_eq!(
        report.path_additions,
        vec![
            PathBuf::from("/home/runner/.local/bin"),
            PathBuf::from("/home/runner/.local/share/mise/shims"),
        ]
    );

    // Hand the state over through the file, as two processes would
    let state_file = StateFile::new(dir.path().join("state.json"));
    state_file.save(&report.phase_state()).await.unwrap();
    let state = state_file.take().await.unwrap();
    assert_eq!(state.workspace, "myorg/myproject");
    assert_eq!(state.cache_tag_prefix, "myrepo");
    assert_eq!(state.python_tag, "myrepo-python-3.12");
    assert_eq!(state.cache_python, Some(true));

    let save_runner = FakeRunner::all_hits();
    let save_ctx = PhaseContext::new(&save_runner, &env, &config, Platform::Linux);
    let save_inputs = SaveInputs {
        workspace: "myorg/myproject".to_string(),
        ..Default::default()
    };
    let saved = phase::save(&save_inputs, &state, &save_ctx).await.unwrap();

    assert_eq!(
        saved,
        SaveReport::Saved {
            tags: vec![
                "myrepo-python-3.12".to_string(),
                "myrepo-pip".to_string(),
                "myrepo-uv".to_string(),
            ]
        }
    );
    let saves = save_runner.cache_calls("save");
    assert_eq!(saves.len(), 3);
    assert!(saves[0].args[2].starts_with("myrepo-python-3.12:"));
    assert!(saves[1].args[2].starts_with("myrepo-pip:"));
    assert!(saves[2].args[2].starts_with("myrepo-uv:"));
    assert!(saves.iter().all(|inv| inv.args[1] == "myorg/myproject"));

    let prune = Invocation::new("uv").args(["cache", "prune", "--ci"]).quiet();
    assert!(save_runner.calls().contains(&prune));
}

#[tokio::test]
async fn consumed_state_skips_next_save() {
    let env = runner_env();
    let config = Config::default();
    let dir = TempDir::new().unwrap();
    let state_file = StateFile::new(dir.path().join("state.json"));
    state_file.save(&recorded_state()).await.unwrap();

    let inputs = SaveInputs {
        cli_version: "skip".to_string(),
        ..Default::default()
    };

    let runner = FakeRunner::all_hits();
    let ctx = PhaseContext::new(&runner, &env, &config, Platform::Linux);
    let first = phase::save(&inputs, &state_file.take().await.unwrap(), &ctx)
        .await
        .unwrap();
    assert!(matches!(first, SaveReport::Saved { .. }));

    // A later job without its own restore must not reuse those slots
    let runner = FakeRunner::all_hits();
    let ctx = PhaseContext::new(&runner, &env, &config, Platform::Linux);
    let second = phase::save(&inputs, &state_file.take().await.unwrap(), &ctx)
        .await
        .unwrap();
    assert_eq!(second, SaveReport::Skipped);
    assert!(runner.calls().is_empty());
}

#[tokio::test]
async fn prepare_resolves_identity_before_any_install() {
    let dir = TempDir::new().unwrap();
    let env = runner_env();
    let config = Config::default();
    let runner = FakeRunner::all_hits();
    let ctx = PhaseContext::new(&runner, &env, &config, Platform::Linux);

    let inputs = RestoreInputs {
        cli_version: "skip".to_string(),
        ..restore_inputs(&dir)
    };
    let identity = phase::prepare(&inputs, &ctx).await.unwrap();

    assert_eq!(identity.workspace, "myorg/myproject");
    assert_eq!(identity.tags.python, "myrepo-python-3.12");
    assert_eq!(output(&identity.outputs(), "uv-tag"), Some("myrepo-uv"));
    assert!(runner.calls().is_empty());

    let report = phase::restore_caches(&inputs, identity.clone(), &ctx).await.unwrap();
    assert_eq!(report.identity(), identity);
    assert_eq!(runner.cache_calls("restore").len(), 3);
}

#[tokio::test]
async fn custom_cache_tag_is_used() {
    let dir = TempDir::new().unwrap();
    let env = runner_env();
    let config = Config::default();
    let runner = FakeRunner::all_hits();
    let ctx = PhaseContext::new(&runner, &env, &config, Platform::Linux);

    let inputs = RestoreInputs {
        cache_tag: "my-custom-tag".to_string(),
        python_version: "3.11".to_string(),
        ..restore_inputs(&dir)
    };
    let report = phase::restore(&inputs, &ctx).await.unwrap();

    let outputs = report.outputs();
    assert_eq!(output(&outputs, "python-tag"), Some("my-custom-tag-python-3.11"));
    assert_eq!(output(&outputs, "pip-tag"), Some("my-custom-tag-pip"));
    assert_eq!(output(&outputs, "uv-tag"), Some("my-custom-tag-uv"));
}

#[tokio::test]
async fn pinned_version_feeds_tags_and_mise() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join(".python-version"), "3.13.1\n").unwrap();
    let env = runner_env();
    let config = Config::default();
    let runner = FakeRunner::missing(&["myrepo-python-3.13.1"]);
    let ctx = PhaseContext::new(&runner, &env, &config, Platform::Linux);

    let inputs = RestoreInputs {
        python_version: String::new(),
        ..restore_inputs(&dir)
    };
    let report = phase::restore(&inputs, &ctx).await.unwrap();

    assert_eq!(report.tags.python, "myrepo-python-3.13.1");
    assert_eq!(
        runner.mise_calls(),
        vec![vec!["install", "python@3.13.1"], vec!["use", "-g", "python@3.13.1"]]
    );
}

#[tokio::test]
async fn disabled_pip_is_never_touched() {
    let dir = TempDir::new().unwrap();
    let env = runner_env();
    let config = Config::default();
    let runner = FakeRunner::all_hits();
    let ctx = PhaseContext::new(&runner, &env, &config, Platform::Linux);

    let inputs = RestoreInputs {
        cache_pip: false,
        ..restore_inputs(&dir)
    };
    let report = phase::restore(&inputs, &ctx).await.unwrap();

    assert!(!runner.calls().iter().any(|inv| mentions(inv, "myrepo-pip:")));
    assert!(runner.cache_calls("restore").iter().any(|inv| mentions(inv, "myrepo-uv:")));

    let outputs = report.outputs();
    assert_eq!(output(&outputs, "pip-cache-hit"), None);
    assert_eq!(output(&outputs, "cache-hit"), Some("true"));

    // Save follows what restore recorded
    let save_runner = FakeRunner::all_hits();
    let save_ctx = PhaseContext::new(&save_runner, &env, &config, Platform::Linux);
    let inputs = SaveInputs {
        cli_version: "skip".to_string(),
        ..Default::default()
    };
    phase::save(&inputs, &report.phase_state(), &save_ctx).await.unwrap();
    assert!(!save_runner.calls().iter().any(|inv| mentions(inv, "myrepo-pip:")));
    assert_eq!(save_runner.cache_calls("save").len(), 2);
}

#[tokio::test]
async fn disabled_uv_is_never_touched() {
    let dir = TempDir::new().unwrap();
    let env = runner_env();
    let config = Config::default();
    let runner = FakeRunner::all_hits();
    let ctx = PhaseContext::new(&runner, &env, &config, Platform::Linux);

    let inputs = RestoreInputs {
        cache_uv: false,
        ..restore_inputs(&dir)
    };
    phase::restore(&inputs, &ctx).await.unwrap();

    assert!(!runner.calls().iter().any(|inv| mentions(inv, "myrepo-uv:")));
    assert!(runner.cache_calls("restore").iter().any(|inv| mentions(inv, "myrepo-pip:")));
}

#[tokio::test]
async fn skip_sentinel_suppresses_bootstrap_only() {
    let dir = TempDir::new().unwrap();
    let env = runner_env();
    let config = Config::default();
    let runner = FakeRunner::all_hits();
    let ctx = PhaseContext::new(&runner, &env, &config, Platform::Linux);

    let inputs = RestoreInputs {
        cli_version: "skip".to_string(),
        ..restore_inputs(&dir)
    };
    phase::restore(&inputs, &ctx).await.unwrap();

    assert!(!runner.calls().iter().any(|inv| inv.args == ["--version"]));
    assert!(!runner.calls().iter().any(|inv| mentions(inv, "boringcache.com")));
    assert_eq!(runner.cache_calls("restore").len(), 3);
}

#[tokio::test]
async fn outdated_cli_is_reinstalled() {
    let dir = TempDir::new().unwrap();
    let env = runner_env();
    let config = Config::default();
    let mut runner = FakeRunner::all_hits();
    runner.installed_cli = "boringcache 1.7.0".to_string();
    let ctx = PhaseContext::new(&runner, &env, &config, Platform::Linux);

    phase::restore(&restore_inputs(&dir), &ctx).await.unwrap();

    let install = runner
        .calls()
        .into_iter()
        .find(|inv| mentions(inv, "boringcache.com/install.sh"))
        .expect("installer should run");
    assert_eq!(install.program, PathBuf::from("sh"));
    assert_eq!(
        install.envs,
        vec![("BORINGCACHE_VERSION".to_string(), "v1.8.0".to_string())]
    );
}

#[tokio::test]
async fn python_miss_installs_interpreter() {
    let dir = TempDir::new().unwrap();
    let env = runner_env();
    let config = Config::default();
    let runner = FakeRunner::missing(&["myrepo-python-3.12"]);
    let ctx = PhaseContext::new(&runner, &env, &config, Platform::Linux);

    let report = phase::restore(&restore_inputs(&dir), &ctx).await.unwrap();

    assert_eq!(report.interpreter, InterpreterAction::Install);
    assert_eq!(report.python_hit, Some(false));
    assert_eq!(
        runner.mise_calls(),
        vec![vec!["install", "python@3.12"], vec!["use", "-g", "python@3.12"]]
    );
    // pip/uv hits still count even though the interpreter missed
    assert!(report.cache_hit());
}

#[tokio::test]
async fn package_misses_clear_aggregate_hit() {
    let dir = TempDir::new().unwrap();
    let env = runner_env();
    let config = Config::default();
    let runner = FakeRunner::missing(&["myrepo-pip", "myrepo-uv"]);
    let ctx = PhaseContext::new(&runner, &env, &config, Platform::Linux);

    let report = phase::restore(&restore_inputs(&dir), &ctx).await.unwrap();
    let outputs = report.outputs();
    assert_eq!(output(&outputs, "python-cache-hit"), Some("true"));
    assert_eq!(output(&outputs, "pip-cache-hit"), Some("false"));
    assert_eq!(output(&outputs, "cache-hit"), Some("false"));
}

#[tokio::test]
async fn python_cache_disabled_still_installs() {
    let dir = TempDir::new().unwrap();
    let env = runner_env();
    let config = Config::default();
    let runner = FakeRunner::all_hits();
    let ctx = PhaseContext::new(&runner, &env, &config, Platform::Linux);

    let inputs = RestoreInputs {
        cache_python: false,
        ..restore_inputs(&dir)
    };
    let report = phase::restore(&inputs, &ctx).await.unwrap();

    assert!(!runner.calls().iter().any(|inv| mentions(inv, "myrepo-python-3.12:")));
    assert!(runner.mise_calls().contains(&vec!["install".to_string(), "python@3.12".to_string()]));

    let state = report.phase_state();
    assert_eq!(state.cache_python, Some(false));

    let save_runner = FakeRunner::all_hits();
    let save_ctx = PhaseContext::new(&save_runner, &env, &config, Platform::Linux);
    let inputs = SaveInputs {
        workspace: "myorg/myproject".to_string(),
        ..Default::default()
    };
    phase::save(&inputs, &state, &save_ctx).await.unwrap();
    assert!(!save_runner.calls().iter().any(|inv| mentions(inv, "myrepo-python-3.12:")));
}

#[tokio::test]
async fn restore_without_workspace_fails_before_cache_calls() {
    let dir = TempDir::new().unwrap();
    let env = runner_env();
    let config = Config::default();
    let runner = FakeRunner::all_hits();
    let ctx = PhaseContext::new(&runner, &env, &config, Platform::Linux);

    let inputs = RestoreInputs {
        cli_version: "skip".to_string(),
        workspace: String::new(),
        ..restore_inputs(&dir)
    };
    let err = phase::restore(&inputs, &ctx).await.unwrap_err();

    assert!(matches!(err, PyCacheError::WorkspaceRequired));
    assert!(runner.calls().is_empty());
}

#[tokio::test]
async fn interpreter_install_failure_is_fatal() {
    let dir = TempDir::new().unwrap();
    let env = runner_env();
    let config = Config::default();
    let runner = FakeRunner::with(|inv| {
        if inv.program.ends_with("mise") && inv.args.first().is_some_and(|a| a == "install") {
            1
        } else if inv.args.first().is_some_and(|a| a == "restore") {
            1
        } else {
            0
        }
    });
    let ctx = PhaseContext::new(&runner, &env, &config, Platform::Linux);

    let err = phase::restore(&restore_inputs(&dir), &ctx).await.unwrap_err();
    let err = PyCacheError::setup_failed(err);
    assert!(err.to_string().starts_with("Python setup failed:"));
    assert!(err.to_string().contains("python@3.12"));

    // Nothing after the failed install ran
    assert!(!runner.calls().iter().any(|inv| mentions(inv, "myrepo-pip:")));
}

#[tokio::test]
async fn save_without_workspace_is_a_noop() {
    let env = runner_env();
    let config = Config::default();
    let runner = FakeRunner::all_hits();
    let ctx = PhaseContext::new(&runner, &env, &config, Platform::Linux);

    let report = phase::save(&SaveInputs::default(), &PhaseState::default(), &ctx)
        .await
        .unwrap();

    assert_eq!(report, SaveReport::Skipped);
    assert!(runner.calls().is_empty());
}

fn recorded_state() -> PhaseState {
    PhaseState {
        workspace: "myorg/myproject".to_string(),
        cache_tag_prefix: "myrepo".to_string(),
        python_version: "3.12".to_string(),
        python_tag: "myrepo-python-3.12".to_string(),
        pip_tag: "myrepo-pip".to_string(),
        uv_tag: "myrepo-uv".to_string(),
        mise_dir: PathBuf::from("/home/runner/.local/share/mise"),
        pip_cache_dir: PathBuf::from("/home/runner/.cache/pip"),
        uv_cache_dir: PathBuf::from("/home/runner/.cache/uv"),
        cache_python: Some(true),
        cache_pip: Some(true),
        cache_uv: Some(true),
        verbose: true,
        exclude: "*.whl".to_string(),
        saved_at: None,
    }
}

#[tokio::test]
async fn save_input_can_disable_pip() {
    let env = runner_env();
    let config = Config::default();
    let runner = FakeRunner::all_hits();
    let ctx = PhaseContext::new(&runner, &env, &config, Platform::Linux);

    let inputs = SaveInputs {
        cli_version: "skip".to_string(),
        cache_pip: Some(false),
        ..Default::default()
    };
    phase::save(&inputs, &recorded_state(), &ctx).await.unwrap();

    let saves = runner.cache_calls("save");
    assert_eq!(saves.len(), 2);
    assert!(!saves.iter().any(|inv| mentions(inv, "myrepo-pip:")));
}

#[tokio::test]
async fn save_forwards_flags() {
    let env = runner_env();
    let config = Config::default();
    let runner = FakeRunner::all_hits();
    let ctx = PhaseContext::new(&runner, &env, &config, Platform::Linux);

    let inputs = SaveInputs {
        cli_version: "skip".to_string(),
        ..Default::default()
    };
    phase::save(&inputs, &recorded_state(), &ctx).await.unwrap();

    let saves = runner.cache_calls("save");
    assert_eq!(
        saves[0].args,
        vec![
            "save",
            "myorg/myproject",
            "myrepo-python-3.12:/home/runner/.local/share/mise",
            "--verbose",
        ]
    );
    assert_eq!(
        saves[1].args,
        vec![
            "save",
            "myorg/myproject",
            "myrepo-pip:/home/runner/.cache/pip",
            "--verbose",
            "--exclude",
            "*.whl",
        ]
    );
    assert!(saves[2].args.ends_with(&["--exclude".to_string(), "*.whl".to_string()]));
}

#[tokio::test]
async fn failed_save_stops_the_sequence() {
    let env = runner_env();
    let config = Config::default();
    let runner = FakeRunner::with(|inv| {
        if inv.args.first().is_some_and(|a| a == "save") && mentions(inv, "myrepo-pip:") {
            2
        } else {
            0
        }
    });
    let ctx = PhaseContext::new(&runner, &env, &config, Platform::Linux);

    let inputs = SaveInputs {
        cli_version: "skip".to_string(),
        ..Default::default()
    };
    let err = phase::save(&inputs, &recorded_state(), &ctx).await.unwrap_err();

    assert!(matches!(err, PyCacheError::ToolFailed { code: 2, .. }));
    assert!(!runner.calls().iter().any(|inv| mentions(inv, "myrepo-uv:")));
}

#[tokio::test]
async fn failed_prune_does_not_block_uv_save() {
    let env = runner_env();
    let config = Config::default();
    let runner = FakeRunner::with(|inv| if inv.program == PathBuf::from("uv") { 1 } else { 0 });
    let ctx = PhaseContext::new(&runner, &env, &config, Platform::Linux);

    let inputs = SaveInputs {
        cli_version: "skip".to_string(),
        ..Default::default()
    };
    phase::save(&inputs, &recorded_state(), &ctx).await.unwrap();

    assert!(runner.cache_calls("save").iter().any(|inv| mentions(inv, "myrepo-uv:")));
}
