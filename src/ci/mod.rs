//! CI runner integration
//!
//! Captures the environment a job step runs in and writes step outputs
//! back to the runner.

mod env;
mod outputs;

pub use env::CiEnv;
pub use outputs::StepOutputs;

/// Emit a workflow annotation when running under GitHub Actions
pub fn annotate(env: &CiEnv, level: &str, message: &str) {
    if env.github_actions {
        println!("::{}::{}", level, escape_annotation(message));
    }
}

/// Escape data for a workflow command so multi-line messages survive
fn escape_annotation(message: &str) -> String {
    message
        .replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}
