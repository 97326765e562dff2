//! UI module for consistent CLI output
//!
//! Uses `cliclack` for styled step output in a terminal, with automatic
//! fallback to plain bracketed lines in CI logs.
//!
//! # Example
//!
//! ```rust,ignore
//! use pycache::ui::{self, UiContext};
//!
//! let ctx = UiContext::detect();
//!
//! ui::intro(&ctx, "Python cache restore");
//! ui::step_ok_detail(&ctx, "pip cache restored", "myrepo-pip");
//! ui::step_warn(&ctx, "uv cache miss");
//! ui::outro_success(&ctx, "Python 3.12 ready");
//! ```

mod context;
mod output;

pub use context::UiContext;
pub use output::{intro, key_value, outro_success, outro_warn, step_info, step_ok_detail, step_warn};
