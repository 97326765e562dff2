//! pycache - Python toolchain cache for CI
//!
//! Restores and saves the Python interpreter, pip cache and uv cache around
//! a CI job. Storage is delegated to the boringcache CLI and interpreter
//! installs to mise.

pub mod ci;
pub mod cli;
pub mod config;
pub mod error;
pub mod paths;
pub mod phase;
pub mod state;
pub mod tags;
pub mod tools;
pub mod ui;

pub use error::{PyCacheError, PyCacheResult};
