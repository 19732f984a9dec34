//! Configuration loading, CLI overrides and validation for nodelink.
//!
//! The agent config names the panel to talk to (`[panel]`), how often to
//! poll and report (`[sync]`), and the log level (`[logging]`). Files may be
//! TOML, YAML or JSON (comments allowed).

mod cli;
mod defaults;
mod loader;
mod types;
mod validate;

pub use cli::{CliOverrides, apply_overrides};
pub use loader::{ConfigError, load_config};
pub use types::*;
pub use validate::validate_config;
