//! Configuration module
//!
//! Handles user configuration (`config.toml` in the platform config directory,
//! overridable through `BZR_VCS_*` environment variables).

mod settings;

pub use settings::*;
