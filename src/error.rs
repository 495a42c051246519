//! Error types for bazaar-vcs
//!
//! Uses `thiserror` for ergonomic error definitions with automatic `Display` and `Error` impls.

use std::fmt;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Top-level error type for bazaar-vcs
#[derive(Error, Debug)]
pub enum Error {
    #[error("VCS error: {0}")]
    Vcs(#[from] VcsError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// The bzr subcommand an operation was running when it failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VcsOperation {
    Revert,
    Pull,
    Add,
    Commit,
    Push,
    Cat,
}

impl fmt::Display for VcsOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VcsOperation::Revert => write!(f, "revert"),
            VcsOperation::Pull => write!(f, "pull"),
            VcsOperation::Add => write!(f, "add"),
            VcsOperation::Commit => write!(f, "commit"),
            VcsOperation::Push => write!(f, "push"),
            VcsOperation::Cat => write!(f, "cat"),
        }
    }
}

/// Revision-control errors
#[derive(Error, Debug)]
pub enum VcsError {
    /// A wrapped bzr subprocess exited with a non-zero status
    #[error("[BZR] {}", describe_failure(*operation, location, stderr))]
    OperationFailed {
        operation: VcsOperation,
        location: PathBuf,
        stderr: String,
    },

    #[error("Not inside a bzr working copy: {0}")]
    NotVersioned(PathBuf),
}

fn describe_failure(operation: VcsOperation, location: &Path, stderr: &str) -> String {
    match operation {
        VcsOperation::Cat => format!("cat failed for '{}': {}", location.display(), stderr),
        _ => format!("{} of '{}' failed: {}", operation, location.display(), stderr),
    }
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("Failed to save configuration: {0}")]
    SaveFailed(String),

    #[error("Failed to create config directory: {0}")]
    DirectoryCreationFailed(PathBuf),
}

/// Result type alias using our error type
pub type Result<T> = std::result::Result<T, Error>;
