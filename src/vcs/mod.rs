//! Revision-control adapter contract
//!
//! - `VcsBackend` - Operations every revision-control adapter provides
//! - `prepare_file_list` / `youngest_ancestor` - Path helpers
//! - `find_working_copy` - Control-directory lookup

mod discover;
mod paths;

pub use discover::*;
pub use paths::*;

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::error::Result;

/// A revision-control system wrapped for translation files.
///
/// Each instance is bound to one absolute location (a file or directory
/// inside a working copy). Operations return the concatenated textual output
/// of the commands they ran.
#[async_trait]
pub trait VcsBackend: Send + Sync {
    /// Name of the control directory marking a working copy
    const RCS_METADIR: &'static str;

    /// Whether the control directory may live in any ancestor directory
    const SCAN_PARENTS: bool;

    /// Absolute location this instance operates on
    fn location_abs(&self) -> &Path;

    /// Bring the location up to date, optionally discarding local changes first
    async fn update(&self, revision: Option<&str>, needs_revert: bool) -> Result<String>;

    /// Put `files` under version control and commit them
    async fn add(
        &self,
        files: &[PathBuf],
        message: Option<&str>,
        author: Option<&str>,
    ) -> Result<String>;

    /// Commit local changes to the location and publish them
    async fn commit(&self, message: Option<&str>, author: Option<&str>) -> Result<String>;

    /// Last committed content of the location, ignoring local edits
    async fn get_clean_file(&self, revision: Option<&str>) -> Result<String>;
}
