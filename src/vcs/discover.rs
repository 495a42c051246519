//! Locate the working copy that governs a path
//!
//! Backends mark their working copies with a control directory (`.bzr`,
//! `.git`, ...). Backends that allow nested checkouts are found by walking up
//! from the file; the others must have the control directory right next to it.

use std::path::{Path, PathBuf};

use tracing::debug;

/// Find the directory holding `metadir` for `path`.
///
/// The search starts at `path` itself when it is a directory, otherwise at its
/// parent. With `scan_parents` the search continues upward until the
/// filesystem root or `stop_at` (inclusive) is reached.
pub fn find_working_copy(
    path: &Path,
    metadir: &str,
    scan_parents: bool,
    stop_at: Option<&Path>,
) -> Option<PathBuf> {
    let start = if path.is_dir() { Some(path) } else { path.parent() };

    let mut current = start;
    while let Some(dir) = current {
        if dir.join(metadir).is_dir() {
            debug!("Found {} in {:?}", metadir, dir);
            return Some(dir.to_path_buf());
        }
        if !scan_parents || stop_at.is_some_and(|stop| dir == stop) {
            break;
        }
        current = dir.parent();
    }

    None
}
