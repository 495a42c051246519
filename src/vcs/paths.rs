//! File list normalization shared by every backend

use std::path::{Component, Path, PathBuf};

/// Make every path absolute against the current directory and drop
/// `.`/`..` components.
pub fn prepare_file_list<I, P>(files: I) -> Vec<PathBuf>
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    let cwd = std::env::current_dir().ok();
    files
        .into_iter()
        .map(|file| absolutize(file.as_ref(), cwd.as_deref()))
        .collect()
}

/// Join a relative `path` onto `base` (if any) and normalize it lexically
pub fn absolutize(path: &Path, base: Option<&Path>) -> PathBuf {
    match base {
        Some(base) if path.is_relative() => normalize(&base.join(path)),
        _ => normalize(path),
    }
}

/// Lexical normalization: symlinks are not resolved, `..` at the root stays at the root
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                None | Some(Component::ParentDir) => out.push(".."),
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                Some(_) => {
                    out.pop();
                }
            },
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// The deepest directory containing every one of `files`.
///
/// Returns `None` when `files` is empty.
pub fn youngest_ancestor<P: AsRef<Path>>(files: &[P]) -> Option<PathBuf> {
    let mut parents = files
        .iter()
        .map(|file| file.as_ref().parent().unwrap_or_else(|| Path::new("")));

    let mut common: Vec<Component<'_>> = parents.next()?.components().collect();
    for dir in parents {
        let shared = common
            .iter()
            .zip(dir.components())
            .take_while(|(a, b)| **a == *b)
            .count();
        common.truncate(shared);
    }

    Some(common.into_iter().collect())
}
