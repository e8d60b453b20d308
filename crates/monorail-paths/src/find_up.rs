use std::path::{Path, PathBuf};

const REPO_ROOT_SENTINEL: &str = ".git";

/// Walks up from `start` looking for a directory that contains an entry
/// named `file_name`, returning that directory. `start` is canonicalized
/// first so relative paths and symlinked working directories behave.
pub fn find_up(file_name: &str, start: &Path) -> Option<PathBuf> {
    let start = dunce::canonicalize(start).ok()?;
    start
        .ancestors()
        .find(|dir| dir.join(file_name).exists())
        .map(Path::to_path_buf)
}

/// Finds the repository root: the nearest ancestor of `cwd` containing a
/// `.git` entry. Returns `None` when no repository encloses `cwd`.
pub fn find_repo_root(cwd: &Path) -> Option<PathBuf> {
    find_up(REPO_ROOT_SENTINEL, cwd)
}
