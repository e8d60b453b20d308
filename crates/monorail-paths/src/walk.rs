use std::{
    fs,
    path::{Path, PathBuf},
};

use tracing::debug;

use crate::glob::{match_glob, match_glob_partial};

/// Walks the tree under `root` and returns the absolute path of every file
/// named `file_name` whose parent directory matches one of the workspace
/// `globs` (relative to `root`). Subtrees whose relative path cannot be a
/// prefix of any glob are pruned without being entered.
///
/// Filesystem errors on individual entries are non-fatal: the entry is
/// skipped and the walk continues.
pub fn find_with_glob(file_name: &str, root: &Path, globs: &[String]) -> Vec<PathBuf> {
    let mut found = Vec::new();
    walk(file_name, root, root, globs, &mut found);
    found
}

fn walk(file_name: &str, root: &Path, dir: &Path, globs: &[String], found: &mut Vec<PathBuf>) {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) => {
            debug!("skipping unreadable directory {}: {err}", dir.display());
            return;
        }
    };
    for entry in entries {
        let Ok(entry) = entry else {
            continue;
        };
        let Ok(file_type) = entry.file_type() else {
            continue;
        };
        let path = entry.path();
        if file_type.is_dir() {
            let relative = path.strip_prefix(root).unwrap_or(&path);
            if globs.iter().any(|glob| match_glob_partial(relative, glob)) {
                walk(file_name, root, &path, globs, found);
            }
        } else if entry.file_name() == file_name {
            let relative = path
                .parent()
                .and_then(|parent| parent.strip_prefix(root).ok())
                .unwrap_or_else(|| Path::new(""));
            if globs.iter().any(|glob| match_glob(relative, glob)) {
                found.push(path);
            }
        }
    }
}
