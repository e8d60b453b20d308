//! Path utilities for workspace discovery: a glob matcher with globstar
//! support, a pruning directory walker built on it, and walk-up helpers for
//! locating the repository root.

mod find_up;
mod glob;
mod walk;

pub use find_up::{find_repo_root, find_up};
pub use glob::{match_glob, match_glob_partial};
pub use walk::find_with_glob;
