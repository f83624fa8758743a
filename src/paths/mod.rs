// src/paths/mod.rs

//! The path table: which files belong to which asset class, what is watched
//! for it, and where its outputs go.
//!
//! - [`table`] holds the immutable per-class entries and the built-in layout.
//! - [`patterns`] compiles source/watch globs and enumerates matching files.

pub mod patterns;
pub mod table;

use std::path::Path;

pub use patterns::{glob_base, SourceFile, SourceMatcher, WatchMatcher};
pub use table::{PathEntry, PathTable, PROJECT_FOLDER, SOURCE_FOLDER};

/// Convert a path into a string relative to `root`, with forward slashes.
///
/// Returns `None` if the path is not under `root` and cannot be relativized.
pub fn relative_str(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let s = rel.to_string_lossy().replace('\\', "/");
    Some(s)
}
