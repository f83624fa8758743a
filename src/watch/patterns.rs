// src/watch/patterns.rs

use std::path::PathBuf;

use tracing::debug;

use crate::errors::Result;
use crate::paths::patterns::glob_base;
use crate::paths::{PathTable, WatchMatcher};
use crate::types::AssetClass;

/// Compiled watch globs of one asset class.
#[derive(Clone)]
pub struct WatchProfile {
    class: AssetClass,
    matcher: WatchMatcher,
}

impl std::fmt::Debug for WatchProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatchProfile")
            .field("class", &self.class)
            .finish_non_exhaustive()
    }
}

impl WatchProfile {
    pub fn class(&self) -> AssetClass {
        self.class
    }

    /// `rel_path` is relative to the project root, with forward slashes.
    pub fn matches(&self, rel_path: &str) -> bool {
        self.matcher.is_match(rel_path)
    }
}

/// Profiles for `classes`; classes without watch globs are left out.
pub fn build_profiles(table: &PathTable, classes: &[AssetClass]) -> Result<Vec<WatchProfile>> {
    let mut profiles = Vec::new();
    for class in classes {
        let entry = table.entry(*class)?;
        if entry.watch.is_empty() {
            debug!(class = %class, "no watch patterns; not watched");
            continue;
        }
        profiles.push(WatchProfile {
            class: *class,
            matcher: entry.watch_matcher()?,
        });
    }
    Ok(profiles)
}

/// Directories to watch recursively for `classes`, relative to the project
/// root: the literal base of every watch glob, with directories nested in
/// another one dropped. An empty path stands for the project root itself.
pub fn watch_roots(table: &PathTable, classes: &[AssetClass]) -> Result<Vec<PathBuf>> {
    let mut bases = Vec::new();
    for class in classes {
        let entry = table.entry(*class)?;
        bases.extend(
            entry
                .watch
                .iter()
                .filter(|p| !p.starts_with('!'))
                .map(|p| glob_base(p)),
        );
    }
    bases.sort();
    bases.dedup();

    let mut roots: Vec<PathBuf> = Vec::new();
    for base in bases {
        if !roots.iter().any(|r| base.starts_with(r)) {
            roots.push(base);
        }
    }
    Ok(roots)
}
