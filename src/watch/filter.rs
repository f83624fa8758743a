// src/watch/filter.rs

//! Pure mapping from changed paths to per-class change events.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::errors::Result;
use crate::fs::{walk_files, FileSystem};
use crate::paths::relative_str;
use crate::types::AssetClass;
use crate::watch::hash::MemoryHashStore;
use crate::watch::patterns::WatchProfile;
use crate::watch::ChangeEvent;

#[derive(Debug)]
pub struct ChangeFilter {
    root: PathBuf,
    build_dir: PathBuf,
    profiles: Vec<WatchProfile>,
    fs: Arc<dyn FileSystem>,
    hashes: Option<MemoryHashStore>,
}

impl ChangeFilter {
    /// `build_folder` is relative to `root`; everything below it is ignored
    /// so that task outputs never re-trigger tasks.
    pub fn new(
        root: impl Into<PathBuf>,
        build_folder: &Path,
        profiles: Vec<WatchProfile>,
        fs: Arc<dyn FileSystem>,
    ) -> Self {
        let root = root.into();
        let build_dir = root.join(build_folder);
        Self {
            root,
            build_dir,
            profiles,
            fs,
            hashes: None,
        }
    }

    /// Drop events for files whose content did not change.
    pub fn with_skip_unchanged(mut self) -> Self {
        self.hashes = Some(MemoryHashStore::new());
        self
    }

    /// Record the current content of every watched file below `dir` so the
    /// first no-op save is already recognised. Returns how many files were
    /// hashed.
    pub fn prime(&mut self, dir: &Path) -> Result<usize> {
        let Some(hashes) = self.hashes.as_mut() else {
            return Ok(0);
        };
        let mut count = 0;
        for path in walk_files(self.fs.as_ref(), &self.root.join(dir))? {
            let Some(rel) = relative_str(&self.root, &path) else {
                continue;
            };
            if !self.profiles.iter().any(|p| p.matches(&rel)) {
                continue;
            }
            let contents = self.fs.read(&path)?;
            hashes.update(&path, &contents);
            count += 1;
        }
        debug!(files = count, "primed watch hashes");
        Ok(count)
    }

    /// Change events for one batch of paths (one filesystem notification).
    ///
    /// Each class appears at most once per batch, attributed to the first
    /// path that matched it.
    pub fn changes<'a>(&mut self, paths: impl IntoIterator<Item = &'a Path>) -> Vec<ChangeEvent> {
        let mut seen: BTreeSet<AssetClass> = BTreeSet::new();
        let mut events = Vec::new();

        for path in paths {
            if path.starts_with(&self.build_dir) {
                continue;
            }
            let Some(rel) = relative_str(&self.root, path) else {
                debug!(path = %path.display(), "change outside the project root; ignoring");
                continue;
            };

            let classes: Vec<AssetClass> = self
                .profiles
                .iter()
                .filter(|p| !seen.contains(&p.class()) && p.matches(&rel))
                .map(|p| p.class())
                .collect();
            if classes.is_empty() {
                continue;
            }

            if !self.content_changed(path) {
                debug!(path = %rel, "content unchanged; skipping");
                continue;
            }

            for class in classes {
                seen.insert(class);
                events.push(ChangeEvent {
                    class,
                    path: PathBuf::from(&rel),
                });
            }
        }

        events
    }

    fn content_changed(&mut self, path: &Path) -> bool {
        let Some(hashes) = self.hashes.as_mut() else {
            return true;
        };
        if !self.fs.is_file(path) {
            hashes.forget(path);
            return true;
        }
        match self.fs.read(path) {
            Ok(contents) => hashes.update(path, &contents),
            Err(err) => {
                warn!(path = %path.display(), error = %err, "failed to hash changed file; treating as changed");
                true
            }
        }
    }
}
