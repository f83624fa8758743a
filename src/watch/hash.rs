// src/watch/hash.rs

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use blake3::Hasher;

/// Hex blake3 digest of a file's contents.
pub fn compute_content_hash(contents: &[u8]) -> String {
    let mut hasher = Hasher::new();
    hasher.update(contents);
    hasher.finalize().to_hex().to_string()
}

/// Last seen content hash per file, kept for the lifetime of the watcher.
#[derive(Debug, Default)]
pub struct MemoryHashStore {
    map: HashMap<PathBuf, String>,
}

impl MemoryHashStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `contents` for `path`; returns true if they differ from what was
    /// recorded before (or nothing was).
    pub fn update(&mut self, path: &Path, contents: &[u8]) -> bool {
        let hash = compute_content_hash(contents);
        match self.map.get(path) {
            Some(old) if *old == hash => false,
            _ => {
                self.map.insert(path.to_path_buf(), hash);
                true
            }
        }
    }

    pub fn forget(&mut self, path: &Path) {
        self.map.remove(path);
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}
