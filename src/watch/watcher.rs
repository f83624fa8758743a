// src/watch/watcher.rs

use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::Stream;
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::errors::{PipelineError, Result};
use crate::tasks::BuildContext;
use crate::types::AssetClass;
use crate::watch::filter::ChangeFilter;
use crate::watch::patterns::{build_profiles, watch_roots};
use crate::watch::ChangeEvent;

/// Live binding between the watch globs of some asset classes and the
/// filesystem.
///
/// A lazy, infinite stream of [`ChangeEvent`]s. Dropping it stops watching;
/// calling [`WatchSubscription::start`] again gives a fresh one.
pub struct WatchSubscription {
    rx: mpsc::UnboundedReceiver<ChangeEvent>,
    _watcher: Box<dyn Watcher + Send>,
}

impl std::fmt::Debug for WatchSubscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatchSubscription").finish_non_exhaustive()
    }
}

impl WatchSubscription {
    /// Start watching for changes matching the watch globs of `classes`.
    ///
    /// Only the base directories of those globs are watched (recursively),
    /// so large unrelated trees such as `node_modules` cost nothing.
    pub fn start(ctx: &BuildContext, classes: &[AssetClass]) -> Result<Self> {
        // Canonicalize once so we have a stable base path; notify reports
        // canonical paths.
        let root = ctx.root.canonicalize().unwrap_or_else(|_| ctx.root.clone());

        let profiles = build_profiles(&ctx.paths, classes)?;
        let mut filter = ChangeFilter::new(
            root.clone(),
            ctx.paths.build_folder(),
            profiles,
            ctx.fs.clone(),
        );
        if ctx.watch.skip_unchanged {
            filter = filter.with_skip_unchanged();
            filter.prime(ctx.paths.source_folder())?;
        }

        let (tx, rx) = mpsc::unbounded_channel::<ChangeEvent>();

        // Called synchronously by notify on its own thread.
        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if matches!(event.kind, EventKind::Access(_)) {
                        return;
                    }
                    debug!(?event, "received notify event");
                    for change in filter.changes(event.paths.iter().map(|p| p.as_path())) {
                        if tx.send(change).is_err() {
                            return;
                        }
                    }
                }
                Err(err) => warn!(error = %err, "file watch error"),
            },
            Config::default(),
        )
        .map_err(|e| PipelineError::Other(e.into()))?;

        let mut watched = Vec::new();
        for rel in watch_roots(&ctx.paths, classes)? {
            let dir = existing_dir(&root, &root.join(&rel));
            if watched.iter().any(|w: &PathBuf| dir.starts_with(w)) {
                continue;
            }
            watcher
                .watch(&dir, RecursiveMode::Recursive)
                .map_err(|e| PipelineError::Other(e.into()))?;
            debug!(dir = %dir.display(), "watching directory");
            watched.push(dir);
        }

        info!(root = %root.display(), dirs = watched.len(), "file watcher started");

        Ok(Self {
            rx,
            _watcher: Box::new(watcher),
        })
    }
}

/// `dir` if it exists, otherwise its nearest existing ancestor, but never
/// above `root`.
fn existing_dir(root: &Path, dir: &Path) -> PathBuf {
    let mut current = dir;
    while !current.is_dir() {
        match current.parent() {
            Some(parent) if parent.starts_with(root) => current = parent,
            _ => return root.to_path_buf(),
        }
    }
    current.to_path_buf()
}

impl Stream for WatchSubscription {
    type Item = ChangeEvent;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().rx.poll_recv(cx)
    }
}
