// src/watch/mod.rs

//! File watching and change detection.
//!
//! This module is responsible for:
//! - Compiling the watch globs of each asset class ([`patterns`]).
//! - Turning raw filesystem paths into per-class change events, with
//!   optional content hashing to drop no-op saves ([`filter`], [`hash`]).
//! - Wiring up a cross-platform filesystem watcher (`notify`) behind a
//!   stream of [`ChangeEvent`]s ([`watcher`]).
//!
//! It does **not** know about the task graph; the watch service in
//! `exec::task_runner` turns change events into task triggers.

pub mod filter;
pub mod hash;
pub mod patterns;
pub mod watcher;

use std::path::PathBuf;

use crate::types::AssetClass;

pub use filter::ChangeFilter;
pub use hash::MemoryHashStore;
pub use patterns::{build_profiles, watch_roots, WatchProfile};
pub use watcher::WatchSubscription;

/// A watched source of `class` changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub class: AssetClass,
    /// Changed file, relative to the project root.
    pub path: PathBuf,
}
