// src/tasks/mod.rs

//! The units of work run by the task graph.
//!
//! Every task receives a [`BuildContext`] explicitly; there is no global
//! state. Tasks are stateless between invocations and can be re-run any
//! number of times.
//!
//! - [`asset`] is the generic transform task shared by all asset classes.
//! - [`images`] runs the two image variants side by side.
//! - [`clean`] removes the output tree.

pub mod asset;
pub mod clean;
pub mod images;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::info;

use crate::config::{ConfigFile, ServerSection, WatchSection};
use crate::errors::{PipelineError, Result};
use crate::fs::FileSystem;
use crate::paths::{relative_str, PathTable};
use crate::server::ReloadHandle;
use crate::transform::PipelineTable;
use crate::types::{AssetClass, TaskId};

pub use asset::run_asset_task;
pub use clean::clean;
pub use images::run_images_task;

/// Everything a task needs, passed by value (cheap clones of shared state).
#[derive(Debug, Clone)]
pub struct BuildContext {
    /// Project root; every pattern and output folder is relative to it.
    pub root: PathBuf,
    pub paths: Arc<PathTable>,
    pub pipelines: Arc<PipelineTable>,
    pub fs: Arc<dyn FileSystem>,
    pub reload: ReloadHandle,
    pub server: ServerSection,
    pub watch: WatchSection,
}

impl BuildContext {
    pub fn new(
        root: impl Into<PathBuf>,
        paths: PathTable,
        pipelines: PipelineTable,
        fs: Arc<dyn FileSystem>,
    ) -> Self {
        Self {
            root: root.into(),
            paths: Arc::new(paths),
            pipelines: Arc::new(pipelines),
            fs,
            reload: ReloadHandle::new(),
            server: ServerSection::default(),
            watch: WatchSection::default(),
        }
    }

    pub fn from_config(root: impl Into<PathBuf>, cfg: &ConfigFile, fs: Arc<dyn FileSystem>) -> Self {
        let mut ctx = Self::new(root, cfg.paths().clone(), cfg.pipelines().clone(), fs);
        ctx.server = cfg.server.clone();
        ctx.watch = cfg.watch.clone();
        ctx
    }

    /// Absolute location of the output tree.
    pub fn build_dir(&self) -> PathBuf {
        self.root.join(self.paths.build_folder())
    }

    /// Tell connected browsers that `class` wrote `written`.
    pub(crate) fn notify_reload(&self, class: AssetClass, written: &[PathBuf]) {
        if written.is_empty() {
            return;
        }
        let build_dir = self.build_dir();
        let paths = written
            .iter()
            .map(|p| relative_str(&build_dir, p).unwrap_or_else(|| p.to_string_lossy().into_owned()))
            .collect();
        self.reload.notify(class, paths);
    }
}

/// What one task invocation did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskReport {
    /// Number of source files the task picked up.
    pub inputs: usize,
    /// Files written, absolute.
    pub written: Vec<PathBuf>,
}

impl TaskReport {
    pub fn is_noop(&self) -> bool {
        self.inputs == 0 && self.written.is_empty()
    }
}

/// Run a one-shot task to completion.
///
/// `watch` and `serve` are long-running services started by the executor;
/// asking for them here is an error.
pub async fn run_task(ctx: &BuildContext, task: TaskId) -> Result<TaskReport> {
    let report = match task {
        TaskId::Clean => clean(ctx).await?,
        TaskId::Build(AssetClass::Images) => run_images_task(ctx).await?,
        TaskId::Build(class) => run_asset_task(ctx, class).await?,
        TaskId::Watch | TaskId::Serve => {
            return Err(PipelineError::Other(anyhow::anyhow!(
                "'{task}' is a service and cannot be run as a one-shot task"
            )));
        }
    };
    info!(
        task = %task,
        inputs = report.inputs,
        outputs = report.written.len(),
        "task finished"
    );
    Ok(report)
}

/// Output location of `relative` below an output folder.
pub(crate) fn output_path(ctx: &BuildContext, output: &Path, relative: &Path) -> PathBuf {
    ctx.root.join(output).join(relative)
}
