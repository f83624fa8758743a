// src/tasks/clean.rs

use tracing::{debug, info};

use crate::errors::Result;
use crate::tasks::{BuildContext, TaskReport};

/// Delete the output tree. A missing tree is already clean.
pub async fn clean(ctx: &BuildContext) -> Result<TaskReport> {
    let dir = ctx.build_dir();
    if !ctx.fs.exists(&dir) {
        debug!(dir = %dir.display(), "output folder absent; nothing to clean");
        return Ok(TaskReport::default());
    }
    ctx.fs.remove_dir_all(&dir)?;
    info!(dir = %dir.display(), "removed output folder");
    Ok(TaskReport::default())
}
