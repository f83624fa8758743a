// src/tasks/asset.rs

use std::path::PathBuf;

use tracing::{debug, info};

use crate::errors::Result;
use crate::paths::PathEntry;
use crate::tasks::{output_path, BuildContext, TaskReport};
use crate::transform::{Asset, FileSet, Pipeline};
use crate::types::AssetClass;

/// The transform task of one asset class:
///
/// 1. enumerate the files matching the class's source patterns,
/// 2. run them through the class's transformer chain,
/// 3. write the results below the output folder, keeping relative paths,
/// 4. notify the dev server.
///
/// No matching file is a successful no-op: nothing is written and no reload
/// is pushed.
pub async fn run_asset_task(ctx: &BuildContext, class: AssetClass) -> Result<TaskReport> {
    let entry = ctx.paths.entry(class)?;
    let files = load_sources(ctx, entry)?;
    if files.is_empty() {
        info!(class = %class, "no matching sources; nothing to do");
        return Ok(TaskReport::default());
    }
    let inputs = files.len();

    let pipeline = Pipeline::from_specs(ctx.pipelines.chain(class), &ctx.fs)?;
    debug!(class = %class, inputs, steps = ?pipeline, "running pipeline");
    let outputs = pipeline.apply(files).await?;

    let written = write_outputs(ctx, entry, outputs)?;
    ctx.notify_reload(class, &written);

    Ok(TaskReport { inputs, written })
}

/// Read every source file of an entry into a [`FileSet`].
pub(crate) fn load_sources(ctx: &BuildContext, entry: &PathEntry) -> Result<FileSet> {
    let matcher = entry.source_matcher()?;
    let mut files = FileSet::new();
    for source in matcher.enumerate(ctx.fs.as_ref(), &ctx.root)? {
        let contents = ctx.fs.read(&source.path)?;
        files.push(Asset::new(source.path, source.relative, contents));
    }
    Ok(files)
}

pub(crate) fn write_outputs(
    ctx: &BuildContext,
    entry: &PathEntry,
    files: FileSet,
) -> Result<Vec<PathBuf>> {
    let mut written = Vec::with_capacity(files.len());
    for asset in files {
        let dest = output_path(ctx, &entry.output, &asset.relative);
        ctx.fs.write(&dest, &asset.contents)?;
        debug!(file = %dest.display(), bytes = asset.contents.len(), "wrote output");
        written.push(dest);
    }
    Ok(written)
}
