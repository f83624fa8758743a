// src/tasks/images.rs

//! Every source image yields two outputs: a web variant (webp by default)
//! and a compressed fallback in the original format. Images the web chain
//! cannot read only get the fallback (see
//! [`crate::transform::ImageVariants::wants_web`]). The variants run
//! concurrently and independently; one failing does not stop the other from
//! writing its files, but the task as a whole then reports the failure.

use tracing::{debug, info, warn};

use crate::errors::Result;
use crate::paths::PathEntry;
use crate::tasks::asset::{load_sources, write_outputs};
use crate::tasks::{BuildContext, TaskReport};
use crate::transform::{FileSet, Pipeline};
use crate::types::AssetClass;

pub async fn run_images_task(ctx: &BuildContext) -> Result<TaskReport> {
    let entry = ctx.paths.entry(AssetClass::Images)?;
    let files = load_sources(ctx, entry)?;
    if files.is_empty() {
        info!(class = %AssetClass::Images, "no matching sources; nothing to do");
        return Ok(TaskReport::default());
    }
    let inputs = files.len();

    let variants = ctx.pipelines.images();
    let web = Pipeline::from_specs(&variants.web, &ctx.fs)?;
    let fallback = Pipeline::from_specs(&variants.fallback, &ctx.fs)?;

    let web_files: FileSet = files
        .iter()
        .filter(|asset| variants.wants_web(&asset.source))
        .cloned()
        .collect();
    if web_files.len() < inputs {
        debug!(
            skipped = inputs - web_files.len(),
            "images without a web variant; fallback only"
        );
    }

    let (web_res, fallback_res) = tokio::join!(
        run_variant(ctx, entry, "web", &web, web_files),
        run_variant(ctx, entry, "fallback", &fallback, files),
    );

    let mut written = Vec::new();
    let mut first_err = None;
    for res in [web_res, fallback_res] {
        match res {
            Ok(mut paths) => written.append(&mut paths),
            Err(err) if first_err.is_none() => first_err = Some(err),
            Err(err) => warn!(error = %err, "second image variant also failed"),
        }
    }

    ctx.notify_reload(AssetClass::Images, &written);

    match first_err {
        Some(err) => Err(err),
        None => Ok(TaskReport { inputs, written }),
    }
}

async fn run_variant(
    ctx: &BuildContext,
    entry: &PathEntry,
    variant: &str,
    pipeline: &Pipeline,
    files: FileSet,
) -> Result<Vec<std::path::PathBuf>> {
    let outputs = pipeline.apply(files).await.inspect_err(|err| {
        warn!(variant, error = %err, "image variant failed");
    })?;
    let written = write_outputs(ctx, entry, outputs)?;
    info!(variant, outputs = written.len(), "image variant finished");
    Ok(written)
}
