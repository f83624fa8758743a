// src/config/validate.rs

use std::path::{Component, Path, PathBuf};

use crate::config::model::{ConfigFile, ImagesSection, RawConfigFile};
use crate::errors::{PipelineError, Result};
use crate::paths::patterns::check_alternation_syntax;
use crate::paths::{PathEntry, PathTable};
use crate::transform::{ImageVariants, PipelineTable, TransformerSpec};
use crate::types::AssetClass;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = PipelineError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_project(&raw)?;
        validate_server(&raw)?;
        let paths = resolve_paths(&raw)?;
        validate_path_table(&paths)?;
        let pipelines = resolve_pipelines(&raw)?;
        Ok(ConfigFile::new_unchecked(
            raw.server,
            raw.watch,
            paths,
            pipelines,
        ))
    }
}

fn config_error(msg: impl Into<String>) -> PipelineError {
    PipelineError::ConfigError(msg.into())
}

fn validate_project(cfg: &RawConfigFile) -> Result<()> {
    let source = cfg.project.source.trim();
    let build = cfg.project.build.trim();

    if source.is_empty() {
        return Err(config_error("[project].source must not be empty"));
    }
    if !is_plain_relative(Path::new(build)) {
        return Err(config_error(format!(
            "[project].build must be a relative folder inside the project, got '{build}'"
        )));
    }
    let source_norm = normalize(Path::new(source));
    let build_norm = normalize(Path::new(build));
    if source_norm == build_norm {
        return Err(config_error(format!(
            "[project].build must differ from [project].source (both are '{build}')"
        )));
    }
    if source_norm.starts_with(&build_norm) {
        return Err(config_error(format!(
            "[project].source '{source}' must not be inside [project].build '{build}'"
        )));
    }
    if build_norm.starts_with(&source_norm) {
        return Err(config_error(format!(
            "[project].build '{build}' must not be inside [project].source '{source}'"
        )));
    }
    Ok(())
}

/// Drop `.` components so that `./dist` and `dist` compare equal.
fn normalize(path: &Path) -> PathBuf {
    path.components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}

/// Non-empty, relative, and never climbing out of the project root. `clean`
/// deletes this folder recursively.
fn is_plain_relative(path: &Path) -> bool {
    let mut normal = 0usize;
    for component in path.components() {
        match component {
            Component::Normal(_) => normal += 1,
            Component::CurDir => {}
            _ => return false,
        }
    }
    normal > 0
}

fn validate_server(cfg: &RawConfigFile) -> Result<()> {
    if cfg.server.host.trim().is_empty() {
        return Err(config_error("[server].host must not be empty"));
    }
    Ok(())
}

fn parse_class(section: &str, key: &str) -> Result<AssetClass> {
    key.parse::<AssetClass>()
        .map_err(|e| config_error(format!("[{section}.{key}]: {e}")))
}

/// Built-in table for the configured folders, with `[paths.*]` overrides
/// applied on top.
fn resolve_paths(cfg: &RawConfigFile) -> Result<PathTable> {
    let mut table = PathTable::defaults(cfg.project.source.trim(), cfg.project.build.trim());

    for (key, overrides) in cfg.paths.iter() {
        let class = parse_class("paths", key)?;
        let base = table.entry(class)?.clone();
        let entry = PathEntry {
            source: overrides.source.clone().unwrap_or(base.source),
            watch: overrides.watch.clone().unwrap_or(base.watch),
            output: overrides
                .output
                .as_ref()
                .map(|o| o.trim().into())
                .unwrap_or(base.output),
        };
        table.insert(class, entry);
    }

    Ok(table)
}

/// Check that every class has a usable entry.
///
/// This is what makes a missing or broken mapping a startup failure rather
/// than a failure of the first task that needs it. Every output directory
/// must sit inside the build folder, so that `clean` removes all outputs.
pub fn validate_path_table(table: &PathTable) -> Result<()> {
    let build = normalize(table.build_folder());
    for class in AssetClass::ALL {
        let entry = table.entry(class)?;

        if !entry.source.iter().any(|p| !p.starts_with('!')) {
            return Err(config_error(format!(
                "asset class '{class}' has no source pattern"
            )));
        }
        if entry.output.as_os_str().is_empty() {
            return Err(config_error(format!(
                "asset class '{class}' has an empty output directory"
            )));
        }
        if !is_plain_relative(&entry.output) || !normalize(&entry.output).starts_with(&build) {
            return Err(config_error(format!(
                "asset class '{class}': output '{}' must be a folder inside '{}'",
                entry.output.display(),
                table.build_folder().display()
            )));
        }

        for pattern in entry.source.iter().chain(entry.watch.iter()) {
            check_alternation_syntax(pattern)
                .map_err(|e| config_error(format!("asset class '{class}': {e}")))?;
        }
        entry.source_matcher()?;
        entry.watch_matcher()?;
    }
    Ok(())
}

fn validate_chain(label: &str, specs: &[TransformerSpec]) -> Result<()> {
    for (idx, spec) in specs.iter().enumerate() {
        spec.validate()
            .map_err(|e| config_error(format!("{label}[{idx}]: {e}")))?;
    }
    Ok(())
}

fn resolve_pipelines(cfg: &RawConfigFile) -> Result<PipelineTable> {
    let mut table = PipelineTable::defaults();

    for (key, specs) in cfg.pipeline.iter() {
        let class = parse_class("pipeline", key)?;
        if class == AssetClass::Images {
            return Err(config_error(
                "[pipeline].images is not used; set [images].web and [images].fallback instead",
            ));
        }
        validate_chain(&format!("[pipeline].{key}"), specs)?;
        table.set_chain(class, specs.clone());
    }

    let images = resolve_images(&cfg.images, table.images())?;
    table.set_images(images);

    Ok(table)
}

fn resolve_images(section: &ImagesSection, current: &ImageVariants) -> Result<ImageVariants> {
    let web = section.web.clone().unwrap_or_else(|| current.web.clone());
    let fallback = section
        .fallback
        .clone()
        .unwrap_or_else(|| current.fallback.clone());
    validate_chain("[images].web", &web)?;
    validate_chain("[images].fallback", &fallback)?;

    let web_formats = match &section.web_formats {
        Some(formats) => formats
            .iter()
            .map(|f| {
                let f = f.trim().trim_start_matches('.').to_ascii_lowercase();
                if f.is_empty() {
                    Err(config_error("[images].web_formats must not contain empty entries"))
                } else {
                    Ok(f)
                }
            })
            .collect::<Result<Vec<_>>>()?,
        None => current.web_formats.clone(),
    };
    Ok(ImageVariants {
        web,
        fallback,
        web_formats,
    })
}
