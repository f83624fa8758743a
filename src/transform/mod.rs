// src/transform/mod.rs

//! File transformation layer.
//!
//! A task hands a [`FileSet`] to an ordered [`Pipeline`] of [`Transformer`]s,
//! each consuming the set and producing the next one.
//!
//! - [`include`], [`rename`], [`concat`], [`svg_stack`] are implemented here.
//! - [`command`] is the boundary to external tools (Sass, minifiers, image
//!   compressors, font converters): bytes in on stdin, bytes out on stdout.
//! - [`spec`] is the declarative, config-facing description of a transformer.
//! - [`pipeline`] composes transformers and holds the per-class chains.

pub mod command;
pub mod concat;
pub mod include;
pub mod pipeline;
pub mod rename;
pub mod spec;
pub mod svg_stack;

use std::fmt;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;

use crate::errors::Result;

pub use pipeline::{ImageVariants, Pipeline, PipelineTable};
pub use spec::TransformerSpec;

/// One file flowing through a pipeline.
#[derive(Clone, PartialEq, Eq)]
pub struct Asset {
    /// Original source location on disk.
    pub source: PathBuf,
    /// Output location, relative to the task's output directory.
    pub relative: PathBuf,
    pub contents: Vec<u8>,
}

impl fmt::Debug for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Asset")
            .field("source", &self.source)
            .field("relative", &self.relative)
            .field("len", &self.contents.len())
            .finish()
    }
}

impl Asset {
    pub fn new(
        source: impl Into<PathBuf>,
        relative: impl Into<PathBuf>,
        contents: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            source: source.into(),
            relative: relative.into(),
            contents: contents.into(),
        }
    }

    /// Relative output path with forward slashes, for logs and errors.
    pub fn display_name(&self) -> String {
        self.relative.to_string_lossy().replace('\\', "/")
    }

    /// Directory of the source file, used to resolve relative references.
    pub fn source_dir(&self) -> &Path {
        self.source.parent().unwrap_or_else(|| Path::new("."))
    }

    /// Replace the extension of the output path; `extname` includes the dot
    /// and may be compound (`.min.css`).
    pub fn set_extname(&mut self, extname: &str) {
        let stem = self
            .relative
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.relative.set_file_name(format!("{stem}{extname}"));
    }
}

/// An ordered collection of assets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileSet {
    assets: Vec<Asset>,
}

impl FileSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, asset: Asset) {
        self.assets.push(asset);
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Asset> {
        self.assets.iter()
    }

    pub fn into_assets(self) -> Vec<Asset> {
        self.assets
    }
}

impl From<Vec<Asset>> for FileSet {
    fn from(assets: Vec<Asset>) -> Self {
        Self { assets }
    }
}

impl FromIterator<Asset> for FileSet {
    fn from_iter<I: IntoIterator<Item = Asset>>(iter: I) -> Self {
        Self {
            assets: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for FileSet {
    type Item = Asset;
    type IntoIter = std::vec::IntoIter<Asset>;

    fn into_iter(self) -> Self::IntoIter {
        self.assets.into_iter()
    }
}

pub type TransformFuture<'a> = Pin<Box<dyn Future<Output = Result<FileSet>> + Send + 'a>>;

/// A single step of a pipeline: `transform(fileSet) -> fileSet`.
pub trait Transformer: Send + Sync + fmt::Debug {
    /// Short name used in logs and errors.
    fn name(&self) -> &str;

    fn transform(&self, files: FileSet) -> TransformFuture<'_>;
}
