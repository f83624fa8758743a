// src/transform/concat.rs

use crate::transform::{Asset, FileSet, TransformFuture, Transformer};

/// Joins every file of the set into one output named `file`.
///
/// Inputs are ordered by their relative path and separated by a newline. An
/// empty input set yields an empty output set, not an empty file.
#[derive(Debug, Clone)]
pub struct ConcatTransformer {
    file: String,
}

impl ConcatTransformer {
    pub fn new(file: impl Into<String>) -> Self {
        Self { file: file.into() }
    }
}

impl Transformer for ConcatTransformer {
    fn name(&self) -> &str {
        "concat"
    }

    fn transform(&self, files: FileSet) -> TransformFuture<'_> {
        Box::pin(async move {
            let mut assets = files.into_assets();
            if assets.is_empty() {
                return Ok(FileSet::new());
            }
            assets.sort_by(|a, b| a.relative.cmp(&b.relative));

            let source = assets[0].source.clone();
            let mut contents = Vec::new();
            for (idx, asset) in assets.into_iter().enumerate() {
                if idx > 0 {
                    contents.push(b'\n');
                }
                contents.extend(asset.contents);
            }

            Ok(FileSet::from(vec![Asset::new(source, &self.file, contents)]))
        })
    }
}
