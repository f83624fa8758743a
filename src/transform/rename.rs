// src/transform/rename.rs

use crate::transform::{FileSet, TransformFuture, Transformer};

/// Rewrites output file names: optional suffix on the stem, optional new
/// extension (`main.css` + `.min.css` -> `main.min.css`).
#[derive(Debug, Clone)]
pub struct RenameTransformer {
    extname: Option<String>,
    suffix: Option<String>,
}

impl RenameTransformer {
    pub fn new(extname: Option<String>, suffix: Option<String>) -> Self {
        Self { extname, suffix }
    }
}

impl Transformer for RenameTransformer {
    fn name(&self) -> &str {
        "rename"
    }

    fn transform(&self, files: FileSet) -> TransformFuture<'_> {
        Box::pin(async move {
            Ok(files
                .into_iter()
                .map(|mut asset| {
                    let current_ext = asset
                        .relative
                        .extension()
                        .map(|e| format!(".{}", e.to_string_lossy()))
                        .unwrap_or_default();
                    let extname = self.extname.as_deref().unwrap_or(&current_ext);
                    let suffix = self.suffix.as_deref().unwrap_or("");
                    asset.set_extname(&format!("{suffix}{extname}"));
                    asset
                })
                .collect())
        })
    }
}
