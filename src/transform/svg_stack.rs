// src/transform/svg_stack.rs

//! SVG "stack" sprite assembly.
//!
//! Every icon becomes a nested `<svg id="<file stem>">` inside one root
//! document. Only the icon addressed by the URL fragment is displayed, so
//! `sprite.svg#home` renders the `home` icon.

use regex::Regex;

use crate::errors::{PipelineError, Result};
use crate::transform::{Asset, FileSet, TransformFuture, Transformer};

const NAME: &str = "svg-stack";

const STACK_STYLE: &str = ":root>svg{display:none}:root>svg:target{display:inline}";

#[derive(Debug)]
pub struct SvgStackTransformer {
    file: String,
    root: Regex,
    view_box: Regex,
}

impl SvgStackTransformer {
    pub fn new(file: impl Into<String>) -> Result<Self> {
        let root = Regex::new(r"(?s)<svg\b([^>]*)>(.*)</svg>")
            .map_err(|e| PipelineError::Other(e.into()))?;
        let view_box = Regex::new(r#"viewBox\s*=\s*["']([^"']*)["']"#)
            .map_err(|e| PipelineError::Other(e.into()))?;
        Ok(Self {
            file: file.into(),
            root,
            view_box,
        })
    }

    fn icon(&self, asset: &Asset) -> Result<String> {
        let name = asset.display_name();
        let text = std::str::from_utf8(&asset.contents)
            .map_err(|e| PipelineError::transform(NAME, &name, e.to_string()))?;
        let caps = self
            .root
            .captures(text)
            .ok_or_else(|| PipelineError::transform(NAME, &name, "no <svg> root element"))?;

        let id = icon_id(asset);
        let view_box = self
            .view_box
            .captures(&caps[1])
            .map(|vb| format!(r#" viewBox="{}""#, &vb[1]))
            .unwrap_or_default();

        Ok(format!(r#"<svg id="{id}"{view_box}>{}</svg>"#, caps[2].trim()))
    }
}

impl Transformer for SvgStackTransformer {
    fn name(&self) -> &str {
        NAME
    }

    fn transform(&self, files: FileSet) -> TransformFuture<'_> {
        Box::pin(async move {
            let mut assets = files.into_assets();
            if assets.is_empty() {
                return Ok(FileSet::new());
            }
            assets.sort_by(|a, b| a.relative.cmp(&b.relative));

            let mut doc = String::from(
                r#"<?xml version="1.0" encoding="utf-8"?><svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink">"#,
            );
            doc.push_str(&format!("<style>{STACK_STYLE}</style>"));
            for asset in &assets {
                doc.push_str(&self.icon(asset)?);
            }
            doc.push_str("</svg>");

            let source = assets[0].source.clone();
            Ok(FileSet::from(vec![Asset::new(source, &self.file, doc)]))
        })
    }
}

/// Fragment identifier of an icon: its file stem, with characters that are
/// not valid in an XML id replaced by `-`.
fn icon_id(asset: &Asset) -> String {
    let stem = asset
        .relative
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    stem.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '-'
            }
        })
        .collect()
}
