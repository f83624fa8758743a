// src/transform/pipeline.rs

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use tracing::debug;

use crate::errors::Result;
use crate::fs::FileSystem;
use crate::transform::{FileSet, Transformer, TransformerSpec};
use crate::types::AssetClass;

/// An ordered chain of transformers applied by plain sequential composition.
pub struct Pipeline {
    steps: Vec<Box<dyn Transformer>>,
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.steps.iter().map(|s| s.name()))
            .finish()
    }
}

impl Pipeline {
    pub fn new(steps: Vec<Box<dyn Transformer>>) -> Self {
        Self { steps }
    }

    pub fn from_specs(specs: &[TransformerSpec], fs: &Arc<dyn FileSystem>) -> Result<Self> {
        let steps = specs
            .iter()
            .map(|spec| spec.build(fs))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { steps })
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Run every step in order. The first failing step aborts the chain.
    pub async fn apply(&self, files: FileSet) -> Result<FileSet> {
        let mut current = files;
        for step in &self.steps {
            if current.is_empty() {
                break;
            }
            debug!(step = %step.name(), files = current.len(), "applying transformer");
            current = step.transform(current).await?;
        }
        Ok(current)
    }
}

/// Extensions the default web converter can read.
pub const DEFAULT_WEB_FORMATS: [&str; 5] = ["png", "jpg", "jpeg", "tif", "tiff"];

/// The two outputs produced for every source image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageVariants {
    /// Lightweight web format (webp by default).
    pub web: Vec<TransformerSpec>,
    /// Compressed copy in the original format.
    pub fallback: Vec<TransformerSpec>,
    /// Source extensions (lowercase, no dot) the web chain is run on. Other
    /// images only get the fallback.
    pub web_formats: Vec<String>,
}

impl Default for ImageVariants {
    fn default() -> Self {
        Self {
            web: vec![
                TransformerSpec::command("cwebp -quiet -q 70 {input} -o -"),
                TransformerSpec::rename_ext(".webp"),
            ],
            fallback: vec![TransformerSpec::command("npx --no-install imagemin {input}")],
            web_formats: DEFAULT_WEB_FORMATS.iter().map(|f| f.to_string()).collect(),
        }
    }
}

impl ImageVariants {
    /// Whether the web chain applies to `path`. A `.webp` source is already
    /// in the web format and would collide with its own fallback.
    pub fn wants_web(&self, path: &Path) -> bool {
        let Some(ext) = path.extension().map(|e| e.to_string_lossy().to_ascii_lowercase()) else {
            return false;
        };
        ext != "webp" && self.web_formats.iter().any(|f| *f == ext)
    }
}

/// Transformer chains per asset class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineTable {
    chains: BTreeMap<AssetClass, Vec<TransformerSpec>>,
    images: ImageVariants,
}

impl Default for PipelineTable {
    fn default() -> Self {
        Self::defaults()
    }
}

impl PipelineTable {
    /// A table where every class copies its sources unchanged.
    pub fn passthrough() -> Self {
        Self {
            chains: BTreeMap::new(),
            images: ImageVariants {
                web: Vec::new(),
                fallback: Vec::new(),
                ..ImageVariants::default()
            },
        }
    }

    /// The built-in chains.
    ///
    /// Ordering matters: vendor prefixing runs before minification.
    pub fn defaults() -> Self {
        let mut chains = BTreeMap::new();
        chains.insert(
            AssetClass::Html,
            vec![
                TransformerSpec::Include,
                TransformerSpec::command("npx --no-install prettier --parser html"),
            ],
        );
        chains.insert(
            AssetClass::Style,
            vec![
                TransformerSpec::command_with_ext("sass --stdin --no-source-map", ".css"),
                TransformerSpec::command("npx --no-install postcss --no-map --use autoprefixer"),
                TransformerSpec::command("npx --no-install postcss --no-map --use cssnano"),
                TransformerSpec::rename_ext(".min.css"),
            ],
        );
        chains.insert(
            AssetClass::Js,
            vec![
                TransformerSpec::Include,
                TransformerSpec::command("npx --no-install babel --presets @babel/preset-env"),
                TransformerSpec::command("npx --no-install terser --compress --mangle"),
                TransformerSpec::rename_ext(".min.js"),
            ],
        );
        chains.insert(
            AssetClass::Fonts,
            vec![TransformerSpec::command_with_ext(
                "npx --no-install ttf2woff {input} /dev/stdout",
                ".woff",
            )],
        );
        chains.insert(AssetClass::VendorCss, vec![TransformerSpec::concat("vendor.css")]);
        chains.insert(AssetClass::VendorJs, vec![TransformerSpec::concat("vendor.js")]);
        chains.insert(
            AssetClass::Sprite,
            vec![TransformerSpec::SvgStack {
                file: "sprite.svg".to_string(),
            }],
        );

        Self {
            chains,
            images: ImageVariants::default(),
        }
    }

    /// Chain of a class; a class without a chain copies its files unchanged.
    pub fn chain(&self, class: AssetClass) -> &[TransformerSpec] {
        self.chains.get(&class).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn set_chain(&mut self, class: AssetClass, specs: Vec<TransformerSpec>) {
        self.chains.insert(class, specs);
    }

    pub fn images(&self) -> &ImageVariants {
        &self.images
    }

    pub fn set_images(&mut self, images: ImageVariants) {
        self.images = images;
    }

    pub fn iter(&self) -> impl Iterator<Item = (AssetClass, &[TransformerSpec])> {
        self.chains.iter().map(|(class, specs)| (*class, specs.as_slice()))
    }
}
