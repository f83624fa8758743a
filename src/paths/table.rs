// src/paths/table.rs

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::errors::{PipelineError, Result};
use crate::paths::patterns::{SourceMatcher, WatchMatcher};
use crate::types::AssetClass;

/// Folder holding the sources, relative to the project root.
pub const SOURCE_FOLDER: &str = "src";

/// Folder receiving every build output, relative to the project root.
pub const PROJECT_FOLDER: &str = "dist";

/// Source/watch/output mapping of one asset class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathEntry {
    /// Globs selecting the files to build; `!`-prefixed globs exclude.
    pub source: Vec<String>,
    /// Globs whose changes re-run the task. Empty means "not watched".
    pub watch: Vec<String>,
    /// Output directory, relative to the project root.
    pub output: PathBuf,
}

impl PathEntry {
    pub fn new<S: Into<String>>(
        source: impl IntoIterator<Item = S>,
        watch: impl IntoIterator<Item = S>,
        output: impl Into<PathBuf>,
    ) -> Self {
        Self {
            source: source.into_iter().map(Into::into).collect(),
            watch: watch.into_iter().map(Into::into).collect(),
            output: output.into(),
        }
    }

    pub fn source_matcher(&self) -> Result<SourceMatcher> {
        SourceMatcher::compile(&self.source)
    }

    pub fn watch_matcher(&self) -> Result<WatchMatcher> {
        WatchMatcher::compile(&self.watch)
    }
}

/// Immutable mapping from asset class to its [`PathEntry`].
///
/// Built once at startup and shared by every task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathTable {
    source_folder: PathBuf,
    build_folder: PathBuf,
    entries: BTreeMap<AssetClass, PathEntry>,
}

impl PathTable {
    /// A table with no entries.
    pub fn empty(source_folder: impl Into<PathBuf>, build_folder: impl Into<PathBuf>) -> Self {
        Self {
            source_folder: source_folder.into(),
            build_folder: build_folder.into(),
            entries: BTreeMap::new(),
        }
    }

    /// The built-in layout for the given source and output folders.
    pub fn defaults(source_folder: &str, project_folder: &str) -> Self {
        let src = source_folder.trim_end_matches('/');
        let dist = project_folder.trim_end_matches('/');
        let images = format!("{src}/images/**/*.{{png,jpg,svg,webp,gif,ico}}");
        let vendor_css = format!("{src}/vendor/css/**/*.css");
        let vendor_js = format!("{src}/vendor/js/**/*.js");

        let mut table = Self::empty(src, dist);
        table.insert(
            AssetClass::Html,
            PathEntry::new(
                vec![format!("{src}/**/*.html"), format!("!{src}/**/_*.html")],
                vec![format!("{src}/**/*.html")],
                dist,
            ),
        );
        table.insert(
            AssetClass::Style,
            PathEntry::new(
                vec![format!("{src}/scss/main.scss")],
                vec![format!("{src}/scss/**/*.scss")],
                format!("{dist}/css"),
            ),
        );
        table.insert(
            AssetClass::Js,
            PathEntry::new(
                vec![format!("{src}/js/main.js"), format!("{src}/js/vendor.js")],
                vec![format!("{src}/js/**/*.js")],
                format!("{dist}/js"),
            ),
        );
        table.insert(
            AssetClass::Images,
            PathEntry::new(vec![images.clone()], vec![images], format!("{dist}/images")),
        );
        table.insert(
            AssetClass::Fonts,
            PathEntry::new(
                vec![format!("{src}/fonts/*.ttf")],
                vec![format!("{src}/fonts/*.ttf")],
                format!("{dist}/fonts"),
            ),
        );
        table.insert(
            AssetClass::VendorCss,
            PathEntry::new(vec![vendor_css.clone()], vec![vendor_css], format!("{dist}/css")),
        );
        table.insert(
            AssetClass::VendorJs,
            PathEntry::new(vec![vendor_js.clone()], vec![vendor_js], format!("{dist}/js")),
        );
        table.insert(
            AssetClass::Sprite,
            PathEntry::new(
                vec![format!("{src}/images/stack/*.svg")],
                Vec::<String>::new(),
                format!("{dist}/images"),
            ),
        );
        table
    }

    pub fn insert(&mut self, class: AssetClass, entry: PathEntry) {
        self.entries.insert(class, entry);
    }

    pub fn get(&self, class: AssetClass) -> Option<&PathEntry> {
        self.entries.get(&class)
    }

    /// Look up the entry of a class; a missing entry is a configuration error.
    pub fn entry(&self, class: AssetClass) -> Result<&PathEntry> {
        self.entries.get(&class).ok_or_else(|| {
            PipelineError::ConfigError(format!("no path entry for asset class '{class}'"))
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = (AssetClass, &PathEntry)> {
        self.entries.iter().map(|(class, entry)| (*class, entry))
    }

    pub fn source_folder(&self) -> &Path {
        &self.source_folder
    }

    /// Root of the output tree; `clean` deletes this directory.
    pub fn build_folder(&self) -> &Path {
        &self.build_folder
    }
}
