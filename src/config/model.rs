// src/config/model.rs

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::paths::{PathTable, PROJECT_FOLDER, SOURCE_FOLDER};
use crate::transform::{PipelineTable, TransformerSpec};

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [project]
/// source = "src"
/// build = "dist"
///
/// [server]
/// port = 3000
///
/// [paths.style]
/// source = ["src/scss/main.scss", "src/scss/print.scss"]
///
/// [pipeline]
/// style = [
///   { kind = "command", cmd = "sass --stdin", extname = ".css" },
///   { kind = "rename", extname = ".min.css" },
/// ]
///
/// [images]
/// web = [{ kind = "command", cmd = "cwebp -q 80 {input} -o -", extname = ".webp" }]
/// ```
///
/// All sections are optional and have reasonable defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawConfigFile {
    #[serde(default)]
    pub project: ProjectSection,

    #[serde(default)]
    pub server: ServerSection,

    #[serde(default)]
    pub watch: WatchSection,

    /// Per-class overrides of the built-in path table, keyed by asset class
    /// (`[paths.vendor-css]`).
    #[serde(default)]
    pub paths: BTreeMap<String, PathOverride>,

    /// Per-class replacement transformer chains.
    #[serde(default)]
    pub pipeline: BTreeMap<String, Vec<TransformerSpec>>,

    #[serde(default)]
    pub images: ImagesSection,
}

/// `[project]` section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectSection {
    /// Source folder, relative to the project root.
    #[serde(default = "default_source")]
    pub source: String,

    /// Output folder, relative to the project root. `clean` deletes it.
    #[serde(default = "default_build")]
    pub build: String,
}

fn default_source() -> String {
    SOURCE_FOLDER.to_string()
}

fn default_build() -> String {
    PROJECT_FOLDER.to_string()
}

impl Default for ProjectSection {
    fn default() -> Self {
        Self {
            source: default_source(),
            build: default_build(),
        }
    }
}

/// `[server]` section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerSection {
    #[serde(default = "default_host")]
    pub host: String,

    /// `0` picks a free port.
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerSection {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// `[watch]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WatchSection {
    /// Only rebuild when the content of the changed file differs from the
    /// last time it was seen (blake3, in memory).
    #[serde(default)]
    pub skip_unchanged: bool,
}

/// `[paths.<class>]`: any field left out keeps its built-in value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PathOverride {
    #[serde(default)]
    pub source: Option<Vec<String>>,
    #[serde(default)]
    pub watch: Option<Vec<String>>,
    #[serde(default)]
    pub output: Option<String>,
}

/// `[images]`: the two chains run for every source image.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ImagesSection {
    #[serde(default)]
    pub web: Option<Vec<TransformerSpec>>,
    #[serde(default)]
    pub fallback: Option<Vec<TransformerSpec>>,
    /// Source extensions the web chain runs on (`["png", "jpg"]`).
    #[serde(default)]
    pub web_formats: Option<Vec<String>>,
}

/// Validated configuration.
///
/// Only obtainable through `TryFrom<RawConfigFile>` (or [`Default`], which
/// is the built-in layout), so holders can rely on a complete path table and
/// well-formed transformer chains.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub server: ServerSection,
    pub watch: WatchSection,
    paths: PathTable,
    pipelines: PipelineTable,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(
        server: ServerSection,
        watch: WatchSection,
        paths: PathTable,
        pipelines: PipelineTable,
    ) -> Self {
        Self {
            server,
            watch,
            paths,
            pipelines,
        }
    }

    pub fn paths(&self) -> &PathTable {
        &self.paths
    }

    pub fn pipelines(&self) -> &PipelineTable {
        &self.pipelines
    }
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self::new_unchecked(
            ServerSection::default(),
            WatchSection::default(),
            PathTable::defaults(SOURCE_FOLDER, PROJECT_FOLDER),
            PipelineTable::defaults(),
        )
    }
}
