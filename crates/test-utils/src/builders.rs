#![allow(dead_code)]

use assetpipe::config::{ConfigFile, PathOverride, RawConfigFile};
use assetpipe::transform::TransformerSpec;
use assetpipe::types::AssetClass;

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile::default(),
        }
    }

    pub fn with_build_folder(mut self, folder: &str) -> Self {
        self.config.project.build = folder.to_string();
        self
    }

    pub fn with_source_folder(mut self, folder: &str) -> Self {
        self.config.project.source = folder.to_string();
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.config.server.port = port;
        self
    }

    pub fn with_skip_unchanged(mut self, val: bool) -> Self {
        self.config.watch.skip_unchanged = val;
        self
    }

    pub fn with_paths(mut self, class: AssetClass, paths: PathOverride) -> Self {
        self.config.paths.insert(class.to_string(), paths);
        self
    }

    pub fn with_pipeline(mut self, class: AssetClass, chain: Vec<TransformerSpec>) -> Self {
        self.config.pipeline.insert(class.to_string(), chain);
        self
    }

    pub fn with_images(mut self, web: Vec<TransformerSpec>, fallback: Vec<TransformerSpec>) -> Self {
        self.config.images.web = Some(web);
        self.config.images.fallback = Some(fallback);
        self
    }

    /// Replace every chain with a plain copy, so builds need no external tool.
    pub fn passthrough(mut self) -> Self {
        for class in AssetClass::ALL {
            if class == AssetClass::Images {
                continue;
            }
            self.config.pipeline.insert(class.to_string(), Vec::new());
        }
        self.config.images.web = Some(Vec::new());
        self.config.images.fallback = Some(Vec::new());
        self
    }

    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `PathOverride`.
#[derive(Default)]
pub struct PathOverrideBuilder {
    paths: PathOverride,
}

impl PathOverrideBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn source(mut self, pattern: &str) -> Self {
        self.paths
            .source
            .get_or_insert_with(Vec::new)
            .push(pattern.to_string());
        self
    }

    pub fn watch(mut self, pattern: &str) -> Self {
        self.paths
            .watch
            .get_or_insert_with(Vec::new)
            .push(pattern.to_string());
        self
    }

    pub fn output(mut self, dir: &str) -> Self {
        self.paths.output = Some(dir.to_string());
        self
    }

    pub fn build(self) -> PathOverride {
        self.paths
    }
}
