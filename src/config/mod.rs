// src/config/mod.rs

//! Configuration loading and validation for assetpipe.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load an optional config file from disk (`loader.rs`).
//! - Validate it and resolve it into a path table and pipeline table
//!   (`validate.rs`).
//!
//! Every section is optional; a project without a config file runs on the
//! built-in layout.

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_config_path, load_and_validate, load_from_path, load_or_default};
pub use model::{
    ConfigFile, ImagesSection, PathOverride, ProjectSection, RawConfigFile, ServerSection,
    WatchSection,
};
