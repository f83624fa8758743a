// src/types.rs

//! Small shared vocabulary types: asset classes, task identifiers and reload
//! scopes.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

/// A category of static file with its own source/output mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum AssetClass {
    Html,
    Style,
    Js,
    Images,
    Fonts,
    VendorCss,
    VendorJs,
    Sprite,
}

impl AssetClass {
    /// Every known class, in declaration order.
    pub const ALL: [AssetClass; 8] = [
        AssetClass::Html,
        AssetClass::Style,
        AssetClass::Js,
        AssetClass::Images,
        AssetClass::Fonts,
        AssetClass::VendorCss,
        AssetClass::VendorJs,
        AssetClass::Sprite,
    ];

    /// Classes built by the default run, in the order they are declared in
    /// the parallel build group.
    pub const DEFAULT_BUILD: [AssetClass; 7] = [
        AssetClass::Images,
        AssetClass::Fonts,
        AssetClass::VendorJs,
        AssetClass::VendorCss,
        AssetClass::Js,
        AssetClass::Style,
        AssetClass::Html,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AssetClass::Html => "html",
            AssetClass::Style => "style",
            AssetClass::Js => "js",
            AssetClass::Images => "images",
            AssetClass::Fonts => "fonts",
            AssetClass::VendorCss => "vendor-css",
            AssetClass::VendorJs => "vendor-js",
            AssetClass::Sprite => "sprite",
        }
    }

    /// What connected browsers should refresh after this class is rebuilt.
    pub fn reload_scope(&self) -> ReloadScope {
        match self {
            AssetClass::Style | AssetClass::VendorCss => ReloadScope::Css,
            _ => ReloadScope::Full,
        }
    }
}

impl fmt::Display for AssetClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AssetClass {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "html" => Ok(AssetClass::Html),
            "style" => Ok(AssetClass::Style),
            "js" => Ok(AssetClass::Js),
            "images" => Ok(AssetClass::Images),
            "fonts" => Ok(AssetClass::Fonts),
            "vendor-css" => Ok(AssetClass::VendorCss),
            "vendor-js" => Ok(AssetClass::VendorJs),
            "sprite" => Ok(AssetClass::Sprite),
            other => Err(format!(
                "unknown asset class '{other}' (expected one of html, style, js, images, fonts, vendor-css, vendor-js, sprite)"
            )),
        }
    }
}

/// Identifier of a node in the task graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TaskId {
    /// Delete the whole output directory.
    Clean,
    /// Run the transform task of one asset class.
    Build(AssetClass),
    /// Start the file watcher (long-running).
    Watch,
    /// Start the dev server (long-running).
    Serve,
}

impl TaskId {
    /// Whether a failure of this task must keep its dependents from running.
    ///
    /// Only `clean` gates: nothing may write into a half-deleted output tree.
    /// Build failures never hold back the watch/serve phase.
    pub fn gates_dependents(&self) -> bool {
        matches!(self, TaskId::Clean)
    }

    /// Long-running tasks report progress once started and never complete in
    /// normal operation.
    pub fn is_service(&self) -> bool {
        matches!(self, TaskId::Watch | TaskId::Serve)
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskId::Clean => f.write_str("clean"),
            TaskId::Build(class) => write!(f, "{class}"),
            TaskId::Watch => f.write_str("watch"),
            TaskId::Serve => f.write_str("serve"),
        }
    }
}

impl FromStr for TaskId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "clean" => Ok(TaskId::Clean),
            "watch" => Ok(TaskId::Watch),
            "serve" => Ok(TaskId::Serve),
            other => AssetClass::from_str(other).map(TaskId::Build),
        }
    }
}

/// Scope of a live-reload notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReloadScope {
    /// Reload the whole page.
    Full,
    /// Re-fetch stylesheets only.
    Css,
}
