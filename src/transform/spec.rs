// src/transform/spec.rs

use std::fmt;
use std::sync::Arc;

use serde::Deserialize;

use crate::errors::Result;
use crate::fs::FileSystem;
use crate::transform::command::CommandTransformer;
use crate::transform::concat::ConcatTransformer;
use crate::transform::include::IncludeTransformer;
use crate::transform::rename::RenameTransformer;
use crate::transform::svg_stack::SvgStackTransformer;
use crate::transform::Transformer;

/// Declarative description of one pipeline step, as written in the config:
///
/// ```toml
/// [pipeline]
/// style = [
///   { kind = "command", cmd = "sass --stdin --no-source-map", extname = ".css" },
///   { kind = "rename", extname = ".min.css" },
/// ]
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum TransformerSpec {
    /// Inline `@@include(...)` directives.
    Include,

    /// Rename outputs.
    Rename {
        #[serde(default)]
        extname: Option<String>,
        #[serde(default)]
        suffix: Option<String>,
    },

    /// Join all files into one.
    Concat { file: String },

    /// Pipe each file through an external command.
    Command {
        cmd: String,
        #[serde(default)]
        extname: Option<String>,
    },

    /// Bundle SVG icons into a stack sprite.
    SvgStack { file: String },
}

impl TransformerSpec {
    pub fn command(cmd: impl Into<String>) -> Self {
        TransformerSpec::Command {
            cmd: cmd.into(),
            extname: None,
        }
    }

    pub fn command_with_ext(cmd: impl Into<String>, extname: impl Into<String>) -> Self {
        TransformerSpec::Command {
            cmd: cmd.into(),
            extname: Some(extname.into()),
        }
    }

    pub fn rename_ext(extname: impl Into<String>) -> Self {
        TransformerSpec::Rename {
            extname: Some(extname.into()),
            suffix: None,
        }
    }

    pub fn concat(file: impl Into<String>) -> Self {
        TransformerSpec::Concat { file: file.into() }
    }

    /// Check the fields that serde cannot.
    pub fn validate(&self) -> std::result::Result<(), String> {
        match self {
            TransformerSpec::Include => Ok(()),
            TransformerSpec::Rename { extname, suffix } => {
                if extname.is_none() && suffix.is_none() {
                    return Err("rename needs `extname` and/or `suffix`".to_string());
                }
                check_extname(extname.as_deref())
            }
            TransformerSpec::Concat { file } => check_file_name("concat", file),
            TransformerSpec::SvgStack { file } => check_file_name("svg-stack", file),
            TransformerSpec::Command { cmd, extname } => {
                if cmd.trim().is_empty() {
                    return Err("command transformer has an empty `cmd`".to_string());
                }
                check_extname(extname.as_deref())
            }
        }
    }

    /// Instantiate the transformer.
    pub fn build(&self, fs: &Arc<dyn FileSystem>) -> Result<Box<dyn Transformer>> {
        let transformer: Box<dyn Transformer> = match self {
            TransformerSpec::Include => Box::new(IncludeTransformer::new(Arc::clone(fs))?),
            TransformerSpec::Rename { extname, suffix } => {
                Box::new(RenameTransformer::new(extname.clone(), suffix.clone()))
            }
            TransformerSpec::Concat { file } => Box::new(ConcatTransformer::new(file.clone())),
            TransformerSpec::Command { cmd, extname } => {
                Box::new(CommandTransformer::new(cmd.clone(), extname.clone()))
            }
            TransformerSpec::SvgStack { file } => Box::new(SvgStackTransformer::new(file.clone())?),
        };
        Ok(transformer)
    }
}

impl fmt::Display for TransformerSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransformerSpec::Include => f.write_str("include"),
            TransformerSpec::Rename { extname, suffix } => {
                f.write_str("rename(")?;
                if let Some(suffix) = suffix {
                    write!(f, "suffix={suffix}")?;
                    if extname.is_some() {
                        f.write_str(", ")?;
                    }
                }
                if let Some(ext) = extname {
                    write!(f, "extname={ext}")?;
                }
                f.write_str(")")
            }
            TransformerSpec::Concat { file } => write!(f, "concat({file})"),
            TransformerSpec::Command { cmd, extname } => {
                write!(f, "command(`{cmd}`)")?;
                if let Some(ext) = extname {
                    write!(f, " -> *{ext}")?;
                }
                Ok(())
            }
            TransformerSpec::SvgStack { file } => write!(f, "svg-stack({file})"),
        }
    }
}

fn check_extname(extname: Option<&str>) -> std::result::Result<(), String> {
    match extname {
        Some(ext) if !ext.starts_with('.') || ext.len() < 2 => {
            Err(format!("extname '{ext}' must start with '.' (e.g. \".min.css\")"))
        }
        _ => Ok(()),
    }
}

fn check_file_name(kind: &str, file: &str) -> std::result::Result<(), String> {
    if file.trim().is_empty() || file.contains(['/', '\\']) {
        return Err(format!("{kind} `file` must be a plain file name, got '{file}'"));
    }
    Ok(())
}
