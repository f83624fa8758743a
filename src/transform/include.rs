// src/transform/include.rs

//! `@@include` directive expansion for HTML and JS sources.
//!
//! ```text
//! @@include('partials/_header.html')
//! @@include("partials/_card.html", {"title": "Hello"})
//! ```
//!
//! Paths resolve against the directory of the file containing the directive.
//! Parameters are substituted into the partial as `@@title`, and are
//! inherited by nested includes.

use std::path::Path;
use std::sync::Arc;

use regex::Regex;
use serde_json::{Map, Value};
use tracing::debug;

use crate::errors::{PipelineError, Result};
use crate::fs::FileSystem;
use crate::transform::{Asset, FileSet, TransformFuture, Transformer};

/// Nesting limit; deeper chains are treated as an include cycle.
const MAX_INCLUDE_DEPTH: usize = 32;

const NAME: &str = "include";

const DIRECTIVE: &str = "@@include(";

#[derive(Debug)]
pub struct IncludeTransformer {
    fs: Arc<dyn FileSystem>,
    /// Matches the head of a directive, up to and including the path.
    head: Regex,
}

/// One parsed `@@include(...)` occurrence.
struct Directive {
    path: String,
    params: Map<String, Value>,
    /// Byte offset just past the closing parenthesis.
    end: usize,
}

impl IncludeTransformer {
    pub fn new(fs: Arc<dyn FileSystem>) -> Result<Self> {
        let head = Regex::new(r#"\A@@include\(\s*['"]([^'"]+)['"]\s*"#)
            .map_err(|e| PipelineError::Other(e.into()))?;
        Ok(Self { fs, head })
    }

    fn expand_asset(&self, mut asset: Asset) -> Result<Asset> {
        let origin = asset.relative.display().to_string();
        let text = String::from_utf8(std::mem::take(&mut asset.contents))
            .map_err(|e| PipelineError::transform(NAME, &origin, e.to_string()))?;
        let expanded = self.expand(&text, asset.source_dir(), &Map::new(), 0, &origin)?;
        asset.contents = expanded.into_bytes();
        Ok(asset)
    }

    fn expand(
        &self,
        text: &str,
        dir: &Path,
        params: &Map<String, Value>,
        depth: usize,
        origin: &str,
    ) -> Result<String> {
        if depth > MAX_INCLUDE_DEPTH {
            return Err(PipelineError::transform(
                NAME,
                origin,
                format!("includes nested deeper than {MAX_INCLUDE_DEPTH} levels (cycle?)"),
            ));
        }

        let mut out = String::with_capacity(text.len());
        let mut last = 0;

        while let Some(found) = text[last..].find(DIRECTIVE) {
            let start = last + found;
            out.push_str(&text[last..start]);

            let directive = self.parse_directive(text, start, origin)?;
            let partial_path = dir.join(directive.path.trim_start_matches("./"));
            let mut child_params = params.clone();
            child_params.extend(directive.params);

            let partial = self.fs.read_to_string(&partial_path).map_err(|e| {
                PipelineError::transform(
                    NAME,
                    origin,
                    format!("cannot read partial {:?}: {e}", partial_path),
                )
            })?;
            debug!(partial = ?partial_path, depth, "inlining partial");

            let partial = substitute_params(&partial, &child_params);
            let partial_dir = partial_path.parent().unwrap_or(dir);
            out.push_str(&self.expand(&partial, partial_dir, &child_params, depth + 1, origin)?);

            last = directive.end;
        }

        out.push_str(&text[last..]);
        Ok(out)
    }

    /// Parse the directive starting at `start`. The parameter object is read
    /// as JSON, so braces and parentheses inside its strings are fine. Text
    /// that starts like a directive but does not parse is an error rather
    /// than being left in the output.
    fn parse_directive(&self, text: &str, start: usize, origin: &str) -> Result<Directive> {
        let malformed = |detail: &str| {
            let snippet: String = text[start..].chars().take(60).collect();
            PipelineError::transform(
                NAME,
                origin,
                format!("malformed include directive ({detail}): {snippet}"),
            )
        };

        let caps = self
            .head
            .captures(&text[start..])
            .ok_or_else(|| malformed("expected a quoted path"))?;
        let path = caps[1].to_string();
        let mut rest = &text[start + caps[0].len()..];

        let mut params = Map::new();
        if let Some(after_comma) = rest.strip_prefix(',') {
            let after_comma = after_comma.trim_start();
            let mut values = serde_json::Deserializer::from_str(after_comma).into_iter::<Value>();
            params = match values.next() {
                Some(Ok(Value::Object(map))) => map,
                Some(Ok(other)) => {
                    return Err(PipelineError::transform(
                        NAME,
                        origin,
                        format!("include parameters must be a JSON object, got {other}"),
                    ));
                }
                Some(Err(e)) => {
                    return Err(PipelineError::transform(
                        NAME,
                        origin,
                        format!("invalid include parameters: {e}"),
                    ));
                }
                None => return Err(malformed("missing parameters after ','")),
            };
            rest = &after_comma[values.byte_offset()..];
        }

        let tail = rest.trim_start();
        if !tail.starts_with(')') {
            return Err(malformed("expected ')'"));
        }
        Ok(Directive {
            path,
            params,
            end: text.len() - tail.len() + 1,
        })
    }
}

impl Transformer for IncludeTransformer {
    fn name(&self) -> &str {
        NAME
    }

    fn transform(&self, files: FileSet) -> TransformFuture<'_> {
        Box::pin(async move {
            files
                .into_iter()
                .map(|asset| self.expand_asset(asset))
                .collect::<Result<FileSet>>()
        })
    }
}

/// Replace `@@name` with the parameter value. Longer names go first so that
/// `@@titleSuffix` is not clobbered by `@@title`.
fn substitute_params(text: &str, params: &Map<String, Value>) -> String {
    let mut keys: Vec<&String> = params.keys().filter(|k| k.as_str() != "include").collect();
    keys.sort_by_key(|k| std::cmp::Reverse(k.len()));

    let mut result = text.to_string();
    for key in keys {
        let value = match &params[key.as_str()] {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        result = result.replace(&format!("@@{key}"), &value);
    }
    result
}
