// src/paths/patterns.rs

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

use globset::{Glob, GlobBuilder, GlobMatcher, GlobSet, GlobSetBuilder};

use crate::errors::{PipelineError, Result};
use crate::fs::{walk_files, FileSystem};
use crate::paths::relative_str;

/// A source file selected by a [`SourceMatcher`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Location on disk (`root` joined with the matched relative path).
    pub path: PathBuf,
    /// Path below the glob base of the pattern that selected the file. This is
    /// where the file lands under the output directory.
    pub relative: PathBuf,
}

#[derive(Clone)]
struct IncludePattern {
    base: PathBuf,
    matcher: GlobMatcher,
}

/// Compiled source patterns of one asset class.
///
/// Plain patterns select files, patterns prefixed with `!` exclude them.
/// Patterns are evaluated against paths relative to the project root, with
/// forward slashes.
#[derive(Clone)]
pub struct SourceMatcher {
    includes: Vec<IncludePattern>,
    exclude: Option<GlobSet>,
}

impl fmt::Debug for SourceMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceMatcher")
            .field("includes", &self.includes.len())
            .finish_non_exhaustive()
    }
}

impl SourceMatcher {
    pub fn compile(patterns: &[String]) -> Result<Self> {
        let mut includes = Vec::new();
        let mut excludes = Vec::new();

        for pattern in patterns {
            match pattern.strip_prefix('!') {
                Some(negated) => excludes.push(negated.to_string()),
                None => includes.push(IncludePattern {
                    base: glob_base(pattern),
                    matcher: compile_glob(pattern)?.compile_matcher(),
                }),
            }
        }

        let exclude = if excludes.is_empty() {
            None
        } else {
            Some(build_globset(&excludes)?)
        };

        Ok(Self { includes, exclude })
    }

    /// Returns true if `rel_path` is selected by an include pattern and not
    /// rejected by an exclusion.
    pub fn is_match(&self, rel_path: &str) -> bool {
        if self.is_excluded(rel_path) {
            return false;
        }
        self.includes.iter().any(|inc| inc.matcher.is_match(rel_path))
    }

    fn is_excluded(&self, rel_path: &str) -> bool {
        self.exclude
            .as_ref()
            .is_some_and(|set| set.is_match(rel_path))
    }

    /// List the files under `root` selected by these patterns.
    ///
    /// Only the glob base directory of each pattern is walked. A base that
    /// does not exist simply contributes nothing. The result is sorted and
    /// each file appears once, attributed to the first pattern matching it.
    pub fn enumerate(&self, fs: &dyn FileSystem, root: &Path) -> Result<Vec<SourceFile>> {
        let mut seen = HashSet::new();
        let mut selected = Vec::new();

        for include in &self.includes {
            let base_dir = root.join(&include.base);
            for path in walk_files(fs, &base_dir)? {
                let Some(rel) = relative_str(root, &path) else {
                    continue;
                };
                if !include.matcher.is_match(&rel) || self.is_excluded(&rel) {
                    continue;
                }
                if !seen.insert(path.clone()) {
                    continue;
                }
                let relative = path
                    .strip_prefix(&base_dir)
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|_| PathBuf::from(&rel));
                selected.push(SourceFile { path, relative });
            }
        }

        selected.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(selected)
    }
}

/// Compiled watch patterns for one asset class.
#[derive(Clone)]
pub struct WatchMatcher {
    set: GlobSet,
}

impl WatchMatcher {
    pub fn compile(patterns: &[String]) -> Result<Self> {
        Ok(Self {
            set: build_globset(patterns)?,
        })
    }

    pub fn is_match(&self, rel_path: &str) -> bool {
        self.set.is_match(rel_path)
    }
}

/// Leading literal directories of a pattern.
///
/// - `src/**/*.html` -> `src`
/// - `src/images/**/*.{png,jpg}` -> `src/images`
/// - `src/scss/main.scss` (no glob at all) -> `src/scss`
pub fn glob_base(pattern: &str) -> PathBuf {
    let pattern = pattern.strip_prefix('!').unwrap_or(pattern);
    let components: Vec<&str> = pattern.split('/').collect();

    let literal_len = match components.iter().position(|c| has_glob_meta(c)) {
        Some(idx) => idx,
        None => components.len().saturating_sub(1),
    };

    let mut base = PathBuf::new();
    for component in &components[..literal_len] {
        if component.is_empty() || *component == "." {
            continue;
        }
        base.push(component);
    }
    base
}

fn has_glob_meta(component: &str) -> bool {
    component.contains(['*', '?', '[', '{'])
}

/// Reject brace groups using `|` as the separator (`{png|jpg}`); alternation
/// is written with commas (`{png,jpg}`).
pub fn check_alternation_syntax(pattern: &str) -> std::result::Result<(), String> {
    let mut depth = 0usize;
    for c in pattern.chars() {
        match c {
            '{' => depth += 1,
            '}' => depth = depth.saturating_sub(1),
            '|' if depth > 0 => {
                return Err(format!(
                    "pattern '{pattern}' separates alternatives with '|'; use ',' as in {{png,jpg}}"
                ));
            }
            _ => {}
        }
    }
    Ok(())
}

fn compile_glob(pattern: &str) -> Result<Glob> {
    GlobBuilder::new(pattern)
        .literal_separator(true)
        .build()
        .map_err(|e| PipelineError::ConfigError(format!("invalid glob pattern '{pattern}': {e}")))
}

/// Build a GlobSet from simple string patterns.
fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        builder.add(compile_glob(pat)?);
    }
    builder
        .build()
        .map_err(|e| PipelineError::ConfigError(format!("building glob set: {e}")))
}
