//! Glob matching over root-relative paths.
//!
//! A pattern without a `/` is matched against the final path segment only, so
//! `*.rs` selects Rust files at any depth. A pattern with a `/` is matched
//! against the whole relative path, where `**` stands for zero or more whole
//! segments (`src/**/*.rs`). A single `*` never crosses a separator.

use std::path::Path;

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use tracing::debug;

/// A single glob pattern plus its case-sensitivity mode.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PatternSpec {
    /// The glob as written by the user.
    pub glob: String,

    /// Whether matching respects case.
    pub case_sensitive: bool,
}

impl PatternSpec {
    /// Create a new pattern spec.
    pub fn new(glob: impl Into<String>, case_sensitive: bool) -> Self {
        Self {
            glob: glob.into(),
            case_sensitive,
        }
    }

    /// Whether the pattern is matched against the full relative path rather
    /// than the final segment.
    pub fn is_path_pattern(&self) -> bool {
        normalize_separators(&self.glob).contains('/')
    }

    /// Check a single path against this pattern.
    pub fn is_match(&self, path: impl AsRef<Path>) -> bool {
        PatternSet::new(std::slice::from_ref(&self.glob), self.case_sensitive).is_match(path)
    }
}

/// A compiled group of patterns sharing one case-sensitivity mode.
///
/// Malformed globs are dropped at compile time and can therefore never match.
#[derive(Debug, Clone)]
pub struct PatternSet {
    specs: Vec<PatternSpec>,
    by_name: GlobSet,
    by_path: GlobSet,
    case_sensitive: bool,
}

impl PatternSet {
    /// Compile a list of glob strings.
    pub fn new<S: AsRef<str>>(patterns: &[S], case_sensitive: bool) -> Self {
        let mut specs = Vec::with_capacity(patterns.len());
        let mut by_name = GlobSetBuilder::new();
        let mut by_path = GlobSetBuilder::new();

        for raw in patterns {
            let spec = PatternSpec::new(raw.as_ref(), case_sensitive);
            let glob = normalize_pattern(&spec.glob, case_sensitive);

            let compiled = match GlobBuilder::new(&glob).literal_separator(true).build() {
                Ok(compiled) => compiled,
                Err(err) => {
                    debug!("Ignoring malformed pattern {glob:?}: {err}");
                    continue;
                }
            };

            if spec.is_path_pattern() {
                by_path.add(compiled);
            } else {
                by_name.add(compiled);
            }
            specs.push(spec);
        }

        Self {
            specs,
            by_name: by_name.build().unwrap_or_else(|_| GlobSet::empty()),
            by_path: by_path.build().unwrap_or_else(|_| GlobSet::empty()),
            case_sensitive,
        }
    }

    /// An empty set; matches nothing.
    pub fn empty() -> Self {
        Self::new::<&str>(&[], false)
    }

    /// Whether no valid pattern was compiled.
    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    /// Number of valid patterns in the set.
    pub fn len(&self) -> usize {
        self.specs.len()
    }

    /// The patterns that compiled successfully.
    pub fn specs(&self) -> &[PatternSpec] {
        &self.specs
    }

    /// Whether `path` matches at least one pattern. Always false when empty.
    pub fn is_match(&self, path: impl AsRef<Path>) -> bool {
        if self.is_empty() {
            return false;
        }

        let path = normalize_path(path.as_ref(), self.case_sensitive);
        let name = path.rsplit('/').next().unwrap_or(path.as_str());

        self.by_name.is_match(name) || self.by_path.is_match(path.as_str())
    }
}

impl Default for PatternSet {
    fn default() -> Self {
        Self::empty()
    }
}

/// Check whether `path` matches any of `patterns`.
///
/// Returns `false` for an empty pattern list; what "nothing configured" means
/// is up to the caller.
pub fn matches_any<S: AsRef<str>>(
    path: impl AsRef<Path>,
    patterns: &[S],
    case_sensitive: bool,
) -> bool {
    PatternSet::new(patterns, case_sensitive).is_match(path)
}

fn normalize_separators(value: &str) -> String {
    if std::path::MAIN_SEPARATOR == '/' {
        value.to_string()
    } else {
        value.replace(std::path::MAIN_SEPARATOR, "/")
    }
}

fn normalize_pattern(pattern: &str, case_sensitive: bool) -> String {
    let pattern = normalize_separators(pattern.trim());
    if case_sensitive {
        pattern
    } else {
        pattern.to_lowercase()
    }
}

fn normalize_path(path: &Path, case_sensitive: bool) -> String {
    let mut path = path.to_string_lossy().replace('\\', "/");

    while let Some(stripped) = path.strip_prefix("./") {
        path = stripped.to_string();
    }
    while path.len() > 1 && path.ends_with('/') {
        path.pop();
    }

    if case_sensitive {
        path
    } else {
        path.to_lowercase()
    }
}
