//! The selection policy shared by one-shot traversal and live watching.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::binary::is_binary_file;
use crate::config::SelectionConfig;
use crate::error::Result;
use crate::ignore_rules::IgnoreRuleSet;
use crate::language::LanguageMap;
use crate::pattern::PatternSet;

/// Outcome of evaluating a path against the policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// The path is selected.
    Accepted,

    /// The file content looks binary.
    Binary,

    /// An ignore rule (or the metadata directory) hides the path.
    Ignored,

    /// Filter patterns are configured and none matched.
    NotFiltered,

    /// An exclude pattern matched.
    Excluded,
}

impl Verdict {
    /// Whether the path is selected.
    pub fn is_accepted(self) -> bool {
        self == Self::Accepted
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Self::Accepted => "accepted",
            Self::Binary => "binary content",
            Self::Ignored => "ignored",
            Self::NotFiltered => "no filter pattern matched",
            Self::Excluded => "matched exclude pattern",
        };
        f.write_str(reason)
    }
}

/// Ignore rules, compiled filter/exclude patterns and language map for one
/// root directory.
///
/// Built once per configuration load and never mutated.
#[derive(Debug, Clone)]
pub struct SelectionPolicy {
    root: PathBuf,
    config: SelectionConfig,
    ignore_rules: IgnoreRuleSet,
    filters: PatternSet,
    excludes: PatternSet,
    languages: LanguageMap,
}

impl SelectionPolicy {
    /// Load ignore rules for `root` and compile `config`.
    pub fn load(root: &Path, config: SelectionConfig) -> Result<Self> {
        let ignore_rules = IgnoreRuleSet::load(root, config.global_ignore, config.system_ignore)?;
        Ok(Self::with_rules(root, config, ignore_rules))
    }

    /// Compile `config` around an already loaded rule set.
    pub fn with_rules(root: &Path, config: SelectionConfig, ignore_rules: IgnoreRuleSet) -> Self {
        let filters = PatternSet::new(&config.filter_patterns, config.case_sensitive);
        let excludes = PatternSet::new(&config.exclude_patterns, config.case_sensitive);
        let languages = LanguageMap::new(&config.syntax_map);

        Self {
            root: root.to_path_buf(),
            config,
            ignore_rules,
            filters,
            excludes,
            languages,
        }
    }

    /// Root directory the policy applies to.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Configuration the policy was built from.
    pub fn config(&self) -> &SelectionConfig {
        &self.config
    }

    /// Compiled ignore rules.
    pub fn ignore_rules(&self) -> &IgnoreRuleSet {
        &self.ignore_rules
    }

    /// Language detection for accepted files.
    pub fn languages(&self) -> &LanguageMap {
        &self.languages
    }

    /// `path` relative to the root, or `None` when it lies outside.
    pub fn relative<'a>(&self, path: &'a Path) -> Option<&'a Path> {
        path.strip_prefix(&self.root).ok()
    }

    /// Evaluate a directory. Filter patterns never apply to directories.
    pub fn directory_verdict(&self, relative: &Path) -> Verdict {
        if relative.as_os_str().is_empty() {
            return Verdict::Accepted;
        }
        if self.ignore_rules.is_ignored(relative, true) {
            return Verdict::Ignored;
        }
        if self.excludes.is_match(relative) {
            return Verdict::Excluded;
        }
        Verdict::Accepted
    }

    /// Whether a walk should descend into the directory at `relative`.
    pub fn should_descend(&self, relative: &Path) -> bool {
        self.directory_verdict(relative).is_accepted()
    }

    /// Evaluate a file by path only: ignore rules, then filters (when any are
    /// configured), then excludes.
    pub fn path_verdict(&self, relative: &Path) -> Verdict {
        if self.ignore_rules.is_ignored(relative, false) {
            return Verdict::Ignored;
        }
        if !self.filters.is_empty() && !self.filters.is_match(relative) {
            return Verdict::NotFiltered;
        }
        if self.excludes.is_match(relative) {
            return Verdict::Excluded;
        }
        Verdict::Accepted
    }

    /// Evaluate a file: binary sniff first, then [`Self::path_verdict`].
    pub fn file_verdict(&self, relative: &Path, absolute: &Path) -> std::io::Result<Verdict> {
        if is_binary_file(absolute)? {
            return Ok(Verdict::Binary);
        }
        Ok(self.path_verdict(relative))
    }
}
