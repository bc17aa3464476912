//! Hierarchical ignore rules.
//!
//! Rules are collected from up to three scopes and compiled into a single
//! gitignore matcher in the order system, global, local. The matcher applies
//! last-match-wins, so a `!pattern` in the local file can re-include a path a
//! broader scope excluded.

use std::fs;
use std::path::{Path, PathBuf};

use ignore::gitignore::{Gitignore, GitignoreBuilder, gitconfig_excludes_path};
use tracing::debug;

use crate::error::{Result, SelectionError};

/// Repository metadata directory, never traversed or watched.
pub const METADATA_DIR: &str = ".git";

/// Name of the local rule file read from the root directory.
pub const LOCAL_IGNORE_FILE: &str = ".gitignore";

const SYSTEM_GITCONFIG: &str = "/etc/gitconfig";

/// Scope a rule was loaded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RuleOrigin {
    /// Machine-wide rules.
    System,
    /// Per-user rules.
    Global,
    /// Rules from the root directory.
    Local,
}

/// One parsed ignore rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IgnoreRule {
    /// Which scope the rule came from.
    pub origin: RuleOrigin,

    /// The glob, without the `!` prefix or trailing `/`.
    pub pattern: String,

    /// Whether the rule re-includes matching paths.
    pub negated: bool,

    /// Whether the rule only applies to directories.
    pub directory_only: bool,

    /// File the rule was read from.
    pub source: PathBuf,
}

impl IgnoreRule {
    fn parse(line: &str, origin: RuleOrigin, source: &Path) -> Self {
        let (negated, rest) = match line.strip_prefix('!') {
            Some(rest) => (true, rest),
            None => (false, line),
        };
        let (directory_only, pattern) = match rest.strip_suffix('/') {
            Some(pattern) => (true, pattern),
            None => (false, rest),
        };

        Self {
            origin,
            pattern: pattern.to_string(),
            negated,
            directory_only,
            source: source.to_path_buf(),
        }
    }
}

/// Where each scope's rule file lives.
#[derive(Debug, Clone, Default)]
pub struct RuleSources {
    /// System rule file, if any.
    pub system: Option<PathBuf>,

    /// User rule file, if any.
    pub global: Option<PathBuf>,

    /// Local rule file.
    pub local: PathBuf,
}

impl RuleSources {
    /// Locate rule files the way git does.
    pub fn discover(root: &Path, include_global: bool, include_system: bool) -> Self {
        Self {
            system: include_system.then(system_excludes_path).flatten(),
            global: include_global.then(gitconfig_excludes_path).flatten(),
            local: root.join(LOCAL_IGNORE_FILE),
        }
    }

    /// Only the local rule file.
    pub fn local_only(root: &Path) -> Self {
        Self {
            system: None,
            global: None,
            local: root.join(LOCAL_IGNORE_FILE),
        }
    }
}

/// Compiled ignore rules for one root directory.
#[derive(Debug, Clone)]
pub struct IgnoreRuleSet {
    rules: Vec<IgnoreRule>,
    matcher: Gitignore,
}

impl IgnoreRuleSet {
    /// Load the local rule file under `root`, optionally preceded by the user
    /// and system rule files.
    pub fn load(root: &Path, include_global: bool, include_system: bool) -> Result<Self> {
        Self::load_from(
            root,
            &RuleSources::discover(root, include_global, include_system),
        )
    }

    /// Load rules from explicit locations.
    pub fn load_from(root: &Path, sources: &RuleSources) -> Result<Self> {
        let mut builder = GitignoreBuilder::new(root);
        let mut rules = Vec::new();

        let scopes = [
            (RuleOrigin::System, sources.system.as_deref()),
            (RuleOrigin::Global, sources.global.as_deref()),
            (RuleOrigin::Local, Some(sources.local.as_path())),
        ];

        for (origin, path) in scopes {
            let Some(path) = path else {
                continue;
            };
            let Some(contents) = read_rule_file(path)? else {
                debug!("No {origin:?} ignore file at {}", path.display());
                continue;
            };

            for line in contents.lines() {
                let line = line.trim();
                if line.is_empty() || line.starts_with('#') {
                    continue;
                }

                builder
                    .add_line(Some(path.to_path_buf()), line)
                    .map_err(|err| SelectionError::ConfigParse {
                        path: path.to_path_buf(),
                        message: err.to_string(),
                    })?;
                rules.push(IgnoreRule::parse(line, origin, path));
            }
        }

        let matcher = builder.build().map_err(|err| SelectionError::ConfigParse {
            path: sources.local.clone(),
            message: err.to_string(),
        })?;

        debug!("Loaded {} ignore rules for {}", rules.len(), root.display());
        Ok(Self { rules, matcher })
    }

    /// A rule set with no rules; only the metadata directory is ignored.
    pub fn empty(root: &Path) -> Self {
        let matcher = GitignoreBuilder::new(root)
            .build()
            .unwrap_or_else(|_| Gitignore::empty());
        Self {
            rules: Vec::new(),
            matcher,
        }
    }

    /// Rules in evaluation order.
    pub fn rules(&self) -> &[IgnoreRule] {
        &self.rules
    }

    /// Number of rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether there are no rules.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Whether `relative_path` is ignored.
    ///
    /// The path and each of its ancestor directories are evaluated; the last
    /// matching rule decides, and an ignored ancestor hides everything below
    /// it.
    pub fn is_ignored(&self, relative_path: impl AsRef<Path>, is_directory: bool) -> bool {
        let path = relative_path.as_ref();
        let path = path.strip_prefix(self.matcher.path()).unwrap_or(path);

        if path
            .components()
            .any(|component| component.as_os_str() == METADATA_DIR)
        {
            return true;
        }
        if path.as_os_str().is_empty() || path.has_root() {
            return false;
        }

        let segments: Vec<_> = path.components().collect();
        let mut prefix = PathBuf::new();
        for (index, segment) in segments.iter().enumerate() {
            prefix.push(segment);
            let is_last = index + 1 == segments.len();
            let as_directory = !is_last || is_directory;

            if self.matcher.matched(&prefix, as_directory).is_ignore() {
                return true;
            }
        }

        false
    }
}

fn read_rule_file(path: &Path) -> Result<Option<String>> {
    match fs::read_to_string(path) {
        Ok(contents) => Ok(Some(contents)),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(source) => Err(SelectionError::ConfigRead {
            path: path.to_path_buf(),
            source,
        }),
    }
}

fn system_excludes_path() -> Option<PathBuf> {
    let contents = fs::read_to_string(SYSTEM_GITCONFIG).ok()?;
    excludes_file_from_gitconfig(&contents)
}

/// Extract `core.excludesFile` from gitconfig text.
fn excludes_file_from_gitconfig(contents: &str) -> Option<PathBuf> {
    let mut in_core = false;

    for line in contents.lines() {
        let line = line.trim();
        if line.starts_with('[') {
            let section = line.trim_start_matches('[').trim_end_matches(']').trim();
            in_core = section.eq_ignore_ascii_case("core");
            continue;
        }
        if !in_core {
            continue;
        }

        if let Some((key, value)) = line.split_once('=') {
            if key.trim().eq_ignore_ascii_case("excludesfile") {
                return Some(expand_home(value.trim().trim_matches('"')));
            }
        }
    }

    None
}

fn expand_home(value: &str) -> PathBuf {
    match (value.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn local_rules(contents: &str) -> (TempDir, IgnoreRuleSet) {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join(LOCAL_IGNORE_FILE), contents).unwrap();
        let rules =
            IgnoreRuleSet::load_from(temp_dir.path(), &RuleSources::local_only(temp_dir.path()))
                .unwrap();
        (temp_dir, rules)
    }

    #[test]
    fn test_comments_and_blank_lines_skipped() {
        let (_dir, rules) = local_rules("# build output\n\n*.tmp\n   \n# trailing\n");

        assert_eq!(rules.len(), 1);
        assert!(rules.is_ignored("scratch.tmp", false));
        assert!(!rules.is_ignored("main.rs", false));
    }

    #[test]
    fn test_negation_last_match_wins() {
        let (_dir, rules) = local_rules("*.log\n!important.log\n");

        assert!(rules.is_ignored("debug.log", false));
        assert!(!rules.is_ignored("important.log", false));

        let (_dir, rules) = local_rules("!important.log\n*.log\n");
        assert!(rules.is_ignored("important.log", false));
    }

    #[test]
    fn test_directory_only_rules() {
        let (_dir, rules) = local_rules("build/\n");

        assert!(rules.is_ignored("build", true));
        assert!(!rules.is_ignored("build", false));
        assert!(rules.is_ignored("build/output.txt", false));
        assert!(rules.is_ignored("nested/build/output.txt", false));

        let rule = &rules.rules()[0];
        assert!(rule.directory_only);
        assert_eq!(rule.pattern, "build");
        assert_eq!(rule.origin, RuleOrigin::Local);
    }

    #[test]
    fn test_metadata_directory_always_ignored() {
        let temp_dir = TempDir::new().unwrap();
        let rules = IgnoreRuleSet::empty(temp_dir.path());

        assert!(rules.is_ignored(".git", true));
        assert!(rules.is_ignored(".git/config", false));
        assert!(rules.is_ignored("sub/.git/HEAD", false));
        assert!(!rules.is_ignored("src/git.rs", false));
    }

    #[test]
    fn test_scopes_apply_system_global_local() {
        let temp_dir = TempDir::new().unwrap();
        let system = temp_dir.path().join("system-ignore");
        let global = temp_dir.path().join("global-ignore");
        fs::write(&system, "*.bak\n").unwrap();
        fs::write(&global, "*.tmp\n!notes.bak\n").unwrap();
        fs::write(temp_dir.path().join(LOCAL_IGNORE_FILE), "!keep.tmp\n").unwrap();

        let sources = RuleSources {
            system: Some(system),
            global: Some(global),
            local: temp_dir.path().join(LOCAL_IGNORE_FILE),
        };
        let rules = IgnoreRuleSet::load_from(temp_dir.path(), &sources).unwrap();

        let origins: Vec<RuleOrigin> = rules.rules().iter().map(|r| r.origin).collect();
        assert_eq!(
            origins,
            vec![RuleOrigin::System, RuleOrigin::Global, RuleOrigin::Global, RuleOrigin::Local]
        );
        assert!(rules.is_ignored("old.bak", false));
        assert!(!rules.is_ignored("notes.bak", false));
        assert!(rules.is_ignored("scratch.tmp", false));
        assert!(!rules.is_ignored("keep.tmp", false));
        assert!(rules.rules()[3].negated);
    }

    #[test]
    fn test_missing_files_are_not_errors() {
        let temp_dir = TempDir::new().unwrap();
        let sources = RuleSources {
            system: Some(temp_dir.path().join("absent-system")),
            global: Some(temp_dir.path().join("absent-global")),
            local: temp_dir.path().join(LOCAL_IGNORE_FILE),
        };

        let rules = IgnoreRuleSet::load_from(temp_dir.path(), &sources).unwrap();
        assert!(rules.is_empty());
    }

    #[test]
    fn test_unreadable_local_file_is_config_error() {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir(temp_dir.path().join(LOCAL_IGNORE_FILE)).unwrap();

        let sources = RuleSources::local_only(temp_dir.path());
        let err = IgnoreRuleSet::load_from(temp_dir.path(), &sources).unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn test_ignored_parent_hides_children() {
        let (_dir, rules) = local_rules("deps/\n!deps/keep.js\n");

        assert!(rules.is_ignored("deps", true));
        assert!(rules.is_ignored("deps/keep.js", false));
    }

    #[test]
    fn test_excludes_file_from_gitconfig() {
        let config = "[user]\n\tname = someone\n[core]\n\teditor = vim\n\texcludesFile = \"/opt/ignore\"\n";
        assert_eq!(
            excludes_file_from_gitconfig(config),
            Some(PathBuf::from("/opt/ignore"))
        );
        assert_eq!(excludes_file_from_gitconfig("[core]\n\tbare = false\n"), None);
        assert_eq!(
            excludes_file_from_gitconfig("[alias]\n\texcludesfile = /nope\n"),
            None
        );
    }
}
