//! Integration tests for the selection walk.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use pretty_assertions::assert_eq;
use sink_selection::{
    FileRecord, IgnoreRuleSet, RuleSources, SelectionConfig, SelectionError, SelectionPolicy,
    Traverser,
};
use tempfile::TempDir;

fn write(root: &Path, relative: &str, content: impl AsRef<[u8]>) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

/// Run a walk with only the root's own `.gitignore`, so the host's global
/// ignore file cannot influence results.
fn select(root: &Path, config: SelectionConfig) -> Result<Vec<FileRecord>, SelectionError> {
    let rules = IgnoreRuleSet::load_from(root, &RuleSources::local_only(root))?;
    let policy = SelectionPolicy::with_rules(root, config, rules);
    Traverser::new(Arc::new(policy)).process()
}

fn paths(records: &[FileRecord]) -> Vec<PathBuf> {
    records.iter().map(|r| r.path.clone()).collect()
}

#[test]
fn test_filter_with_ignored_dependencies() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    write(root, "a.go", "package main\n");
    write(root, "b.txt", "notes\n");
    write(root, ".git/config", "[core]\n");
    write(root, "deps/x.js", "module.exports = {}\n");
    write(root, ".gitignore", "deps/\n");

    let records = select(root, SelectionConfig::new().filter("*.go")).unwrap();

    assert_eq!(paths(&records), vec![PathBuf::from("a.go")]);
    assert_eq!(records[0].language, "go");
    assert_eq!(records[0].text(), "package main\n");
}

#[test]
fn test_lexical_order_is_deterministic() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    write(root, "c.rs", "");
    write(root, "b.rs", "");
    write(root, "a/z.rs", "");
    write(root, "a/b.rs", "");

    let first = paths(&select(root, SelectionConfig::new()).unwrap());
    let second = paths(&select(root, SelectionConfig::new()).unwrap());

    assert_eq!(
        first,
        vec![
            PathBuf::from("a/b.rs"),
            PathBuf::from("a/z.rs"),
            PathBuf::from("b.rs"),
            PathBuf::from("c.rs"),
        ]
    );
    assert_eq!(first, second);
}

#[test]
fn test_excluded_directories_are_pruned() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    write(root, "src/lib.rs", "pub fn lib() {}\n");
    write(root, "build/gen.rs", "// generated\n");
    write(root, "build/deep/more.rs", "// generated\n");

    let config = SelectionConfig::new().filter("*.rs").exclude("build");
    let records = select(root, config).unwrap();

    assert_eq!(paths(&records), vec![PathBuf::from("src/lib.rs")]);
}

#[test]
fn test_exclude_applies_after_filter() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    write(root, "main.go", "");
    write(root, "main_test.go", "");
    write(root, "README.md", "");

    let config = SelectionConfig::new().filter("*.go").exclude("*_test.go");
    let records = select(root, config).unwrap();

    assert_eq!(paths(&records), vec![PathBuf::from("main.go")]);
}

#[test]
fn test_no_filters_selects_all_text_files() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    write(root, "notes.txt", "hello\n");
    write(root, "logo.png", [0x89, b'P', b'N', b'G', 0x00, 0x1a]);
    write(root, ".gitignore", "*.log\n");
    write(root, "debug.log", "trace\n");

    let records = select(root, SelectionConfig::new()).unwrap();

    assert_eq!(
        paths(&records),
        vec![PathBuf::from(".gitignore"), PathBuf::from("notes.txt")]
    );
}

#[test]
fn test_binary_files_are_rejected_even_when_filtered_in() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    let mut content = b"package main".to_vec();
    content.push(0);
    write(root, "weird.go", content);
    write(root, "ok.go", "package main\n");

    let records = select(root, SelectionConfig::new().filter("*.go")).unwrap();

    assert_eq!(paths(&records), vec![PathBuf::from("ok.go")]);
}

#[test]
fn test_records_carry_metadata() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    write(root, "views/page.tpl", "{{ title }}");

    let config = SelectionConfig::new().with_syntax("tpl", "handlebars");
    let records = select(root, config).unwrap();

    let record = &records[0];
    assert_eq!(record.absolute_path, root.join("views/page.tpl"));
    assert_eq!(record.extension.as_deref(), Some("tpl"));
    assert_eq!(record.language, "handlebars");
    assert_eq!(record.size, 11);
}

#[test]
fn test_missing_root_is_traversal_error() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path().join("does-not-exist");

    let err = select(&root, SelectionConfig::new()).unwrap_err();
    assert!(matches!(err, SelectionError::Traversal { .. }));
}

#[cfg(unix)]
#[test]
fn test_symlinked_files_are_followed() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    write(root, "real.md", "# real\n");
    std::os::unix::fs::symlink(root.join("real.md"), root.join("alias.md")).unwrap();

    let records = select(root, SelectionConfig::new()).unwrap();

    assert_eq!(
        paths(&records),
        vec![PathBuf::from("alias.md"), PathBuf::from("real.md")]
    );
    assert_eq!(records[0].text(), "# real\n");
}

#[cfg(unix)]
#[test]
fn test_dangling_symlink_aborts_the_walk() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    write(root, "a.md", "# accepted first\n");
    std::os::unix::fs::symlink(root.join("missing.md"), root.join("b.md")).unwrap();
    write(root, "c.md", "# never reached\n");

    let err = select(root, SelectionConfig::new()).unwrap_err();

    assert!(matches!(err, SelectionError::Traversal { .. }));
}
