//! One-shot selection walk.

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use tracing::{info, trace};
use walkdir::WalkDir;

use crate::config::SelectionConfig;
use crate::error::{Result, SelectionError};
use crate::policy::SelectionPolicy;
use crate::record::FileRecord;

/// Walks a root directory and collects the files the policy accepts.
pub struct Traverser {
    policy: Arc<SelectionPolicy>,
}

impl Traverser {
    /// Create a traverser for the policy's root directory.
    pub fn new(policy: Arc<SelectionPolicy>) -> Self {
        Self { policy }
    }

    /// The policy in use.
    pub fn policy(&self) -> &SelectionPolicy {
        &self.policy
    }

    /// Walk the tree in lexical order and read every accepted file.
    ///
    /// Ignored and excluded directories are pruned without descending. Any
    /// read error aborts the walk; no partial result is returned.
    pub fn process(&self) -> Result<Vec<FileRecord>> {
        let start = Instant::now();
        let policy = self.policy.as_ref();
        let mut records = Vec::new();
        let mut skipped = 0usize;

        let walker = WalkDir::new(policy.root())
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| {
                if entry.depth() == 0 || !entry.file_type().is_dir() {
                    return true;
                }
                let Some(relative) = policy.relative(entry.path()) else {
                    return false;
                };
                let verdict = policy.directory_verdict(relative);
                if !verdict.is_accepted() {
                    trace!("Pruning {}: {verdict}", relative.display());
                }
                verdict.is_accepted()
            });

        for entry in walker {
            let entry = entry?;
            let absolute = entry.path();

            if !is_regular_file(&entry)? {
                continue;
            }
            let Some(relative) = policy.relative(absolute) else {
                continue;
            };

            let verdict = policy
                .file_verdict(relative, absolute)
                .map_err(|err| SelectionError::traversal(absolute, err))?;
            if !verdict.is_accepted() {
                trace!("Skipping {}: {verdict}", relative.display());
                skipped += 1;
                continue;
            }

            records.push(FileRecord::read(absolute, relative, policy.languages())?);
        }

        info!(
            "Selected {} files under {} in {:?} ({skipped} skipped)",
            records.len(),
            policy.root().display(),
            start.elapsed(),
        );

        Ok(records)
    }
}

/// Load the policy for `root` and run a single selection walk.
pub fn select_files(root: &Path, config: SelectionConfig) -> Result<Vec<FileRecord>> {
    let policy = SelectionPolicy::load(root, config)?;
    Traverser::new(Arc::new(policy)).process()
}

/// Regular files and symlinks resolving to regular files.
fn is_regular_file(entry: &walkdir::DirEntry) -> Result<bool> {
    let file_type = entry.file_type();
    if file_type.is_file() {
        return Ok(true);
    }
    if file_type.is_symlink() {
        let metadata =
            fs::metadata(entry.path()).map_err(|err| SelectionError::traversal(entry.path(), err))?;
        return Ok(metadata.is_file());
    }
    Ok(false)
}
