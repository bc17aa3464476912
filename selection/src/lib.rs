//! # Selection
//!
//! This crate decides which files under a root directory are selected.
//!
//! ## Features
//!
//! - **Glob Patterns**: Filter and exclude globs with `**` support
//! - **Ignore Rules**: System, global and local gitignore scopes
//! - **Binary Detection**: NUL-byte sniffing over a bounded prefix
//! - **Deterministic Walks**: Lexical order with subtree pruning
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        Selection                                │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  SelectionConfig ──► SelectionPolicy ──► Traverser ──► FileRecord│
//! │                          │                                      │
//! │                          ▼                                      │
//! │              IgnoreRuleSet + PatternSet                         │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod binary;
pub mod config;
pub mod error;
pub mod ignore_rules;
pub mod language;
pub mod pattern;
pub mod policy;
pub mod record;
pub mod traverser;

pub use binary::{is_binary_content, is_binary_file};
pub use config::{CONFIG_FILE_NAME, SelectionConfig};
pub use error::{Result, SelectionError};
pub use ignore_rules::{IgnoreRule, IgnoreRuleSet, METADATA_DIR, RuleOrigin, RuleSources};
pub use language::LanguageMap;
pub use pattern::{PatternSet, PatternSpec, matches_any};
pub use policy::{SelectionPolicy, Verdict};
pub use record::FileRecord;
pub use traverser::{Traverser, select_files};
