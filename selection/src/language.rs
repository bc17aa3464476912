//! Language tags for selected files.

use std::collections::HashMap;
use std::path::Path;

/// Tag used when no mapping applies.
pub const UNKNOWN_LANGUAGE: &str = "unknown";

/// Maps file extensions to language tags.
///
/// User mappings take precedence over the built-in table. Keys may be given
/// with or without the leading dot.
#[derive(Debug, Clone, Default)]
pub struct LanguageMap {
    overrides: HashMap<String, String>,
}

impl LanguageMap {
    /// Create a map with user overrides.
    pub fn new(overrides: &HashMap<String, String>) -> Self {
        let overrides = overrides
            .iter()
            .map(|(ext, lang)| (ext.trim_start_matches('.').to_lowercase(), lang.clone()))
            .collect();
        Self { overrides }
    }

    /// Detect the language tag for `path`.
    pub fn detect(&self, path: &Path) -> String {
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            return UNKNOWN_LANGUAGE.to_string();
        };
        let ext = ext.to_lowercase();

        if let Some(lang) = self.overrides.get(&ext) {
            return lang.clone();
        }

        builtin_language(&ext).to_string()
    }
}

fn builtin_language(ext: &str) -> &'static str {
    match ext {
        "go" => "go",
        "py" => "python",
        "js" | "mjs" | "cjs" => "javascript",
        "ts" | "tsx" => "typescript",
        "rs" => "rust",
        "java" => "java",
        "c" | "h" => "c",
        "cpp" | "hpp" | "cc" | "hh" | "cxx" => "cpp",
        "cs" => "csharp",
        "rb" => "ruby",
        "swift" => "swift",
        "kt" | "kts" => "kotlin",
        "sh" | "bash" => "bash",
        "md" | "markdown" => "markdown",
        "json" => "json",
        "yaml" | "yml" => "yaml",
        "toml" => "toml",
        "html" | "htm" => "html",
        "css" => "css",
        "sql" => "sql",
        _ => UNKNOWN_LANGUAGE,
    }
}
