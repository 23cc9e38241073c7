//! Directory entry exclusion.
//!
//! Each directory may contain an ignore file (`.mdignore` by default) with one
//! glob pattern per line. Rules apply to entry names in that directory only.

use std::fs;
use std::path::Path;

use globset::{Glob, GlobSet, GlobSetBuilder};
use tracing::warn;

/// Matcher configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatcherOptions {
    /// Name of the per-directory ignore file
    pub source: String,
    /// Required extension for files, without the dot
    pub extension: Option<String>,
}

impl Default for MatcherOptions {
    fn default() -> Self {
        Self {
            source: ".mdignore".to_string(),
            extension: Some("md".to_string()),
        }
    }
}

/// Decides which entries of one directory are skipped.
#[derive(Debug)]
pub struct Matcher {
    extension: Option<String>,
    rules: GlobSet,
}

impl Matcher {
    /// Build a matcher for `dir`, reading its ignore file if present.
    ///
    /// Unreadable ignore files and invalid patterns are logged and skipped.
    #[must_use]
    pub fn new(options: &MatcherOptions, dir: &Path) -> Self {
        let mut builder = GlobSetBuilder::new();

        let source = dir.join(&options.source);
        if let Ok(content) = fs::read_to_string(&source) {
            for line in content.lines().map(str::trim) {
                if line.is_empty() || line.starts_with('#') {
                    continue;
                }
                match Glob::new(line) {
                    Ok(glob) => {
                        builder.add(glob);
                    }
                    Err(e) => warn!(path = %source.display(), pattern = line, error = %e, "Skipping invalid ignore pattern"),
                }
            }
        }

        let rules = builder.build().unwrap_or_else(|e| {
            warn!(path = %source.display(), error = %e, "Failed to compile ignore patterns");
            GlobSet::empty()
        });

        Self {
            extension: options.extension.clone(),
            rules,
        }
    }

    /// Whether an entry is skipped.
    ///
    /// Hidden entries are always skipped; files must carry the configured
    /// extension; any ignore rule matching the name excludes the entry.
    #[must_use]
    pub fn is_excluded(&self, name: &str, is_dir: bool) -> bool {
        if name.starts_with('.') {
            return true;
        }

        if !is_dir {
            if let Some(extension) = &self.extension {
                let matches = Path::new(name)
                    .extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(|e| e == extension);
                if !matches {
                    return true;
                }
            }
        }

        self.rules.is_match(name)
    }
}
