//! Glob pattern matching for diff path exclusion

use crate::error::ConfigError;
use globset::{Glob, GlobSet, GlobSetBuilder};

/// Compiled set of path-exclusion globs applied by the diff fetcher
///
/// An empty excluder excludes nothing.
#[derive(Debug, Clone)]
pub struct PathExcluder {
    set: GlobSet,
}

impl PathExcluder {
    /// Compile exclusion patterns, failing on the first invalid glob
    pub fn new(patterns: &[String]) -> Result<Self, ConfigError> {
        let mut builder = GlobSetBuilder::new();
        for pattern in patterns {
            let glob = Glob::new(pattern).map_err(|e| ConfigError::InvalidValue {
                key: "diff.exclude_patterns".to_string(),
                reason: format!("invalid glob '{}': {}", pattern, e),
            })?;
            builder.add(glob);
        }

        let set = builder.build().map_err(|e| ConfigError::InvalidValue {
            key: "diff.exclude_patterns".to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self { set })
    }

    /// Excluder that lets every path through
    pub fn empty() -> Self {
        Self {
            set: GlobSet::empty(),
        }
    }

    /// Check if a repository-relative path is excluded
    ///
    /// Patterns are tried against the full path and against every path
    /// suffix, so `dist/**` also excludes `web/dist/app.js`.
    pub fn is_excluded(&self, path: &str) -> bool {
        if self.set.is_empty() {
            return false;
        }

        let path = path.trim_start_matches('/');
        if self.set.is_match(path) {
            return true;
        }

        let parts: Vec<&str> = path.split('/').collect();
        (1..parts.len()).any(|i| self.set.is_match(parts[i..].join("/")))
    }
}

impl Default for PathExcluder {
    fn default() -> Self {
        Self::empty()
    }
}
