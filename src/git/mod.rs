//! Git access for changelog collection
//!
//! [`RevisionSource`] is the seam between the pipeline and version control.
//! [`GitRepository`] implements it with `git2`; tests substitute in-memory
//! fakes.

/// Commit discovery and branch attribution
pub mod collector;
/// Per-commit diff retrieval with degrade-to-empty semantics
pub mod diff;
/// `git2`-backed revision source
pub mod repository;

pub use collector::{Collection, CommitCollector};
pub use diff::DiffFetcher;
pub use repository::GitRepository;

use crate::glob_utils::PathExcluder;
use crate::window::ReportWindow;
use anyhow::Result;

/// Subject line and author of a commit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitMetadata {
    pub title: String,
    pub author: String,
}

/// Read-only view of a repository's history
///
/// Implementations are blocking; the pipeline calls them from
/// `tokio::task::spawn_blocking`.
pub trait RevisionSource: Send + Sync {
    /// Remote-tracking branch names, symbolic aliases (e.g. `origin/HEAD`) excluded
    fn list_remote_branches(&self) -> Result<Vec<String>>;

    /// Ids of commits reachable from any of `refs` and inside `window`, oldest first
    fn list_commit_ids(
        &self,
        refs: &[String],
        window: &ReportWindow,
        exclude_merges: bool,
    ) -> Result<Vec<String>>;

    fn commit_metadata(&self, id: &str) -> Result<CommitMetadata>;

    /// First parent, or `None` for a root commit
    fn parent_id(&self, id: &str) -> Result<Option<String>>;

    /// Zero-context unified diff from `base` (empty tree when `None`) to `id`
    fn diff(&self, base: Option<&str>, id: &str, excludes: &PathExcluder) -> Result<String>;
}
