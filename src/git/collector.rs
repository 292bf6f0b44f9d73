use super::RevisionSource;
use crate::types::CommitRecord;
use crate::window::ReportWindow;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::Arc;

/// Title used when a commit's metadata could not be read
pub const UNKNOWN_TITLE: &str = "(metadata unavailable)";

/// Result of one collection pass over the tracked branches
#[derive(Debug, Clone, Default)]
pub struct Collection {
    /// Branch -> commit ids in the window, oldest first, capped
    pub per_branch: BTreeMap<String, Vec<String>>,
    /// Commit id -> every branch it was attributed to
    pub attribution: HashMap<String, BTreeSet<String>>,
    /// Attributed commit ids in global chronological order, no repeats
    pub ordered_ids: Vec<String>,
}

impl Collection {
    /// Combine a global scan with per-branch listings
    ///
    /// Ids missing from every per-branch list are dropped, repeats are
    /// dropped, and first-seen order of the global scan is kept.
    pub fn from_scans(global: Vec<String>, per_branch: BTreeMap<String, Vec<String>>) -> Self {
        let mut attribution: HashMap<String, BTreeSet<String>> = HashMap::new();
        for (branch, ids) in &per_branch {
            for id in ids {
                attribution
                    .entry(id.clone())
                    .or_default()
                    .insert(branch.clone());
            }
        }

        let mut seen = HashSet::new();
        let ordered_ids = global
            .into_iter()
            .filter(|id| attribution.contains_key(id))
            .filter(|id| seen.insert(id.clone()))
            .collect();

        Self {
            per_branch,
            attribution,
            ordered_ids,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.ordered_ids.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ordered_ids.len()
    }

    pub fn branches_of(&self, id: &str) -> Option<&BTreeSet<String>> {
        self.attribution.get(id)
    }
}

/// Keep the newest `max` entries of an oldest-first list
fn keep_most_recent(mut ids: Vec<String>, max: usize) -> Vec<String> {
    if ids.len() > max {
        ids.drain(..ids.len() - max);
    }
    ids
}

/// Discovers the commits to report on and which branches carry them
///
/// Listing failures degrade to empty results so one broken branch never
/// blocks the others.
#[derive(Clone)]
pub struct CommitCollector {
    source: Arc<dyn RevisionSource>,
    max_commits_per_branch: usize,
    exclude_merges: bool,
}

impl CommitCollector {
    pub fn new(
        source: Arc<dyn RevisionSource>,
        max_commits_per_branch: usize,
        exclude_merges: bool,
    ) -> Self {
        Self {
            source,
            max_commits_per_branch,
            exclude_merges,
        }
    }

    /// Enumerate branches, scan the window, and attribute commits
    pub fn collect(&self, window: &ReportWindow) -> Collection {
        let branches = match self.source.list_remote_branches() {
            Ok(branches) => branches,
            Err(e) => {
                tracing::warn!("Failed to list remote branches, treating as none: {:#}", e);
                Vec::new()
            }
        };
        tracing::info!("Tracking {} remote branches", branches.len());

        if branches.is_empty() {
            return Collection::default();
        }

        let mut per_branch = BTreeMap::new();
        for branch in &branches {
            let ids = match self.source.list_commit_ids(
                std::slice::from_ref(branch),
                window,
                self.exclude_merges,
            ) {
                Ok(ids) => ids,
                Err(e) => {
                    tracing::warn!("Failed to list commits on {}: {:#}", branch, e);
                    Vec::new()
                }
            };

            let found = ids.len();
            let ids = keep_most_recent(ids, self.max_commits_per_branch);
            if ids.len() < found {
                tracing::warn!(
                    "Branch {} has {} commits in window, keeping the latest {}",
                    branch,
                    found,
                    ids.len()
                );
            }
            tracing::debug!("Branch {}: {} commits", branch, ids.len());
            per_branch.insert(branch.clone(), ids);
        }

        // One pass over every tip gives a stable cross-branch chronology
        let global = match self
            .source
            .list_commit_ids(&branches, window, self.exclude_merges)
        {
            Ok(ids) => ids,
            Err(e) => {
                tracing::warn!("Global commit scan failed: {:#}", e);
                Vec::new()
            }
        };

        let collection = Collection::from_scans(global, per_branch);
        tracing::info!(
            "Collected {} commits across {} branches",
            collection.len(),
            branches.len()
        );
        collection
    }

    /// Build display records for every collected commit, in collection order
    pub fn records(&self, collection: &Collection, web_url: Option<&str>) -> Vec<CommitRecord> {
        collection
            .ordered_ids
            .iter()
            .filter_map(|id| {
                let branches = collection.branches_of(id)?.clone();
                let (title, author) = match self.source.commit_metadata(id) {
                    Ok(meta) => (meta.title, meta.author),
                    Err(e) => {
                        tracing::warn!("Failed to read metadata for {}: {:#}", id, e);
                        (UNKNOWN_TITLE.to_string(), "unknown".to_string())
                    }
                };
                CommitRecord::new(id.clone(), title, author, web_url, branches)
            })
            .collect()
    }
}
