//! Summary artifacts produced at each reduction tier

use crate::types::CommitRecord;
use std::fmt;

/// Reduction tier an artifact belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tier {
    Chunk,
    Commit,
    Daily,
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Tier::Chunk => "chunk",
            Tier::Commit => "commit",
            Tier::Daily => "daily",
        };
        f.write_str(name)
    }
}

/// Why a tier fell back instead of using a model completion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Degraded {
    pub reason: String,
}

impl Degraded {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl fmt::Display for Degraded {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.reason)
    }
}

/// Outcome of one tier's model call
pub type TierResult = Result<String, Degraded>;

/// Tier-tagged summary text with enough provenance to rebuild context
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryArtifact {
    pub tier: Tier,
    pub text: String,
    /// Commit the artifact summarizes; `None` for the daily report
    pub commit_id: Option<String>,
    /// 1-based chunk position; only set on chunk artifacts
    pub chunk_index: Option<usize>,
    /// Number of chunks the commit was split into
    pub chunk_total: Option<usize>,
    /// Set when the text is a fallback rather than a model completion
    pub degraded: Option<String>,
}

impl SummaryArtifact {
    pub fn chunk(commit_id: &str, index: usize, total: usize, result: TierResult) -> Self {
        let (text, degraded) = match result {
            Ok(text) => (text, None),
            Err(d) => (chunk_failure_marker(index, total, &d.reason), Some(d.reason)),
        };
        Self {
            tier: Tier::Chunk,
            text,
            commit_id: Some(commit_id.to_string()),
            chunk_index: Some(index),
            chunk_total: Some(total),
            degraded,
        }
    }

    pub fn commit(
        commit_id: &str,
        chunk_total: usize,
        text: String,
        degraded: Option<String>,
    ) -> Self {
        Self {
            tier: Tier::Commit,
            text,
            commit_id: Some(commit_id.to_string()),
            chunk_index: None,
            chunk_total: Some(chunk_total),
            degraded,
        }
    }

    pub fn daily(text: String, degraded: Option<String>) -> Self {
        Self {
            tier: Tier::Daily,
            text,
            commit_id: None,
            chunk_index: None,
            chunk_total: None,
            degraded,
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.degraded.is_some()
    }
}

/// A commit paired with its final (merged or fallback) summary
#[derive(Debug, Clone)]
pub struct CommitSummary {
    pub record: CommitRecord,
    pub summary: SummaryArtifact,
}

/// Placeholder recorded in place of a failed chunk summary
pub fn chunk_failure_marker(index: usize, total: usize, reason: &str) -> String {
    format!("[chunk {}/{} failed: {}]", index, total, reason)
}
