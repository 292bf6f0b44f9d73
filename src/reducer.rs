//! Three-tier summarization: diff chunks -> commit -> day
//!
//! Every tier degrades instead of failing. A failed chunk becomes a marker,
//! a failed commit merge becomes the labeled chunk concatenation, and a failed
//! daily aggregation becomes the chronological list of commit summaries, so a
//! report is always produced.

use crate::llm::CompletionProvider;
use crate::prompt;
use crate::summary::{CommitSummary, Degraded, SummaryArtifact, Tier, TierResult};
use crate::types::CommitRecord;
use std::sync::Arc;

/// Summary given to commits whose filtered diff is empty
pub const NO_CHANGE_PLACEHOLDER: &str =
    "No substantive change (empty diff or all content filtered).";

/// Artifacts produced while reducing one commit
#[derive(Debug, Clone)]
pub struct CommitReduction {
    /// Chunk-tier artifacts in chunk order; empty for zero-diff commits
    pub chunks: Vec<SummaryArtifact>,
    /// Commit-tier artifact
    pub summary: SummaryArtifact,
}

impl CommitReduction {
    /// Completion calls spent on this commit
    pub fn completion_calls(&self) -> usize {
        if self.chunks.is_empty() {
            0
        } else {
            self.chunks.len() + 1
        }
    }

    /// Artifacts that fell back instead of using a completion
    pub fn degraded_count(&self) -> usize {
        self.chunks.iter().filter(|c| c.is_degraded()).count()
            + usize::from(self.summary.is_degraded())
    }
}

/// Drives the completion provider through the chunk, commit and daily tiers
#[derive(Clone)]
pub struct Reducer {
    provider: Arc<dyn CompletionProvider>,
}

impl Reducer {
    pub fn new(provider: Arc<dyn CompletionProvider>) -> Self {
        Self { provider }
    }

    pub fn model_name(&self) -> &str {
        self.provider.model_name()
    }

    async fn call(&self, tier: Tier, subject: &str, prompt: &str) -> TierResult {
        match self.provider.complete(prompt).await {
            Ok(text) => Ok(text),
            Err(e) => {
                tracing::warn!("{} summary for {} failed: {}", tier, subject, e);
                Err(Degraded::new(e.to_string()))
            }
        }
    }

    /// Summarize one chunk; failures become a `[chunk i/n failed: ...]` marker
    pub async fn summarize_chunk(
        &self,
        record: &CommitRecord,
        index: usize,
        total: usize,
        chunk: &str,
    ) -> SummaryArtifact {
        let subject = format!("{} chunk {}/{}", record.short_id(), index, total);
        tracing::debug!("Summarizing {} ({} chars)", subject, chunk.chars().count());

        let prompt = prompt::chunk_prompt(record, index, total, chunk);
        let result = self.call(Tier::Chunk, &subject, &prompt).await;
        SummaryArtifact::chunk(record.id(), index, total, result)
    }

    /// Reduce a commit's packed diff chunks to one commit summary
    ///
    /// With no chunks the placeholder is used and no completion is requested.
    pub async fn summarize_commit(
        &self,
        record: &CommitRecord,
        chunks: &[String],
    ) -> CommitReduction {
        if chunks.is_empty() {
            tracing::debug!("{} has no diff content, using placeholder", record.short_id());
            return CommitReduction {
                chunks: Vec::new(),
                summary: SummaryArtifact::commit(
                    record.id(),
                    0,
                    NO_CHANGE_PLACEHOLDER.to_string(),
                    None,
                ),
            };
        }

        let total = chunks.len();
        let mut chunk_summaries = Vec::with_capacity(total);
        for (i, chunk) in chunks.iter().enumerate() {
            chunk_summaries.push(self.summarize_chunk(record, i + 1, total, chunk).await);
        }

        let prompt = prompt::commit_prompt(record, &chunk_summaries);
        let summary = match self.call(Tier::Commit, record.short_id(), &prompt).await {
            Ok(text) => SummaryArtifact::commit(record.id(), total, text, None),
            Err(d) => SummaryArtifact::commit(
                record.id(),
                total,
                commit_fallback(&chunk_summaries),
                Some(d.reason),
            ),
        };

        CommitReduction {
            chunks: chunk_summaries,
            summary,
        }
    }

    /// Aggregate the day's commit summaries into the final report
    pub async fn summarize_day(&self, date: &str, commits: &[CommitSummary]) -> SummaryArtifact {
        tracing::debug!("Aggregating {} commit summaries for {}", commits.len(), date);

        let prompt = prompt::daily_prompt(date, commits);
        match self.call(Tier::Daily, date, &prompt).await {
            Ok(text) => SummaryArtifact::daily(text, None),
            Err(d) => {
                let text = daily_fallback(date, commits, &d.reason);
                SummaryArtifact::daily(text, Some(d.reason))
            }
        }
    }
}

/// Commit summary used when the merge call fails: chunk summaries in order,
/// each under its position label
pub fn commit_fallback(chunks: &[SummaryArtifact]) -> String {
    prompt::labeled_chunks(chunks)
}

/// Daily report used when aggregation fails
pub fn daily_fallback(date: &str, commits: &[CommitSummary], reason: &str) -> String {
    let mut report = format!(
        "# Changelog {}\n\nautomatic aggregation failed: {}\n\nCommit summaries in chronological order:",
        date, reason
    );
    for (i, entry) in commits.iter().enumerate() {
        report.push_str("\n\n");
        report.push_str(&prompt::commit_entry(i + 1, entry));
    }
    report.push('\n');
    report
}
