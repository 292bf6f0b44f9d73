//! Prompt templates for the three reduction tiers
//!
//! Plain string builders with no I/O. The metadata fields each prompt shows
//! and the section headings it requests are part of the report contract.

use crate::summary::{CommitSummary, SummaryArtifact};
use crate::types::CommitRecord;

/// Sections requested from every chunk summary
pub const CHUNK_SECTIONS: [&str; 4] = [
    "Change points",
    "Affected scope",
    "Risk",
    "Test suggestions",
];

/// Sections requested from the merged commit summary
pub const COMMIT_SECTIONS: [&str; 5] = [
    "Overview",
    "Scope",
    "Risk and rollback",
    "Tests",
    "User-visible impact",
];

/// Sections requested from the daily report
pub const DAILY_SECTIONS: [&str; 5] = [
    "Overview",
    "Key changes by branch",
    "Cross-branch and cherry-pick risks",
    "Test checklist",
    "Other notes",
];

fn section_list(sections: &[&str]) -> String {
    sections
        .iter()
        .map(|s| format!("## {}", s))
        .collect::<Vec<_>>()
        .join("\n")
}

fn commit_header(commit: &CommitRecord) -> String {
    format!(
        "Commit: {} {}\nAuthor: {}\nBranches: {}\nLink: {}",
        commit.short_id(),
        commit.title(),
        commit.author(),
        commit.branch_list(),
        commit.url()
    )
}

/// Label used for a chunk summary inside commit-level text
pub fn chunk_label(index: usize, total: usize) -> String {
    format!("### Chunk {}/{}", index, total)
}

/// Chunk summaries joined with their position labels, in chunk order
pub fn labeled_chunks(chunks: &[SummaryArtifact]) -> String {
    let total = chunks.len();
    chunks
        .iter()
        .enumerate()
        .map(|(i, chunk)| {
            let index = chunk.chunk_index.unwrap_or(i + 1);
            let total = chunk.chunk_total.unwrap_or(total);
            format!("{}\n{}", chunk_label(index, total), chunk.text.trim_end())
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Prompt for one diff chunk of a commit
pub fn chunk_prompt(commit: &CommitRecord, index: usize, total: usize, chunk: &str) -> String {
    format!(
        "You are reviewing part of a git commit. Summarize only what this diff chunk shows \
and do not speculate about code outside it.\n\n\
{header}\nChunk: {index}/{total}\n\n\
Answer in Markdown using exactly these sections:\n{sections}\n\n\
Diff chunk:\n```diff\n{chunk}\n```\n",
        header = commit_header(commit),
        index = index,
        total = total,
        sections = section_list(&CHUNK_SECTIONS),
        chunk = chunk.trim_end(),
    )
}

/// Prompt merging a commit's chunk summaries into one commit summary
pub fn commit_prompt(commit: &CommitRecord, chunks: &[SummaryArtifact]) -> String {
    let failed = chunks.iter().filter(|c| c.is_degraded()).count();
    let completeness = if failed > 0 {
        format!(
            "\nWarning: {} of {} chunks could not be summarized. Say explicitly that this \
summary may be incomplete.\n",
            failed,
            chunks.len()
        )
    } else {
        String::new()
    };

    format!(
        "Merge the chunk summaries below into a single summary of the whole commit. \
Remove repetition and keep concrete file and behavior details.\n\n\
{header}\nChunks: {total}\n{completeness}\n\
Answer in Markdown using exactly these sections:\n{sections}\n\n\
Chunk summaries:\n\n{body}\n",
        header = commit_header(commit),
        total = chunks.len(),
        completeness = completeness,
        sections = section_list(&COMMIT_SECTIONS),
        body = labeled_chunks(chunks),
    )
}

/// Marker shown beside a commit whose chunk summaries could not be merged
pub fn merge_failure_note(reason: &str) -> String {
    format!("Note: commit-level merge failed: {}", reason)
}

/// One commit as listed in the daily prompt and the daily fallback
pub fn commit_entry(position: usize, entry: &CommitSummary) -> String {
    let mut text = format!(
        "### {}. {} {}\nAuthor: {}\nBranches: {}\nLink: {}\n",
        position,
        entry.record.short_id(),
        entry.record.title(),
        entry.record.author(),
        entry.record.branch_list(),
        entry.record.url()
    );
    if let Some(reason) = &entry.summary.degraded {
        text.push_str(&merge_failure_note(reason));
        text.push('\n');
    }
    text.push_str("Summary:\n");
    text.push_str(entry.summary.text.trim_end());
    text
}

/// Prompt aggregating every commit summary of the day
pub fn daily_prompt(date: &str, commits: &[CommitSummary]) -> String {
    let entries = commits
        .iter()
        .enumerate()
        .map(|(i, entry)| commit_entry(i + 1, entry))
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        "Write the daily changelog for {date} from the commit summaries below. Commits are \
listed in chronological order; keep that order when it matters for risk or rollback. \
Call out commits that appear on several branches, since they may be cherry-picks.\n\n\
Commits: {count}\n\n\
Answer in Markdown using exactly these sections:\n{sections}\n\n\
{entries}\n",
        date = date,
        count = commits.len(),
        sections = section_list(&DAILY_SECTIONS),
        entries = entries,
    )
}
