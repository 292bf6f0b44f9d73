//! End-to-end run: collect -> diff -> chunk -> reduce -> deliver

use crate::chunker::DiffChunker;
use crate::config::Config;
use crate::dispatch::{ReportDispatcher, StdoutDispatcher};
use crate::error::ChangelogError;
use crate::git::{CommitCollector, DiffFetcher, RevisionSource};
use crate::llm::CompletionProvider;
use crate::reducer::Reducer;
use crate::summary::{CommitSummary, SummaryArtifact};
use crate::window::{ReportTimezone, ReportWindow};
use std::sync::Arc;
use std::time::Instant;

/// Counters gathered over one run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunStats {
    /// Remote branches that contributed at least one commit
    pub branches: usize,
    /// Commits summarized
    pub commits: usize,
    /// Diff chunks sent to the chunk tier
    pub chunks: usize,
    /// Commits whose filtered diff was empty
    pub empty_diffs: usize,
    /// Completion requests issued across all tiers
    pub completion_calls: usize,
    /// Artifacts that used a fallback instead of a completion
    pub degraded: usize,
    pub duration_ms: u64,
}

/// How a run ended
#[derive(Debug, Clone)]
pub enum RunOutcome {
    /// Nothing was committed in the window; no model calls, nothing delivered
    NoCommits,
    /// A report was produced
    Reported {
        report: SummaryArtifact,
        /// Per-commit summaries in chronological order
        commits: Vec<CommitSummary>,
        /// Whether the dispatcher accepted the report
        delivered: bool,
        stats: RunStats,
    },
}

impl RunOutcome {
    pub fn report_text(&self) -> Option<&str> {
        match self {
            RunOutcome::NoCommits => None,
            RunOutcome::Reported { report, .. } => Some(&report.text),
        }
    }
}

/// Wires the collaborators together for a run
pub struct ChangelogPipeline {
    collector: CommitCollector,
    fetcher: DiffFetcher,
    chunker: DiffChunker,
    reducer: Reducer,
    dispatcher: Arc<dyn ReportDispatcher>,
    timezone: ReportTimezone,
    web_url: Option<String>,
}

impl ChangelogPipeline {
    /// Build a pipeline from validated configuration
    pub fn new(
        config: &Config,
        source: Arc<dyn RevisionSource>,
        provider: Arc<dyn CompletionProvider>,
        dispatcher: Arc<dyn ReportDispatcher>,
    ) -> Result<Self, ChangelogError> {
        let collector = CommitCollector::new(
            source.clone(),
            config.collect.max_commits_per_branch,
            config.collect.exclude_merges,
        );
        let fetcher = DiffFetcher::new(source, config.excluder()?);

        Ok(Self {
            collector,
            fetcher,
            chunker: DiffChunker::new(config.chunking.max_chunk_chars),
            reducer: Reducer::new(provider),
            dispatcher,
            timezone: config.timezone()?,
            web_url: None,
        })
    }

    /// Base URL commit links are built from
    pub fn with_web_url(mut self, web_url: Option<String>) -> Self {
        self.web_url = web_url;
        self
    }

    /// Report on today, in the configured time zone
    pub async fn run(&self) -> Result<RunOutcome, ChangelogError> {
        self.run_window(ReportWindow::today(self.timezone)).await
    }

    /// Report on an explicit window
    pub async fn run_window(&self, window: ReportWindow) -> Result<RunOutcome, ChangelogError> {
        let started = Instant::now();
        tracing::info!(
            "Collecting commits for {} ({} .. {})",
            window.date_label(),
            window.since.to_rfc3339(),
            window.until.to_rfc3339()
        );

        let collector = self.collector.clone();
        let web_url = self.web_url.clone();
        let (collection, records) = tokio::task::spawn_blocking(move || {
            let collection = collector.collect(&window);
            let records = collector.records(&collection, web_url.as_deref());
            (collection, records)
        })
        .await
        .map_err(|e| ChangelogError::other(format!("commit collection task failed: {}", e)))?;

        if records.is_empty() {
            tracing::info!("No commits in window, nothing to report");
            return Ok(RunOutcome::NoCommits);
        }

        let mut stats = RunStats {
            branches: collection
                .per_branch
                .values()
                .filter(|ids| !ids.is_empty())
                .count(),
            commits: records.len(),
            ..Default::default()
        };
        tracing::info!(
            "Summarizing {} commits from {} branches with {}",
            stats.commits,
            stats.branches,
            self.reducer.model_name()
        );

        let mut commits = Vec::with_capacity(records.len());
        for (position, record) in records.into_iter().enumerate() {
            let fetcher = self.fetcher.clone();
            let id = record.id().to_string();
            let diff = tokio::task::spawn_blocking(move || fetcher.fetch(&id))
                .await
                .map_err(|e| ChangelogError::other(format!("diff task failed: {}", e)))?;

            let chunks = self.chunker.chunk(&diff);
            tracing::debug!(
                "[{}/{}] {} {}: {} chars in {} chunks",
                position + 1,
                stats.commits,
                record.short_id(),
                record.title(),
                diff.chars().count(),
                chunks.len()
            );

            let reduction = self.reducer.summarize_commit(&record, &chunks).await;
            stats.chunks += chunks.len();
            stats.empty_diffs += usize::from(chunks.is_empty());
            stats.completion_calls += reduction.completion_calls();
            stats.degraded += reduction.degraded_count();

            commits.push(CommitSummary {
                record,
                summary: reduction.summary,
            });
        }

        let report = self
            .reducer
            .summarize_day(&window.date_label(), &commits)
            .await;
        stats.completion_calls += 1;
        stats.degraded += usize::from(report.is_degraded());

        let delivered = self.deliver(&report.text).await;
        stats.duration_ms = started.elapsed().as_millis() as u64;

        tracing::info!(
            "Run finished in {} ms: {} commits, {} chunks, {} completion calls, {} degraded, delivered: {}",
            stats.duration_ms,
            stats.commits,
            stats.chunks,
            stats.completion_calls,
            stats.degraded,
            delivered
        );

        Ok(RunOutcome::Reported {
            report,
            commits,
            delivered,
            stats,
        })
    }

    /// Deliver the report; on failure print it to stdout so it is not lost
    async fn deliver(&self, report: &str) -> bool {
        match self.dispatcher.deliver(report).await {
            Ok(()) => {
                tracing::info!("Report delivered via {}", self.dispatcher.name());
                true
            }
            Err(e) => {
                tracing::error!(
                    "Failed to deliver report via {}: {}",
                    self.dispatcher.name(),
                    e
                );
                if let Err(e) = StdoutDispatcher.deliver(report).await {
                    tracing::error!("Failed to print report: {}", e);
                }
                false
            }
        }
    }
}
