//! # daily-changelog
//!
//! Builds a daily changelog for a git repository. Every commit made today on
//! any remote-tracking branch is diffed against its first parent, the diff is
//! cut into size-bounded chunks, and a language model reduces it in three
//! tiers: chunk summaries, one summary per commit, and one report for the day.
//! The report is posted to a chat webhook.
//!
//! ## Architecture
//!
//! ```text
//! RevisionSource (git2)
//!        |
//! CommitCollector --> CommitRecord[] (chronological, branch-attributed)
//!        |
//! DiffFetcher --> DiffChunker --> Reducer (CompletionProvider)
//!                                    |  chunk -> commit -> daily
//!                                    v
//!                             ReportDispatcher (webhook | stdout)
//! ```
//!
//! Failures below configuration never abort a run. Each stage falls back to
//! a degraded result and leaves a visible marker in the report.
//!
//! ## Usage Example
//!
//! ```no_run
//! use daily_changelog::config::Config;
//! use daily_changelog::dispatch::StdoutDispatcher;
//! use daily_changelog::git::GitRepository;
//! use daily_changelog::llm::OpenAiCompatClient;
//! use daily_changelog::pipeline::ChangelogPipeline;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load(None)?;
//!     config.validate()?;
//!     let credentials = config.resolve_credentials()?;
//!     let repo = GitRepository::discover(".", "origin")?;
//!     let provider = OpenAiCompatClient::new(&config.llm, credentials.api_key)?;
//!
//!     let pipeline = ChangelogPipeline::new(
//!         &config,
//!         Arc::new(repo),
//!         Arc::new(provider),
//!         Arc::new(StdoutDispatcher),
//!     )?;
//!     pipeline.run().await?;
//!     Ok(())
//! }
//! ```

/// Diff splitting and greedy chunk packing
pub mod chunker;

/// Command-line flags
pub mod cli;

/// Configuration management with environment variable overrides
pub mod config;

/// Report delivery to a webhook or stdout
pub mod dispatch;

/// Error types and utilities
pub mod error;

/// Commit collection and diff retrieval
pub mod git;

/// Glob-based path exclusion for diffs
pub mod glob_utils;

/// Completion provider trait and the OpenAI-compatible client
pub mod llm;

/// Platform config locations
pub mod paths;

/// Run orchestration
pub mod pipeline;

/// Prompt builders for every tier
pub mod prompt;

/// Three-tier summarization with fallbacks
pub mod reducer;

/// Tier-tagged summary artifacts
pub mod summary;

/// Commit records and link helpers
pub mod types;

/// Reporting window computation
pub mod window;
