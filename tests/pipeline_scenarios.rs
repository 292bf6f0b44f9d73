mod common;

use common::{DAY_START, HOUR, RecordingDispatcher, ScriptedProvider, TestRepo, report_window};
use daily_changelog::chunker::DiffChunker;
use daily_changelog::config::Config;
use daily_changelog::error::CompletionError;
use daily_changelog::git::{DiffFetcher, GitRepository};
use daily_changelog::pipeline::{ChangelogPipeline, RunOutcome, RunStats};
use daily_changelog::reducer::NO_CHANGE_PLACEHOLDER;
use daily_changelog::summary::{CommitSummary, SummaryArtifact};
use std::sync::Arc;

struct Harness {
    repo: TestRepo,
    config: Config,
    provider: Arc<ScriptedProvider>,
    dispatcher: Arc<RecordingDispatcher>,
}

impl Harness {
    fn new(repo: TestRepo) -> Self {
        let mut config = Config::default();
        config.collect.timezone = "UTC".to_string();
        Self {
            repo,
            config,
            provider: Arc::new(ScriptedProvider::default()),
            dispatcher: Arc::new(RecordingDispatcher::default()),
        }
    }

    fn source(&self) -> Arc<GitRepository> {
        Arc::new(GitRepository::discover(self.repo.path(), "origin").unwrap())
    }

    async fn run(&self) -> RunOutcome {
        ChangelogPipeline::new(
            &self.config,
            self.source(),
            self.provider.clone(),
            self.dispatcher.clone(),
        )
        .unwrap()
        .with_web_url(Some("https://github.com/acme/app".to_string()))
        .run_window(report_window())
        .await
        .unwrap()
    }
}

fn reported(outcome: RunOutcome) -> (SummaryArtifact, Vec<CommitSummary>, bool, RunStats) {
    match outcome {
        RunOutcome::Reported {
            report,
            commits,
            delivered,
            stats,
        } => (report, commits, delivered, stats),
        RunOutcome::NoCommits => panic!("expected a report"),
    }
}

fn is_chunk_prompt(prompt: &str) -> bool {
    prompt.starts_with("You are reviewing part of a git commit")
}

fn is_commit_prompt(prompt: &str) -> bool {
    prompt.starts_with("Merge the chunk summaries")
}

fn is_daily_prompt(prompt: &str) -> bool {
    prompt.starts_with("Write the daily changelog")
}

#[tokio::test]
async fn test_single_commit_runs_each_tier_once() {
    let repo = TestRepo::new();
    let base = repo.commit(None, &[("src/app.rs", "fn a() {}\n")], "Base", DAY_START - HOUR);
    let tip = repo.commit(
        Some(base),
        &[("src/app.rs", "fn a() { b(); }\n")],
        "Call b from a",
        DAY_START + 9 * HOUR,
    );
    repo.set_remote_branch("main", tip);
    repo.set_remote_head("main");

    let harness = Harness::new(repo);
    let (report, commits, delivered, stats) = reported(harness.run().await);

    let prompts = harness.provider.prompts();
    assert_eq!(prompts.len(), 3);
    assert!(is_chunk_prompt(&prompts[0]));
    assert!(prompts[0].contains("Chunk: 1/1"));
    assert!(prompts[0].contains("Commit: "));
    assert!(prompts[0].contains("Call b from a"));
    assert!(is_commit_prompt(&prompts[1]));
    assert!(is_daily_prompt(&prompts[2]));
    assert!(prompts[2].contains("2024-05-01"));
    assert!(prompts[2].contains(&format!("https://github.com/acme/app/commit/{}", tip)));

    assert!(delivered);
    assert_eq!(report.text, "summary 3");
    assert_eq!(harness.dispatcher.reports(), vec!["summary 3".to_string()]);
    assert_eq!(commits.len(), 1);
    assert_eq!(commits[0].summary.text, "summary 2");
    assert_eq!(stats.commits, 1);
    assert_eq!(stats.branches, 1);
    assert_eq!(stats.chunks, 1);
    assert_eq!(stats.completion_calls, 3);
    assert_eq!(stats.degraded, 0);
}

#[tokio::test]
async fn test_large_commit_is_packed_into_bounded_chunks() {
    let repo = TestRepo::new();
    let line = "x".repeat(150);
    let content = format!("{}\n", line);
    let tip = repo.commit(
        None,
        &[
            ("one.txt", content.as_str()),
            ("two.txt", content.as_str()),
            ("three.txt", content.as_str()),
        ],
        "Add three files",
        DAY_START + 9 * HOUR,
    );
    repo.set_remote_branch("main", tip);

    let mut harness = Harness::new(repo);
    harness.config.chunking.max_chunk_chars = 400;

    let diff = DiffFetcher::new(harness.source(), harness.config.excluder().unwrap())
        .fetch(&tip.to_string());
    assert!(diff.chars().count() > 400);
    let expected_chunks = DiffChunker::new(400).chunk(&diff);
    assert!(expected_chunks.len() >= 2);
    assert!(expected_chunks.iter().all(|c| c.chars().count() <= 400));

    let (_, _, _, stats) = reported(harness.run().await);

    let prompts = harness.provider.prompts();
    let chunk_prompts: Vec<_> = prompts.iter().filter(|p| is_chunk_prompt(p)).collect();
    assert_eq!(chunk_prompts.len(), expected_chunks.len());
    assert_eq!(stats.chunks, expected_chunks.len());
    for (i, (prompt, chunk)) in chunk_prompts.iter().zip(&expected_chunks).enumerate() {
        assert!(prompt.contains(&format!("Chunk: {}/{}", i + 1, expected_chunks.len())));
        assert!(prompt.contains(chunk.as_str()));
    }
    assert_eq!(prompts.iter().filter(|p| is_commit_prompt(p)).count(), 1);
}

#[tokio::test]
async fn test_commit_on_two_branches_lists_both() {
    let repo = TestRepo::new();
    let base = repo.commit(None, &[("a.txt", "base\n")], "Base", DAY_START - HOUR);
    let shared = repo.commit(Some(base), &[("a.txt", "fix\n")], "Hotfix", DAY_START + 8 * HOUR);
    repo.set_remote_branch("main", shared);
    repo.set_remote_branch("release", shared);
    repo.set_remote_head("main");

    let harness = Harness::new(repo);
    let (_, commits, _, stats) = reported(harness.run().await);

    assert_eq!(commits.len(), 1);
    assert_eq!(
        commits[0].record.branch_list(),
        "origin/main, origin/release"
    );
    assert_eq!(stats.branches, 2);

    let prompts = harness.provider.prompts();
    assert_eq!(prompts.len(), 3);
    assert!(prompts[2].contains("Branches: origin/main, origin/release"));
}

#[tokio::test]
async fn test_no_commits_today_skips_everything() {
    let repo = TestRepo::new();
    let old = repo.commit(None, &[("a.txt", "old\n")], "Old work", DAY_START - 5 * HOUR);
    repo.set_remote_branch("main", old);

    let harness = Harness::new(repo);
    let outcome = harness.run().await;

    assert!(matches!(outcome, RunOutcome::NoCommits));
    assert!(outcome.report_text().is_none());
    assert!(harness.provider.prompts().is_empty());
    assert!(harness.dispatcher.reports().is_empty());
}

#[tokio::test]
async fn test_repository_without_remote_branches() {
    let repo = TestRepo::new();
    repo.commit(None, &[("a.txt", "local\n")], "Local only", DAY_START + HOUR);

    let harness = Harness::new(repo);
    assert!(matches!(harness.run().await, RunOutcome::NoCommits));
    assert!(harness.provider.prompts().is_empty());
}

#[tokio::test]
async fn test_filtered_commit_gets_placeholder_without_calls() {
    let repo = TestRepo::new();
    let base = repo.commit(
        None,
        &[("src/lib.rs", "pub fn v() -> u32 { 1 }\n"), ("Cargo.lock", "v1\n")],
        "Base",
        DAY_START - HOUR,
    );
    let bump = repo.commit(
        Some(base),
        &[("Cargo.lock", "v2\n")],
        "Bump lockfile",
        DAY_START + 9 * HOUR,
    );
    let code = repo.commit(
        Some(bump),
        &[("src/lib.rs", "pub fn v() -> u32 { 2 }\n")],
        "Return 2",
        DAY_START + 10 * HOUR,
    );
    repo.set_remote_branch("main", code);

    let harness = Harness::new(repo);
    let (_, commits, _, stats) = reported(harness.run().await);

    assert_eq!(commits.len(), 2);
    assert_eq!(commits[0].record.title(), "Bump lockfile");
    assert_eq!(commits[0].summary.text, NO_CHANGE_PLACEHOLDER);
    assert_eq!(stats.empty_diffs, 1);

    let prompts = harness.provider.prompts();
    // Lockfile commit: none; code commit: chunk + commit; then daily
    assert_eq!(prompts.len(), 3);
    assert!(prompts.iter().take(2).all(|p| !p.contains("Bump lockfile")));
    assert!(prompts[2].contains("Bump lockfile"));
    assert!(prompts[2].contains(NO_CHANGE_PLACEHOLDER));
    let bump_pos = prompts[2].find("Bump lockfile").unwrap();
    let code_pos = prompts[2].find("Return 2").unwrap();
    assert!(bump_pos < code_pos);
}

#[tokio::test]
async fn test_commit_merge_failure_uses_labeled_chunks() {
    let repo = TestRepo::new();
    let tip = repo.commit(None, &[("a.txt", "a\n")], "Add a", DAY_START + 9 * HOUR);
    repo.set_remote_branch("main", tip);

    let mut harness = Harness::new(repo);
    harness.provider = Arc::new(ScriptedProvider::new(vec![
        Ok("alpha".to_string()),
        Err(CompletionError::Api {
            status: 500,
            body: "internal".to_string(),
        }),
    ]));

    let (report, commits, delivered, stats) = reported(harness.run().await);

    assert_eq!(commits[0].summary.text, "### Chunk 1/1\nalpha");
    assert!(commits[0].summary.is_degraded());
    assert_eq!(stats.degraded, 1);
    assert!(delivered);
    assert_eq!(report.text, "summary 3");

    let daily = &harness.provider.prompts()[2];
    assert!(daily.contains("Note: commit-level merge failed: backend returned HTTP 500: internal"));
    assert!(daily.contains("### Chunk 1/1\nalpha"));
}

#[tokio::test]
async fn test_chunk_failure_marker_reaches_commit_prompt() {
    let repo = TestRepo::new();
    let tip = repo.commit(None, &[("a.txt", "a\n")], "Add a", DAY_START + 9 * HOUR);
    repo.set_remote_branch("main", tip);

    let mut harness = Harness::new(repo);
    harness.provider = Arc::new(ScriptedProvider::new(vec![Err(CompletionError::RateLimited)]));

    let (_, _, _, stats) = reported(harness.run().await);

    let prompts = harness.provider.prompts();
    assert_eq!(prompts.len(), 3);
    assert!(prompts[1].contains("[chunk 1/1 failed: rate limited by backend]"));
    assert!(prompts[1].contains("may be incomplete"));
    assert_eq!(stats.degraded, 1);
}

#[tokio::test]
async fn test_daily_failure_still_delivers_fallback() {
    let repo = TestRepo::new();
    let first = repo.commit(None, &[("a.txt", "a\n")], "First", DAY_START + 9 * HOUR);
    let second = repo.commit(Some(first), &[("b.txt", "b\n")], "Second", DAY_START + 11 * HOUR);
    repo.set_remote_branch("main", second);

    let mut harness = Harness::new(repo);
    harness.provider = Arc::new(ScriptedProvider::new(vec![
        Ok("c1".to_string()),
        Ok("first summary".to_string()),
        Ok("c2".to_string()),
        Ok("second summary".to_string()),
        Err(CompletionError::Transport("timed out".to_string())),
    ]));

    let (report, _, delivered, _) = reported(harness.run().await);

    assert!(delivered);
    assert!(report.is_degraded());
    assert!(
        report
            .text
            .contains("automatic aggregation failed: transport failure: timed out")
    );
    let first_pos = report.text.find("first summary").unwrap();
    let second_pos = report.text.find("second summary").unwrap();
    assert!(first_pos < second_pos);
    assert_eq!(harness.dispatcher.reports(), vec![report.text.clone()]);
}

#[tokio::test]
async fn test_delivery_failure_is_not_fatal() {
    let repo = TestRepo::new();
    let tip = repo.commit(None, &[("a.txt", "a\n")], "Add a", DAY_START + 9 * HOUR);
    repo.set_remote_branch("main", tip);

    let mut harness = Harness::new(repo);
    harness.dispatcher = Arc::new(RecordingDispatcher::rejecting());

    let (report, _, delivered, _) = reported(harness.run().await);

    assert!(!delivered);
    assert_eq!(report.text, "summary 3");
    assert_eq!(harness.dispatcher.reports().len(), 1);
}
