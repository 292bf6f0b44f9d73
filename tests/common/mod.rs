//! Shared fixtures: throwaway git repositories and scripted collaborators
#![allow(dead_code)]

use chrono::{DateTime, FixedOffset, Utc};
use daily_changelog::dispatch::ReportDispatcher;
use daily_changelog::error::{CompletionError, DeliveryError};
use daily_changelog::llm::CompletionProvider;
use daily_changelog::window::{ReportTimezone, ReportWindow};
use git2::{Oid, Repository, Signature, Time};
use std::collections::VecDeque;
use std::path::Path;
use std::sync::Mutex;
use tempfile::TempDir;

/// 2024-05-01T00:00:00Z
pub const DAY_START: i64 = 1_714_521_600;
pub const HOUR: i64 = 3_600;

/// Report window for 2024-05-01 in UTC, ending at 20:00
pub fn report_window() -> ReportWindow {
    let utc = ReportTimezone::Fixed(FixedOffset::east_opt(0).unwrap());
    let now = DateTime::<Utc>::from_timestamp(DAY_START + 20 * HOUR, 0).unwrap();
    ReportWindow::ending_at(utc, now)
}

/// A repository in a temp dir whose history is written commit by commit
pub struct TestRepo {
    pub dir: TempDir,
    pub repo: Repository,
}

impl TestRepo {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        repo.remote("origin", "git@github.com:acme/app.git").unwrap();
        Self { dir, repo }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Commit `files` on top of `parent` at `time` without touching HEAD
    pub fn commit(
        &self,
        parent: Option<Oid>,
        files: &[(&str, &str)],
        message: &str,
        time: i64,
    ) -> Oid {
        let parents: Vec<Oid> = parent.into_iter().collect();
        self.commit_with_parents(&parents, files, message, time)
    }

    pub fn commit_with_parents(
        &self,
        parents: &[Oid],
        files: &[(&str, &str)],
        message: &str,
        time: i64,
    ) -> Oid {
        let mut index = self.repo.index().unwrap();
        match parents.first() {
            Some(first) => {
                let tree = self.repo.find_commit(*first).unwrap().tree().unwrap();
                index.read_tree(&tree).unwrap();
            }
            None => index.clear().unwrap(),
        }

        for (path, content) in files {
            let full = self.path().join(path);
            if let Some(dir) = full.parent() {
                std::fs::create_dir_all(dir).unwrap();
            }
            std::fs::write(&full, content).unwrap();
            index.add_path(Path::new(path)).unwrap();
        }

        let tree_id = index.write_tree().unwrap();
        let tree = self.repo.find_tree(tree_id).unwrap();
        let sig = Signature::new("Dana Dev", "dana@example.com", &Time::new(time, 0)).unwrap();
        let parent_commits: Vec<_> = parents
            .iter()
            .map(|id| self.repo.find_commit(*id).unwrap())
            .collect();
        let parent_refs: Vec<_> = parent_commits.iter().collect();

        self.repo
            .commit(None, &sig, &sig, message, &tree, &parent_refs)
            .unwrap()
    }

    /// Point `origin/<branch>` at `oid`
    pub fn set_remote_branch(&self, branch: &str, oid: Oid) {
        self.repo
            .reference(&format!("refs/remotes/origin/{}", branch), oid, true, "test")
            .unwrap();
    }

    /// Add the `origin/HEAD -> origin/<branch>` alias a clone would have
    pub fn set_remote_head(&self, branch: &str) {
        self.repo
            .reference_symbolic(
                "refs/remotes/origin/HEAD",
                &format!("refs/remotes/origin/{}", branch),
                true,
                "test",
            )
            .unwrap();
    }
}

/// Replays scripted responses, then answers `summary N` for call N
#[derive(Default)]
pub struct ScriptedProvider {
    script: Mutex<VecDeque<Result<String, CompletionError>>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedProvider {
    pub fn new(script: Vec<Result<String, CompletionError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl CompletionProvider for ScriptedProvider {
    async fn complete(&self, prompt: &str) -> Result<String, CompletionError> {
        let mut prompts = self.prompts.lock().unwrap();
        prompts.push(prompt.to_string());
        let n = prompts.len();
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(format!("summary {}", n)))
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}

/// Keeps every delivered report; optionally rejects them
#[derive(Default)]
pub struct RecordingDispatcher {
    pub reject: bool,
    reports: Mutex<Vec<String>>,
}

impl RecordingDispatcher {
    pub fn rejecting() -> Self {
        Self {
            reject: true,
            ..Default::default()
        }
    }

    pub fn reports(&self) -> Vec<String> {
        self.reports.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl ReportDispatcher for RecordingDispatcher {
    async fn deliver(&self, report: &str) -> Result<(), DeliveryError> {
        self.reports.lock().unwrap().push(report.to_string());
        if self.reject {
            return Err(DeliveryError::Rejected {
                status: 500,
                body: "webhook down".to_string(),
            });
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "recording"
    }
}
