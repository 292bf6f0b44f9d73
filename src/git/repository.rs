use super::{CommitMetadata, RevisionSource};
use crate::error::GitError;
use crate::glob_utils::PathExcluder;
use crate::window::ReportWindow;
use anyhow::{Context, Result, anyhow};
use git2::{BranchType, DiffFormat, DiffOptions, Oid, ReferenceType, Repository, Sort};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// `git2` repository behind a mutex so it can be shared with blocking tasks
pub struct GitRepository {
    repo: Mutex<Repository>,
    remote: String,
}

impl GitRepository {
    /// Discover and open a git repository from any path within it
    ///
    /// `remote` limits branch enumeration to one remote (e.g. `origin`);
    /// an empty string tracks every remote.
    pub fn discover<P: AsRef<Path>>(path: P, remote: &str) -> Result<Self, GitError> {
        let path = path.as_ref();

        // Walks up the directory tree
        let repo = Repository::discover(path).map_err(|e| {
            GitError::RepoNotFound(format!("{} ({})", path.display(), e.message()))
        })?;

        tracing::info!(
            "Opened git repository at: {}",
            repo.workdir().unwrap_or_else(|| repo.path()).display()
        );

        Ok(Self {
            repo: Mutex::new(repo),
            remote: remote.to_string(),
        })
    }

    /// URL of the tracked remote, if it is configured
    pub fn remote_url(&self) -> Option<String> {
        if self.remote.is_empty() {
            return None;
        }
        let repo = self.lock().ok()?;
        let remote = repo.find_remote(&self.remote).ok()?;
        remote.url().map(|u| u.to_string())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Repository>> {
        self.repo
            .lock()
            .map_err(|e| anyhow!("Repository lock was poisoned: {}", e))
    }

    fn tracks(&self, branch_name: &str) -> bool {
        self.remote.is_empty()
            || branch_name
                .strip_prefix(self.remote.as_str())
                .is_some_and(|rest| rest.starts_with('/'))
    }
}

fn parse_oid(id: &str) -> Result<Oid> {
    Oid::from_str(id).map_err(|_| GitError::InvalidCommitHash(id.to_string()).into())
}

/// Resolve a remote-tracking branch name like `origin/main` to its tip
///
/// Looked up under `refs/remotes/` only, so a tag or local branch with the
/// same short name never wins.
fn resolve_remote_branch(repo: &Repository, name: &str) -> Result<Oid> {
    let commit = repo
        .find_reference(&format!("refs/remotes/{}", name))
        .and_then(|reference| reference.peel_to_commit())
        .with_context(|| format!("Failed to resolve ref {}", name))?;
    Ok(commit.id())
}

impl RevisionSource for GitRepository {
    fn list_remote_branches(&self) -> Result<Vec<String>> {
        let repo = self.lock()?;
        let mut names = Vec::new();

        let branches = repo
            .branches(Some(BranchType::Remote))
            .map_err(|e| GitError::BranchListFailed(e.message().to_string()))?;

        for entry in branches {
            let (branch, _) = entry?;

            // origin/HEAD and other aliases point at a real branch already listed
            if branch.get().kind() == Some(ReferenceType::Symbolic) {
                continue;
            }

            let Some(name) = branch.name()? else {
                tracing::debug!("Skipping remote branch with non-UTF-8 name");
                continue;
            };
            if name.ends_with("/HEAD") || !self.tracks(name) {
                continue;
            }
            names.push(name.to_string());
        }

        names.sort();
        names.dedup();
        tracing::debug!("Found {} remote branches", names.len());
        Ok(names)
    }

    fn list_commit_ids(
        &self,
        refs: &[String],
        window: &ReportWindow,
        exclude_merges: bool,
    ) -> Result<Vec<String>> {
        if refs.is_empty() {
            return Ok(Vec::new());
        }

        let repo = self.lock()?;
        let mut revwalk = repo.revwalk()?;
        revwalk.set_sorting(Sort::TIME | Sort::TOPOLOGICAL)?;

        // A ref that no longer resolves only drops its own tip from the walk
        let mut tips = 0;
        for name in refs {
            match resolve_remote_branch(&repo, name) {
                Ok(oid) => {
                    revwalk.push(oid)?;
                    tips += 1;
                }
                Err(e) => tracing::warn!("Skipping {} in commit scan: {:#}", name, e),
            }
        }
        if tips == 0 {
            return Err(GitError::IterFailed {
                refs: refs.join(", "),
                reason: "no ref resolved to a commit".to_string(),
            }
            .into());
        }

        let since = window.since_epoch();
        let mut ids = Vec::new();

        for oid in revwalk {
            let oid = oid?;
            let commit = repo.find_commit(oid)?;
            let commit_time = commit.time().seconds();

            if commit_time < since {
                break; // Commits are sorted, no need to continue
            }
            if !window.contains_epoch(commit_time) {
                continue;
            }
            if exclude_merges && commit.parent_count() > 1 {
                continue;
            }

            ids.push(oid.to_string());
        }

        // Newest-first walk, callers want oldest first
        ids.reverse();
        Ok(ids)
    }

    fn commit_metadata(&self, id: &str) -> Result<CommitMetadata> {
        let repo = self.lock()?;
        let commit = repo.find_commit(parse_oid(id)?)?;

        let title = commit.summary().unwrap_or("").trim().to_string();
        let author = commit.author();
        let author = author
            .name()
            .filter(|n| !n.trim().is_empty())
            .or_else(|| author.email())
            .unwrap_or("unknown")
            .to_string();

        Ok(CommitMetadata { title, author })
    }

    fn parent_id(&self, id: &str) -> Result<Option<String>> {
        let repo = self.lock()?;
        let commit = repo.find_commit(parse_oid(id)?)?;
        if commit.parent_count() == 0 {
            return Ok(None);
        }
        Ok(Some(commit.parent_id(0)?.to_string()))
    }

    fn diff(&self, base: Option<&str>, id: &str, excludes: &PathExcluder) -> Result<String> {
        let repo = self.lock()?;
        let tree = repo.find_commit(parse_oid(id)?)?.tree()?;

        // No base means a root commit, diffed against the empty tree
        let base_tree = match base {
            Some(base) => Some(repo.find_commit(parse_oid(base)?)?.tree()?),
            None => None,
        };

        let mut diff_opts = DiffOptions::new();
        diff_opts
            .context_lines(0)
            .interhunk_lines(0)
            .minimal(true)
            .ignore_whitespace(false);

        let diff = repo.diff_tree_to_tree(base_tree.as_ref(), Some(&tree), Some(&mut diff_opts))?;

        let mut diff_content = String::new();
        diff.print(DiffFormat::Patch, |delta, _hunk, line| {
            let path = delta
                .new_file()
                .path()
                .or_else(|| delta.old_file().path())
                .map(|p| p.to_string_lossy().replace('\\', "/"));

            if path.as_deref().is_some_and(|p| excludes.is_excluded(p)) {
                return true;
            }
            if delta.flags().is_binary() || line.origin() == 'B' {
                return true;
            }

            let content = String::from_utf8_lossy(line.content());
            match line.origin() {
                origin @ ('+' | '-' | ' ') => {
                    diff_content.push(origin);
                    diff_content.push_str(&content);
                }
                // File and hunk headers carry their own text
                'F' | 'H' => diff_content.push_str(&content),
                // "\ No newline at end of file" markers
                '=' | '>' | '<' => diff_content.push_str(&content),
                _ => {}
            }

            // Always continue; returning false would surface as a git2 error
            true
        })
        .map_err(|e| GitError::DiffFailed {
            commit: id.to_string(),
            reason: e.message().to_string(),
        })?;

        Ok(diff_content)
    }
}
