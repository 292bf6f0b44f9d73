//! Shared record types passed between pipeline stages

use regex::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;

/// Number of hex digits shown for an abbreviated commit id
pub const SHORT_ID_LEN: usize = 7;

/// A commit attributed to at least one tracked branch
///
/// Construction enforces the non-empty branch set, so every record that
/// reaches the reducer is attributable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitRecord {
    id: String,
    title: String,
    author: String,
    url: String,
    branches: BTreeSet<String>,
}

impl CommitRecord {
    /// Returns `None` when `branches` is empty
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        author: impl Into<String>,
        web_url: Option<&str>,
        branches: BTreeSet<String>,
    ) -> Option<Self> {
        if branches.is_empty() {
            return None;
        }
        let id = id.into();
        let url = commit_url(web_url, &id);
        Some(Self {
            id,
            title: title.into(),
            author: author.into(),
            url,
            branches,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Abbreviated id for display
    pub fn short_id(&self) -> &str {
        short_id(&self.id)
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn author(&self) -> &str {
        &self.author
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Branch names in lexicographic order
    pub fn branches(&self) -> &BTreeSet<String> {
        &self.branches
    }

    /// Branch names joined for display, e.g. `origin/dev, origin/main`
    pub fn branch_list(&self) -> String {
        self.branches
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// First [`SHORT_ID_LEN`] characters of a commit id
pub fn short_id(id: &str) -> &str {
    match id.char_indices().nth(SHORT_ID_LEN) {
        Some((end, _)) => &id[..end],
        None => id,
    }
}

/// Link to a commit page
///
/// Without a repository web URL the link degrades to `commit/<id>`.
pub fn commit_url(web_url: Option<&str>, id: &str) -> String {
    match web_url.map(|u| u.trim_end_matches('/')).filter(|u| !u.is_empty()) {
        Some(base) => format!("{}/commit/{}", base, id),
        None => format!("commit/{}", id),
    }
}

static SCP_LIKE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:[\w.-]+@)?([\w.-]+):(?:/)?([\w./-]+?)(?:\.git)?/?$").expect("valid regex")
});

static URL_LIKE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:https?|ssh|git)://(?:[^@/]+@)?([\w.-]+)(?::\d+)?/([\w./-]+?)(?:\.git)?/?$")
        .expect("valid regex")
});

/// Derive a browsable `https://host/owner/repo` URL from a git remote URL
///
/// Handles `https://`, `ssh://`, `git://` and scp-like `git@host:owner/repo.git`
/// forms. Local paths and anything unrecognized yield `None`.
pub fn derive_web_url(remote_url: &str) -> Option<String> {
    let remote_url = remote_url.trim();
    if remote_url.is_empty() || remote_url.starts_with("file://") || remote_url.starts_with('/') {
        return None;
    }

    let caps = URL_LIKE
        .captures(remote_url)
        .or_else(|| SCP_LIKE.captures(remote_url))?;
    let host = caps.get(1)?.as_str();
    let path = caps.get(2)?.as_str().trim_matches('/');
    if path.is_empty() {
        return None;
    }
    Some(format!("https://{}/{}", host, path))
}
