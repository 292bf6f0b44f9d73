use super::RevisionSource;
use crate::glob_utils::PathExcluder;
use std::sync::Arc;

/// Fetches a commit's diff against its first parent
///
/// Never fails: any revision-control error yields an empty diff, which the
/// reducer turns into a placeholder summary without calling the model.
#[derive(Clone)]
pub struct DiffFetcher {
    source: Arc<dyn RevisionSource>,
    excludes: Arc<PathExcluder>,
}

impl DiffFetcher {
    pub fn new(source: Arc<dyn RevisionSource>, excludes: PathExcluder) -> Self {
        Self {
            source,
            excludes: Arc::new(excludes),
        }
    }

    pub fn fetch(&self, id: &str) -> String {
        let parent = match self.source.parent_id(id) {
            Ok(parent) => parent,
            Err(e) => {
                tracing::warn!("Failed to resolve parent of {}, using empty diff: {:#}", id, e);
                return String::new();
            }
        };

        match self.source.diff(parent.as_deref(), id, &self.excludes) {
            Ok(text) => {
                tracing::debug!("Diff for {}: {} bytes", id, text.len());
                text
            }
            Err(e) => {
                tracing::warn!("Failed to diff {}, using empty diff: {:#}", id, e);
                String::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::CommitMetadata;
    use crate::window::ReportWindow;
    use anyhow::{Result, bail};
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingSource {
        parent_fails: bool,
        diff_fails: bool,
        diff_calls: Mutex<Vec<(Option<String>, String)>>,
    }

    impl RevisionSource for RecordingSource {
        fn list_remote_branches(&self) -> Result<Vec<String>> {
            Ok(Vec::new())
        }

        fn list_commit_ids(&self, _: &[String], _: &ReportWindow, _: bool) -> Result<Vec<String>> {
            Ok(Vec::new())
        }

        fn commit_metadata(&self, _: &str) -> Result<CommitMetadata> {
            bail!("unused")
        }

        fn parent_id(&self, id: &str) -> Result<Option<String>> {
            if self.parent_fails {
                bail!("shallow history");
            }
            Ok(if id == "root" {
                None
            } else {
                Some(format!("{}^", id))
            })
        }

        fn diff(&self, base: Option<&str>, id: &str, _: &PathExcluder) -> Result<String> {
            self.diff_calls
                .lock()
                .unwrap()
                .push((base.map(str::to_string), id.to_string()));
            if self.diff_fails {
                bail!("corrupted object");
            }
            Ok(format!("diff --git a/{id} b/{id}\n+x\n"))
        }
    }

    #[test]
    fn test_diffs_against_parent() {
        let source = Arc::new(RecordingSource::default());
        let fetcher = DiffFetcher::new(source.clone(), PathExcluder::empty());

        let text = fetcher.fetch("abc");
        assert!(text.starts_with("diff --git a/abc"));
        assert_eq!(
            source.diff_calls.lock().unwrap()[0],
            (Some("abc^".to_string()), "abc".to_string())
        );
    }

    #[test]
    fn test_root_commit_diffs_against_empty_tree() {
        let source = Arc::new(RecordingSource::default());
        let fetcher = DiffFetcher::new(source.clone(), PathExcluder::empty());

        fetcher.fetch("root");
        assert_eq!(source.diff_calls.lock().unwrap()[0].0, None);
    }

    #[test]
    fn test_parent_failure_degrades_to_empty() {
        let source = Arc::new(RecordingSource {
            parent_fails: true,
            ..Default::default()
        });
        let fetcher = DiffFetcher::new(source.clone(), PathExcluder::empty());

        assert_eq!(fetcher.fetch("abc"), "");
        assert!(source.diff_calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_diff_failure_degrades_to_empty() {
        let source = Arc::new(RecordingSource {
            diff_fails: true,
            ..Default::default()
        });
        let fetcher = DiffFetcher::new(source, PathExcluder::empty());
        assert_eq!(fetcher.fetch("abc"), "");
    }
}
