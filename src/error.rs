/// Centralized error types for daily-changelog using thiserror
///
/// Only [`ConfigError`] aborts a run. Every other category is absorbed by the
/// pipeline stage that raised it and turned into a visible marker in the
/// report.
use thiserror::Error;

/// Main error type for the changelog pipeline
#[derive(Error, Debug)]
pub enum ChangelogError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Git error: {0}")]
    Git(#[from] GitError),

    #[error("Completion error: {0}")]
    Completion(#[from] CompletionError),

    #[error("Delivery error: {0}")]
    Delivery(#[from] DeliveryError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

/// Errors related to configuration and credentials
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration file: {0}")]
    LoadFailed(String),

    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),

    #[error("Invalid configuration value for '{key}': {reason}")]
    InvalidValue { key: String, reason: String },

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    #[error("Configuration file not found: {0}")]
    FileNotFound(String),
}

/// Errors related to git operations
#[derive(Error, Debug)]
pub enum GitError {
    #[error("Git repository not found at: {0}")]
    RepoNotFound(String),

    #[error("Failed to list remote branches: {0}")]
    BranchListFailed(String),

    #[error("Failed to iterate commits for {refs}: {reason}")]
    IterFailed { refs: String, reason: String },

    #[error("Invalid commit hash: {0}")]
    InvalidCommitHash(String),

    #[error("Failed to compute diff for {commit}: {reason}")]
    DiffFailed { commit: String, reason: String },
}

/// Errors reported by a completion (language model) backend
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompletionError {
    #[error("transport failure: {0}")]
    Transport(String),

    #[error("authentication rejected (HTTP {0})")]
    Auth(u16),

    #[error("rate limited by backend")]
    RateLimited,

    #[error("backend returned HTTP {status}: {body}")]
    Api { status: u16, body: String },

    #[error("backend returned no completion text")]
    EmptyResponse,
}

/// Errors related to report delivery
#[derive(Error, Debug)]
pub enum DeliveryError {
    #[error("webhook request failed: {0}")]
    Transport(String),

    #[error("webhook rejected report with HTTP {status}: {body}")]
    Rejected { status: u16, body: String },
}

// Conversion from anyhow::Error to ChangelogError, keeping typed git errors
impl From<anyhow::Error> for ChangelogError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<GitError>() {
            Ok(git) => ChangelogError::Git(git),
            Err(err) => ChangelogError::Other(format!("{:#}", err)),
        }
    }
}

impl ChangelogError {
    /// Create a new error from a string message
    pub fn other(msg: impl Into<String>) -> Self {
        ChangelogError::Other(msg.into())
    }
}

impl CompletionError {
    /// Check if a second attempt could plausibly succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            CompletionError::Transport(_) | CompletionError::RateLimited => true,
            CompletionError::Api { status, .. } => *status >= 500,
            CompletionError::Auth(_) | CompletionError::EmptyResponse => false,
        }
    }
}
