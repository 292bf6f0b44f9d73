/// Configuration system for daily-changelog
///
/// Supports loading from multiple sources with priority:
/// CLI args > Environment variables > Config file > Defaults
use crate::error::{ChangelogError, ConfigError};
use crate::glob_utils::PathExcluder;
use crate::window::ReportTimezone;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Prefix shared by every environment override
pub const ENV_PREFIX: &str = "DAILY_CHANGELOG_";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Repository to report on
    #[serde(default)]
    pub repository: RepositoryConfig,

    /// Commit collection policy
    #[serde(default)]
    pub collect: CollectConfig,

    /// Diff chunking limits
    #[serde(default)]
    pub chunking: ChunkingConfig,

    /// Diff path filtering
    #[serde(default)]
    pub diff: DiffConfig,

    /// Completion backend
    #[serde(default)]
    pub llm: LlmConfig,

    /// Report delivery
    #[serde(default)]
    pub webhook: WebhookConfig,
}

/// Repository configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepositoryConfig {
    /// Path inside the working copy
    #[serde(default = "default_repo_path")]
    pub path: PathBuf,

    /// Remote whose tracking branches are scanned
    #[serde(default = "default_remote")]
    pub remote: String,

    /// Base URL for commit links, e.g. `https://github.com/owner/repo`.
    /// Empty means derive it from the remote URL.
    #[serde(default)]
    pub web_url: String,
}

/// Commit collection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectConfig {
    /// Most recent commits kept per branch
    #[serde(default = "default_max_commits_per_branch")]
    pub max_commits_per_branch: usize,

    /// Zone the day boundary is computed in: "local", "UTC" or "+08:00"
    #[serde(default = "default_timezone")]
    pub timezone: String,

    /// Skip commits with more than one parent
    #[serde(default = "default_exclude_merges")]
    pub exclude_merges: bool,
}

/// Chunking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Upper bound on characters per chunk sent to the model
    #[serde(default = "default_max_chunk_chars")]
    pub max_chunk_chars: usize,
}

/// Diff filtering configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiffConfig {
    /// Globs for paths whose changes are left out of diffs
    #[serde(default = "default_exclude_patterns")]
    pub exclude_patterns: Vec<String>,
}

/// Completion backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Model identifier sent with every request
    #[serde(default = "default_model")]
    pub model: String,

    /// OpenAI-compatible API base URL
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,

    /// Extra attempts for transient failures
    #[serde(default)]
    pub max_retries: u32,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

/// Webhook delivery configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookConfig {
    /// Deliver the report; when false it is printed to stdout
    #[serde(default = "default_webhook_enabled")]
    pub enabled: bool,

    /// Inline webhook URL, takes precedence over `url_env`
    #[serde(default)]
    pub url: String,

    /// Environment variable holding the webhook URL
    #[serde(default = "default_webhook_url_env")]
    pub url_env: String,

    /// JSON field the report text is sent in
    #[serde(default = "default_text_field")]
    pub text_field: String,
}

/// Secrets resolved once at startup
#[derive(Clone)]
pub struct Credentials {
    pub api_key: String,
    /// `None` when delivery is disabled
    pub webhook_url: Option<String>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &"<redacted>")
            .field("webhook_url", &self.webhook_url.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

// Default value functions
fn default_repo_path() -> PathBuf {
    PathBuf::from(".")
}

fn default_remote() -> String {
    "origin".to_string()
}

fn default_max_commits_per_branch() -> usize {
    200
}

fn default_timezone() -> String {
    "local".to_string()
}

fn default_exclude_merges() -> bool {
    true
}

fn default_max_chunk_chars() -> usize {
    crate::chunker::DEFAULT_MAX_CHUNK_CHARS
}

fn default_exclude_patterns() -> Vec<String> {
    [
        "**/package-lock.json",
        "**/yarn.lock",
        "**/pnpm-lock.yaml",
        "**/Cargo.lock",
        "**/poetry.lock",
        "**/go.sum",
        "**/dist/**",
        "**/build/**",
        "**/target/**",
        "**/*.min.js",
        "**/*.min.css",
        "**/*.map",
    ]
    .iter()
    .map(|p| p.to_string())
    .collect()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_llm_timeout() -> u64 {
    120
}

fn default_temperature() -> f32 {
    0.2
}

fn default_webhook_enabled() -> bool {
    true
}

fn default_webhook_url_env() -> String {
    "CHANGELOG_WEBHOOK_URL".to_string()
}

fn default_text_field() -> String {
    "text".to_string()
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            path: default_repo_path(),
            remote: default_remote(),
            web_url: String::new(),
        }
    }
}

impl Default for CollectConfig {
    fn default() -> Self {
        Self {
            max_commits_per_branch: default_max_commits_per_branch(),
            timezone: default_timezone(),
            exclude_merges: default_exclude_merges(),
        }
    }
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            max_chunk_chars: default_max_chunk_chars(),
        }
    }
}

impl Default for DiffConfig {
    fn default() -> Self {
        Self {
            exclude_patterns: default_exclude_patterns(),
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            base_url: default_base_url(),
            api_key_env: default_api_key_env(),
            timeout_secs: default_llm_timeout(),
            max_retries: 0,
            temperature: default_temperature(),
        }
    }
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            enabled: default_webhook_enabled(),
            url: String::new(),
            url_env: default_webhook_url_env(),
            text_field: default_text_field(),
        }
    }
}

fn invalid(key: &str, reason: impl Into<String>) -> ChangelogError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        reason: reason.into(),
    }
    .into()
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl Config {
    /// Load configuration from file
    pub fn from_file(path: &Path) -> Result<Self, ChangelogError> {
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()).into());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::LoadFailed(format!("Failed to read config file: {}", e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| ConfigError::ParseFailed(format!("Invalid TOML: {}", e)))?;

        Ok(config)
    }

    /// Load configuration from default location or fall back to defaults
    pub fn load_or_default() -> Result<Self, ChangelogError> {
        let config_path = crate::paths::PlatformPaths::default_config_path();

        if config_path.exists() {
            tracing::info!("Loading config from: {}", config_path.display());
            Self::from_file(&config_path)
        } else {
            tracing::debug!("No config file at {}, using defaults", config_path.display());
            Ok(Self::default())
        }
    }

    /// Load from an explicit path (which must exist) or the default location,
    /// then apply environment overrides
    ///
    /// Nothing is validated yet; call [`Config::validate`] once the CLI
    /// overrides are layered on top.
    pub fn load(path: Option<&Path>) -> Result<Self, ChangelogError> {
        let mut config = match path {
            Some(path) => {
                tracing::info!("Loading config from: {}", path.display());
                Self::from_file(path)?
            }
            None => Self::load_or_default()?,
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Serialize the effective configuration
    pub fn to_toml(&self) -> Result<String, ChangelogError> {
        toml::to_string_pretty(self).map_err(|e| {
            ConfigError::ParseFailed(format!("Failed to serialize config: {}", e)).into()
        })
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ChangelogError> {
        if self.chunking.max_chunk_chars == 0 {
            return Err(invalid("chunking.max_chunk_chars", "must be greater than 0"));
        }

        if self.collect.max_commits_per_branch == 0 {
            return Err(invalid(
                "collect.max_commits_per_branch",
                "must be greater than 0",
            ));
        }

        if self.llm.timeout_secs == 0 {
            return Err(invalid("llm.timeout_secs", "must be greater than 0"));
        }

        if self.llm.model.trim().is_empty() {
            return Err(invalid("llm.model", "must not be empty"));
        }

        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(invalid(
                "llm.temperature",
                format!("must be between 0.0 and 2.0, got {}", self.llm.temperature),
            ));
        }

        if self.webhook.text_field.trim().is_empty() {
            return Err(invalid("webhook.text_field", "must not be empty"));
        }

        self.collect
            .timezone
            .parse::<ReportTimezone>()
            .map_err(|reason| invalid("collect.timezone", reason))?;

        PathExcluder::new(&self.diff.exclude_patterns)?;

        Ok(())
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) {
        let var = |name: &str| non_empty(std::env::var(format!("{}{}", ENV_PREFIX, name)).ok());

        if let Some(path) = var("REPO") {
            self.repository.path = PathBuf::from(path);
        }

        if let Some(remote) = var("REMOTE") {
            self.repository.remote = remote;
        }

        if let Some(web_url) = var("WEB_URL") {
            self.repository.web_url = web_url;
        }

        if let Some(timezone) = var("TIMEZONE") {
            self.collect.timezone = timezone;
        }

        if let Some(cap) = var("MAX_COMMITS_PER_BRANCH")
            && let Ok(cap) = cap.parse()
        {
            self.collect.max_commits_per_branch = cap;
        }

        if let Some(limit) = var("MAX_CHUNK_CHARS")
            && let Ok(limit) = limit.parse()
        {
            self.chunking.max_chunk_chars = limit;
        }

        if let Some(model) = var("MODEL") {
            self.llm.model = model;
        }

        if let Some(base_url) = var("BASE_URL") {
            self.llm.base_url = base_url;
        }

        if let Some(timeout) = var("LLM_TIMEOUT_SECS")
            && let Ok(timeout) = timeout.parse()
        {
            self.llm.timeout_secs = timeout;
        }
    }

    /// Parsed reporting time zone
    pub fn timezone(&self) -> Result<ReportTimezone, ChangelogError> {
        self.collect
            .timezone
            .parse()
            .map_err(|reason: String| invalid("collect.timezone", reason))
    }

    /// Compiled diff exclusion globs
    pub fn excluder(&self) -> Result<PathExcluder, ChangelogError> {
        Ok(PathExcluder::new(&self.diff.exclude_patterns)?)
    }

    /// Commit link base: the configured value, else derived from the remote URL
    pub fn web_url(&self, remote_url: Option<&str>) -> Option<String> {
        non_empty(Some(self.repository.web_url.clone()))
            .map(|url| url.trim_end_matches('/').to_string())
            .or_else(|| remote_url.and_then(crate::types::derive_web_url))
    }

    /// Resolve secrets from the process environment
    pub fn resolve_credentials(&self) -> Result<Credentials, ChangelogError> {
        self.resolve_credentials_with(|name| std::env::var(name).ok())
    }

    /// Resolve secrets through `lookup`, which maps a variable name to its value
    pub fn resolve_credentials_with<F>(&self, lookup: F) -> Result<Credentials, ChangelogError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = non_empty(lookup(&self.llm.api_key_env)).ok_or_else(|| {
            ConfigError::MissingRequired(format!(
                "API key environment variable {}",
                self.llm.api_key_env
            ))
        })?;

        let webhook_url = if self.webhook.enabled {
            let url = non_empty(Some(self.webhook.url.clone()))
                .or_else(|| non_empty(lookup(&self.webhook.url_env)))
                .ok_or_else(|| {
                    ConfigError::MissingRequired(format!(
                        "webhook URL (webhook.url or environment variable {})",
                        self.webhook.url_env
                    ))
                })?;
            Some(url)
        } else {
            None
        };

        Ok(Credentials {
            api_key,
            webhook_url,
        })
    }
}
