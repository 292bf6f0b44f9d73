//! Command-line interface
use crate::config::Config;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug, Default)]
#[command(
    name = "daily-changelog",
    version = env!("DAILY_CHANGELOG_LONG_VERSION"),
    about = "Summarize today's commits on every remote branch and post the changelog to a webhook",
    long_about = "Collects the commits made today on every remote-tracking branch, summarizes each \
                  diff with a language model (chunk, then commit, then day), and delivers the \
                  resulting daily report to a chat webhook."
)]
pub struct Cli {
    /// Config file path (defaults to ~/.config/daily-changelog/config.toml)
    #[arg(short, long, value_name = "FILE", env = "DAILY_CHANGELOG_CONFIG")]
    pub config: Option<PathBuf>,

    /// Repository path (any directory inside the working copy)
    #[arg(short, long, value_name = "DIR")]
    pub repo: Option<PathBuf>,

    /// Model identifier passed to the completion endpoint
    #[arg(short, long)]
    pub model: Option<String>,

    /// Day boundary time zone: "local", "UTC" or an offset like "+08:00"
    #[arg(long)]
    pub timezone: Option<String>,

    /// Maximum characters per diff chunk
    #[arg(long, value_name = "CHARS")]
    pub max_chunk_chars: Option<usize>,

    /// Maximum commits considered per branch
    #[arg(long, value_name = "N")]
    pub max_commits_per_branch: Option<usize>,

    /// Print the report to stdout instead of posting it
    #[arg(long)]
    pub dry_run: bool,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    pub print_config: bool,
}

impl Cli {
    /// Apply flag overrides on top of file and environment settings
    pub fn apply(&self, config: &mut Config) {
        if let Some(repo) = &self.repo {
            config.repository.path = repo.clone();
        }
        if let Some(model) = &self.model {
            config.llm.model = model.clone();
        }
        if let Some(timezone) = &self.timezone {
            config.collect.timezone = timezone.clone();
        }
        if let Some(limit) = self.max_chunk_chars {
            config.chunking.max_chunk_chars = limit;
        }
        if let Some(cap) = self.max_commits_per_branch {
            config.collect.max_commits_per_branch = cap;
        }
        if self.dry_run {
            config.webhook.enabled = false;
        }
    }
}
