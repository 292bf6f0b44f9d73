use anyhow::{Context, Result};
use clap::Parser;
use daily_changelog::cli::Cli;
use daily_changelog::config::Config;
use daily_changelog::dispatch::{ReportDispatcher, StdoutDispatcher, WebhookDispatcher};
use daily_changelog::git::GitRepository;
use daily_changelog::llm::OpenAiCompatClient;
use daily_changelog::pipeline::{ChangelogPipeline, RunOutcome};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let mut config = Config::load(cli.config.as_deref())?;
    cli.apply(&mut config);
    config.validate()?;

    if cli.print_config {
        print!("{}", config.to_toml()?);
        return Ok(());
    }

    // Secrets are checked before any git or network work
    let credentials = config.resolve_credentials()?;

    let repo = GitRepository::discover(&config.repository.path, &config.repository.remote)?;
    let web_url = config.web_url(repo.remote_url().as_deref());

    let provider = OpenAiCompatClient::new(&config.llm, credentials.api_key)
        .context("Failed to create completion client")?;

    let dispatcher: Arc<dyn ReportDispatcher> = match credentials.webhook_url {
        Some(url) => Arc::new(
            WebhookDispatcher::new(url, config.webhook.text_field.clone())
                .context("Failed to create webhook client")?,
        ),
        None => Arc::new(StdoutDispatcher),
    };

    let pipeline = ChangelogPipeline::new(&config, Arc::new(repo), Arc::new(provider), dispatcher)?
        .with_web_url(web_url);

    match pipeline.run().await? {
        RunOutcome::NoCommits => tracing::info!("No commits today, skipping report"),
        RunOutcome::Reported { delivered, .. } if !delivered => {
            tracing::warn!("Report was printed to stdout because delivery failed");
        }
        RunOutcome::Reported { .. } => {}
    }

    Ok(())
}

/// Logs go to stderr so stdout carries only the report
fn init_tracing() {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("daily_changelog=info"));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
