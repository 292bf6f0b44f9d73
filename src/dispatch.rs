//! Report delivery

use crate::error::DeliveryError;
use std::io::Write;
use std::time::Duration;

/// Longest response body kept in a [`DeliveryError::Rejected`]
const MAX_ERROR_BODY: usize = 500;

/// Timeout for the webhook POST
const WEBHOOK_TIMEOUT_SECS: u64 = 30;

/// Sends a finished report somewhere
#[async_trait::async_trait]
pub trait ReportDispatcher: Send + Sync {
    async fn deliver(&self, report: &str) -> Result<(), DeliveryError>;

    /// Short name used in log lines
    fn name(&self) -> &str;
}

/// POSTs `{"<text_field>": report}` to a chat webhook
pub struct WebhookDispatcher {
    http: reqwest::Client,
    url: String,
    text_field: String,
}

impl WebhookDispatcher {
    pub fn new(
        url: impl Into<String>,
        text_field: impl Into<String>,
    ) -> Result<Self, DeliveryError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("daily-changelog/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(WEBHOOK_TIMEOUT_SECS))
            .build()
            .map_err(|e| DeliveryError::Transport(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            url: url.into(),
            text_field: text_field.into(),
        })
    }

    /// JSON body carrying the report
    pub fn payload(&self, report: &str) -> serde_json::Value {
        let mut body = serde_json::Map::new();
        body.insert(
            self.text_field.clone(),
            serde_json::Value::String(report.to_string()),
        );
        serde_json::Value::Object(body)
    }
}

#[async_trait::async_trait]
impl ReportDispatcher for WebhookDispatcher {
    async fn deliver(&self, report: &str) -> Result<(), DeliveryError> {
        let response = self
            .http
            .post(&self.url)
            .json(&self.payload(report))
            .send()
            .await
            .map_err(|e| DeliveryError::Transport(e.without_url().to_string()))?;

        let status = response.status();
        if status.is_success() {
            tracing::info!("Webhook accepted report (HTTP {})", status.as_u16());
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(DeliveryError::Rejected {
            status: status.as_u16(),
            body: body.chars().take(MAX_ERROR_BODY).collect(),
        })
    }

    fn name(&self) -> &str {
        "webhook"
    }
}

/// Writes the report to stdout
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutDispatcher;

impl StdoutDispatcher {
    /// Write the report to any sink, newline terminated
    pub fn write_to<W: Write>(mut out: W, report: &str) -> std::io::Result<()> {
        out.write_all(report.as_bytes())?;
        if !report.ends_with('\n') {
            out.write_all(b"\n")?;
        }
        out.flush()
    }
}

#[async_trait::async_trait]
impl ReportDispatcher for StdoutDispatcher {
    async fn deliver(&self, report: &str) -> Result<(), DeliveryError> {
        Self::write_to(std::io::stdout().lock(), report)
            .map_err(|e| DeliveryError::Transport(format!("stdout: {}", e)))
    }

    fn name(&self) -> &str {
        "stdout"
    }
}
