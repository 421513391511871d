use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tracing::{debug, info};

use janitor_model::ScanResult;

use super::{DailySummary, NotificationSink};
use crate::error::NotifyError;

/// POSTs summaries to a Discord/Slack-compatible incoming webhook.
#[derive(Debug, Clone)]
pub struct WebhookNotifier {
    url: String,
    client: reqwest::Client,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>) -> Result<Self, NotifyError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            url: url.into(),
            client,
        })
    }

    /// JSON body posted for one summary.
    pub fn payload(summary: &DailySummary) -> serde_json::Value {
        let text = summary.render_text();
        json!({
            "content": text,
            "text": text,
            "summary": summary,
        })
    }
}

#[async_trait]
impl NotificationSink for WebhookNotifier {
    async fn record_result(&self, result: &ScanResult) {
        debug!(path = %result.file_path, "webhook notifier only sends summaries");
    }

    async fn send_summary(&self, summary: &DailySummary) -> Result<(), NotifyError> {
        let response = self
            .client
            .post(&self.url)
            .json(&Self::payload(summary))
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(NotifyError::Status(status.as_u16()));
        }
        info!(scanned = summary.files_scanned, "summary webhook delivered");
        Ok(())
    }
}
