//! Result recording and summary delivery.

mod log;
mod summary;
mod webhook;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use janitor_model::ScanResult;

pub use log::LogNotifier;
pub use summary::{DailySummary, SummaryRecorder};
pub use webhook::WebhookNotifier;

use crate::config::NotificationConfig;
use crate::error::NotifyError;

/// Destination for finished per-file results and periodic summaries.
#[async_trait]
pub trait NotificationSink: Send + Sync + fmt::Debug {
    async fn record_result(&self, result: &ScanResult);

    async fn send_summary(&self, summary: &DailySummary) -> Result<(), NotifyError>;
}

/// Fans results out to every sink and keeps the running summary.
#[derive(Debug, Default)]
pub struct Notifications {
    recorder: SummaryRecorder,
    sinks: Vec<Arc<dyn NotificationSink>>,
}

impl Notifications {
    pub fn new(sinks: Vec<Arc<dyn NotificationSink>>) -> Self {
        Self {
            recorder: SummaryRecorder::default(),
            sinks,
        }
    }

    /// Log sink plus a webhook sink when a URL is configured.
    pub fn from_config(config: &NotificationConfig) -> Self {
        let mut sinks: Vec<Arc<dyn NotificationSink>> = vec![Arc::new(LogNotifier)];
        if let Some(url) = config.webhook_url.as_deref().filter(|u| !u.is_empty()) {
            match WebhookNotifier::new(url) {
                Ok(notifier) => sinks.push(Arc::new(notifier)),
                Err(err) => warn!(error = %err, "webhook notifications disabled"),
            }
        }
        Self::new(sinks)
    }

    /// Adds `result` to the running summary and forwards it to every sink.
    pub async fn record_result(&self, result: &ScanResult) {
        if result.is_skipped() {
            return;
        }
        self.recorder.record(result);
        for sink in &self.sinks {
            sink.record_result(result).await;
        }
    }

    /// Summary of the period so far, without resetting it.
    pub fn current_summary(&self) -> DailySummary {
        self.recorder.peek()
    }

    /// Closes the current period and delivers it. Empty periods are not
    /// sent. Returns how many sinks accepted the summary.
    pub async fn send_summary(
        &self,
        duplicate_groups: usize,
        path_mismatches: usize,
    ) -> usize {
        let mut summary = self.recorder.take();
        if summary.is_empty() {
            return 0;
        }
        summary.duplicate_groups = duplicate_groups;
        summary.path_mismatches = path_mismatches;

        let mut delivered = 0;
        for sink in &self.sinks {
            match sink.send_summary(&summary).await {
                Ok(()) => delivered += 1,
                Err(err) => warn!(sink = ?sink, error = %err, "summary delivery failed"),
            }
        }
        delivered
    }
}
