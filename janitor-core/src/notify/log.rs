use async_trait::async_trait;
use tracing::{info, warn};

use janitor_model::{Disposition, ScanResult};

use super::{DailySummary, NotificationSink};
use crate::error::NotifyError;

/// Writes results and summaries to the tracing log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl NotificationSink for LogNotifier {
    async fn record_result(&self, result: &ScanResult) {
        match result.disposition {
            Disposition::Valid => {}
            Disposition::Replaced | Disposition::Flagged | Disposition::Queued => {
                warn!(
                    target: "janitor::scan",
                    path = %result.file_path,
                    title = %result.title,
                    disposition = %result.disposition,
                    errors = ?result.errors,
                    "file needs attention"
                );
            }
            Disposition::Skipped => {}
        }
    }

    async fn send_summary(&self, summary: &DailySummary) -> Result<(), NotifyError> {
        info!(target: "janitor::scan", "{}", summary.render_text());
        Ok(())
    }
}
