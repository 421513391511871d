use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;

use janitor_model::{Disposition, ScanResult};

/// Invalid files listed individually in a summary.
const MAX_LISTED_INVALID: usize = 100;

/// Aggregate of everything processed since the previous summary.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DailySummary {
    pub period_start: DateTime<Utc>,
    pub period_end: DateTime<Utc>,
    pub files_scanned: u64,
    pub files_valid: u64,
    pub files_invalid: u64,
    pub files_replaced: u64,
    pub files_flagged: u64,
    pub files_queued: u64,
    pub invalid_files: Vec<ScanResult>,
    pub duplicate_groups: usize,
    pub path_mismatches: usize,
}

impl DailySummary {
    fn empty(period_start: DateTime<Utc>) -> Self {
        Self {
            period_start,
            period_end: period_start,
            files_scanned: 0,
            files_valid: 0,
            files_invalid: 0,
            files_replaced: 0,
            files_flagged: 0,
            files_queued: 0,
            invalid_files: Vec::new(),
            duplicate_groups: 0,
            path_mismatches: 0,
        }
    }

    fn absorb(&mut self, result: &ScanResult) {
        self.files_scanned += 1;
        if result.valid {
            self.files_valid += 1;
        } else {
            self.files_invalid += 1;
            if self.invalid_files.len() < MAX_LISTED_INVALID {
                self.invalid_files.push(result.clone());
            }
        }
        match result.disposition {
            Disposition::Replaced => self.files_replaced += 1,
            Disposition::Flagged => self.files_flagged += 1,
            Disposition::Queued => self.files_queued += 1,
            Disposition::Valid | Disposition::Skipped => {}
        }
    }

    pub fn is_empty(&self) -> bool {
        self.files_scanned == 0
    }

    /// Plain-text rendering used by the log and webhook sinks.
    pub fn render_text(&self) -> String {
        let mut lines = vec![
            format!(
                "Media janitor summary {}",
                self.period_end.format("%Y-%m-%d")
            ),
            format!(
                "Scanned {} | valid {} | invalid {}",
                self.files_scanned, self.files_valid, self.files_invalid
            ),
            format!(
                "Replaced {} | flagged {} | queued {}",
                self.files_replaced, self.files_flagged, self.files_queued
            ),
        ];
        if self.duplicate_groups > 0 || self.path_mismatches > 0 {
            lines.push(format!(
                "Duplicates {} | path mismatches {}",
                self.duplicate_groups, self.path_mismatches
            ));
        }
        for result in &self.invalid_files {
            let reason = result.errors.first().map(String::as_str).unwrap_or("-");
            lines.push(format!(
                "- [{}] {}: {}",
                result.disposition, result.title, reason
            ));
        }
        lines.join("\n")
    }
}

/// Collects per-file results until the next summary is taken.
#[derive(Debug)]
pub struct SummaryRecorder {
    current: Mutex<DailySummary>,
}

impl Default for SummaryRecorder {
    fn default() -> Self {
        Self {
            current: Mutex::new(DailySummary::empty(Utc::now())),
        }
    }
}

impl SummaryRecorder {
    pub fn record(&self, result: &ScanResult) {
        if result.is_skipped() {
            return;
        }
        self.current.lock().absorb(result);
    }

    /// Current totals without resetting.
    pub fn peek(&self) -> DailySummary {
        let mut summary = self.current.lock().clone();
        summary.period_end = Utc::now();
        summary
    }

    /// Returns the summary and starts a new period.
    pub fn take(&self) -> DailySummary {
        let now = Utc::now();
        let mut current = self.current.lock();
        let mut summary =
            std::mem::replace(&mut *current, DailySummary::empty(now));
        summary.period_end = now;
        summary
    }
}
