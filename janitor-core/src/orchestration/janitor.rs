use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use serde::Serialize;
use tracing::{debug, info, warn};

use janitor_model::{
    Disposition, MediaRecord, ScanResult, ScanStats, SourceFilter, ValidationResult,
};

use super::mismatch::detect_path_mismatch;
use super::rate_limit::{DailyReplacementLimiter, LimiterStatus};
use super::worker::{FileProcessor, ValidationPool};
use crate::catalog::{CatalogCache, CatalogStatus};
use crate::config::{JanitorConfig, ScanMode};
use crate::notify::{DailySummary, Notifications};
use crate::reports::{find_duplicates, find_mismatches};
use crate::state::StateStore;
use crate::validation::Validator;

/// Errors quoted in a blocklist message.
const BLOCKLIST_REASON_ERRORS: usize = 2;

/// Tally of one background batch.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct BatchReport {
    /// Jobs handed to the pool.
    pub submitted: usize,
    pub valid: usize,
    pub flagged: usize,
    pub replaced: usize,
    /// Deferred by a timeout or the daily limit.
    pub queued: usize,
    pub skipped: usize,
    /// Jobs that panicked or were dropped by the pool.
    pub failed: usize,
}

impl BatchReport {
    fn record(&mut self, result: &ScanResult) {
        match result.disposition {
            Disposition::Valid => self.valid += 1,
            Disposition::Flagged => self.flagged += 1,
            Disposition::Replaced => self.replaced += 1,
            Disposition::Queued => self.queued += 1,
            Disposition::Skipped => self.skipped += 1,
        }
    }
}

/// Everything the status endpoint reports about scanning and replacement.
#[derive(Debug, Clone, Serialize)]
pub struct JanitorStatus {
    pub scanner_enabled: bool,
    pub scan_mode: ScanMode,
    pub scan_in_progress: bool,
    pub auto_replace_enabled: bool,
    pub dry_run: bool,
    pub stats: ScanStats,
    pub catalog: CatalogStatus,
    pub replacements: LimiterStatus,
    pub current_period: DailySummary,
}

/// Decides what happens to each file: keep, flag, defer or replace.
pub struct Janitor {
    config: JanitorConfig,
    state: Arc<StateStore>,
    catalog: Arc<CatalogCache>,
    validator: Validator,
    limiter: DailyReplacementLimiter,
    notifications: Arc<Notifications>,
    scan_lock: tokio::sync::Mutex<()>,
    in_flight: Mutex<HashSet<String>>,
}

/// Claim on a path for the duration of one decision.
struct InFlight<'a> {
    paths: &'a Mutex<HashSet<String>>,
    path: String,
}

impl<'a> InFlight<'a> {
    fn claim(paths: &'a Mutex<HashSet<String>>, path: &str) -> Option<Self> {
        paths.lock().insert(path.to_string()).then(|| Self {
            paths,
            path: path.to_string(),
        })
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.paths.lock().remove(&self.path);
    }
}

impl fmt::Debug for Janitor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Janitor")
            .field("state", &self.state)
            .field("limiter", &self.limiter)
            .field("scan_in_progress", &self.scan_lock.try_lock().is_err())
            .finish_non_exhaustive()
    }
}

impl Janitor {
    /// Wires the collaborators together. The limiter starts empty with the
    /// configured daily cap.
    pub fn new(
        config: JanitorConfig,
        state: Arc<StateStore>,
        catalog: Arc<CatalogCache>,
        validator: Validator,
        notifications: Arc<Notifications>,
    ) -> Self {
        let limiter = DailyReplacementLimiter::new(config.actions.max_replacements_per_day);
        Self {
            config,
            state,
            catalog,
            validator,
            limiter,
            notifications,
            scan_lock: tokio::sync::Mutex::new(()),
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    /// Swaps the limiter, e.g. for one driven by a fixed clock.
    pub fn with_limiter(mut self, limiter: DailyReplacementLimiter) -> Self {
        self.limiter = limiter;
        self
    }

    /// Effective configuration.
    pub fn config(&self) -> &JanitorConfig {
        &self.config
    }

    /// Persistent scan state.
    pub fn state(&self) -> &Arc<StateStore> {
        &self.state
    }

    /// Catalog cache and scan queue.
    pub fn catalog(&self) -> &Arc<CatalogCache> {
        &self.catalog
    }

    /// Daily replacement budget.
    pub fn limiter(&self) -> &DailyReplacementLimiter {
        &self.limiter
    }

    /// Notification fan-out and the running daily summary.
    pub fn notifications(&self) -> &Arc<Notifications> {
        &self.notifications
    }

    /// Runs the whole decision procedure for one path and reports the
    /// result to the notification sinks. Never fails; every problem ends up
    /// in the returned disposition.
    ///
    /// A path already being processed, e.g. by a webhook while a batch holds
    /// it, is skipped rather than validated twice.
    pub async fn validate_and_process(&self, path: &str) -> ScanResult {
        let Some(_claim) = InFlight::claim(&self.in_flight, path) else {
            debug!(path, "already being processed, skipping");
            return ScanResult::skipped(path, "already being processed");
        };
        let result = self.decide(path).await;
        if !result.is_skipped() {
            self.notifications.record_result(&result).await;
        }
        result
    }

    async fn decide(&self, path: &str) -> ScanResult {
        match tokio::fs::try_exists(path).await {
            Ok(true) => {}
            Ok(false) => {
                debug!(path, "file no longer exists, skipping");
                return ScanResult::skipped(path, "file no longer exists");
            }
            Err(err) => {
                debug!(path, error = %err, "cannot stat file, skipping");
                return ScanResult::skipped(path, format!("cannot stat file: {err}"));
            }
        }

        let Some((record, instance)) = self.catalog.find_item_by_path(path) else {
            debug!(path, "path not in catalog, skipping");
            return ScanResult::skipped(path, "not found in catalog");
        };

        let mut validation = self.validator.validate(path).await;
        if validation.timed_out {
            info!(path, title = %record.title, "validation timed out, will retry later");
            return outcome(
                &record,
                validation,
                Disposition::Queued,
                Some("validation timed out".into()),
                false,
            );
        }

        let mut wrong_file = false;
        if validation.valid
            && self.config.actions.detect_wrong_files
            && let Some(mismatch) =
                detect_path_mismatch(&record, self.config.actions.mismatch_threshold)
        {
            warn!(
                path,
                title = %record.title,
                expected = %mismatch.expected_folder,
                overlap = mismatch.overlap,
                "file does not match its title"
            );
            validation.fail(mismatch.error_message());
            wrong_file = true;
        }

        let media_type = record.media_type();
        if validation.valid {
            self.state.mark_scanned(path, true, media_type);
            return outcome(&record, validation, Disposition::Valid, None, false);
        }

        if !self.config.actions.auto_replace {
            self.state.mark_scanned(path, false, media_type);
            return outcome(
                &record,
                validation,
                Disposition::Flagged,
                Some("auto replace disabled".into()),
                wrong_file,
            );
        }

        if self.config.actions.dry_run {
            info!(
                path,
                title = %record.title,
                errors = ?validation.errors,
                "dry run: would delete and search for replacement"
            );
            self.state.mark_scanned(path, false, media_type);
            return outcome(
                &record,
                validation,
                Disposition::Flagged,
                Some("dry run".into()),
                wrong_file,
            );
        }

        if !self.limiter.try_reserve() {
            info!(
                path,
                limit = self.limiter.status().max_per_day,
                "daily replacement limit reached, deferring"
            );
            return outcome(
                &record,
                validation,
                Disposition::Queued,
                Some("daily replacement limit reached".into()),
                wrong_file,
            );
        }

        self.replace(record, instance, validation, wrong_file).await
    }

    async fn replace(
        &self,
        record: MediaRecord,
        instance: String,
        validation: ValidationResult,
        wrong_file: bool,
    ) -> ScanResult {
        let path = record.path.clone();
        let media_type = record.media_type();

        let Some(source) = self.catalog.source(&instance, record.source) else {
            warn!(
                path = %path,
                instance = %instance,
                kind = %record.source,
                "owning instance is not configured"
            );
            self.limiter.release();
            self.state.mark_scanned(&path, false, media_type);
            return outcome(
                &record,
                validation,
                Disposition::Flagged,
                Some(format!("unknown instance {instance}")),
                wrong_file,
            );
        };

        if let Err(err) = source.delete_file(record.deletion_key).await {
            warn!(path = %path, instance = %instance, error = %err, "delete failed, leaving file in place");
            self.limiter.release();
            self.state.mark_scanned(&path, false, media_type);
            return outcome(
                &record,
                validation,
                Disposition::Flagged,
                Some(format!("delete failed: {err}")),
                wrong_file,
            );
        }
        info!(path = %path, instance = %instance, title = %record.title, "deleted bad file");

        if self.config.actions.blocklist_bad_releases {
            let message = blocklist_message(&validation.errors);
            match source.add_to_blocklist(&record, &message).await {
                Ok(true) => debug!(path = %path, "release blocklisted"),
                Ok(false) => debug!(path = %path, "no grab history to blocklist"),
                Err(err) => warn!(path = %path, error = %err, "blocklist failed"),
            }
        }

        let detail = match source.search_for_replacement(&record).await {
            Ok(()) => None,
            Err(err) => {
                warn!(path = %path, error = %err, "search failed after delete");
                Some(format!("search failed: {err}"))
            }
        };

        self.state.mark_replaced(
            &path,
            wrong_file,
            &record.title,
            &validation.errors.join("; "),
            media_type,
        );
        self.catalog.remove_from_queue(&path);
        info!(
            target: "janitor::scan",
            path = %path,
            title = %record.title,
            used = self.limiter.used_today(),
            "file replaced"
        );
        outcome(&record, validation, Disposition::Replaced, detail, wrong_file)
    }

    /// Background tick: refreshes when the queue is empty, then processes
    /// one batch. Does nothing when the scanner is disabled, a scan is
    /// already running, or watch-only mode has finished its initial sweep.
    pub async fn run_background_scan(&self, pool: &ValidationPool) -> Option<BatchReport> {
        let scanner = &self.config.scanner;
        if !scanner.enabled {
            return None;
        }
        if scanner.mode == ScanMode::WatchOnly && self.state.is_initial_scan_done() {
            debug!("initial scan done, watch-only mode idle");
            return None;
        }
        self.scan_batch(pool).await
    }

    /// Processes one batch regardless of scanner mode.
    pub async fn scan_batch(&self, pool: &ValidationPool) -> Option<BatchReport> {
        let Ok(_running) = self.scan_lock.try_lock() else {
            debug!("background scan already running");
            return None;
        };

        if self.catalog.queue_len() == 0 {
            let queued = self.catalog.refresh(SourceFilter::All).await;
            if queued == 0 {
                self.check_initial_scan_complete();
                return None;
            }
        }

        let batch = self.catalog.next_batch(self.config.scanner.batch_size());
        let mut report = BatchReport::default();
        let mut tickets = Vec::with_capacity(batch.len());
        for (i, record) in batch.iter().enumerate() {
            if i > 0 {
                tokio::time::sleep(self.config.scanner.item_delay()).await;
            }
            match pool.enqueue(record.path.as_str()).await {
                Ok(ticket) => tickets.push(ticket),
                Err(err) => {
                    warn!(path = %record.path, error = %err, "could not submit file");
                    report.failed += 1;
                }
            }
        }
        report.submitted = tickets.len();

        for ticket in tickets {
            let path = ticket.path().to_string();
            match ticket.wait().await {
                Ok(result) => report.record(&result),
                Err(err) => {
                    warn!(path = %path, error = %err, "validation job failed");
                    report.failed += 1;
                }
            }
        }

        let stats = self.state.get_stats();
        info!(
            target: "janitor::scan",
            submitted = report.submitted,
            valid = report.valid,
            replaced = report.replaced,
            flagged = report.flagged,
            queued = report.queued,
            failed = report.failed,
            remaining = self.catalog.queue_len(),
            progress = format!(
                "{}/{}",
                stats.movies_scanned + stats.tv_scanned,
                stats.movies_total + stats.tv_total
            ),
            "batch complete"
        );
        self.check_initial_scan_complete();
        Some(report)
    }

    /// Marks the initial scan complete once the queue is drained after a
    /// refresh and every media type has been scanned up to its library
    /// total. Returns whether the scan is complete.
    pub fn check_initial_scan_complete(&self) -> bool {
        if self.state.is_initial_scan_done() {
            return true;
        }
        if self.catalog.queue_len() > 0 || !self.catalog.has_refreshed() {
            return false;
        }
        let stats = self.state.get_stats();
        if stats.movies_scanned < stats.movies_total || stats.tv_scanned < stats.tv_total {
            debug!(
                movies = format!("{}/{}", stats.movies_scanned, stats.movies_total),
                tv = format!("{}/{}", stats.tv_scanned, stats.tv_total),
                "queue empty but library not fully scanned"
            );
            return false;
        }
        self.state.mark_scan_completed();
        info!(target: "janitor::scan", "initial scan complete");
        true
    }

    /// Forgets every scan record and today's replacement usage so the
    /// whole library is scanned again.
    pub fn clear_state(&self) {
        self.state.clear();
        self.limiter.reset();
        info!("scan state cleared");
    }

    /// Re-fetches the selected catalogs. Returns how many files were queued.
    pub async fn refresh_library(&self, filter: SourceFilter) -> usize {
        self.catalog.refresh(filter).await
    }

    /// Periodic Sonarr-only refresh.
    pub async fn refresh_tv_library(&self) -> usize {
        self.refresh_library(SourceFilter::Tv).await
    }

    /// Sends the period summary with duplicate and mismatch counts for the
    /// cached movie library. Returns how many sinks accepted it.
    pub async fn send_daily_summary(&self) -> usize {
        let movies = self.catalog.get_cached_media(SourceFilter::Movies);
        let duplicates = find_duplicates(&movies).count;
        let mismatches = if self.config.actions.detect_wrong_files {
            find_mismatches(&movies, self.config.actions.mismatch_threshold).count
        } else {
            0
        };
        self.notifications.send_summary(duplicates, mismatches).await
    }

    /// Snapshot for the status endpoint.
    pub fn status(&self) -> JanitorStatus {
        JanitorStatus {
            scanner_enabled: self.config.scanner.enabled,
            scan_mode: self.config.scanner.mode,
            scan_in_progress: self.scan_lock.try_lock().is_err(),
            auto_replace_enabled: self.config.actions.auto_replace,
            dry_run: self.config.actions.dry_run,
            stats: self.state.get_stats(),
            catalog: self.catalog.status(),
            replacements: self.limiter.status(),
            current_period: self.notifications.current_summary(),
        }
    }
}

#[async_trait]
impl FileProcessor for Janitor {
    async fn process(&self, path: &str) -> ScanResult {
        self.validate_and_process(path).await
    }
}

fn blocklist_message(errors: &[String]) -> String {
    let quoted: Vec<&str> = errors
        .iter()
        .take(BLOCKLIST_REASON_ERRORS)
        .map(String::as_str)
        .collect();
    format!("Blocked by media-janitor: {}", quoted.join(", "))
}

fn outcome(
    record: &MediaRecord,
    validation: ValidationResult,
    disposition: Disposition,
    detail: Option<String>,
    wrong_file: bool,
) -> ScanResult {
    ScanResult {
        file_path: record.path.clone(),
        title: record.title.clone(),
        media_type: record.media_type(),
        valid: validation.valid,
        errors: validation.errors,
        warnings: validation.warnings,
        disposition,
        detail,
        wrong_file,
        timestamp: Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocklist_message_quotes_first_two_errors() {
        let errors = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        assert_eq!(blocklist_message(&errors), "Blocked by media-janitor: a, b");
        assert_eq!(blocklist_message(&[]), "Blocked by media-janitor: ");
    }
}
