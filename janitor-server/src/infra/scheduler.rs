//! Periodic background work: batch scans, TV refreshes and the daily
//! summary. Every task stops when the shared token is cancelled.

use std::time::Duration;

use chrono::{Local, NaiveDateTime, NaiveTime, TimeDelta};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use janitor_model::SourceFilter;

use super::app_state::AppState;
use super::config::validation::{FALLBACK_SUMMARY_TIME, parse_summary_time};

#[derive(Debug)]
pub struct Scheduler {
    shutdown: CancellationToken,
    handles: Vec<JoinHandle<()>>,
}

impl Scheduler {
    pub fn start(state: AppState, shutdown: CancellationToken) -> Self {
        let mut handles = vec![
            tokio::spawn(scan_loop(state.clone(), shutdown.clone())),
            tokio::spawn(summary_loop(state.clone(), shutdown.clone())),
        ];
        let tv_hours = state.config.janitor.scanner.tv_refresh_hours;
        if tv_hours > 0 {
            handles.push(tokio::spawn(tv_refresh_loop(
                state,
                shutdown.clone(),
                Duration::from_secs(tv_hours * 3600),
            )));
        }
        info!(tasks = handles.len(), "scheduler started");
        Self { shutdown, handles }
    }

    /// Cancels every task and waits for them to return.
    pub async fn stop(self) {
        self.shutdown.cancel();
        for handle in self.handles {
            if let Err(err) = handle.await {
                warn!(error = %err, "scheduled task ended abnormally");
            }
        }
        info!("scheduler stopped");
    }
}

async fn scan_loop(state: AppState, shutdown: CancellationToken) {
    let queued = tokio::select! {
        _ = shutdown.cancelled() => return,
        queued = state.janitor.refresh_library(SourceFilter::All) => queued,
    };
    info!(queued, "initial library refresh complete");

    if !state.config.janitor.scanner.enabled {
        info!("background scanner disabled; relying on webhooks");
        return;
    }

    let mut ticker = tokio::time::interval(state.config.janitor.scanner.batch_interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = ticker.tick() => {
                if let Some(report) = state.janitor.run_background_scan(&state.pool).await {
                    debug!(?report, "background batch finished");
                }
            }
        }
    }
}

async fn tv_refresh_loop(state: AppState, shutdown: CancellationToken, period: Duration) {
    let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = ticker.tick() => {
                let queued = state.janitor.refresh_tv_library().await;
                info!(target: "janitor::refresh", queued, "scheduled tv refresh complete");
            }
        }
    }
}

async fn summary_loop(state: AppState, shutdown: CancellationToken) {
    let configured = &state.config.janitor.notifications.daily_summary_time;
    let at = parse_summary_time(configured)
        .or_else(|| parse_summary_time(FALLBACK_SUMMARY_TIME))
        .unwrap_or(NaiveTime::MIN);

    let mut next = next_occurrence(Local::now().naive_local(), at);
    info!(next = %next, "daily summary scheduled");
    loop {
        let wait = (next - Local::now().naive_local())
            .to_std()
            .unwrap_or(Duration::ZERO);
        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = tokio::time::sleep(wait) => {
                let delivered = state.janitor.send_daily_summary().await;
                info!(delivered, "daily summary sent");
                next += TimeDelta::days(1);
            }
        }
    }
}

/// First time strictly after `now` whose wall-clock time is `at`.
pub fn next_occurrence(now: NaiveDateTime, at: NaiveTime) -> NaiveDateTime {
    let today = now.date().and_time(at);
    if today > now {
        today
    } else {
        today + TimeDelta::days(1)
    }
}
