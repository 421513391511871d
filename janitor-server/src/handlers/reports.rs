//! Read-only library reports. None of these write scan state.

use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;

use janitor_core::reports::{
    DuplicateReport, LibraryReport, MismatchReport, MissingReport, OrphanReport,
    REPLACED_REPORT_LIMIT, ReplacedReport, find_duplicates, find_mismatches,
    find_missing, library_report, orphan_report,
};
use janitor_model::SourceFilter;

use super::scan::SourceQuery;
use crate::infra::app_state::AppState;
use crate::infra::errors::{AppError, AppResult};

const DEFAULT_TOP_N: usize = 10;
const MAX_TOP_N: usize = 500;

#[derive(Debug, Default, Deserialize)]
pub struct LibraryQuery {
    #[serde(default)]
    pub top_n: Option<usize>,
    #[serde(default)]
    pub source: Option<String>,
}

pub async fn replaced(State(state): State<AppState>) -> Json<ReplacedReport> {
    let store = state.janitor.state();
    let total = store.get_stats().total_replaced;
    Json(ReplacedReport::new(
        total,
        store.replacements(REPLACED_REPORT_LIMIT),
    ))
}

pub async fn missing(State(state): State<AppState>) -> AppResult<Json<MissingReport>> {
    let records = loaded_media(&state, SourceFilter::All)?;
    Ok(Json(find_missing(&records).await))
}

pub async fn mismatches(
    State(state): State<AppState>,
    Query(query): Query<SourceQuery>,
) -> AppResult<Json<MismatchReport>> {
    let records = loaded_media(&state, query.filter()?)?;
    let threshold = state.janitor.config().actions.mismatch_threshold;
    Ok(Json(find_mismatches(&records, threshold)))
}

pub async fn duplicates(
    State(state): State<AppState>,
    Query(query): Query<SourceQuery>,
) -> AppResult<Json<DuplicateReport>> {
    let records = loaded_media(&state, query.filter()?)?;
    Ok(Json(find_duplicates(&records)))
}

pub async fn orphans(State(state): State<AppState>) -> AppResult<Json<OrphanReport>> {
    let Some(watch) = state.watch.as_ref() else {
        return Err(AppError::bad_request("Plex integration not enabled"));
    };
    ensure_loaded(&state)?;
    let catalog_paths = state.janitor.catalog().all_paths();
    Ok(Json(orphan_report(watch.as_ref(), &catalog_paths).await?))
}

pub async fn library(
    State(state): State<AppState>,
    Query(query): Query<LibraryQuery>,
) -> AppResult<Json<LibraryReport>> {
    let filter = SourceQuery {
        source: query.source,
    }
    .filter()?;
    let top_n = query.top_n.unwrap_or(DEFAULT_TOP_N).clamp(1, MAX_TOP_N);
    let records = loaded_media(&state, filter)?;
    Ok(Json(library_report(&records, top_n)))
}

fn ensure_loaded(state: &AppState) -> AppResult<()> {
    if state.janitor.catalog().has_refreshed() {
        Ok(())
    } else {
        Err(AppError::unavailable(
            "Library cache not loaded yet; try again after the first refresh",
        ))
    }
}

fn loaded_media(
    state: &AppState,
    filter: SourceFilter,
) -> AppResult<Vec<janitor_model::MediaRecord>> {
    ensure_loaded(state)?;
    Ok(state.janitor.catalog().get_cached_media(filter))
}
