use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::info;

use janitor_model::SourceFilter;

use crate::infra::app_state::AppState;
use crate::infra::errors::{AppError, AppResult};

#[derive(Debug, Default, Deserialize)]
pub struct SourceQuery {
    #[serde(default)]
    pub source: Option<String>,
}

impl SourceQuery {
    /// Parsed filter; absent means every source.
    pub fn filter(&self) -> AppResult<SourceFilter> {
        match self.source.as_deref() {
            None => Ok(SourceFilter::All),
            Some(raw) => raw
                .parse()
                .map_err(|err: janitor_model::ParseSourceFilterError| {
                    AppError::bad_request(err.to_string())
                }),
        }
    }
}

/// Runs one batch in the background, ignoring the watch-only gate.
pub async fn trigger_scan(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    let janitor = state.janitor.clone();
    let pool = state.pool.clone();
    tokio::spawn(async move {
        match janitor.scan_batch(&pool).await {
            Some(report) => info!(?report, "triggered scan finished"),
            None => info!("triggered scan had nothing to do"),
        }
    });
    (
        StatusCode::ACCEPTED,
        Json(json!({ "status": "ok", "message": "Scan triggered" })),
    )
}

pub async fn refresh_library(
    State(state): State<AppState>,
    Query(query): Query<SourceQuery>,
) -> AppResult<Json<Value>> {
    let filter = query.filter()?;
    let queued = state.janitor.refresh_library(filter).await;
    Ok(Json(json!({
        "status": "ok",
        "files_to_scan": queued,
        "source": filter,
    })))
}

pub async fn clear_state(State(state): State<AppState>) -> Json<Value> {
    state.janitor.clear_state();
    Json(json!({
        "status": "ok",
        "message": "State cleared, will re-scan all files",
    }))
}
