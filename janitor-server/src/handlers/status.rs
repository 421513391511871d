use axum::{Json, extract::State};
use serde::Serialize;
use serde_json::{Value, json};

use janitor_core::orchestration::JanitorStatus;

use crate::infra::app_state::AppState;

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub webhooks_enabled: bool,
    pub watch_history: bool,
    pub pool: PoolStatus,
    #[serde(flatten)]
    pub janitor: JanitorStatus,
}

#[derive(Debug, Serialize)]
pub struct PoolStatus {
    pub workers: usize,
    pub pending: usize,
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}

pub async fn status(State(state): State<AppState>) -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "running",
        version: env!("CARGO_PKG_VERSION"),
        webhooks_enabled: state.config.server.webhooks_enabled,
        watch_history: state.watch.is_some(),
        pool: PoolStatus {
            workers: state.pool.worker_count(),
            pending: state.pool.pending(),
        },
        janitor: state.janitor.status(),
    })
}
