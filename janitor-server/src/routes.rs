use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::handlers::{reports, scan, status, webhook};
use crate::infra::app_state::AppState;

pub fn create_app(state: AppState) -> Router {
    let mut router = Router::new()
        .route("/health", get(status::health))
        .route("/status", get(status::status))
        .route("/scan/trigger", post(scan::trigger_scan))
        .route("/scan/refresh", post(scan::refresh_library))
        .route("/state/clear", post(scan::clear_state))
        .nest("/report", report_routes());

    if state.config.server.webhooks_enabled {
        router = router.nest("/webhook", webhook_routes());
    }

    router.layer(TraceLayer::new_for_http()).with_state(state)
}

fn webhook_routes() -> Router<AppState> {
    Router::new()
        .route("/radarr", post(webhook::radarr_webhook))
        .route("/sonarr", post(webhook::sonarr_webhook))
        .route("/test", post(webhook::test_webhook))
}

fn report_routes() -> Router<AppState> {
    Router::new()
        .route("/replaced", get(reports::replaced))
        .route("/missing", get(reports::missing))
        .route("/mismatches", get(reports::mismatches))
        .route("/duplicates", get(reports::duplicates))
        .route("/orphans", get(reports::orphans))
        .route("/library", get(reports::library))
}
