mod support;

use axum::http::StatusCode;
use serde_json::json;

use janitor_model::SourceFilter;
use support::{TestApp, movie};

fn library() -> Vec<janitor_model::MediaRecord> {
    vec![
        movie("Alien", 1979, "/local/movies/Alien (1979)/Alien.1979.mkv", 1, 8_000_000_000),
        movie("Alien", 1979, "/local/movies/Alien (1979)/Alien.1979.720p.mkv", 2, 3_000_000_000),
        movie("Heat", 1995, "/local/movies/Heat (1995)/Heat.1995.mkv", 3, 12_000_000_000),
    ]
}

#[tokio::test]
async fn health_and_status_respond() {
    let app = TestApp::build(library(), true).await;

    let (status, body) = app.get("/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    let (status, body) = app.get("/status").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "running");
    assert_eq!(body["scanner_enabled"], true);
    assert_eq!(body["pool"]["workers"], 1);
    assert_eq!(body["replacements"]["max_per_day"], 10);
}

#[tokio::test]
async fn radarr_import_is_cached_and_queued() {
    let app = TestApp::build(library(), true).await;
    let payload = json!({
        "eventType": "Download",
        "instanceName": "radarr",
        "movie": { "id": 77, "title": "Thief", "year": 1981, "folderPath": "/remote/movies/Thief (1981)" },
        "movieFile": {
            "id": 501,
            "path": "/remote/movies/Thief (1981)/Thief.1981.mkv",
            "size": 1024,
            "quality": { "quality": { "name": "Bluray-1080p" } }
        }
    });

    let (status, body) = app.post_json("/webhook/radarr", &payload).await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body["status"], "queued");
    assert_eq!(body["file"], "/local/movies/Thief (1981)/Thief.1981.mkv");

    let (record, instance) = app
        .state
        .janitor
        .catalog()
        .find_item_by_path("/local/movies/Thief (1981)/Thief.1981.mkv")
        .expect("webhook item cached");
    assert_eq!(instance, "radarr");
    assert_eq!(record.deletion_key.get(), 501);
    assert_eq!(record.search_key.get(), 77);
    assert_eq!(record.folder_path.as_deref(), Some("/local/movies/Thief (1981)"));
}

#[tokio::test]
async fn sonarr_import_uses_series_and_episode_ids() {
    let app = TestApp::build(Vec::new(), true).await;
    let payload = json!({
        "eventType": "EpisodeFileImported",
        "series": { "id": 9, "title": "Severance" },
        "episodes": [{ "id": 404, "seasonNumber": 2, "episodeNumber": 3 }],
        "episodeFile": { "id": 808, "path": "/remote/tv/Severance/S02E03.mkv" }
    });

    let (status, _) = app.post_json("/webhook/sonarr", &payload).await;
    assert_eq!(status, StatusCode::ACCEPTED);

    let (record, instance) = app
        .state
        .janitor
        .catalog()
        .find_item_by_path("/local/tv/Severance/S02E03.mkv")
        .expect("webhook item cached");
    assert_eq!(instance, "sonarr");
    assert_eq!(record.title, "Severance - S02E03");
    assert_eq!(record.search_key.get(), 9);
    assert_eq!(record.deletion_key.get(), 808);
    assert_eq!(record.episode_id.map(|id| id.get()), Some(404));
}

#[tokio::test]
async fn webhook_from_unknown_instance_is_not_cached() {
    let app = TestApp::build(library(), true).await;
    let payload = json!({
        "eventType": "Download",
        "instanceName": "radarr-4k",
        "movie": { "id": 77, "title": "Thief", "year": 1981 },
        "movieFile": { "id": 501, "path": "/remote/movies/Thief (1981)/Thief.1981.mkv" }
    });

    let (status, body) = app.post_json("/webhook/radarr", &payload).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["status"], 404);
    assert!(
        app.state
            .janitor
            .catalog()
            .find_item_by_path("/local/movies/Thief (1981)/Thief.1981.mkv")
            .is_none()
    );
    assert_eq!(app.state.pool.pending(), 0);
}

#[tokio::test]
async fn webhook_rejects_files_without_id_or_path() {
    let app = TestApp::build(library(), true).await;
    let no_id = json!({
        "eventType": "Download",
        "movie": { "id": 1 },
        "movieFile": { "path": "/remote/movies/x.mkv" }
    });
    let (status, body) = app.post_json("/webhook/radarr", &no_id).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["status"], 400);

    let no_path = json!({
        "eventType": "Download",
        "movie": { "id": 1 },
        "movieFile": { "id": 5 }
    });
    let (status, _) = app.post_json("/webhook/radarr", &no_path).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn other_events_are_ignored_and_test_is_acknowledged() {
    let app = TestApp::build(library(), true).await;

    let (status, body) = app
        .post_json("/webhook/radarr", &json!({ "eventType": "Grab", "movie": { "id": 1 } }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ignored");

    let (status, body) = app
        .post_json("/webhook/sonarr", &json!({ "eventType": "Test" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    let (status, body) = app
        .post_json("/webhook/test", &json!({ "hello": "world" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["received"]["hello"], "world");
}

#[tokio::test]
async fn disabled_webhooks_are_not_routed() {
    let app = TestApp::build(library(), false).await;
    let (status, _) = app
        .post_json("/webhook/radarr", &json!({ "eventType": "Test" }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn reports_wait_for_first_refresh() {
    let app = TestApp::build(library(), true).await;
    let (status, _) = app.get("/report/library").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

    // The replaced report reads state only.
    let (status, body) = app.get("/report/replaced").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 0);
}

#[tokio::test]
async fn library_reports_after_refresh() {
    let app = TestApp::build(library(), true).await;
    app.state.janitor.refresh_library(SourceFilter::All).await;

    let (status, body) = app.get("/report/library?top_n=1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_files"], 3);
    assert_eq!(body["largest_files"].as_array().map(Vec::len), Some(1));
    assert_eq!(body["largest_files"][0]["title"], "Heat");

    let (status, body) = app.get("/report/duplicates?source=movies").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);
    assert_eq!(body["total_potential_savings_bytes"], 3_000_000_000u64);

    let (status, body) = app.get("/report/missing").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 3);

    let (status, _) = app.get("/report/duplicates?source=music").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn orphans_need_a_media_server() {
    let app = TestApp::build(library(), true).await;
    let (status, body) = app.get("/report/orphans").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(
        body["error"]["message"]
            .as_str()
            .is_some_and(|m| m.contains("Plex"))
    );
}

#[tokio::test]
async fn refresh_and_clear_endpoints() {
    let app = TestApp::build(library(), true).await;

    let (status, body) = app.post("/scan/refresh?source=movies").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["files_to_scan"], 3);
    assert_eq!(body["source"], "movies");

    let (status, _) = app.post("/scan/refresh?source=music").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    app.state
        .janitor
        .state()
        .mark_scanned("/local/movies/Heat (1995)/Heat.1995.mkv", true, janitor_model::MediaType::Movie);
    let (status, body) = app.post("/state/clear").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(app.state.janitor.state().get_stats().total_scanned, 0);
}
