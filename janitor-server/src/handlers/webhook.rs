//! Radarr/Sonarr "on import" webhooks.
//!
//! Imported files are upserted into the catalog cache and validated on the
//! pool. Payloads without a file id or path are rejected here.

use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, info, warn};

use janitor_core::sources::SourceCatalog;
use janitor_core::sources::episode_parse::{episode_title, parse_coordinates};
use janitor_core::sources::payloads::ArrFile;
use janitor_model::{
    DeletionKey, EpisodeCoordinates, EpisodeId, MediaRecord, SearchKey, SeriesId,
    SourceKind,
};

use crate::infra::app_state::AppState;
use crate::infra::errors::{AppError, AppResult};

#[derive(Debug, Deserialize)]
#[serde(tag = "eventType")]
pub enum RadarrEvent {
    #[serde(alias = "MovieFileImported")]
    Download(RadarrImport),
    Test,
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RadarrImport {
    #[serde(default)]
    pub instance_name: Option<String>,
    pub movie: WebhookMovie,
    #[serde(default)]
    pub movie_file: Option<ArrFile>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookMovie {
    pub id: i64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub folder_path: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "eventType")]
pub enum SonarrEvent {
    #[serde(alias = "EpisodeFileImported")]
    Download(SonarrImport),
    Test,
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SonarrImport {
    #[serde(default)]
    pub instance_name: Option<String>,
    pub series: WebhookSeries,
    #[serde(default)]
    pub episodes: Vec<WebhookEpisode>,
    #[serde(default)]
    pub episode_file: Option<ArrFile>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookSeries {
    pub id: i64,
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookEpisode {
    pub id: i64,
    #[serde(default)]
    pub season_number: Option<u32>,
    #[serde(default)]
    pub episode_number: Option<u32>,
}

pub async fn radarr_webhook(
    State(state): State<AppState>,
    Json(event): Json<RadarrEvent>,
) -> AppResult<(StatusCode, Json<Value>)> {
    let import = match event {
        RadarrEvent::Download(import) => import,
        RadarrEvent::Test => return Ok(test_received(SourceKind::Radarr)),
        RadarrEvent::Other => return Ok(ignored(SourceKind::Radarr)),
    };

    let source = resolve_source(&state, SourceKind::Radarr, import.instance_name.as_deref())?;
    let file = import
        .movie_file
        .ok_or_else(|| AppError::bad_request("Payload has no movieFile"))?;
    let (file_id, raw_path) = file_keys(&file)?;

    let movie = import.movie;
    let record = MediaRecord {
        title: movie.title.unwrap_or_else(|| "Unknown Movie".to_string()),
        path: source.translate_path(raw_path),
        search_key: SearchKey::new(movie.id),
        deletion_key: DeletionKey::new(file_id),
        quality: file.quality_name(),
        size_bytes: file.size.unwrap_or(0),
        source: SourceKind::Radarr,
        instance: source.name().to_string(),
        year: movie.year,
        folder_path: movie.folder_path.map(|p| source.translate_path(&p)),
        series_id: None,
        episode_id: None,
        coordinates: None,
    };
    accept(&state, record)
}

pub async fn sonarr_webhook(
    State(state): State<AppState>,
    Json(event): Json<SonarrEvent>,
) -> AppResult<(StatusCode, Json<Value>)> {
    let import = match event {
        SonarrEvent::Download(import) => import,
        SonarrEvent::Test => return Ok(test_received(SourceKind::Sonarr)),
        SonarrEvent::Other => return Ok(ignored(SourceKind::Sonarr)),
    };

    let source = resolve_source(&state, SourceKind::Sonarr, import.instance_name.as_deref())?;
    let file = import
        .episode_file
        .ok_or_else(|| AppError::bad_request("Payload has no episodeFile"))?;
    let (file_id, raw_path) = file_keys(&file)?;

    let episode = import.episodes.first();
    let coordinates = match episode {
        Some(ep) if ep.season_number.is_some() || ep.episode_number.is_some() => {
            EpisodeCoordinates {
                season: ep.season_number,
                episode: ep.episode_number,
            }
        }
        _ => parse_coordinates(raw_path),
    };
    let series_title = import.series.title.as_deref().unwrap_or("Unknown");
    let record = MediaRecord {
        title: episode_title(series_title, &coordinates),
        path: source.translate_path(raw_path),
        search_key: SearchKey::new(import.series.id),
        deletion_key: DeletionKey::new(file_id),
        quality: file.quality_name(),
        size_bytes: file.size.unwrap_or(0),
        source: SourceKind::Sonarr,
        instance: source.name().to_string(),
        year: None,
        folder_path: None,
        series_id: Some(SeriesId::new(import.series.id)),
        episode_id: episode.map(|ep| EpisodeId::new(ep.id)),
        coordinates: Some(coordinates),
    };
    accept(&state, record)
}

/// Echo endpoint for checking connectivity from the *arr side.
pub async fn test_webhook(Json(payload): Json<Value>) -> Json<Value> {
    info!("test webhook received");
    Json(json!({ "status": "ok", "received": payload }))
}

/// The named instance of `kind`. Only a payload that names no instance
/// falls back to the first one of that kind; an unknown name is rejected so
/// file ids are never attributed to an instance that did not issue them.
fn resolve_source(
    state: &AppState,
    kind: SourceKind,
    instance_name: Option<&str>,
) -> AppResult<Arc<dyn SourceCatalog>> {
    let sources = state.janitor.catalog().sources();
    match instance_name.map(str::trim).filter(|name| !name.is_empty()) {
        Some(name) => sources
            .iter()
            .find(|s| s.kind() == kind && s.name() == name)
            .cloned()
            .ok_or_else(|| {
                warn!(instance = %name, kind = %kind, "webhook names an unknown instance");
                AppError::not_found(format!("No {kind} instance named '{name}'"))
            }),
        None => sources
            .iter()
            .find(|s| s.kind() == kind)
            .cloned()
            .ok_or_else(|| AppError::not_found(format!("No {kind} instance configured"))),
    }
}

fn file_keys(file: &ArrFile) -> AppResult<(i64, &str)> {
    match (file.id, file.best_path()) {
        (Some(id), Some(path)) => Ok((id, path)),
        (None, _) => Err(AppError::bad_request("Payload file has no id")),
        (_, None) => Err(AppError::bad_request("Payload file has no path")),
    }
}

fn accept(state: &AppState, record: MediaRecord) -> AppResult<(StatusCode, Json<Value>)> {
    let path = record.path.clone();
    info!(
        path = %path,
        title = %record.title,
        instance = %record.instance,
        "imported file received"
    );
    state.janitor.catalog().add_to_cache(record);
    state.pool.submit(path.as_str())?;
    Ok((
        StatusCode::ACCEPTED,
        Json(json!({ "status": "queued", "file": path })),
    ))
}

fn test_received(kind: SourceKind) -> (StatusCode, Json<Value>) {
    info!(source = %kind, "test event received");
    (StatusCode::OK, Json(json!({ "status": "ok", "event": "Test" })))
}

fn ignored(kind: SourceKind) -> (StatusCode, Json<Value>) {
    debug!(source = %kind, "ignoring webhook event");
    (
        StatusCode::OK,
        Json(json!({ "status": "ignored", "reason": "event type not processed" })),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn radarr_download_and_import_alias_parse() {
        let payload = json!({
            "eventType": "MovieFileImported",
            "instanceName": "radarr-4k",
            "movie": { "id": 12, "title": "Alien", "year": 1979 },
            "movieFile": { "id": 34, "path": "/movies/Alien (1979)/Alien.mkv" }
        });
        match serde_json::from_value::<RadarrEvent>(payload).expect("payload parses") {
            RadarrEvent::Download(import) => {
                assert_eq!(import.instance_name.as_deref(), Some("radarr-4k"));
                assert_eq!(import.movie.id, 12);
                assert_eq!(import.movie_file.and_then(|f| f.id), Some(34));
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn unknown_events_fall_through() {
        let payload = json!({ "eventType": "Grab", "movie": { "id": 1 } });
        assert!(matches!(
            serde_json::from_value::<RadarrEvent>(payload),
            Ok(RadarrEvent::Other)
        ));
        let payload = json!({ "eventType": "Test", "series": { "id": 1 } });
        assert!(matches!(
            serde_json::from_value::<SonarrEvent>(payload),
            Ok(SonarrEvent::Test)
        ));
    }

    #[test]
    fn missing_file_id_is_rejected() {
        let file: ArrFile =
            serde_json::from_value(json!({ "path": "/tv/a.mkv" })).expect("file parses");
        let err = file_keys(&file).expect_err("id is required");
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }
}
