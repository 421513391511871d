//! Record, config and filesystem builders.

use std::path::Path;

use janitor_core::config::{JanitorConfig, ValidationConfig};
use janitor_model::{
    DeletionKey, EpisodeCoordinates, EpisodeId, MediaRecord, SearchKey, SeriesId, SourceKind,
};

pub fn movie(title: &str, year: i32, path: &str, search: i64, file: i64) -> MediaRecord {
    let folder = Path::new(path)
        .parent()
        .map(|p| p.to_string_lossy().into_owned());
    MediaRecord {
        title: title.to_string(),
        path: path.to_string(),
        search_key: SearchKey::new(search),
        deletion_key: DeletionKey::new(file),
        quality: "Bluray-1080p".to_string(),
        size_bytes: 8 * 1024 * 1024 * 1024,
        source: SourceKind::Radarr,
        instance: "radarr".to_string(),
        year: Some(year),
        folder_path: folder,
        series_id: None,
        episode_id: None,
        coordinates: None,
    }
}

pub fn episode(
    series: &str,
    path: &str,
    series_id: i64,
    episode_id: Option<i64>,
    file: i64,
    season: u32,
    number: u32,
) -> MediaRecord {
    let coordinates = EpisodeCoordinates::new(season, number);
    MediaRecord {
        title: format!("{series} - {coordinates}"),
        path: path.to_string(),
        search_key: SearchKey::new(series_id),
        deletion_key: DeletionKey::new(file),
        quality: "WEBDL-1080p".to_string(),
        size_bytes: 1024 * 1024 * 1024,
        source: SourceKind::Sonarr,
        instance: "sonarr".to_string(),
        year: None,
        folder_path: None,
        series_id: Some(SeriesId::new(series_id)),
        episode_id: episode_id.map(EpisodeId::new),
        coordinates: Some(coordinates),
    }
}

/// ffprobe JSON for a 1080p H.264 file of the given length.
pub fn probe_json(duration_seconds: f64) -> String {
    format!(
        r#"{{
            "streams": [
                {{"codec_name": "h264", "codec_type": "video", "width": 1920,
                  "height": 1080, "bit_rate": "8000000"}},
                {{"codec_name": "aac", "codec_type": "audio"}}
            ],
            "format": {{"duration": "{duration_seconds}", "bit_rate": "8500000",
                        "format_name": "matroska,webm"}}
        }}"#
    )
}

/// Validation settings that keep the deep scan but skip the full decode.
pub fn validation_config() -> ValidationConfig {
    ValidationConfig {
        sample_duration_seconds: 30,
        full_decode_enabled: false,
        reject_3d: false,
        ..ValidationConfig::default()
    }
}

pub fn janitor_config() -> JanitorConfig {
    let mut config = JanitorConfig::default();
    config.validation = validation_config();
    config.actions.auto_replace = true;
    config.actions.dry_run = false;
    config.actions.blocklist_bad_releases = true;
    config.actions.detect_wrong_files = true;
    config.actions.max_replacements_per_day = 10;
    config.scanner.item_delay_millis = 0;
    config
}

/// Creates an empty file (and its parents) under `root`, returning the full
/// path as a string.
pub fn touch(root: &Path, relative: &str) -> String {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("create fixture dirs");
    }
    std::fs::write(&path, b"").expect("write fixture file");
    path.to_string_lossy().into_owned()
}
