use std::collections::HashMap;

use async_trait::async_trait;
use futures::{StreamExt, TryStreamExt, stream};
use tracing::{debug, info, warn};

use janitor_model::{
    DeletionKey, EpisodeCoordinates, EpisodeId, MediaRecord, SearchKey,
    SeriesId, SourceKind,
};

use super::SourceCatalog;
use super::episode_parse::{episode_title, parse_coordinates};
use super::http::ArrHttp;
use super::path_map::PathTranslator;
use super::payloads::{
    ArrCommand, ArrFile, HistoryPage, SonarrEpisode, SonarrSeries, latest_grab,
};
use crate::config::InstanceConfig;
use crate::error::SourceError;

const SERIES_FETCH_CONCURRENCY: usize = 4;

/// Per-episode source catalog.
///
/// Records carry the series id as their search key; the episode to search
/// for is the explicit `episode_id`, or a lookup by coordinates when the
/// file could not be joined to an episode.
#[derive(Debug, Clone)]
pub struct SonarrClient {
    http: ArrHttp,
    paths: PathTranslator,
}

impl SonarrClient {
    /// Builds a client for one configured Sonarr instance.
    pub fn new(instance: &InstanceConfig) -> Result<Self, SourceError> {
        Ok(Self {
            http: ArrHttp::new(&instance.name, &instance.url, &instance.api_key)?,
            paths: PathTranslator::new(instance.path_mappings.clone()),
        })
    }

    async fn episodes(
        &self,
        series_id: SeriesId,
    ) -> Result<Vec<SonarrEpisode>, SourceError> {
        self.http
            .get("episode", &[("seriesId", series_id.to_string())])
            .await
    }

    async fn series_records(
        &self,
        series: SonarrSeries,
    ) -> Result<Vec<MediaRecord>, SourceError> {
        let series_id = SeriesId::new(series.id);
        let params = [("seriesId", series_id.to_string())];
        let episodes = self.episodes(series_id).await?;
        let files: Vec<ArrFile> = self.http.get("episodefile", &params).await?;
        Ok(self.join_series(&series, episodes, files))
    }

    /// Joins bulk episode files to their episodes. Files without a matching
    /// episode fall back to coordinates parsed from their path.
    pub fn join_series(
        &self,
        series: &SonarrSeries,
        episodes: Vec<SonarrEpisode>,
        files: Vec<ArrFile>,
    ) -> Vec<MediaRecord> {
        let mut by_file: HashMap<i64, SonarrEpisode> = HashMap::new();
        for episode in episodes.into_iter().filter(|e| e.has_file) {
            let Some(file_id) = episode.episode_file_id else {
                continue;
            };
            // Multi-episode files keep the earliest episode.
            let keep_existing = by_file.get(&file_id).is_some_and(|existing| {
                (existing.season_number, existing.episode_number)
                    <= (episode.season_number, episode.episode_number)
            });
            if !keep_existing {
                by_file.insert(file_id, episode);
            }
        }

        let series_id = SeriesId::new(series.id);
        files
            .into_iter()
            .filter_map(|file| {
                let (Some(file_id), Some(raw_path)) = (file.id, file.best_path())
                else {
                    debug!(
                        instance = %self.name(),
                        series = %series.title,
                        "skipping episode file without id or path"
                    );
                    return None;
                };
                let episode = by_file.get(&file_id);
                let coordinates = match episode {
                    Some(ep) => EpisodeCoordinates {
                        season: ep.season_number,
                        episode: ep.episode_number,
                    },
                    None => {
                        let parsed = parse_coordinates(raw_path);
                        EpisodeCoordinates {
                            season: parsed.season.or(file.season_number),
                            episode: parsed.episode,
                        }
                    }
                };
                Some(MediaRecord {
                    title: episode_title(&series.title, &coordinates),
                    path: self.paths.translate(raw_path),
                    search_key: SearchKey::new(series.id),
                    deletion_key: DeletionKey::new(file_id),
                    quality: file.quality_name(),
                    size_bytes: file.size.unwrap_or(0),
                    source: SourceKind::Sonarr,
                    instance: self.name().to_string(),
                    year: None,
                    folder_path: None,
                    series_id: Some(series_id),
                    episode_id: episode.map(|ep| EpisodeId::new(ep.id)),
                    coordinates: Some(coordinates),
                })
            })
            .collect()
    }

    /// Explicit episode id, or the episode matching the record's
    /// coordinates.
    async fn resolve_episode_id(
        &self,
        item: &MediaRecord,
    ) -> Result<EpisodeId, SourceError> {
        if let Some(id) = item.episode_id {
            return Ok(id);
        }
        let coordinates = item.coordinates.unwrap_or_default();
        let (Some(series_id), true) =
            (item.series_id, coordinates.is_complete())
        else {
            return Err(SourceError::NotFound(format!(
                "episode for {}",
                item.title
            )));
        };
        debug!(title = %item.title, "looking up episode by coordinates");
        self.episodes(series_id)
            .await?
            .into_iter()
            .find(|ep| {
                ep.season_number == coordinates.season
                    && ep.episode_number == coordinates.episode
            })
            .map(|ep| EpisodeId::new(ep.id))
            .ok_or_else(|| {
                SourceError::NotFound(format!("episode for {}", item.title))
            })
    }
}

#[async_trait]
impl SourceCatalog for SonarrClient {
    fn name(&self) -> &str {
        self.http.instance()
    }

    fn kind(&self) -> SourceKind {
        SourceKind::Sonarr
    }

    async fn test_connection(&self) -> bool {
        match self
            .http
            .get::<serde_json::Value>("system/status", &[])
            .await
        {
            Ok(_) => {
                info!(instance = %self.name(), "sonarr connection ok");
                true
            }
            Err(err) => {
                warn!(instance = %self.name(), error = %err, "sonarr connection failed");
                false
            }
        }
    }

    async fn get_all_media(&self) -> Result<Vec<MediaRecord>, SourceError> {
        let series: Vec<SonarrSeries> = self.http.get("series", &[]).await?;
        let with_files: Vec<SonarrSeries> =
            series.into_iter().filter(SonarrSeries::has_files).collect();
        let series_count = with_files.len();

        let per_series: Vec<Vec<MediaRecord>> = stream::iter(with_files)
            .map(|series| self.series_records(series))
            .buffer_unordered(SERIES_FETCH_CONCURRENCY)
            .try_collect()
            .await?;
        let records: Vec<MediaRecord> =
            per_series.into_iter().flatten().collect();

        info!(
            instance = %self.name(),
            series = series_count,
            episodes = records.len(),
            "fetched episodes"
        );
        Ok(records)
    }

    async fn delete_file(&self, key: DeletionKey) -> Result<(), SourceError> {
        self.http.delete(&format!("episodefile/{key}")).await?;
        info!(instance = %self.name(), file_id = %key, "deleted episode file");
        Ok(())
    }

    async fn search_for_replacement(
        &self,
        item: &MediaRecord,
    ) -> Result<(), SourceError> {
        let episode_id = self.resolve_episode_id(item).await?;
        let command = ArrCommand::EpisodeSearch {
            episode_ids: vec![episode_id.get()],
        };
        self.http.post("command", Some(&command)).await?;
        info!(instance = %self.name(), title = %item.title, "triggered episode search");
        Ok(())
    }

    async fn add_to_blocklist(
        &self,
        item: &MediaRecord,
        message: &str,
    ) -> Result<bool, SourceError> {
        let episode_id = self.resolve_episode_id(item).await?;
        let page: HistoryPage = self
            .http
            .get(
                "history",
                &[
                    ("episodeId", episode_id.to_string()),
                    ("eventType", "grabbed".to_string()),
                    ("sortKey", "date".to_string()),
                    ("sortDirection", "descending".to_string()),
                    ("pageSize", "10".to_string()),
                ],
            )
            .await?;
        let Some(grab) = latest_grab(&page.records) else {
            debug!(title = %item.title, "no grab history, nothing to blocklist");
            return Ok(false);
        };
        self.http
            .post::<()>(&format!("history/failed/{}", grab.id), None)
            .await?;
        info!(
            instance = %self.name(),
            title = %item.title,
            history_id = grab.id,
            reason = message,
            "blocklisted release"
        );
        Ok(true)
    }

    fn translate_path(&self, raw: &str) -> String {
        self.paths.translate(raw)
    }
}
