use async_trait::async_trait;
use tracing::{debug, info, warn};

use janitor_model::{DeletionKey, MediaRecord, SearchKey, SourceKind};

use super::http::ArrHttp;
use super::path_map::PathTranslator;
use super::payloads::{ArrCommand, HistoryRecord, RadarrMovie, latest_grab};
use super::SourceCatalog;
use crate::config::InstanceConfig;
use crate::error::SourceError;

/// Per-movie source catalog.
#[derive(Debug, Clone)]
pub struct RadarrClient {
    http: ArrHttp,
    paths: PathTranslator,
}

impl RadarrClient {
    /// Builds a client for one configured Radarr instance.
    pub fn new(instance: &InstanceConfig) -> Result<Self, SourceError> {
        Ok(Self {
            http: ArrHttp::new(&instance.name, &instance.url, &instance.api_key)?,
            paths: PathTranslator::new(instance.path_mappings.clone()),
        })
    }

    /// Converts one movie into a record, or `None` when it has no usable
    /// file.
    pub fn movie_to_record(
        &self,
        movie: RadarrMovie,
    ) -> Option<MediaRecord> {
        if !movie.has_file {
            return None;
        }
        let file = movie.movie_file?;
        let (Some(file_id), Some(raw_path)) = (file.id, file.best_path())
        else {
            debug!(
                instance = %self.name(),
                movie = %movie.title,
                "skipping movie without file id or path"
            );
            return None;
        };
        Some(MediaRecord {
            path: self.paths.translate(raw_path),
            quality: file.quality_name(),
            size_bytes: file.size.unwrap_or(0),
            title: movie.title,
            search_key: SearchKey::new(movie.id),
            deletion_key: DeletionKey::new(file_id),
            source: SourceKind::Radarr,
            instance: self.name().to_string(),
            year: movie.year,
            folder_path: movie.path.map(|p| self.paths.translate(&p)),
            series_id: None,
            episode_id: None,
            coordinates: None,
        })
    }
}

#[async_trait]
impl SourceCatalog for RadarrClient {
    fn name(&self) -> &str {
        self.http.instance()
    }

    fn kind(&self) -> SourceKind {
        SourceKind::Radarr
    }

    async fn test_connection(&self) -> bool {
        match self
            .http
            .get::<serde_json::Value>("system/status", &[])
            .await
        {
            Ok(_) => {
                info!(instance = %self.name(), "radarr connection ok");
                true
            }
            Err(err) => {
                warn!(instance = %self.name(), error = %err, "radarr connection failed");
                false
            }
        }
    }

    async fn get_all_media(&self) -> Result<Vec<MediaRecord>, SourceError> {
        let movies: Vec<RadarrMovie> = self.http.get("movie", &[]).await?;
        let total = movies.len();
        let records: Vec<MediaRecord> = movies
            .into_iter()
            .filter_map(|movie| self.movie_to_record(movie))
            .collect();
        info!(
            instance = %self.name(),
            movies = total,
            with_files = records.len(),
            "fetched movies"
        );
        Ok(records)
    }

    async fn delete_file(&self, key: DeletionKey) -> Result<(), SourceError> {
        self.http.delete(&format!("moviefile/{key}")).await?;
        info!(instance = %self.name(), file_id = %key, "deleted movie file");
        Ok(())
    }

    async fn search_for_replacement(
        &self,
        item: &MediaRecord,
    ) -> Result<(), SourceError> {
        let command = ArrCommand::MoviesSearch {
            movie_ids: vec![item.search_key.get()],
        };
        self.http.post("command", Some(&command)).await?;
        info!(instance = %self.name(), title = %item.title, "triggered movie search");
        Ok(())
    }

    async fn add_to_blocklist(
        &self,
        item: &MediaRecord,
        message: &str,
    ) -> Result<bool, SourceError> {
        let history: Vec<HistoryRecord> = self
            .http
            .get(
                "history/movie",
                &[
                    ("movieId", item.search_key.to_string()),
                    ("eventType", "grabbed".to_string()),
                ],
            )
            .await?;
        let Some(grab) = latest_grab(&history) else {
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
