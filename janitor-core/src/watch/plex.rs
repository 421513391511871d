use std::collections::{HashMap, HashSet};
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};
use url::Url;

use super::WatchHistorySource;
use crate::config::PlexConfig;
use crate::error::WatchHistoryError;
use crate::sources::PathTranslator;

const LIBRARY_TIMEOUT: Duration = Duration::from_secs(120);
/// Plex metadata type for episodes.
const EPISODE_TYPE: &str = "4";

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    #[serde(rename = "MediaContainer")]
    container: T,
}

#[derive(Debug, Default, Deserialize)]
struct SectionsContainer {
    #[serde(rename = "Directory", default)]
    directories: Vec<PlexSection>,
}

#[derive(Debug, Deserialize)]
struct PlexSection {
    key: String,
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    title: String,
}

#[derive(Debug, Default, Deserialize)]
struct ItemsContainer {
    #[serde(rename = "Metadata", default)]
    metadata: Vec<PlexItem>,
}

#[derive(Debug, Deserialize)]
struct PlexItem {
    #[serde(rename = "viewCount", default)]
    view_count: u64,
    #[serde(rename = "Media", default)]
    media: Vec<PlexMedia>,
}

#[derive(Debug, Deserialize)]
struct PlexMedia {
    #[serde(rename = "Part", default)]
    parts: Vec<PlexPart>,
}

#[derive(Debug, Deserialize)]
struct PlexPart {
    #[serde(default)]
    file: Option<String>,
}

impl PlexItem {
    fn file(&self) -> Option<&str> {
        self.media
            .first()
            .and_then(|media| media.parts.first())
            .and_then(|part| part.file.as_deref())
    }
}

/// Plex Media Server client for watch counts and known file paths.
#[derive(Debug, Clone)]
pub struct PlexClient {
    base_url: String,
    token: String,
    paths: PathTranslator,
    client: reqwest::Client,
}

impl PlexClient {
    /// Builds the HTTP client. Reachability is checked by `test_connection`.
    pub fn new(config: &PlexConfig) -> Result<Self, WatchHistoryError> {
        let client = reqwest::Client::builder()
            .timeout(LIBRARY_TIMEOUT)
            .build()?;
        Ok(Self {
            base_url: config.url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
            paths: PathTranslator::new(config.path_mappings.clone()),
            client,
        })
    }

    async fn get<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, &str)],
    ) -> Result<T, WatchHistoryError> {
        let mut url = Url::parse(&format!("{}/{}", self.base_url, endpoint))?;
        if !params.is_empty() {
            url.query_pairs_mut().extend_pairs(params);
        }
        let response = self
            .client
            .get(url)
            .header("X-Plex-Token", &self.token)
            .header("Accept", "application/json")
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(WatchHistoryError::Status(status.as_u16()));
        }
        Ok(response.json().await?)
    }

    pub async fn test_connection(&self) -> bool {
        match self.get::<serde_json::Value>("identity", &[]).await {
            Ok(_) => true,
            Err(err) => {
                warn!(error = %err, "plex connection failed");
                false
            }
        }
    }

    async fn video_sections(&self) -> Result<Vec<PlexSection>, WatchHistoryError> {
        let envelope: Envelope<SectionsContainer> =
            self.get("library/sections", &[]).await?;
        Ok(envelope
            .container
            .directories
            .into_iter()
            .filter(|section| section.kind == "movie" || section.kind == "show")
            .collect())
    }

    async fn section_items(
        &self,
        section: &PlexSection,
    ) -> Result<Vec<PlexItem>, WatchHistoryError> {
        let endpoint = format!("library/sections/{}/all", section.key);
        let params: &[(&str, &str)] = if section.kind == "show" {
            &[("type", EPISODE_TYPE)]
        } else {
            &[]
        };
        let envelope: Envelope<ItemsContainer> =
            self.get(&endpoint, params).await?;
        debug!(
            section = %section.title,
            items = envelope.container.metadata.len(),
            "fetched plex section"
        );
        Ok(envelope.container.metadata)
    }

    /// Visits every file-bearing item across movie and show sections.
    async fn for_each_file(
        &self,
        mut visit: impl FnMut(String, u64) + Send,
    ) -> Result<(), WatchHistoryError> {
        for section in self.video_sections().await? {
            for item in self.section_items(&section).await? {
                if let Some(file) = item.file() {
                    visit(self.paths.translate(file), item.view_count);
                }
            }
        }
        Ok(())
    }
}

#[async_trait]
impl WatchHistorySource for PlexClient {
    async fn get_watch_history(
        &self,
    ) -> Result<HashMap<String, u64>, WatchHistoryError> {
        let mut counts = HashMap::new();
        self.for_each_file(|path, views| {
            if views > 0 {
                counts.insert(path, views);
            }
        })
        .await?;
        info!(items_with_views = counts.len(), "fetched plex watch history");
        Ok(counts)
    }

    async fn all_file_paths(&self) -> Result<HashSet<String>, WatchHistoryError> {
        let mut paths = HashSet::new();
        self.for_each_file(|path, _| {
            paths.insert(path);
        })
        .await?;
        Ok(paths)
    }
}
