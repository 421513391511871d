//! Source catalog clients (Radarr/Sonarr compatible).

pub mod episode_parse;
mod http;
pub mod path_map;
pub mod payloads;
mod radarr;
mod sonarr;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use janitor_model::{DeletionKey, MediaRecord, SourceKind};

pub use http::ArrHttp;
pub use path_map::PathTranslator;
pub use radarr::RadarrClient;
pub use sonarr::SonarrClient;

use crate::config::JanitorConfig;
use crate::error::SourceError;

/// A remote system of record for media files.
///
/// Deletion takes a [`DeletionKey`] and nothing else; search reads the
/// record's search key or episode id. The two key spaces never mix.
#[async_trait]
pub trait SourceCatalog: Send + Sync + fmt::Debug {
    /// Configured instance name.
    fn name(&self) -> &str;

    fn kind(&self) -> SourceKind;

    async fn test_connection(&self) -> bool;

    /// Every file the instance manages, with translated local paths.
    async fn get_all_media(&self) -> Result<Vec<MediaRecord>, SourceError>;

    async fn delete_file(&self, key: DeletionKey) -> Result<(), SourceError>;

    async fn search_for_replacement(
        &self,
        item: &MediaRecord,
    ) -> Result<(), SourceError>;

    /// Marks the release that produced `item` as failed. `Ok(false)` means
    /// there was nothing to blocklist.
    async fn add_to_blocklist(
        &self,
        item: &MediaRecord,
        message: &str,
    ) -> Result<bool, SourceError>;

    fn translate_path(&self, raw: &str) -> String;
}

/// Builds clients for every configured instance, Radarr first, in
/// configuration order. Instances that fail to build are logged and left
/// out.
pub fn build_sources(config: &JanitorConfig) -> Vec<Arc<dyn SourceCatalog>> {
    let mut sources: Vec<Arc<dyn SourceCatalog>> = Vec::new();
    for instance in &config.radarr {
        match RadarrClient::new(instance) {
            Ok(client) => sources.push(Arc::new(client)),
            Err(err) => {
                warn!(instance = %instance.name, error = %err, "skipping radarr instance")
            }
        }
    }
    for instance in &config.sonarr {
        match SonarrClient::new(instance) {
            Ok(client) => sources.push(Arc::new(client)),
            Err(err) => {
                warn!(instance = %instance.name, error = %err, "skipping sonarr instance")
            }
        }
    }
    sources
}

/// Keeps only the sources that answer a connection test, preserving order.
pub async fn connected_sources(
    sources: Vec<Arc<dyn SourceCatalog>>,
) -> Vec<Arc<dyn SourceCatalog>> {
    let checks = futures::future::join_all(
        sources.iter().map(|source| source.test_connection()),
    )
    .await;
    sources
        .into_iter()
        .zip(checks)
        .filter_map(|(source, ok)| {
            if !ok {
                warn!(
                    instance = %source.name(),
                    kind = %source.kind(),
                    "excluding unreachable source"
                );
            }
            ok.then_some(source)
        })
        .collect()
}
