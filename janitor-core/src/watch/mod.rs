//! Optional watch-history signal used to reorder the scan queue.

mod plex;

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;

pub use plex::PlexClient;

use crate::error::WatchHistoryError;

/// A media server that knows how often each file was watched.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WatchHistorySource: Send + Sync {
    /// Local path to view count, only for files watched at least once.
    async fn get_watch_history(
        &self,
    ) -> Result<HashMap<String, u64>, WatchHistoryError>;

    /// Every local path the server knows about.
    async fn all_file_paths(&self) -> Result<HashSet<String>, WatchHistoryError>;
}

/// Paths only one side knows: `(server_only, catalog_only)`, both sorted.
pub fn find_orphans(
    server_paths: &HashSet<String>,
    catalog_paths: &HashSet<String>,
) -> (Vec<String>, Vec<String>) {
    let mut server_only: Vec<String> =
        server_paths.difference(catalog_paths).cloned().collect();
    let mut catalog_only: Vec<String> =
        catalog_paths.difference(server_paths).cloned().collect();
    server_only.sort();
    catalog_only.sort();
    (server_only, catalog_only)
}
