use std::collections::HashSet;

use serde::Serialize;

use crate::error::WatchHistoryError;
use crate::watch::{find_orphans, WatchHistorySource};

/// Paths known to only one side: the media server or the catalogs.
#[derive(Debug, Clone, Serialize)]
pub struct OrphanReport {
    pub server_total: usize,
    pub catalog_total: usize,
    pub server_only: Vec<String>,
    pub catalog_only: Vec<String>,
}

pub async fn orphan_report(
    watch: &dyn WatchHistorySource,
    catalog_paths: &HashSet<String>,
) -> Result<OrphanReport, WatchHistoryError> {
    let server_paths = watch.all_file_paths().await?;
    let (server_only, catalog_only) = find_orphans(&server_paths, catalog_paths);
    Ok(OrphanReport {
        server_total: server_paths.len(),
        catalog_total: catalog_paths.len(),
        server_only,
        catalog_only,
    })
}
