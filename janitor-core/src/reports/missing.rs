use serde::Serialize;
use tracing::debug;

use janitor_model::{MediaRecord, MediaType};

/// A catalog entry whose file is not on disk.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MissingFile {
    pub title: String,
    pub path: String,
    pub instance: String,
    pub media_type: MediaType,
}

/// Catalog files absent from disk.
#[derive(Debug, Clone, Serialize)]
pub struct MissingReport {
    pub count: usize,
    pub movies_count: usize,
    pub tv_count: usize,
    pub files: Vec<MissingFile>,
}

/// Checks every record against the filesystem. Read-only: nothing is
/// recorded in the state store.
pub async fn find_missing(records: &[MediaRecord]) -> MissingReport {
    let mut files = Vec::new();
    for record in records {
        // Unreadable parents count as missing.
        let exists = tokio::fs::try_exists(&record.path).await.unwrap_or(false);
        if !exists {
            debug!(path = %record.path, instance = %record.instance, "catalog file missing on disk");
            files.push(MissingFile {
                title: record.title.clone(),
                path: record.path.clone(),
                instance: record.instance.clone(),
                media_type: record.media_type(),
            });
        }
    }
    let movies_count = files.iter().filter(|f| f.media_type == MediaType::Movie).count();
    MissingReport {
        count: files.len(),
        movies_count,
        tv_count: files.len() - movies_count,
        files,
    }
}
