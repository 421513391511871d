//! Typed shapes of the Radarr/Sonarr responses the janitor consumes.
//!
//! Only the fields we read are modelled. Conversions into `MediaRecord`
//! reject entries without a file id or path instead of carrying the gap
//! inward.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityName {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QualityWrapper {
    pub quality: QualityName,
}

/// A file record as embedded in movies or returned by `episodefile`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArrFile {
    pub id: Option<i64>,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub relative_path: Option<String>,
    #[serde(default)]
    pub quality: Option<QualityWrapper>,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub series_id: Option<i64>,
    #[serde(default)]
    pub season_number: Option<u32>,
}

impl ArrFile {
    pub fn quality_name(&self) -> String {
        self.quality
            .as_ref()
            .map(|q| q.quality.name.clone())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| "Unknown".to_string())
    }

    /// Absolute path when present, else the relative one.
    pub fn best_path(&self) -> Option<&str> {
        self.path
            .as_deref()
            .or(self.relative_path.as_deref())
            .filter(|p| !p.is_empty())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RadarrMovie {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub has_file: bool,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub movie_file: Option<ArrFile>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesStatistics {
    #[serde(default)]
    pub episode_file_count: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SonarrSeries {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub statistics: Option<SeriesStatistics>,
}

impl SonarrSeries {
    pub fn has_files(&self) -> bool {
        self.statistics
            .as_ref()
            .is_some_and(|s| s.episode_file_count > 0)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SonarrEpisode {
    pub id: i64,
    #[serde(default)]
    pub series_id: Option<i64>,
    #[serde(default)]
    pub season_number: Option<u32>,
    #[serde(default)]
    pub episode_number: Option<u32>,
    #[serde(default)]
    pub has_file: bool,
    #[serde(default)]
    pub episode_file_id: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryRecord {
    pub id: i64,
    #[serde(default)]
    pub event_type: Option<String>,
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
}

impl HistoryRecord {
    pub fn is_grab(&self) -> bool {
        self.event_type
            .as_deref()
            .is_none_or(|event| event.eq_ignore_ascii_case("grabbed"))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HistoryPage {
    #[serde(default)]
    pub records: Vec<HistoryRecord>,
}

/// Most recent grab in a history listing.
pub fn latest_grab(records: &[HistoryRecord]) -> Option<&HistoryRecord> {
    records
        .iter()
        .filter(|record| record.is_grab())
        .max_by_key(|record| record.date)
}

/// Body of `POST /api/v3/command`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "name")]
pub enum ArrCommand {
    MoviesSearch {
        #[serde(rename = "movieIds")]
        movie_ids: Vec<i64>,
    },
    EpisodeSearch {
        #[serde(rename = "episodeIds")]
        episode_ids: Vec<i64>,
    },
}
