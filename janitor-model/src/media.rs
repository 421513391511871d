//! Catalog records as seen by the janitor.

use std::fmt;

use crate::ids::{DeletionKey, EpisodeId, SearchKey, SeriesId};
use crate::media_type::MediaType;

/// Which family of source catalog produced a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum SourceKind {
    /// Per-movie source (Radarr compatible).
    Radarr,
    /// Per-episode source (Sonarr compatible).
    Sonarr,
}

impl SourceKind {
    pub const fn media_type(self) -> MediaType {
        match self {
            SourceKind::Radarr => MediaType::Movie,
            SourceKind::Sonarr => MediaType::Tv,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            SourceKind::Radarr => "radarr",
            SourceKind::Sonarr => "sonarr",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Season/episode numbers. Either half may be unknown when the source
/// could not tell us and the filename did not parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EpisodeCoordinates {
    pub season: Option<u32>,
    pub episode: Option<u32>,
}

impl EpisodeCoordinates {
    pub const fn new(season: u32, episode: u32) -> Self {
        Self {
            season: Some(season),
            episode: Some(episode),
        }
    }

    pub const fn is_complete(&self) -> bool {
        self.season.is_some() && self.episode.is_some()
    }
}

impl fmt::Display for EpisodeCoordinates {
    /// Renders `S01E02`, substituting `??` for unknown halves.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.season {
            Some(s) => write!(f, "S{s:02}")?,
            None => f.write_str("S??")?,
        }
        match self.episode {
            Some(e) => write!(f, "E{e:02}"),
            None => f.write_str("E??"),
        }
    }
}

/// One media file known to a source catalog.
///
/// `path` is always the locally translated path. `instance` is the
/// configured name of the source that owns the file; subsequent actions on
/// the file are routed there.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MediaRecord {
    pub title: String,
    pub path: String,
    pub search_key: SearchKey,
    pub deletion_key: DeletionKey,
    pub quality: String,
    pub size_bytes: u64,
    pub source: SourceKind,
    pub instance: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub year: Option<i32>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub folder_path: Option<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub series_id: Option<SeriesId>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub episode_id: Option<EpisodeId>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub coordinates: Option<EpisodeCoordinates>,
}

impl MediaRecord {
    pub const fn media_type(&self) -> MediaType {
        self.source.media_type()
    }

    pub fn is_movie(&self) -> bool {
        self.source == SourceKind::Radarr
    }

    /// File name component of the path, used by the mismatch check.
    pub fn file_name(&self) -> &str {
        self.path
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or(self.path.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coordinates_render_placeholders() {
        assert_eq!(EpisodeCoordinates::new(1, 2).to_string(), "S01E02");
        let partial = EpisodeCoordinates {
            season: Some(3),
            episode: None,
        };
        assert_eq!(partial.to_string(), "S03E??");
        assert_eq!(EpisodeCoordinates::default().to_string(), "S??E??");
    }

    #[test]
    fn file_name_strips_directories() {
        let record = MediaRecord {
            title: "Alien".into(),
            path: "/media/movies/Alien (1979)/Alien.1979.mkv".into(),
            search_key: SearchKey::new(1),
            deletion_key: DeletionKey::new(2),
            quality: "Bluray-1080p".into(),
            size_bytes: 0,
            source: SourceKind::Radarr,
            instance: "radarr".into(),
            year: Some(1979),
            folder_path: None,
            series_id: None,
            episode_id: None,
            coordinates: None,
        };
        assert_eq!(record.file_name(), "Alien.1979.mkv");
        assert_eq!(record.media_type(), MediaType::Movie);
    }
}
