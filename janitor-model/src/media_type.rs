use std::fmt;
use std::str::FromStr;

/// Broad media category used for counters and reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum MediaType {
    Movie,
    Tv,
    #[default]
    Unknown,
}

impl MediaType {
    pub const fn as_str(self) -> &'static str {
        match self {
            MediaType::Movie => "movie",
            MediaType::Tv => "tv",
            MediaType::Unknown => "unknown",
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Selects which sources a catalog refresh touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum SourceFilter {
    #[default]
    All,
    Movies,
    Tv,
}

impl SourceFilter {
    pub fn includes(self, media_type: MediaType) -> bool {
        match self {
            SourceFilter::All => true,
            SourceFilter::Movies => media_type == MediaType::Movie,
            SourceFilter::Tv => media_type == MediaType::Tv,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseSourceFilterError(pub String);

impl fmt::Display for ParseSourceFilterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown source filter '{}' (expected all, movies or tv)",
            self.0
        )
    }
}

impl std::error::Error for ParseSourceFilterError {}

impl FromStr for SourceFilter {
    type Err = ParseSourceFilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "all" => Ok(SourceFilter::All),
            "movies" | "movie" | "radarr" => Ok(SourceFilter::Movies),
            "tv" | "series" | "sonarr" => Ok(SourceFilter::Tv),
            other => Err(ParseSourceFilterError(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_filter_parses_aliases() {
        assert_eq!("Movies".parse::<SourceFilter>(), Ok(SourceFilter::Movies));
        assert_eq!("sonarr".parse::<SourceFilter>(), Ok(SourceFilter::Tv));
        assert_eq!("".parse::<SourceFilter>(), Ok(SourceFilter::All));
        assert!("music".parse::<SourceFilter>().is_err());
    }

    #[test]
    fn filter_membership() {
        assert!(SourceFilter::All.includes(MediaType::Tv));
        assert!(SourceFilter::Movies.includes(MediaType::Movie));
        assert!(!SourceFilter::Movies.includes(MediaType::Tv));
        assert!(!SourceFilter::Tv.includes(MediaType::Unknown));
    }
}
