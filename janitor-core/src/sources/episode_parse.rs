//! Best-effort season/episode recovery from a file path.

use once_cell::sync::Lazy;
use regex::Regex;

use janitor_model::EpisodeCoordinates;

static SXXEYY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bS(\d{1,3})[ ._-]?E(\d{1,4})")
        .expect("SxxEyy regex should compile")
});

static NXNN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:^|[^\d])(\d{1,2})x(\d{1,3})(?:[^\d]|$)")
        .expect("NxNN regex should compile")
});

static SEASON_DIR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bSeason[ ._-]?(\d{1,3})\b")
        .expect("season folder regex should compile")
});

/// Parses `S01E02`, `1x02` or a `Season 01` folder. Unknown halves stay
/// `None`; this never fails.
pub fn parse_coordinates(path: &str) -> EpisodeCoordinates {
    let file_name = path.rsplit(['/', '\\']).next().unwrap_or(path);

    for candidate in [file_name, path] {
        if let Some(caps) = SXXEYY.captures(candidate) {
            return EpisodeCoordinates {
                season: caps[1].parse().ok(),
                episode: caps[2].parse().ok(),
            };
        }
        if let Some(caps) = NXNN.captures(candidate) {
            return EpisodeCoordinates {
                season: caps[1].parse().ok(),
                episode: caps[2].parse().ok(),
            };
        }
    }

    EpisodeCoordinates {
        season: SEASON_DIR
            .captures(path)
            .and_then(|caps| caps[1].parse().ok()),
        episode: None,
    }
}

/// `"{series} - S01E02"`, with `??` for unknown halves.
pub fn episode_title(series: &str, coordinates: &EpisodeCoordinates) -> String {
    format!("{series} - {coordinates}")
}
