//! Records persisted by the state store.

use chrono::{DateTime, Utc};

use crate::media_type::MediaType;

/// Number of replacement records retained in history.
pub const REPLACEMENT_RETENTION: usize = 500;

/// Outcome of the last completed validation of a path.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScanRecord {
    pub timestamp: DateTime<Utc>,
    pub valid: bool,
    #[cfg_attr(feature = "serde", serde(default))]
    pub media_type: MediaType,
}

/// A file the janitor deleted and asked the source to re-acquire.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ReplacementRecord {
    pub path: String,
    pub title: String,
    pub reason: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub wrong_file: bool,
    #[cfg_attr(feature = "serde", serde(default))]
    pub media_type: MediaType,
    pub timestamp: DateTime<Utc>,
}

/// Library-wide file counts reported by the last complete refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LibraryTotals {
    pub movies: u64,
    pub tv: u64,
}

/// Aggregate view over the state store.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScanStats {
    pub total_scanned: u64,
    pub valid_files: u64,
    pub invalid_files: u64,
    pub total_replaced: u64,
    pub movies_replaced: u64,
    pub tv_replaced: u64,
    pub movies_scanned: u64,
    pub tv_scanned: u64,
    pub movies_total: u64,
    pub tv_total: u64,
    pub scan_started: Option<DateTime<Utc>>,
    pub scan_completed: Option<DateTime<Utc>>,
    pub initial_scan_done: bool,
}

impl ScanStats {
    /// Files known to the library that have not been scanned yet.
    pub fn remaining(&self) -> u64 {
        (self.movies_total + self.tv_total).saturating_sub(self.total_scanned)
    }
}
