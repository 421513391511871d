use std::collections::{HashMap, VecDeque};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use janitor_model::{
    LibraryTotals, MediaType, ReplacementRecord, ScanRecord,
    REPLACEMENT_RETENTION,
};

/// Replacement counters per media type. Unlike the bounded history these
/// never roll over.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplacedCounts {
    pub movies: u64,
    pub tv: u64,
    pub unknown: u64,
}

impl ReplacedCounts {
    pub fn total(&self) -> u64 {
        self.movies + self.tv + self.unknown
    }

    pub(super) fn bump(&mut self, media_type: MediaType) {
        match media_type {
            MediaType::Movie => self.movies += 1,
            MediaType::Tv => self.tv += 1,
            MediaType::Unknown => self.unknown += 1,
        }
    }
}

/// On-disk layout of the state file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub(super) struct StateDocument {
    pub scanned_files: HashMap<String, ScanRecord>,
    pub scan_started: Option<DateTime<Utc>>,
    pub scan_completed: Option<DateTime<Utc>>,
    /// Oldest first.
    pub replacements: VecDeque<ReplacementRecord>,
    pub replaced_counts: ReplacedCounts,
    pub library_totals: LibraryTotals,
}

impl StateDocument {
    pub fn push_replacement(&mut self, record: ReplacementRecord) {
        self.replaced_counts.bump(record.media_type);
        self.replacements.push_back(record);
        while self.replacements.len() > REPLACEMENT_RETENTION {
            self.replacements.pop_front();
        }
    }

    pub fn scanned_of(&self, media_type: MediaType) -> u64 {
        self.scanned_files
            .values()
            .filter(|record| record.media_type == media_type)
            .count() as u64
    }
}
