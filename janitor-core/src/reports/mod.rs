//! On-demand reconciliation reports over the cached catalog.

mod duplicates;
mod library;
mod missing;
mod orphans;

use serde::Serialize;

use janitor_model::{MediaRecord, ReplacementRecord};

pub use duplicates::{find_duplicates, DuplicateGroup, DuplicateReport};
pub use library::{library_report, FileStats, LibraryReport};
pub use missing::{find_missing, MissingFile, MissingReport};
pub use orphans::{orphan_report, OrphanReport};

use crate::orchestration::{detect_path_mismatch, PathMismatch};

/// Replaced entries returned by the replaced report.
pub const REPLACED_REPORT_LIMIT: usize = 100;

const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

/// Formats a byte count with binary multiples, e.g. `1.50 GB`.
pub fn bytes_to_human(bytes: u64) -> String {
    let mut value = bytes as f64;
    for unit in UNITS {
        if value < 1024.0 {
            return format!("{value:.2} {unit}");
        }
        value /= 1024.0;
    }
    format!("{value:.2} PB")
}

/// Files whose path does not match their title.
#[derive(Debug, Clone, Serialize)]
pub struct MismatchReport {
    pub count: usize,
    pub mismatches: Vec<PathMismatch>,
}

/// Runs the path-mismatch heuristic over `records`.
pub fn find_mismatches(records: &[MediaRecord], threshold: f64) -> MismatchReport {
    let mismatches: Vec<PathMismatch> = records
        .iter()
        .filter_map(|record| detect_path_mismatch(record, threshold))
        .collect();
    MismatchReport {
        count: mismatches.len(),
        mismatches,
    }
}

/// Most recent replacements, newest first.
#[derive(Debug, Clone, Serialize)]
pub struct ReplacedReport {
    pub count: usize,
    pub replaced: Vec<ReplacementRecord>,
}

impl ReplacedReport {
    /// `entries` are expected most recent first.
    pub fn new(total: u64, entries: Vec<ReplacementRecord>) -> Self {
        Self {
            count: total as usize,
            replaced: entries,
        }
    }
}
