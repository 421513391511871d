//! Per-file outcome of the decision orchestrator.

use std::fmt;

use chrono::{DateTime, Utc};

use crate::media_type::MediaType;

/// What the orchestrator did with a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Disposition {
    /// File passed validation.
    Valid,
    /// File is bad but was left in place.
    Flagged,
    /// File was deleted and a replacement search issued.
    Replaced,
    /// Decision deferred (limit reached or validation timed out).
    Queued,
    /// File was not processed at all.
    Skipped,
}

impl Disposition {
    pub const fn as_str(self) -> &'static str {
        match self {
            Disposition::Valid => "valid",
            Disposition::Flagged => "flagged",
            Disposition::Replaced => "replaced",
            Disposition::Queued => "queued",
            Disposition::Skipped => "skipped",
        }
    }
}

impl fmt::Display for Disposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScanResult {
    pub file_path: String,
    pub title: String,
    pub media_type: MediaType,
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub disposition: Disposition,
    #[cfg_attr(feature = "serde", serde(default))]
    pub detail: Option<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub wrong_file: bool,
    pub timestamp: DateTime<Utc>,
}

impl ScanResult {
    /// Outcome for a file that was never processed.
    pub fn skipped(file_path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            file_path: file_path.into(),
            title: String::new(),
            media_type: MediaType::Unknown,
            valid: false,
            errors: Vec::new(),
            warnings: Vec::new(),
            disposition: Disposition::Skipped,
            detail: Some(reason.into()),
            wrong_file: false,
            timestamp: Utc::now(),
        }
    }

    pub fn is_skipped(&self) -> bool {
        self.disposition == Disposition::Skipped
    }
}
