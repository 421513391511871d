//! Runtime configuration for the janitor core.
//!
//! Every section deserialises with defaults so a partial TOML table is
//! enough; the server crate layers file and environment sources on top.

use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// One `from -> to` path prefix rewrite.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct PathMapping {
    pub from: String,
    pub to: String,
}

/// Connection details for one Radarr/Sonarr instance.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct InstanceConfig {
    pub name: String,
    pub url: String,
    pub api_key: String,
    #[serde(default)]
    pub path_mappings: Vec<PathMapping>,
}

/// How much of a file the sampled decode covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DeepScanMode {
    /// Decode a sample at the start of the file only.
    #[default]
    Partial,
    /// Decode samples at the start, middle and end.
    Full,
}

/// Tool paths, timeouts and thresholds for file validation.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ValidationConfig {
    pub check_duration_sanity: bool,
    pub max_duration_hours: f64,
    pub check_bitrate: bool,
    pub min_bitrate_sd: u64,
    pub min_bitrate_720p: u64,
    pub min_bitrate_1080p: u64,
    pub min_bitrate_4k: u64,
    pub deep_scan_enabled: bool,
    pub deep_scan_mode: DeepScanMode,
    pub sample_duration_seconds: u64,
    pub decode_timeout_seconds: u64,
    pub probe_timeout_seconds: u64,
    pub full_decode_enabled: bool,
    pub full_decode_timeout_seconds: u64,
    pub reject_3d: bool,
    pub ffprobe_path: String,
    pub ffmpeg_path: String,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            check_duration_sanity: true,
            max_duration_hours: 12.0,
            check_bitrate: true,
            min_bitrate_sd: 500,
            min_bitrate_720p: 1500,
            min_bitrate_1080p: 3000,
            min_bitrate_4k: 8000,
            deep_scan_enabled: true,
            deep_scan_mode: DeepScanMode::Partial,
            sample_duration_seconds: 30,
            decode_timeout_seconds: 60,
            probe_timeout_seconds: 60,
            full_decode_enabled: false,
            full_decode_timeout_seconds: 3600,
            reject_3d: false,
            ffprobe_path: "ffprobe".to_string(),
            ffmpeg_path: "ffmpeg".to_string(),
        }
    }
}

impl ValidationConfig {
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_seconds.max(1))
    }

    pub fn decode_timeout(&self) -> Duration {
        Duration::from_secs(self.decode_timeout_seconds.max(1))
    }

    pub fn full_decode_timeout(&self) -> Duration {
        Duration::from_secs(self.full_decode_timeout_seconds.max(1))
    }
}

/// Whether background scanning stops after the first full sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ScanMode {
    /// Keep draining the queue forever, picking up new files.
    Continuous,
    /// Run the initial sweep, then rely on webhooks for new imports.
    #[default]
    WatchOnly,
}

/// Background scan pacing and worker pool sizing.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ScannerConfig {
    pub enabled: bool,
    pub files_per_hour: u32,
    pub mode: ScanMode,
    pub batch_interval_seconds: u64,
    pub item_delay_millis: u64,
    pub tv_refresh_hours: u64,
    pub workers: usize,
    pub queue_capacity: usize,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            files_per_hour: 100,
            mode: ScanMode::WatchOnly,
            batch_interval_seconds: 60,
            item_delay_millis: 1000,
            tv_refresh_hours: 6,
            workers: 2,
            queue_capacity: 256,
        }
    }
}

impl ScannerConfig {
    /// Files drained per batch: the hourly budget spread over a minute
    /// cadence, never less than one.
    pub fn batch_size(&self) -> usize {
        ((self.files_per_hour / 60) as usize).max(1)
    }

    /// Pause between background batches.
    pub fn batch_interval(&self) -> Duration {
        Duration::from_secs(self.batch_interval_seconds.max(1))
    }

    pub fn item_delay(&self) -> Duration {
        Duration::from_millis(self.item_delay_millis)
    }
}

/// What happens to files that fail validation.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ActionsConfig {
    pub auto_replace: bool,
    pub dry_run: bool,
    pub blocklist_bad_releases: bool,
    pub max_replacements_per_day: u32,
    pub detect_wrong_files: bool,
    pub mismatch_threshold: f64,
}

impl Default for ActionsConfig {
    fn default() -> Self {
        Self {
            auto_replace: true,
            dry_run: false,
            blocklist_bad_releases: true,
            max_replacements_per_day: 10,
            detect_wrong_files: true,
            mismatch_threshold: 0.6,
        }
    }
}

/// Optional Plex server used for watch history and orphan reports.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct PlexConfig {
    pub enabled: bool,
    pub url: String,
    pub token: String,
    pub prioritize_watched: bool,
    pub path_mappings: Vec<PathMapping>,
}

impl Default for PlexConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            url: String::new(),
            token: String::new(),
            prioritize_watched: true,
            path_mappings: Vec::new(),
        }
    }
}

/// Daily summary delivery.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct NotificationConfig {
    pub webhook_url: Option<String>,
    /// Local wall-clock time (`HH:MM`) the daily summary is sent at.
    pub daily_summary_time: String,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            webhook_url: None,
            daily_summary_time: "08:00".to_string(),
        }
    }
}

/// Location of the persisted scan state.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct StateConfig {
    pub path: PathBuf,
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("/data/state/state.json"),
        }
    }
}

/// Everything the core needs, fully resolved.
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct JanitorConfig {
    pub state: StateConfig,
    pub radarr: Vec<InstanceConfig>,
    pub sonarr: Vec<InstanceConfig>,
    pub validation: ValidationConfig,
    pub scanner: ScannerConfig,
    pub actions: ActionsConfig,
    pub plex: PlexConfig,
    pub notifications: NotificationConfig,
}

impl JanitorConfig {
    /// Instance names used more than once across Radarr and Sonarr, sorted.
    /// Names route deletions, so each must be unique.
    pub fn duplicate_instance_names(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut duplicates: Vec<String> = self
            .radarr
            .iter()
            .chain(&self.sonarr)
            .filter(|instance| !seen.insert(instance.name.as_str()))
            .map(|instance| instance.name.clone())
            .collect();
        duplicates.sort();
        duplicates.dedup();
        duplicates
    }
}
