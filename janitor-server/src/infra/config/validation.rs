use std::fmt;

use chrono::NaiveTime;

use janitor_core::config::{ActionsConfig, JanitorConfig};

/// Summary time used when the configured one does not parse.
pub const FALLBACK_SUMMARY_TIME: &str = "08:00";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigWarning {
    pub message: String,
    pub hint: Option<String>,
}

impl fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.hint {
            Some(hint) => write!(f, "{} ({hint})", self.message),
            None => f.write_str(&self.message),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ConfigWarnings {
    pub items: Vec<ConfigWarning>,
}

impl ConfigWarnings {
    pub fn push(&mut self, message: impl Into<String>) {
        self.items.push(ConfigWarning {
            message: message.into(),
            hint: None,
        });
    }

    pub fn push_with_hint(
        &mut self,
        message: impl Into<String>,
        hint: impl Into<String>,
    ) {
        self.items.push(ConfigWarning {
            message: message.into(),
            hint: Some(hint.into()),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn extend(&mut self, other: ConfigWarnings) {
        self.items.extend(other.items);
    }

    pub fn iter(&self) -> impl Iterator<Item = &ConfigWarning> {
        self.items.iter()
    }

    pub fn mentions(&self, needle: &str) -> bool {
        self.items.iter().any(|w| w.message.contains(needle))
    }
}

/// `HH:MM` local wall-clock time.
pub fn parse_summary_time(raw: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(raw.trim(), "%H:%M").ok()
}

/// Applies guard rails to a composed configuration. Out-of-range values
/// are corrected in place; nothing here is fatal.
pub fn apply_guard_rails(config: &mut JanitorConfig) -> ConfigWarnings {
    let mut warnings = ConfigWarnings::default();

    if config.radarr.is_empty() && config.sonarr.is_empty() {
        warnings.push_with_hint(
            "No Radarr or Sonarr instances configured; nothing will be scanned",
            "Add a [[radarr]] or [[sonarr]] table with name, url and api_key",
        );
    }

    if config.scanner.enabled && config.scanner.files_per_hour == 0 {
        warnings.push_with_hint(
            "scanner.files_per_hour is 0; background batches fall back to one file",
            "Set scanner.enabled = false to stop background scanning",
        );
    }

    let threshold = config.actions.mismatch_threshold;
    if !(threshold > 0.0 && threshold <= 1.0) {
        let clamped = if threshold > 1.0 {
            1.0
        } else {
            ActionsConfig::default().mismatch_threshold
        };
        warnings.push(format!(
            "actions.mismatch_threshold {threshold} is outside (0, 1]; using {clamped}"
        ));
        config.actions.mismatch_threshold = clamped;
    }

    if parse_summary_time(&config.notifications.daily_summary_time).is_none() {
        warnings.push_with_hint(
            format!(
                "notifications.daily_summary_time '{}' is not HH:MM; using {FALLBACK_SUMMARY_TIME}",
                config.notifications.daily_summary_time
            ),
            "Use a 24-hour local time such as \"07:30\"",
        );
        config.notifications.daily_summary_time = FALLBACK_SUMMARY_TIME.to_string();
    }

    if config.plex.enabled
        && (config.plex.url.trim().is_empty() || config.plex.token.trim().is_empty())
    {
        warnings.push_with_hint(
            "Plex is enabled without a url or token; watch history disabled",
            "Set plex.url and plex.token",
        );
        config.plex.enabled = false;
    }

    for instance in config.radarr.iter().chain(config.sonarr.iter()) {
        if instance.api_key.trim().is_empty() {
            warnings.push(format!("Instance '{}' has an empty api_key", instance.name));
        }
    }

    warnings
}
