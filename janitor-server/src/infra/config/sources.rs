use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use janitor_core::config::{
    ActionsConfig, InstanceConfig, NotificationConfig, PlexConfig, ScannerConfig,
    StateConfig, ValidationConfig,
};

/// Raw configuration as defined in a TOML file.
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct FileConfig {
    #[serde(default)]
    pub server: FileServerConfig,
    pub state: Option<StateConfig>,
    #[serde(default)]
    pub radarr: Vec<InstanceConfig>,
    #[serde(default)]
    pub sonarr: Vec<InstanceConfig>,
    pub validation: Option<ValidationConfig>,
    pub scanner: Option<ScannerConfig>,
    pub actions: Option<ActionsConfig>,
    pub plex: Option<PlexConfig>,
    pub notifications: Option<NotificationConfig>,
    #[serde(default)]
    pub logging: FileLoggingConfig,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileServerConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub webhooks_enabled: Option<bool>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct FileLoggingConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
}

/// Overrides read from the process environment.
#[derive(Debug, Default, Clone)]
pub struct EnvConfig {
    pub config_path: Option<PathBuf>,
    pub server_host: Option<String>,
    pub server_port: Option<u16>,
    pub state_path: Option<PathBuf>,
    pub dry_run: Option<bool>,
    pub auto_replace: Option<bool>,
    pub max_replacements_per_day: Option<u32>,
    pub log_level: Option<String>,
    /// Variables that were set but could not be parsed.
    pub rejected: Vec<String>,
}

impl EnvConfig {
    pub fn gather() -> Self {
        let mut env_config = EnvConfig {
            config_path: non_empty_var("JANITOR_CONFIG").map(PathBuf::from),
            server_host: non_empty_var("SERVER_HOST"),
            state_path: non_empty_var("JANITOR_STATE_PATH").map(PathBuf::from),
            log_level: non_empty_var("JANITOR_LOG_LEVEL"),
            ..EnvConfig::default()
        };

        env_config.server_port = env_config.parsed("SERVER_PORT", |raw| raw.parse().ok());
        env_config.max_replacements_per_day =
            env_config.parsed("JANITOR_MAX_REPLACEMENTS_PER_DAY", |raw| raw.parse().ok());
        env_config.dry_run = env_config.parsed("JANITOR_DRY_RUN", parse_bool);
        env_config.auto_replace = env_config.parsed("JANITOR_AUTO_REPLACE", parse_bool);

        env_config
    }

    fn parsed<T>(&mut self, name: &str, parse: impl Fn(&str) -> Option<T>) -> Option<T> {
        let raw = non_empty_var(name)?;
        let value = parse(raw.trim());
        if value.is_none() {
            self.rejected.push(name.to_string());
        }
        value
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|raw| !raw.trim().is_empty())
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bools_accept_common_spellings() {
        assert_eq!(parse_bool("YES"), Some(true));
        assert_eq!(parse_bool("off"), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }

    #[test]
    fn file_config_reads_instance_arrays() {
        let raw = r#"
            [server]
            port = 9100

            [[radarr]]
            name = "radarr-4k"
            url = "http://radarr:7878"
            api_key = "abc"
            path_mappings = [{ from = "/movies", to = "/mnt/movies" }]

            [scanner]
            mode = "continuous"
        "#;
        let file: FileConfig = toml::from_str(raw).expect("config should parse");
        assert_eq!(file.server.port, Some(9100));
        assert_eq!(file.radarr.len(), 1);
        assert_eq!(file.radarr[0].path_mappings[0].to, "/mnt/movies");
        assert!(file.sonarr.is_empty());
        let scanner = file.scanner.expect("scanner section");
        assert_eq!(scanner.files_per_hour, 100);
    }
}
