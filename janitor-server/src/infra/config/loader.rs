use std::fs;
use std::path::PathBuf;

use once_cell::sync::Lazy;
use thiserror::Error;

use janitor_core::config::{JanitorConfig, StateConfig};

use super::models::{Config, ConfigMetadata, LoggingConfig, ServerConfig};
use super::sources::{EnvConfig, FileConfig};
use super::validation::{ConfigWarnings, apply_guard_rails};

static DEFAULT_CONFIG_LOCATIONS: Lazy<Vec<PathBuf>> = Lazy::new(|| {
    vec![
        PathBuf::from("janitor.toml"),
        PathBuf::from("config/janitor.toml"),
        PathBuf::from("/data/config.toml"),
    ]
});

#[derive(Debug, Default, Clone)]
pub struct ConfigLoaderOptions {
    pub config_path: Option<PathBuf>,
    pub env_file: Option<PathBuf>,
}

#[derive(Debug, Default)]
pub struct ConfigLoader {
    options: ConfigLoaderOptions,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: ConfigLoaderOptions) -> Self {
        Self { options }
    }

    pub fn with_config_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.options.config_path = Some(path.into());
        self
    }

    pub fn with_env_file<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.options.env_file = Some(path.into());
        self
    }

    pub fn load(&self) -> Result<ConfigLoad, ConfigLoadError> {
        let env_file_loaded = match &self.options.env_file {
            Some(path) => dotenvy::from_path(path).map(|_| true).or_else(
                |err| match err {
                    dotenvy::Error::Io(_) => Ok(false),
                    _ => Err(err),
                },
            )?,
            None => dotenvy::dotenv().map(|_| true).or_else(|err| match err {
                dotenvy::Error::Io(_) => Ok(false),
                _ => Err(err),
            })?,
        };

        let env_config = EnvConfig::gather();
        let (file_config, config_path) = self.load_file_config(&env_config)?;
        let (config, warnings) =
            compose_config(file_config, env_config, config_path, env_file_loaded);

        let duplicates = config.janitor.duplicate_instance_names();
        if !duplicates.is_empty() {
            return Err(ConfigLoadError::DuplicateInstance { names: duplicates });
        }

        Ok(ConfigLoad { config, warnings })
    }

    fn load_file_config(
        &self,
        env_config: &EnvConfig,
    ) -> Result<(Option<FileConfig>, Option<PathBuf>), ConfigLoadError> {
        let mut source = ConfigPathSource::default();

        if let Some(explicit) = &self.options.config_path {
            source.explicit = Some(explicit.clone());
        } else if let Some(from_env) = &env_config.config_path {
            source.env = Some(from_env.clone());
        } else {
            source.default = DEFAULT_CONFIG_LOCATIONS
                .iter()
                .find(|candidate| candidate.exists())
                .cloned();
        }

        let Some((path, provenance)) = source.resolved_path() else {
            return Ok((None, None));
        };

        if !path.exists() {
            if provenance.is_explicit() {
                return Err(ConfigLoadError::MissingConfig { path });
            }
            return Ok((None, None));
        }

        let contents =
            fs::read_to_string(&path).map_err(|err| ConfigLoadError::Io {
                path: path.clone(),
                source: err,
            })?;
        let file_config: FileConfig =
            toml::from_str(&contents).map_err(|err| ConfigLoadError::Parse {
                path: path.clone(),
                source: err,
            })?;

        Ok((Some(file_config), Some(path)))
    }
}

/// Layers environment overrides over the file and fills defaults.
pub(crate) fn compose_config(
    file_config: Option<FileConfig>,
    env: EnvConfig,
    config_path: Option<PathBuf>,
    env_file_loaded: bool,
) -> (Config, ConfigWarnings) {
    let mut warnings = ConfigWarnings::default();

    if file_config.is_none() {
        warnings.push_with_hint(
            "No janitor.toml detected; using defaults and environment variables",
            "Pass --config or set JANITOR_CONFIG to point at a configuration file",
        );
    }

    for name in &env.rejected {
        warnings.push(format!("Ignoring unparseable value for {name}"));
    }

    let FileConfig {
        server: file_server,
        state: file_state,
        radarr,
        sonarr,
        validation,
        scanner,
        actions,
        plex,
        notifications,
        logging: file_logging,
    } = file_config.unwrap_or_default();

    let server_defaults = ServerConfig::default();
    let server = ServerConfig {
        host: env
            .server_host
            .or(file_server.host)
            .unwrap_or(server_defaults.host),
        port: env.server_port.or(file_server.port).unwrap_or(server_defaults.port),
        webhooks_enabled: file_server
            .webhooks_enabled
            .unwrap_or(server_defaults.webhooks_enabled),
    };

    let logging = LoggingConfig {
        level: env
            .log_level
            .or(file_logging.level)
            .unwrap_or_else(|| LoggingConfig::default().level),
    };

    let mut state = file_state.unwrap_or_default();
    if let Some(path) = env.state_path {
        state = StateConfig { path };
    }

    let mut actions = actions.unwrap_or_default();
    if let Some(dry_run) = env.dry_run {
        actions.dry_run = dry_run;
    }
    if let Some(auto_replace) = env.auto_replace {
        actions.auto_replace = auto_replace;
    }
    if let Some(max) = env.max_replacements_per_day {
        actions.max_replacements_per_day = max;
    }

    let mut janitor = JanitorConfig {
        state,
        radarr,
        sonarr,
        validation: validation.unwrap_or_default(),
        scanner: scanner.unwrap_or_default(),
        actions,
        plex: plex.unwrap_or_default(),
        notifications: notifications.unwrap_or_default(),
    };
    warnings.extend(apply_guard_rails(&mut janitor));

    let config = Config {
        server,
        logging,
        janitor,
        metadata: ConfigMetadata {
            config_path,
            env_file_loaded,
        },
    };
    (config, warnings)
}

#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("configuration file missing: {path}")]
    MissingConfig { path: PathBuf },
    #[error("failed to read configuration {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse configuration {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("failed to load .env file")]
    EnvFile(#[from] dotenvy::Error),
    #[error("instance names must be unique across radarr and sonarr: {}", names.join(", "))]
    DuplicateInstance { names: Vec<String> },
}

#[derive(Debug, Default)]
struct ConfigPathSource {
    explicit: Option<PathBuf>,
    env: Option<PathBuf>,
    default: Option<PathBuf>,
}

impl ConfigPathSource {
    fn resolved_path(&self) -> Option<(PathBuf, ConfigPathProvenance)> {
        if let Some(path) = &self.explicit {
            return Some((path.clone(), ConfigPathProvenance::Explicit));
        }
        if let Some(path) = &self.env {
            return Some((path.clone(), ConfigPathProvenance::Env));
        }
        if let Some(path) = &self.default {
            return Some((path.clone(), ConfigPathProvenance::Default));
        }
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConfigPathProvenance {
    Explicit,
    Env,
    Default,
}

impl ConfigPathProvenance {
    fn is_explicit(self) -> bool {
        matches!(
            self,
            ConfigPathProvenance::Explicit | ConfigPathProvenance::Env
        )
    }
}

#[derive(Debug)]
pub struct ConfigLoad {
    pub config: Config,
    pub warnings: ConfigWarnings,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(raw: &str) -> FileConfig {
        toml::from_str(raw).expect("config should parse")
    }

    #[test]
    fn environment_overrides_file_values() {
        let file = file(
            r#"
            [server]
            host = "127.0.0.1"
            port = 9100

            [actions]
            dry_run = false
            max_replacements_per_day = 3
            "#,
        );
        let env = EnvConfig {
            server_port: Some(9200),
            dry_run: Some(true),
            state_path: Some(PathBuf::from("/tmp/janitor/state.json")),
            log_level: Some("debug".into()),
            ..EnvConfig::default()
        };

        let (config, _) = compose_config(Some(file), env, None, false);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 9200);
        assert!(config.janitor.actions.dry_run);
        assert_eq!(config.janitor.actions.max_replacements_per_day, 3);
        assert_eq!(
            config.janitor.state.path,
            PathBuf::from("/tmp/janitor/state.json")
        );
        assert_eq!(config.logging.default_filter(), "debug,tower_http=warn");
    }

    #[test]
    fn no_file_yields_defaults_and_a_warning() {
        let (config, warnings) =
            compose_config(None, EnvConfig::default(), None, false);
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert!(config.server.webhooks_enabled);
        assert_eq!(config.logging.level, "info");
        assert!(warnings.mentions("No janitor.toml detected"));
        assert!(warnings.mentions("No Radarr or Sonarr"));
    }

    #[test]
    fn rejected_env_values_are_reported() {
        let env = EnvConfig {
            rejected: vec!["SERVER_PORT".into()],
            ..EnvConfig::default()
        };
        let (config, warnings) = compose_config(None, env, None, false);
        assert_eq!(config.server.port, 9000);
        assert!(warnings.mentions("SERVER_PORT"));
    }
}
