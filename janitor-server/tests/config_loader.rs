use std::fs;

use tempfile::TempDir;

use janitor_core::config::{DeepScanMode, ScanMode};
use janitor_server::infra::config::{ConfigLoadError, ConfigLoader};

fn loader_for(dir: &TempDir, file: &str) -> ConfigLoader {
    ConfigLoader::new()
        .with_config_path(dir.path().join(file))
        .with_env_file(dir.path().join("absent.env"))
}

#[test]
fn loads_a_full_file() {
    let dir = TempDir::new().expect("temp dir");
    fs::write(
        dir.path().join("janitor.toml"),
        r#"
        [server]
        host = "127.0.0.1"
        webhooks_enabled = false

        [state]
        path = "/srv/janitor/state.json"

        [[radarr]]
        name = "radarr"
        url = "http://radarr:7878"
        api_key = "r-key"

        [[sonarr]]
        name = "sonarr"
        url = "http://sonarr:8989"
        api_key = "s-key"
        path_mappings = [{ from = "/tv", to = "/mnt/tv" }]

        [validation]
        deep_scan_mode = "full"
        reject_3d = true

        [scanner]
        mode = "continuous"
        files_per_hour = 240

        [actions]
        max_replacements_per_day = 4

        [notifications]
        webhook_url = "https://hooks.example.test/janitor"
        daily_summary_time = "06:45"

        [logging]
        level = "warn"
        "#,
    )
    .expect("write config");

    let load = loader_for(&dir, "janitor.toml").load().expect("config loads");
    let config = load.config;
    assert!(load.warnings.is_empty(), "unexpected warnings: {:?}", load.warnings);

    assert_eq!(config.server.host, "127.0.0.1");
    assert!(!config.server.webhooks_enabled);
    assert_eq!(
        config.janitor.state.path.to_str(),
        Some("/srv/janitor/state.json")
    );
    assert_eq!(config.janitor.sonarr[0].path_mappings[0].from, "/tv");
    assert_eq!(config.janitor.validation.deep_scan_mode, DeepScanMode::Full);
    assert!(config.janitor.validation.reject_3d);
    assert_eq!(config.janitor.scanner.mode, ScanMode::Continuous);
    assert_eq!(config.janitor.scanner.batch_size(), 4);
    assert_eq!(config.janitor.actions.max_replacements_per_day, 4);
    assert!(config.janitor.actions.auto_replace);
    assert_eq!(config.logging.level, "warn");
    assert_eq!(
        config.metadata.config_path,
        Some(dir.path().join("janitor.toml"))
    );
}

#[test]
fn missing_explicit_file_is_an_error() {
    let dir = TempDir::new().expect("temp dir");
    let err = loader_for(&dir, "nope.toml").load().expect_err("must fail");
    assert!(matches!(err, ConfigLoadError::MissingConfig { .. }));
}

#[test]
fn malformed_file_reports_parse_error() {
    let dir = TempDir::new().expect("temp dir");
    fs::write(dir.path().join("bad.toml"), "[scanner\nenabled = true").expect("write");
    let err = loader_for(&dir, "bad.toml").load().expect_err("must fail");
    assert!(matches!(err, ConfigLoadError::Parse { .. }));
}

#[test]
fn guard_rails_surface_as_warnings() {
    let dir = TempDir::new().expect("temp dir");
    fs::write(
        dir.path().join("janitor.toml"),
        r#"
        [scanner]
        files_per_hour = 0

        [actions]
        mismatch_threshold = 3.0
        "#,
    )
    .expect("write config");

    let load = loader_for(&dir, "janitor.toml").load().expect("config loads");
    assert!(load.warnings.mentions("No Radarr or Sonarr"));
    assert!(load.warnings.mentions("files_per_hour"));
    assert!(load.warnings.mentions("mismatch_threshold"));
    assert_eq!(load.config.janitor.actions.mismatch_threshold, 1.0);
}

#[test]
fn instance_names_shared_across_kinds_are_rejected() {
    let dir = TempDir::new().expect("temp dir");
    fs::write(
        dir.path().join("janitor.toml"),
        r#"
        [[radarr]]
        name = "main"
        url = "http://radarr:7878"
        api_key = "r-key"

        [[sonarr]]
        name = "main"
        url = "http://sonarr:8989"
        api_key = "s-key"
        "#,
    )
    .expect("write config");

    let err = loader_for(&dir, "janitor.toml").load().expect_err("must fail");
    match err {
        ConfigLoadError::DuplicateInstance { names } => assert_eq!(names, ["main"]),
        other => panic!("unexpected error {other:?}"),
    }
}
