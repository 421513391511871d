use std::sync::Arc;

use anyhow::Result;
use tracing::{info, warn};

use janitor_core::catalog::CatalogCache;
use janitor_core::notify::Notifications;
use janitor_core::orchestration::{FileProcessor, Janitor, ValidationPool};
use janitor_core::sources::{build_sources, connected_sources};
use janitor_core::state::StateStore;
use janitor_core::validation::{FfmpegTools, Validator};
use janitor_core::watch::{PlexClient, WatchHistorySource};

use super::app_state::AppState;
use super::config::Config;

/// Wires the core components from a resolved configuration and starts the
/// validation pool. Unreachable sources and a failing Plex server are
/// logged and left out rather than aborting startup.
pub async fn build_app_state(config: Config) -> Result<AppState> {
    let janitor_config = config.janitor.clone();

    let state = Arc::new(StateStore::open(janitor_config.state.path.clone()));

    let configured = build_sources(&janitor_config);
    let configured_count = configured.len();
    let sources = connected_sources(configured).await;
    info!(
        configured = configured_count,
        connected = sources.len(),
        "source catalogs ready"
    );

    let watch = connect_plex(&config).await;
    let queue_watch = watch
        .as_ref()
        .filter(|_| janitor_config.plex.prioritize_watched)
        .cloned();

    let catalog = Arc::new(CatalogCache::new(sources, state.clone(), queue_watch));
    let tools = Arc::new(FfmpegTools::new(
        janitor_config.validation.ffprobe_path.clone(),
        janitor_config.validation.ffmpeg_path.clone(),
    ));
    let validator = Validator::new(janitor_config.validation.clone(), tools);
    let notifications = Arc::new(Notifications::from_config(&janitor_config.notifications));

    let janitor = Arc::new(Janitor::new(
        janitor_config.clone(),
        state,
        catalog,
        validator,
        notifications,
    ));
    let pool = Arc::new(ValidationPool::spawn(
        janitor.clone() as Arc<dyn FileProcessor>,
        janitor_config.scanner.workers,
        janitor_config.scanner.queue_capacity,
    ));

    info!(
        auto_replace = janitor_config.actions.auto_replace,
        dry_run = janitor_config.actions.dry_run,
        max_per_day = janitor_config.actions.max_replacements_per_day,
        scan_mode = ?janitor_config.scanner.mode,
        "janitor initialised"
    );

    Ok(AppState::new(config, janitor, pool, watch))
}

async fn connect_plex(config: &Config) -> Option<Arc<dyn WatchHistorySource>> {
    let plex = &config.janitor.plex;
    if !plex.enabled {
        return None;
    }
    let client = match PlexClient::new(plex) {
        Ok(client) => client,
        Err(err) => {
            warn!(error = %err, "could not build plex client");
            return None;
        }
    };
    if !client.test_connection().await {
        warn!(url = %plex.url, "plex unreachable; watch history disabled");
        return None;
    }
    info!(url = %plex.url, "plex connected");
    Some(Arc::new(client))
}
