use std::fmt;
use std::sync::Arc;

use janitor_core::orchestration::{Janitor, ValidationPool};
use janitor_core::watch::WatchHistorySource;

use super::config::Config;

/// Shared handles for every request handler and scheduled task.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub janitor: Arc<Janitor>,
    pub pool: Arc<ValidationPool>,
    /// Media server used for the orphan report, when configured.
    pub watch: Option<Arc<dyn WatchHistorySource>>,
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState")
            .field("server", &self.config.server)
            .field("janitor", &self.janitor)
            .field("pool", &self.pool)
            .field("watch_history", &self.watch.is_some())
            .finish_non_exhaustive()
    }
}

impl AppState {
    pub fn new(
        config: Config,
        janitor: Arc<Janitor>,
        pool: Arc<ValidationPool>,
        watch: Option<Arc<dyn WatchHistorySource>>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            janitor,
            pool,
            watch,
        }
    }
}
