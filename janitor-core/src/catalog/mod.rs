//! In-memory catalog of every source instance plus the scan queue built
//! from it.

mod index;
pub mod queue;

use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use tracing::{debug, error, info, warn};

use janitor_model::{MediaRecord, MediaType, SourceFilter, SourceKind};

use self::index::CatalogIndex;
use self::queue::{interleave, order_by_watch};
use crate::sources::SourceCatalog;
use crate::state::StateStore;
use crate::watch::WatchHistorySource;

/// Stage of a refresh in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RefreshPhase {
    #[default]
    Idle,
    Fetching,
    Processing,
}

/// Observable refresh progress for status reporting.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RefreshStatus {
    pub in_progress: bool,
    pub phase: RefreshPhase,
    pub current_instance: Option<String>,
    pub last_refresh: Option<DateTime<Utc>>,
}

/// Snapshot of the cache for the status endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct CatalogStatus {
    pub refresh: RefreshStatus,
    pub queue_size: usize,
    pub cached_items: usize,
    pub movie_instances: usize,
    pub tv_instances: usize,
}

/// Last-fetched state of all source catalogs and the pending scan queue.
///
/// Refreshes are single-flight: a second caller waits for the first to
/// finish. Readers never block on a refresh in progress; they see the
/// previous snapshot until the new one is swapped in.
pub struct CatalogCache {
    sources: Vec<Arc<dyn SourceCatalog>>,
    state: Arc<StateStore>,
    watch: Option<Arc<dyn WatchHistorySource>>,
    index: RwLock<CatalogIndex>,
    queue: Mutex<VecDeque<MediaRecord>>,
    refresh_lock: tokio::sync::Mutex<()>,
    status: Mutex<RefreshStatus>,
}

impl fmt::Debug for CatalogCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CatalogCache")
            .field("sources", &self.sources)
            .field("watch_history", &self.watch.is_some())
            .field("queue_len", &self.queue_len())
            .field("status", &*self.status.lock())
            .finish_non_exhaustive()
    }
}

/// Resets the observable status even if a refresh future is dropped.
struct RefreshGuard<'a>(&'a Mutex<RefreshStatus>);

impl Drop for RefreshGuard<'_> {
    fn drop(&mut self) {
        let mut status = self.0.lock();
        status.in_progress = false;
        status.phase = RefreshPhase::Idle;
        status.current_instance = None;
    }
}

impl CatalogCache {
    /// Builds an empty cache over `sources`. Instance names are the routing
    /// key, so a source whose name is already taken is dropped.
    pub fn new(
        sources: Vec<Arc<dyn SourceCatalog>>,
        state: Arc<StateStore>,
        watch: Option<Arc<dyn WatchHistorySource>>,
    ) -> Self {
        let sources = unique_by_name(sources);
        let index =
            CatalogIndex::with_instances(sources.iter().map(|s| s.name()));
        Self {
            sources,
            state,
            watch,
            index: RwLock::new(index),
            queue: Mutex::new(VecDeque::new()),
            refresh_lock: tokio::sync::Mutex::new(()),
            status: Mutex::new(RefreshStatus::default()),
        }
    }

    /// Sources in configuration order.
    pub fn sources(&self) -> &[Arc<dyn SourceCatalog>] {
        &self.sources
    }

    /// The client for `instance`, provided it serves `kind`.
    pub fn source(&self, instance: &str, kind: SourceKind) -> Option<Arc<dyn SourceCatalog>> {
        self.sources
            .iter()
            .find(|s| s.name() == instance && s.kind() == kind)
            .cloned()
    }

    /// Re-fetches the sources selected by `filter` and rebuilds their part of
    /// the scan queue. Returns how many unscanned items were queued for the
    /// refreshed media types.
    pub async fn refresh(&self, filter: SourceFilter) -> usize {
        let _single_flight = self.refresh_lock.lock().await;
        let _reset = RefreshGuard(&self.status);
        {
            let mut status = self.status.lock();
            status.in_progress = true;
            status.phase = RefreshPhase::Fetching;
        }
        info!(target: "janitor::refresh", ?filter, "refreshing library");

        let mut fetched: Vec<(String, Vec<MediaRecord>)> = Vec::new();
        let mut failed_types: HashSet<MediaType> = HashSet::new();
        for source in &self.sources {
            let media_type = source.kind().media_type();
            if !filter.includes(media_type) {
                continue;
            }
            self.status.lock().current_instance = Some(source.name().to_string());
            match source.get_all_media().await {
                Ok(records) => {
                    fetched.push((source.name().to_string(), records));
                }
                Err(err) => {
                    warn!(
                        instance = %source.name(),
                        error = %err,
                        "failed to fetch source, keeping previous entries"
                    );
                    failed_types.insert(media_type);
                }
            }
        }

        let watch_counts = self.watch_counts().await;

        {
            let mut status = self.status.lock();
            status.phase = RefreshPhase::Processing;
            status.current_instance = None;
        }

        let (movies, episodes) = {
            let mut index = self.index.write();
            for (name, records) in fetched {
                index.replace_instance(&name, records);
            }
            for (path, owners) in index.collisions() {
                warn!(
                    path = %path,
                    owners = ?owners,
                    resolved_to = %owners[0],
                    "path reported by multiple instances"
                );
            }
            (
                index.unique_records(MediaType::Movie),
                index.unique_records(MediaType::Tv),
            )
        };

        self.update_library_totals(filter, &failed_types, &movies, &episodes);

        let scanned = self.state.get_scanned_paths();
        let total_known = movies.len() + episodes.len();
        let queued = self.rebuild_queue(filter, movies, episodes, &scanned, &watch_counts);

        if queued > 0 && !self.state.is_initial_scan_done() {
            let stats = self.state.get_stats();
            if stats.scan_started.is_none() {
                self.state.mark_scan_started();
            }
        }
        self.status.lock().last_refresh = Some(Utc::now());

        info!(
            target: "janitor::refresh",
            ?filter,
            total_files = total_known,
            new_to_scan = queued,
            already_scanned = scanned.len(),
            queue_size = self.queue_len(),
            "library refreshed"
        );
        queued
    }

    async fn watch_counts(&self) -> HashMap<String, u64> {
        let Some(watch) = &self.watch else {
            return HashMap::new();
        };
        match watch.get_watch_history().await {
            Ok(counts) => counts,
            Err(err) => {
                warn!(error = %err, "watch history unavailable, using random order");
                HashMap::new()
            }
        }
    }

    fn update_library_totals(
        &self,
        filter: SourceFilter,
        failed_types: &HashSet<MediaType>,
        movies: &[MediaRecord],
        episodes: &[MediaRecord],
    ) {
        let previous = self.state.library_totals();
        let fresh = |media_type: MediaType| {
            filter.includes(media_type) && !failed_types.contains(&media_type)
        };
        let movies_total = if fresh(MediaType::Movie) {
            movies.len() as u64
        } else {
            previous.movies
        };
        let tv_total = if fresh(MediaType::Tv) {
            episodes.len() as u64
        } else {
            previous.tv
        };
        if (movies_total, tv_total) != (previous.movies, previous.tv) {
            self.state.set_library_totals(movies_total, tv_total);
        }
    }

    fn rebuild_queue(
        &self,
        filter: SourceFilter,
        movies: Vec<MediaRecord>,
        episodes: Vec<MediaRecord>,
        scanned: &HashSet<String>,
        watch_counts: &HashMap<String, u64>,
    ) -> usize {
        let pending = |records: Vec<MediaRecord>| -> Vec<MediaRecord> {
            let mut pending: Vec<MediaRecord> = records
                .into_iter()
                .filter(|r| !scanned.contains(&r.path))
                .collect();
            order_by_watch(&mut pending, watch_counts, &mut rand::rng());
            pending
        };

        let mut queue = self.queue.lock();
        let (kept_movies, kept_episodes): (Vec<MediaRecord>, Vec<MediaRecord>) =
            queue.drain(..).partition(MediaRecord::is_movie);

        let mut queued = 0;
        let movies = if filter.includes(MediaType::Movie) {
            let fresh = pending(movies);
            queued += fresh.len();
            fresh
        } else {
            kept_movies
        };
        let episodes = if filter.includes(MediaType::Tv) {
            let fresh = pending(episodes);
            queued += fresh.len();
            fresh
        } else {
            kept_episodes
        };
        *queue = interleave(movies, episodes);
        queued
    }

    /// Records of every instance matching `filter`. A path reported by two
    /// instances appears once per instance.
    pub fn get_cached_media(&self, filter: SourceFilter) -> Vec<MediaRecord> {
        self.index.read().records(filter)
    }

    /// All known local paths.
    pub fn all_paths(&self) -> HashSet<String> {
        self.get_cached_media(SourceFilter::All)
            .into_iter()
            .map(|r| r.path)
            .collect()
    }

    /// Resolves a path to its record and owning instance, consulting
    /// instances in configuration order.
    pub fn find_item_by_path(&self, path: &str) -> Option<(MediaRecord, String)> {
        let index = self.index.read();
        let record = index.find(path)?.clone();
        let owners = index.owners(path);
        if owners.len() > 1 {
            warn!(
                path,
                owners = ?owners,
                resolved_to = %record.instance,
                "path collision, routing to first configured instance"
            );
        }
        let instance = record.instance.clone();
        Some((record, instance))
    }

    /// Whether any instance reports `path`.
    pub fn contains_path(&self, path: &str) -> bool {
        self.index.read().contains(path)
    }

    /// Inserts or replaces a single record, e.g. a freshly imported file.
    pub fn add_to_cache(&self, record: MediaRecord) {
        debug!(path = %record.path, instance = %record.instance, "caching record");
        self.index.write().upsert(record);
    }

    /// Takes up to `count` items off the front of the queue.
    pub fn next_batch(&self, count: usize) -> Vec<MediaRecord> {
        let mut queue = self.queue.lock();
        let take = count.min(queue.len());
        queue.drain(..take).collect()
    }

    /// Items waiting in the scan queue.
    pub fn queue_len(&self) -> usize {
        self.queue.lock().len()
    }

    /// Queue contents in scan order.
    pub fn queued_paths(&self) -> Vec<String> {
        self.queue.lock().iter().map(|r| r.path.clone()).collect()
    }

    /// Drops `path` from the queue if it is still waiting.
    pub fn remove_from_queue(&self, path: &str) {
        self.queue.lock().retain(|r| r.path != path);
    }

    /// Progress of the current or last refresh.
    pub fn refresh_status(&self) -> RefreshStatus {
        self.status.lock().clone()
    }

    /// True once any refresh has completed.
    pub fn has_refreshed(&self) -> bool {
        self.status.lock().last_refresh.is_some()
    }

    /// Queue, cache and refresh figures for the status endpoint.
    pub fn status(&self) -> CatalogStatus {
        let count = |media_type: MediaType| {
            self.sources
                .iter()
                .filter(|s| s.kind().media_type() == media_type)
                .count()
        };
        CatalogStatus {
            refresh: self.refresh_status(),
            queue_size: self.queue_len(),
            cached_items: self.index.read().len(),
            movie_instances: count(MediaType::Movie),
            tv_instances: count(MediaType::Tv),
        }
    }
}

fn unique_by_name(sources: Vec<Arc<dyn SourceCatalog>>) -> Vec<Arc<dyn SourceCatalog>> {
    let mut names = HashSet::new();
    sources
        .into_iter()
        .filter(|source| {
            let fresh = names.insert(source.name().to_string());
            if !fresh {
                error!(
                    instance = %source.name(),
                    kind = %source.kind(),
                    "duplicate instance name, ignoring this source"
                );
            }
            fresh
        })
        .collect()
}
