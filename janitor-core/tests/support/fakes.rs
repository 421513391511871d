//! Hand-written stand-ins for the remote catalogs and the ffmpeg tools.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use janitor_core::error::{SourceError, ToolError};
use janitor_core::sources::SourceCatalog;
use janitor_core::validation::ffprobe::FfprobeOutput;
use janitor_core::validation::{DecodeOutcome, DecodeWindow, MediaProbe};
use janitor_model::{DeletionKey, EpisodeId, MediaRecord, SearchKey, SourceKind};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceCall {
    Delete(DeletionKey),
    Search {
        search_key: SearchKey,
        episode_id: Option<EpisodeId>,
    },
    Blocklist {
        path: String,
        message: String,
    },
}

/// In-memory catalog that records every destructive call.
#[derive(Debug)]
pub struct FakeSource {
    name: String,
    kind: SourceKind,
    records: Mutex<Vec<MediaRecord>>,
    calls: Mutex<Vec<SourceCall>>,
    pub fail_fetch: AtomicBool,
    pub fail_delete: AtomicBool,
    pub fail_search: AtomicBool,
    fetch_delay: Mutex<Option<Duration>>,
    active_fetches: AtomicUsize,
    max_concurrent_fetches: AtomicUsize,
    fetches: AtomicUsize,
}

impl FakeSource {
    pub fn new(name: &str, kind: SourceKind, records: Vec<MediaRecord>) -> Self {
        Self {
            name: name.to_string(),
            kind,
            records: Mutex::new(records),
            calls: Mutex::new(Vec::new()),
            fail_fetch: AtomicBool::new(false),
            fail_delete: AtomicBool::new(false),
            fail_search: AtomicBool::new(false),
            fetch_delay: Mutex::new(None),
            active_fetches: AtomicUsize::new(0),
            max_concurrent_fetches: AtomicUsize::new(0),
            fetches: AtomicUsize::new(0),
        }
    }

    /// Makes every fetch take `delay`, so overlapping fetches are visible.
    pub fn slow_fetches(&self, delay: Duration) {
        *self.fetch_delay.lock() = Some(delay);
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    /// Most fetches ever observed running at the same time.
    pub fn max_concurrent_fetches(&self) -> usize {
        self.max_concurrent_fetches.load(Ordering::SeqCst)
    }

    pub fn set_records(&self, records: Vec<MediaRecord>) {
        *self.records.lock() = records;
    }

    pub fn calls(&self) -> Vec<SourceCall> {
        self.calls.lock().clone()
    }

    pub fn deletes(&self) -> Vec<DeletionKey> {
        self.calls
            .lock()
            .iter()
            .filter_map(|call| match call {
                SourceCall::Delete(key) => Some(*key),
                _ => None,
            })
            .collect()
    }

    fn failure(&self, endpoint: &str) -> SourceError {
        SourceError::Status {
            instance: self.name.clone(),
            endpoint: endpoint.to_string(),
            status: 500,
        }
    }
}

#[async_trait]
impl SourceCatalog for FakeSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> SourceKind {
        self.kind
    }

    async fn test_connection(&self) -> bool {
        !self.fail_fetch.load(Ordering::SeqCst)
    }

    async fn get_all_media(&self) -> Result<Vec<MediaRecord>, SourceError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let active = self.active_fetches.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_concurrent_fetches.fetch_max(active, Ordering::SeqCst);
        let delay = *self.fetch_delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.active_fetches.fetch_sub(1, Ordering::SeqCst);

        if self.fail_fetch.load(Ordering::SeqCst) {
            return Err(self.failure("media"));
        }
        let mut records = self.records.lock().clone();
        for record in &mut records {
            record.instance = self.name.clone();
        }
        Ok(records)
    }

    async fn delete_file(&self, key: DeletionKey) -> Result<(), SourceError> {
        if self.fail_delete.load(Ordering::SeqCst) {
            return Err(self.failure("file"));
        }
        self.calls.lock().push(SourceCall::Delete(key));
        Ok(())
    }

    async fn search_for_replacement(&self, item: &MediaRecord) -> Result<(), SourceError> {
        if self.fail_search.load(Ordering::SeqCst) {
            return Err(self.failure("command"));
        }
        self.calls.lock().push(SourceCall::Search {
            search_key: item.search_key,
            episode_id: item.episode_id,
        });
        Ok(())
    }

    async fn add_to_blocklist(
        &self,
        item: &MediaRecord,
        message: &str,
    ) -> Result<bool, SourceError> {
        self.calls.lock().push(SourceCall::Blocklist {
            path: item.path.clone(),
            message: message.to_string(),
        });
        Ok(true)
    }

    fn translate_path(&self, raw: &str) -> String {
        raw.to_string()
    }
}

/// Decode calls seen by [`ScriptedProbe`], as `(path, start_seconds)`.
pub type DecodeLog = Vec<(String, Option<f64>)>;

/// ffprobe/ffmpeg replacement driven by per-path scripts.
#[derive(Debug, Default)]
pub struct ScriptedProbe {
    probes: Mutex<HashMap<String, String>>,
    probe_timeouts: Mutex<HashSet<String>>,
    decodes: Mutex<HashMap<(String, u64), DecodeOutcome>>,
    default_probe: Mutex<Option<String>>,
    log: Mutex<DecodeLog>,
}

impl ScriptedProbe {
    /// Probe JSON returned for paths without their own script.
    pub fn with_default_probe(json: String) -> Self {
        let probe = Self::default();
        *probe.default_probe.lock() = Some(json);
        probe
    }

    pub fn script_probe(&self, path: &str, json: String) {
        self.probes.lock().insert(path.to_string(), json);
    }

    pub fn time_out_probe(&self, path: &str) {
        self.probe_timeouts.lock().insert(path.to_string());
    }

    /// Outcome of the decode window starting at `start_seconds` (rounded).
    pub fn script_decode(&self, path: &str, start_seconds: f64, outcome: DecodeOutcome) {
        self.decodes
            .lock()
            .insert((path.to_string(), start_seconds.round() as u64), outcome);
    }

    pub fn decode_log(&self) -> DecodeLog {
        self.log.lock().clone()
    }
}

#[async_trait]
impl MediaProbe for ScriptedProbe {
    async fn probe(&self, path: &str, timeout: Duration) -> Result<FfprobeOutput, ToolError> {
        if self.probe_timeouts.lock().contains(path) {
            return Err(ToolError::Timeout {
                tool: "ffprobe".to_string(),
                seconds: timeout.as_secs(),
            });
        }
        let json = self
            .probes
            .lock()
            .get(path)
            .cloned()
            .or_else(|| self.default_probe.lock().clone());
        match json {
            Some(json) => FfprobeOutput::parse(json.as_bytes()),
            None => Err(ToolError::Failed {
                tool: "ffprobe".to_string(),
                code: Some(1),
                stderr: "Invalid data found when processing input".to_string(),
            }),
        }
    }

    async fn decode(&self, path: &str, window: DecodeWindow, _timeout: Duration) -> DecodeOutcome {
        self.log.lock().push((path.to_string(), window.start_seconds));
        let start = window.start_seconds.unwrap_or(0.0).round() as u64;
        self.decodes
            .lock()
            .get(&(path.to_string(), start))
            .cloned()
            .unwrap_or(DecodeOutcome::Clean)
    }
}
