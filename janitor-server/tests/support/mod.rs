#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, Response, StatusCode};
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use janitor_core::catalog::CatalogCache;
use janitor_core::config::JanitorConfig;
use janitor_core::error::{SourceError, ToolError};
use janitor_core::notify::Notifications;
use janitor_core::orchestration::{FileProcessor, Janitor, ValidationPool};
use janitor_core::sources::SourceCatalog;
use janitor_core::state::StateStore;
use janitor_core::validation::ffprobe::FfprobeOutput;
use janitor_core::validation::{DecodeOutcome, DecodeWindow, MediaProbe, Validator};
use janitor_model::{DeletionKey, MediaRecord, SearchKey, SourceKind};
use janitor_server::infra::config::{Config, ConfigMetadata, LoggingConfig, ServerConfig};
use janitor_server::{AppState, create_app};

/// Read-only catalog that rewrites `/remote` to `/local`.
#[derive(Debug)]
pub struct StaticSource {
    name: String,
    kind: SourceKind,
    records: Vec<MediaRecord>,
}

impl StaticSource {
    pub fn new(name: &str, kind: SourceKind, records: Vec<MediaRecord>) -> Self {
        Self {
            name: name.to_string(),
            kind,
            records,
        }
    }
}

#[async_trait]
impl SourceCatalog for StaticSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> SourceKind {
        self.kind
    }

    async fn test_connection(&self) -> bool {
        true
    }

    async fn get_all_media(&self) -> Result<Vec<MediaRecord>, SourceError> {
        Ok(self.records.clone())
    }

    async fn delete_file(&self, _key: DeletionKey) -> Result<(), SourceError> {
        Ok(())
    }

    async fn search_for_replacement(&self, _item: &MediaRecord) -> Result<(), SourceError> {
        Ok(())
    }

    async fn add_to_blocklist(
        &self,
        _item: &MediaRecord,
        _message: &str,
    ) -> Result<bool, SourceError> {
        Ok(false)
    }

    fn translate_path(&self, raw: &str) -> String {
        match raw.strip_prefix("/remote") {
            Some(rest) => format!("/local{rest}"),
            None => raw.to_string(),
        }
    }
}

/// Probe that always fails; router tests never reach validation of a
/// real file.
#[derive(Debug, Default)]
pub struct UnreachableProbe;

#[async_trait]
impl MediaProbe for UnreachableProbe {
    async fn probe(&self, _path: &str, _timeout: Duration) -> Result<FfprobeOutput, ToolError> {
        Err(ToolError::Failed {
            tool: "ffprobe".to_string(),
            code: Some(1),
            stderr: "not available in tests".to_string(),
        })
    }

    async fn decode(&self, _path: &str, _window: DecodeWindow, _timeout: Duration) -> DecodeOutcome {
        DecodeOutcome::Clean
    }
}

pub fn movie(title: &str, year: i32, path: &str, file: i64, size_bytes: u64) -> MediaRecord {
    MediaRecord {
        title: title.to_string(),
        path: path.to_string(),
        search_key: SearchKey::new(file + 1000),
        deletion_key: DeletionKey::new(file),
        quality: "Bluray-1080p".to_string(),
        size_bytes,
        source: SourceKind::Radarr,
        instance: "radarr".to_string(),
        year: Some(year),
        folder_path: None,
        series_id: None,
        episode_id: None,
        coordinates: None,
    }
}

pub struct TestApp {
    pub state: AppState,
    pub router: Router,
    _dir: TempDir,
}

impl TestApp {
    pub async fn build(records: Vec<MediaRecord>, webhooks_enabled: bool) -> Self {
        let dir = TempDir::new().expect("temp dir");
        let mut janitor_config = JanitorConfig::default();
        janitor_config.state.path = dir.path().join("state.json");
        janitor_config.scanner.item_delay_millis = 0;

        let sources: Vec<Arc<dyn SourceCatalog>> = vec![
            Arc::new(StaticSource::new("radarr", SourceKind::Radarr, records)),
            Arc::new(StaticSource::new("sonarr", SourceKind::Sonarr, Vec::new())),
        ];
        let state_store = Arc::new(StateStore::open(janitor_config.state.path.clone()));
        let catalog = Arc::new(CatalogCache::new(sources, state_store.clone(), None));
        let validator = Validator::new(
            janitor_config.validation.clone(),
            Arc::new(UnreachableProbe),
        );
        let janitor = Arc::new(Janitor::new(
            janitor_config.clone(),
            state_store,
            catalog,
            validator,
            Arc::new(Notifications::default()),
        ));
        let pool = Arc::new(ValidationPool::spawn(
            janitor.clone() as Arc<dyn FileProcessor>,
            1,
            8,
        ));

        let config = Config {
            server: ServerConfig {
                webhooks_enabled,
                ..ServerConfig::default()
            },
            logging: LoggingConfig::default(),
            janitor: janitor_config,
            metadata: ConfigMetadata::default(),
        };
        let state = AppState::new(config, janitor, pool, None);
        let router = create_app(state.clone());
        Self {
            state,
            router,
            _dir: dir,
        }
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .uri(uri)
            .body(Body::empty())
            .expect("request builds");
        self.send(request).await
    }

    pub async fn post_json(&self, uri: &str, body: &Value) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .expect("request builds");
        self.send(request).await
    }

    pub async fn post(&self, uri: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .body(Body::empty())
            .expect("request builds");
        self.send(request).await
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response: Response<Body> = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body reads");
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }
}
