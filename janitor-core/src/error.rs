use std::path::PathBuf;

use thiserror::Error;

/// Failures talking to a source catalog (Radarr/Sonarr) over HTTP.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("request to {instance} failed: {source}")]
    Http {
        instance: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{instance} returned {status} for {endpoint}")]
    Status {
        instance: String,
        endpoint: String,
        status: u16,
    },

    #[error("invalid url for {instance}: {source}")]
    Url {
        instance: String,
        #[source]
        source: url::ParseError,
    },

    #[error("unexpected payload from {instance}: {message}")]
    Payload { instance: String, message: String },

    #[error("{0} not found")]
    NotFound(String),
}

/// Failures running the external probe/decode tools.
#[derive(Error, Debug)]
pub enum ToolError {
    #[error("failed to spawn {tool}: {source}")]
    Spawn {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{tool} exited with code {code:?}: {stderr}")]
    Failed {
        tool: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("{tool} timed out after {seconds}s")]
    Timeout { tool: String, seconds: u64 },

    #[error("could not parse {tool} output: {source}")]
    Parse {
        tool: String,
        #[source]
        source: serde_json::Error,
    },
}

impl ToolError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, ToolError::Timeout { .. })
    }
}

/// Failures loading or saving the persistent state document.
#[derive(Error, Debug)]
pub enum StateError {
    #[error("failed to read state file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write state file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("state file {path} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Failures submitting work to the validation pool.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PoolError {
    #[error("validation pool is shut down")]
    Closed,

    #[error("validation queue is full")]
    Full,

    #[error("validation job panicked: {0}")]
    Panicked(String),

    #[error("validation job was dropped before completion")]
    Dropped,
}

/// Failures talking to the media server.
#[derive(Error, Debug)]
pub enum WatchHistoryError {
    #[error("watch history request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("watch history server returned {0}")]
    Status(u16),

    #[error("invalid watch history url: {0}")]
    Url(#[from] url::ParseError),
}

/// Failures delivering a notification.
#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("notification delivery failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("notification endpoint returned {0}")]
    Status(u16),
}

/// Crate-level error for callers that do not care which collaborator failed.
#[derive(Error, Debug)]
pub enum JanitorError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Tool(#[from] ToolError),

    #[error(transparent)]
    State(#[from] StateError),

    #[error(transparent)]
    Pool(#[from] PoolError),

    #[error(transparent)]
    WatchHistory(#[from] WatchHistoryError),

    #[error(transparent)]
    Notify(#[from] NotifyError),

    #[error("Unknown source instance: {0}")]
    UnknownInstance(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, JanitorError>;
