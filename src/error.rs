//! Error types for the signal pipeline
//!
//! Only the I/O edges (remote store, transport, configuration) have real
//! errors. Parse skips, duplicates and malformed quantities are ordinary
//! outcomes and live next to the code that produces them.

use thiserror::Error;

/// Remote snapshot store errors
#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Snapshot serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid storage endpoint '{endpoint}': {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    #[error("Request signing failed: {0}")]
    Signing(String),
}

/// Message transport errors
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("Transport API error: {0}")]
    Api(String),

    #[error("Malformed transport payload: {0}")]
    Payload(#[from] serde_json::Error),

    #[error("Transport configuration error: {0}")]
    Config(String),

    #[error("Transport stream closed")]
    Closed,
}

/// Startup configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse configuration: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid configuration value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

pub type PersistenceResult<T> = Result<T, PersistenceError>;
pub type TransportResult<T> = Result<T, TransportError>;

impl PersistenceError {
    /// True when the remote store answered but the object does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, PersistenceError::Http { status: 404, .. })
    }
}
