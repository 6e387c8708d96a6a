//! Error types shared across the watcher, delivery and startup paths.

use reqwest::StatusCode;
use std::path::PathBuf;
use thiserror::Error;

/// Fatal startup errors. Any of these aborts the run before a watcher starts.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no URLs were given to watch")]
    NoTargets,

    #[error("notifier '{name}' uses unknown driver '{driver}'")]
    UnknownDriver { name: String, driver: String },

    #[error("failed to read notifier file {path:?}")]
    NotifierFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse notifier file {path:?}")]
    NotifierParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// A single reachability probe failed at the transport level.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("invalid url '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

/// A single delivery attempt failed. The retry loop does not distinguish
/// between variants; they exist for the log lines.
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("remote responded with {0}")]
    Status(StatusCode),

    #[error("notifier config is missing '{key}'")]
    MissingConfig { key: &'static str },
}
