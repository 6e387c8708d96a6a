//! Configuration management for upwatch
//!
//! This module defines the main `Config` struct and its sub-structs. It uses
//! the `figment` crate to layer built-in defaults, an optional
//! `upwatch.toml` file, `UPWATCH_` environment variables and command-line
//! flags, in that order of precedence.

use crate::cli::Cli;
use anyhow::Result;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// The config file read when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "upwatch.toml";

/// The main configuration struct for the application.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Config {
    /// The logging level for the application, used when `RUST_LOG` is unset.
    pub log_level: String,
    /// Path of the JSON file listing notifiers. A missing file means no notifiers.
    pub notifiers_path: PathBuf,
    /// Configuration for URL watchers.
    pub watch: WatchConfig,
    /// Configuration for notification delivery.
    pub delivery: DeliveryConfig,
}

/// Configuration for URL watchers.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct WatchConfig {
    /// Seconds to wait between failed probes.
    pub poll_interval_seconds: u64,
    /// Seconds after which a watcher gives up on its URL.
    pub deadline_seconds: u64,
    /// Timeout for a single probe request.
    pub request_timeout_seconds: u64,
}

/// Configuration for notification delivery.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct DeliveryConfig {
    /// Total attempts per notifier and event, including the first.
    pub max_attempts: u32,
    /// Seconds to wait between attempts.
    pub backoff_seconds: u64,
    /// Timeout for a single driver request.
    pub request_timeout_seconds: u64,
}

impl Config {
    /// Loads the application configuration, layering defaults, the TOML
    /// file, environment variables and CLI flags.
    pub fn load(cli: &Cli) -> Result<Self> {
        let config_path = cli
            .config
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));

        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(config_path))
            // e.g. UPWATCH_WATCH__POLL_INTERVAL_SECONDS=1
            .merge(Env::prefixed("UPWATCH_").split("__"))
            .merge(cli.clone())
            .extract()?;
        Ok(config)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            notifiers_path: PathBuf::from("notify.json"),
            watch: WatchConfig {
                poll_interval_seconds: 5,
                deadline_seconds: 24 * 60 * 60,
                request_timeout_seconds: 30,
            },
            delivery: DeliveryConfig {
                max_attempts: 5,
                backoff_seconds: 1,
                request_timeout_seconds: 30,
            },
        }
    }
}
