//! Command-Line Interface (CLI) argument parsing.
//!
//! This module defines the command-line arguments for the application using the
//! `clap` crate. The positional URLs are the watch targets; the optional flags
//! are merged over the `upwatch.toml` file and environment variables.

use clap::Parser;
use figment::{
    value::{Dict, Map, Value},
    Error, Metadata, Profile, Provider,
};
use std::path::PathBuf;

/// Waits for URLs to come up and notifies you when they do (or don't).
#[derive(Parser, Debug, Clone, Default)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// URLs to watch.
    #[arg(value_name = "URL")]
    pub urls: Vec<String>,

    /// Path to the TOML configuration file.
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Path to the JSON notifier list.
    #[arg(short, long, value_name = "FILE")]
    pub notifiers: Option<PathBuf>,

    /// Log level (e.g. "debug", "info").
    #[arg(long, value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Seconds between failed probes.
    #[arg(long, value_name = "SECONDS")]
    pub poll_interval: Option<u64>,

    /// Seconds before giving up on a URL.
    #[arg(long, value_name = "SECONDS")]
    pub deadline: Option<u64>,
}

impl Provider for Cli {
    fn metadata(&self) -> Metadata {
        Metadata::named("Command-Line Arguments")
    }

    fn data(&self) -> Result<Map<Profile, Dict>, Error> {
        let mut dict = Dict::new();

        if let Some(path) = &self.notifiers {
            dict.insert(
                "notifiers_path".into(),
                Value::from(path.to_string_lossy().into_owned()),
            );
        }

        if let Some(level) = &self.log_level {
            dict.insert("log_level".into(), Value::from(level.clone()));
        }

        let mut watch = Dict::new();
        if let Some(interval) = self.poll_interval {
            watch.insert("poll_interval_seconds".into(), Value::from(interval));
        }
        if let Some(deadline) = self.deadline {
            watch.insert("deadline_seconds".into(), Value::from(deadline));
        }
        if !watch.is_empty() {
            dict.insert("watch".into(), Value::from(watch));
        }

        let mut map = Map::new();
        map.insert(Profile::Default, dict);
        Ok(map)
    }
}
