//! Loads the notifier list from its JSON file.
//!
//! Driver identifiers are resolved here, once, before anything is polled:
//! an entry naming an unknown driver fails the whole load.

use crate::core::{NotifierConfig, NotifierDescriptor};
use crate::drivers::DriverKind;
use crate::error::ConfigError;
use serde::Deserialize;
use std::io::ErrorKind;
use std::path::Path;
use tracing::{debug, info, warn};

/// A notifier entry as written in the file. Field names are accepted in
/// lowercase or capitalised form.
#[derive(Debug, Deserialize)]
struct RawNotifier {
    #[serde(alias = "Name")]
    name: String,
    #[serde(alias = "Driver")]
    driver: String,
    #[serde(default, alias = "Disabled")]
    disabled: bool,
    #[serde(default, alias = "Config")]
    config: NotifierConfig,
}

impl TryFrom<RawNotifier> for NotifierDescriptor {
    type Error = ConfigError;

    fn try_from(raw: RawNotifier) -> Result<Self, Self::Error> {
        let driver = raw
            .driver
            .parse::<DriverKind>()
            .map_err(|_| ConfigError::UnknownDriver {
                name: raw.name.clone(),
                driver: raw.driver.clone(),
            })?;
        Ok(NotifierDescriptor {
            name: raw.name,
            driver,
            disabled: raw.disabled,
            config: raw.config,
        })
    }
}

/// Parses and validates a notifier list from JSON text.
pub fn parse_notifiers(json: &str, path: &Path) -> Result<Vec<NotifierDescriptor>, ConfigError> {
    let raw: Vec<RawNotifier> =
        serde_json::from_str(json).map_err(|source| ConfigError::NotifierParse {
            path: path.to_path_buf(),
            source,
        })?;
    raw.into_iter().map(NotifierDescriptor::try_from).collect()
}

/// Reads the notifier file at `path`.
///
/// # Returns
/// * `Ok(None)` if the file does not exist, cannot be read, or is not valid
///   JSON (a warning is logged and no notifications are sent)
/// * `Ok(Some(list))` with every entry validated
/// * `Err` if an entry names an unknown driver
pub fn load_notifiers(path: &Path) -> Result<Option<Vec<NotifierDescriptor>>, ConfigError> {
    let notifiers = match read_notifiers(path) {
        Ok(Some(notifiers)) => notifiers,
        Ok(None) => {
            warn!(
                "Notifier file {:?} not found; events will be logged but not delivered",
                path
            );
            return Ok(None);
        }
        Err(e @ ConfigError::UnknownDriver { .. }) => return Err(e),
        Err(e) => {
            let reason = std::error::Error::source(&e)
                .map(ToString::to_string)
                .unwrap_or_default();
            warn!(
                "Problem loading notifiers: {} ({}); events will be logged but not delivered",
                e, reason
            );
            return Ok(None);
        }
    };

    for n in &notifiers {
        debug!(name = %n.name, driver = %n.driver, disabled = n.disabled, "Loaded notifier");
    }
    info!(
        "Loaded {} notifier(s) from {:?} ({} disabled)",
        notifiers.len(),
        path,
        notifiers.iter().filter(|n| n.disabled).count()
    );
    Ok(Some(notifiers))
}

fn read_notifiers(path: &Path) -> Result<Option<Vec<NotifierDescriptor>>, ConfigError> {
    let json = match std::fs::read_to_string(path) {
        Ok(json) => json,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(ConfigError::NotifierFile {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    parse_notifiers(&json, path).map(Some)
}
