//! Core domain types and service traits for upwatch
//!
//! This module defines the records that flow between watchers, the dispatch
//! engine and delivery tasks, along with the trait contracts for the two
//! pieces of network I/O the engine depends on.

use crate::drivers::DriverKind;
use crate::error::{DeliveryError, ProbeError};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Free-form driver settings of a notifier, e.g. `url` or `apikey`.
pub type NotifierConfig = BTreeMap<String, String>;

/// A URL to watch, taken verbatim from the command line.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WatchTarget(String);

impl WatchTarget {
    pub fn new(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    pub fn url(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WatchTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// How a watcher finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    /// The URL answered with a 2xx status.
    Connected,
    /// The deadline passed before the URL answered with a 2xx status.
    Timeout,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventKind::Connected => f.write_str("connected"),
            EventKind::Timeout => f.write_str("timeout"),
        }
    }
}

/// The single result a watcher produces. Serializes to the webhook body
/// `{"url": ..., "event": ..., "msg": ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    pub url: String,
    pub event: EventKind,
    pub msg: String,
}

impl EventRecord {
    pub fn connected(url: &str, status: StatusCode) -> Self {
        Self {
            url: url.to_string(),
            event: EventKind::Connected,
            msg: format!("Connected to {url}, status={status}"),
        }
    }

    pub fn timed_out(url: &str) -> Self {
        Self {
            url: url.to_string(),
            event: EventKind::Timeout,
            msg: format!("Giving up on {url}"),
        }
    }
}

/// A configured notification channel. Read-only once loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotifierDescriptor {
    pub name: String,
    pub driver: DriverKind,
    pub disabled: bool,
    pub config: NotifierConfig,
}

impl NotifierDescriptor {
    pub fn is_enabled(&self) -> bool {
        !self.disabled
    }

    /// Looks up a config value, treating an empty string as absent.
    pub fn setting(&self, key: &str) -> Option<&str> {
        self.config
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    /// Like [`setting`](Self::setting) but a missing key is a delivery failure.
    pub fn require(&self, key: &'static str) -> Result<&str, DeliveryError> {
        self.setting(key).ok_or(DeliveryError::MissingConfig { key })
    }
}

// =============================================================================
// Service Traits
// =============================================================================

/// Checks whether a URL is responding.
#[async_trait]
pub trait Probe: Send + Sync {
    /// Performs one request against `url`.
    ///
    /// # Returns
    /// * `Ok(status)` whenever the server answered, whatever the status
    /// * `Err` for transport failures (DNS, connect, timeout)
    async fn probe(&self, url: &str) -> Result<StatusCode, ProbeError>;
}

/// Delivers an event through one notifier.
#[async_trait]
pub trait Deliver: Send + Sync {
    /// Makes exactly one delivery attempt. Any non-success outcome is an `Err`.
    async fn deliver(
        &self,
        notifier: &NotifierDescriptor,
        event: &EventRecord,
    ) -> Result<(), DeliveryError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_event_record_serializes_to_webhook_body() {
        let event = EventRecord::connected("http://example.test/ok", StatusCode::OK);
        let value = serde_json::to_value(&event).unwrap();

        assert_eq!(
            value,
            json!({
                "url": "http://example.test/ok",
                "event": "connected",
                "msg": "Connected to http://example.test/ok, status=200 OK",
            })
        );
    }

    #[test]
    fn test_timeout_message_names_url() {
        let event = EventRecord::timed_out("http://example.test/down");
        assert_eq!(event.event, EventKind::Timeout);
        assert_eq!(event.msg, "Giving up on http://example.test/down");
        assert_eq!(event.event.to_string(), "timeout");
    }

    #[test]
    fn test_empty_setting_counts_as_missing() {
        let notifier = NotifierDescriptor {
            name: "hook".to_string(),
            driver: DriverKind::Webhook,
            disabled: false,
            config: NotifierConfig::from([("url".to_string(), String::new())]),
        };

        assert!(notifier.setting("url").is_none());
        assert!(matches!(
            notifier.require("url"),
            Err(DeliveryError::MissingConfig { key: "url" })
        ));
    }
}
