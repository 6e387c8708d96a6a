//! Notification drivers.
//!
//! The set of drivers is closed: a notifier names one of the [`DriverKind`]
//! variants and [`HttpDrivers`] dispatches on that tag. Each driver makes a
//! single HTTP request per attempt and reports any non-2xx answer as a
//! failure; retrying is the delivery task's job.

pub mod pagerduty;
pub mod prowl;
pub mod webhook;

use crate::core::{Deliver, EventRecord, NotifierDescriptor};
use crate::error::DeliveryError;
use async_trait::async_trait;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, instrument};

/// The delivery mechanisms upwatch knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DriverKind {
    /// Prowl push notifications.
    Prowl,
    /// PagerDuty Events API v2.
    PagerDuty,
    /// JSON POST to an arbitrary URL.
    Webhook,
}

impl DriverKind {
    pub const ALL: [DriverKind; 3] = [
        DriverKind::Prowl,
        DriverKind::PagerDuty,
        DriverKind::Webhook,
    ];

    /// The identifier used in the notifier file.
    pub fn as_str(&self) -> &'static str {
        match self {
            DriverKind::Prowl => "prowl",
            DriverKind::PagerDuty => "pagerduty",
            DriverKind::Webhook => "webhook",
        }
    }
}

impl fmt::Display for DriverKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a driver identifier does not name a known driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownDriver(pub String);

impl FromStr for DriverKind {
    type Err = UnknownDriver;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DriverKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| UnknownDriver(s.to_string()))
    }
}

/// Production [`Deliver`] implementation backed by a shared HTTP client.
#[derive(Debug, Clone)]
pub struct HttpDrivers {
    client: reqwest::Client,
}

impl HttpDrivers {
    /// Creates the drivers with a client whose requests time out after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("upwatch/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Deliver for HttpDrivers {
    #[instrument(skip_all, fields(notifier = %notifier.name, driver = %notifier.driver))]
    async fn deliver(
        &self,
        notifier: &NotifierDescriptor,
        event: &EventRecord,
    ) -> Result<(), DeliveryError> {
        debug!("Sending {} event for {}", event.event, event.url);
        match notifier.driver {
            DriverKind::Prowl => prowl::send(&self.client, notifier, event).await,
            DriverKind::PagerDuty => pagerduty::send(&self.client, notifier, event).await,
            DriverKind::Webhook => webhook::send(&self.client, notifier, event).await,
        }
    }
}

/// Maps a response to success only for 2xx statuses.
pub(crate) fn check_status(response: &reqwest::Response) -> Result<(), DeliveryError> {
    let status = response.status();
    if status.is_success() {
        Ok(())
    } else {
        Err(DeliveryError::Status(status))
    }
}
