//! Polls a single URL until it answers with a 2xx status or the deadline passes.
//!
//! Each watcher runs as its own task and produces exactly one
//! [`EventRecord`]. Transport errors and non-2xx statuses are treated the
//! same way: log, check the deadline, sleep, try again.

use crate::config::WatchConfig;
use crate::core::{EventRecord, Probe, WatchTarget};
use crate::error::ProbeError;
use async_trait::async_trait;
use reqwest::StatusCode;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, instrument, warn};

/// Timing for a watcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatchPolicy {
    /// Pause between failed probes.
    pub poll_interval: Duration,
    /// How long to keep trying before giving up.
    pub deadline: Duration,
}

impl Default for WatchPolicy {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(5),
            deadline: Duration::from_secs(24 * 60 * 60),
        }
    }
}

impl From<&WatchConfig> for WatchPolicy {
    fn from(config: &WatchConfig) -> Self {
        Self {
            poll_interval: Duration::from_secs(config.poll_interval_seconds),
            deadline: Duration::from_secs(config.deadline_seconds),
        }
    }
}

/// State of a watcher after a probe attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    Polling,
    Connected(StatusCode),
    TimedOut,
}

impl PollState {
    /// Decides the next state from the status of the latest probe (`None`
    /// when the request itself failed) and the time spent so far.
    ///
    /// The deadline is exclusive: a watcher whose elapsed time equals the
    /// deadline exactly keeps polling.
    pub fn after_attempt(
        status: Option<StatusCode>,
        elapsed: Duration,
        deadline: Duration,
    ) -> Self {
        match status {
            Some(status) if status.is_success() => PollState::Connected(status),
            _ if elapsed > deadline => PollState::TimedOut,
            _ => PollState::Polling,
        }
    }
}

/// Probes URLs with a plain HTTP GET.
#[derive(Debug, Clone)]
pub struct HttpProber {
    client: reqwest::Client,
}

impl HttpProber {
    /// Creates a prober whose requests time out after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Probe for HttpProber {
    async fn probe(&self, url: &str) -> Result<StatusCode, ProbeError> {
        let parsed = reqwest::Url::parse(url).map_err(|e| ProbeError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        let response = self.client.get(parsed).send().await?;
        Ok(response.status())
    }
}

/// Watches one target.
pub struct UrlWatcher {
    target: WatchTarget,
    policy: WatchPolicy,
    prober: Arc<dyn Probe>,
}

impl UrlWatcher {
    pub fn new(target: WatchTarget, policy: WatchPolicy, prober: Arc<dyn Probe>) -> Self {
        Self {
            target,
            policy,
            prober,
        }
    }

    /// Polls until the target connects or times out and returns the event.
    #[instrument(skip(self), fields(url = %self.target))]
    pub async fn run(&self) -> EventRecord {
        let url = self.target.url();
        let start = Instant::now();
        let mut attempt: u64 = 0;

        loop {
            attempt += 1;
            debug!(attempt, "Probing {}", url);

            let status = match self.prober.probe(url).await {
                Ok(status) => {
                    info!(attempt, %status, "Status of {}", url);
                    Some(status)
                }
                Err(e) => {
                    warn!(attempt, error = %e, "Probe of {} failed", url);
                    None
                }
            };

            match PollState::after_attempt(status, start.elapsed(), self.policy.deadline) {
                PollState::Connected(status) => {
                    info!(attempt, "Connected to {}", url);
                    return EventRecord::connected(url, status);
                }
                PollState::TimedOut => {
                    warn!(attempt, deadline = ?self.policy.deadline, "Giving up on {}", url);
                    return EventRecord::timed_out(url);
                }
                PollState::Polling => {
                    if let Some(status) = status {
                        debug!(%status, "Non-success status from {}", url);
                    }
                    sleep(self.policy.poll_interval).await;
                }
            }
        }
    }
}
