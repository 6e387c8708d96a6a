//! Delivery tasks: one bounded retry loop per (notifier, event) pair.
//!
//! A task reports completion, not success, to the dispatch engine. The
//! report is made by [`DoneGuard`] when it is dropped, so it fires exactly
//! once whether the task delivered, gave up, or panicked inside a driver.

use crate::config::DeliveryConfig;
use crate::core::{Deliver, EventRecord, NotifierDescriptor};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::sleep;
use tracing::{debug, error, info, instrument, warn};

/// Fixed-backoff retry policy for deliveries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    /// Pause before every attempt after the first.
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            backoff: Duration::from_secs(1),
        }
    }
}

impl From<&DeliveryConfig> for RetryPolicy {
    fn from(config: &DeliveryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            backoff: Duration::from_secs(config.backoff_seconds),
        }
    }
}

/// The completion signal a delivery task sends to the dispatch engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryDone {
    pub notifier: String,
    pub url: String,
}

/// Sends a [`DeliveryDone`] when dropped.
#[derive(Debug)]
pub struct DoneGuard {
    tx: mpsc::UnboundedSender<DeliveryDone>,
    signal: Option<DeliveryDone>,
}

impl DoneGuard {
    pub fn new(tx: mpsc::UnboundedSender<DeliveryDone>, notifier: &str, url: &str) -> Self {
        Self {
            tx,
            signal: Some(DeliveryDone {
                notifier: notifier.to_string(),
                url: url.to_string(),
            }),
        }
    }
}

impl Drop for DoneGuard {
    fn drop(&mut self) {
        if let Some(signal) = self.signal.take() {
            if self.tx.send(signal).is_err() {
                // Only happens if the engine itself is gone.
                error!("Delivery completion channel closed");
            }
        }
    }
}

/// How a delivery task ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Delivered { attempts: u32 },
    GaveUp { attempts: u32 },
}

/// Delivers one event through one notifier.
pub struct DeliveryTask {
    notifier: Arc<NotifierDescriptor>,
    event: Arc<EventRecord>,
    deliverer: Arc<dyn Deliver>,
    policy: RetryPolicy,
    // Held for the whole life of the task, including before it is first polled.
    _done: DoneGuard,
}

impl DeliveryTask {
    pub fn new(
        notifier: Arc<NotifierDescriptor>,
        event: Arc<EventRecord>,
        deliverer: Arc<dyn Deliver>,
        policy: RetryPolicy,
        done_tx: mpsc::UnboundedSender<DeliveryDone>,
    ) -> Self {
        let done = DoneGuard::new(done_tx, &notifier.name, &event.url);
        Self {
            notifier,
            event,
            deliverer,
            policy,
            _done: done,
        }
    }

    /// Runs the retry loop. Exhausting the attempts is logged, never returned
    /// as an error.
    #[instrument(skip(self), fields(notifier = %self.notifier.name, url = %self.event.url))]
    pub async fn run(self) -> DeliveryOutcome {
        let max_attempts = self.policy.max_attempts.max(1);

        for attempt in 1..=max_attempts {
            if attempt > 1 {
                sleep(self.policy.backoff).await;
            }
            debug!(attempt, "Delivering notification");

            match self.deliverer.deliver(&self.notifier, &self.event).await {
                Ok(()) => {
                    info!(attempt, "Delivered notification {}", self.notifier.name);
                    return DeliveryOutcome::Delivered { attempts: attempt };
                }
                Err(e) if attempt < max_attempts => {
                    warn!(attempt, "Retrying notification {} due to {}", self.notifier.name, e);
                }
                Err(e) => {
                    error!(
                        attempt,
                        "Giving up on notification {} after {} attempts: {}",
                        self.notifier.name,
                        max_attempts,
                        e
                    );
                }
            }
        }

        DeliveryOutcome::GaveUp {
            attempts: max_attempts,
        }
    }
}
