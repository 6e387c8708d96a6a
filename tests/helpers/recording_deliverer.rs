//! A deliverer that records every attempt instead of sending anything.

use async_trait::async_trait;
use reqwest::StatusCode;
use std::sync::Mutex;
use upwatch::core::{Deliver, EventRecord, NotifierDescriptor};
use upwatch::error::DeliveryError;

#[derive(Debug, Default)]
pub struct RecordingDeliverer {
    attempts: Mutex<Vec<(String, EventRecord)>>,
    fail: bool,
}

impl RecordingDeliverer {
    pub fn new() -> Self {
        Self::default()
    }

    /// A deliverer whose every attempt fails.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn attempts(&self) -> Vec<(String, EventRecord)> {
        self.attempts.lock().unwrap().clone()
    }

    pub fn attempts_for(&self, notifier: &str) -> usize {
        self.attempts
            .lock()
            .unwrap()
            .iter()
            .filter(|(name, _)| name == notifier)
            .count()
    }
}

#[async_trait]
impl Deliver for RecordingDeliverer {
    async fn deliver(
        &self,
        notifier: &NotifierDescriptor,
        event: &EventRecord,
    ) -> Result<(), DeliveryError> {
        self.attempts
            .lock()
            .unwrap()
            .push((notifier.name.clone(), event.clone()));
        if self.fail {
            Err(DeliveryError::Status(StatusCode::INTERNAL_SERVER_ERROR))
        } else {
            Ok(())
        }
    }
}
