//! Probers that never touch the network.

use async_trait::async_trait;
use reqwest::StatusCode;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use upwatch::core::Probe;
use upwatch::error::ProbeError;

/// Returns a fixed status per URL (200 for unknown URLs) and counts calls.
#[derive(Debug, Default)]
pub struct FakeProber {
    statuses: HashMap<String, StatusCode>,
    calls: AtomicUsize,
}

impl FakeProber {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_status(mut self, url: &str, status: StatusCode) -> Self {
        self.statuses.insert(url.to_string(), status);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Probe for FakeProber {
    async fn probe(&self, url: &str) -> Result<StatusCode, ProbeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.statuses.get(url).copied().unwrap_or(StatusCode::OK))
    }
}
