//! The main application logic, decoupled from the entry point.

use crate::{
    config::Config,
    core::{Deliver, NotifierDescriptor, Probe, WatchTarget},
    delivery::RetryPolicy,
    dispatch::{DispatchEngine, DispatchSummary},
    drivers::HttpDrivers,
    error::ConfigError,
    notifiers::load_notifiers,
    watcher::{HttpProber, WatchPolicy},
};
use anyhow::Result;
use std::{sync::Arc, time::Duration};
use tracing::{debug, info, instrument};

/// A fully validated application, ready to run.
pub struct App {
    engine: DispatchEngine,
    targets: Vec<WatchTarget>,
}

impl App {
    /// Creates a new `AppBuilder` to construct an `App`.
    pub fn builder(config: Config) -> AppBuilder {
        AppBuilder::new(config)
    }

    /// Runs until every watcher and every delivery has finished.
    pub async fn run(self) -> Result<DispatchSummary> {
        let summary = self.engine.run(self.targets).await?;
        info!(
            "Finished: {} event(s), {} delivery task(s)",
            summary.events.len(),
            summary.deliveries_spawned
        );
        Ok(summary)
    }
}

/// Builder for the main application.
///
/// Startup validation happens in [`build`](Self::build): no network activity
/// takes place until it has succeeded. The overrides let tests swap the
/// network-facing pieces for fakes.
pub struct AppBuilder {
    config: Config,
    targets: Vec<WatchTarget>,
    notifiers_override: Option<Vec<NotifierDescriptor>>,
    prober_override: Option<Arc<dyn Probe>>,
    deliverer_override: Option<Arc<dyn Deliver>>,
}

impl AppBuilder {
    /// Creates a new `AppBuilder` with the given configuration.
    pub fn new(config: Config) -> Self {
        Self {
            config,
            targets: Vec::new(),
            notifiers_override: None,
            prober_override: None,
            deliverer_override: None,
        }
    }

    /// Sets the URLs to watch.
    pub fn targets<I, S>(mut self, urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.targets = urls.into_iter().map(WatchTarget::new).collect();
        self
    }

    /// Uses the given notifiers instead of reading the notifier file.
    pub fn notifiers_override(mut self, notifiers: Vec<NotifierDescriptor>) -> Self {
        self.notifiers_override = Some(notifiers);
        self
    }

    /// Overrides the URL prober for testing.
    pub fn prober_override(mut self, prober: Arc<dyn Probe>) -> Self {
        self.prober_override = Some(prober);
        self
    }

    /// Overrides the notification drivers for testing.
    pub fn deliverer_override(mut self, deliverer: Arc<dyn Deliver>) -> Self {
        self.deliverer_override = Some(deliverer);
        self
    }

    /// Validates the startup preconditions and assembles the engine.
    #[instrument(skip_all)]
    pub fn build(self) -> Result<App> {
        let config = self.config;

        // =========================================================================
        // 1. Startup validation
        // =========================================================================
        if self.targets.is_empty() {
            return Err(ConfigError::NoTargets.into());
        }

        let notifiers = match self.notifiers_override {
            Some(notifiers) => notifiers,
            None => load_notifiers(&config.notifiers_path)?.unwrap_or_default(),
        };

        // =========================================================================
        // 2. Network-facing services
        // =========================================================================
        let prober = match self.prober_override {
            Some(prober) => prober,
            None => {
                let timeout = Duration::from_secs(config.watch.request_timeout_seconds);
                debug!(?timeout, "Initializing HTTP prober");
                Arc::new(HttpProber::new(timeout)?) as Arc<dyn Probe>
            }
        };

        let deliverer = match self.deliverer_override {
            Some(deliverer) => deliverer,
            None => {
                let timeout = Duration::from_secs(config.delivery.request_timeout_seconds);
                debug!(?timeout, "Initializing notification drivers");
                Arc::new(HttpDrivers::new(timeout)?) as Arc<dyn Deliver>
            }
        };

        // =========================================================================
        // 3. Dispatch engine
        // =========================================================================
        let engine = DispatchEngine::new(notifiers, prober, deliverer)
            .with_watch_policy(WatchPolicy::from(&config.watch))
            .with_retry_policy(RetryPolicy::from(&config.delivery));

        Ok(App {
            engine,
            targets: self.targets,
        })
    }
}
