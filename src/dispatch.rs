//! The dispatch engine: runs the watchers, fans each event out to the
//! enabled notifiers and decides when everything is finished.
//!
//! Watchers and delivery tasks never touch the engine's counters. They
//! report over two channels and the engine's single loop does all the
//! bookkeeping, so the counters need no lock.

use crate::core::{Deliver, EventRecord, NotifierDescriptor, Probe, WatchTarget};
use crate::delivery::{DeliveryDone, DeliveryTask, RetryPolicy};
use crate::error::ConfigError;
use crate::task_manager::TaskManager;
use crate::watcher::{UrlWatcher, WatchPolicy};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, instrument, warn};

/// What a watcher reports when its task ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatcherExit {
    Finished(EventRecord),
    /// The watcher task ended without producing an event (it panicked).
    Aborted { url: String },
}

/// Sends exactly one [`WatcherExit`]: `Finished` through [`emit`](Self::emit),
/// or `Aborted` if dropped first.
#[derive(Debug)]
pub struct WatcherSlot {
    tx: mpsc::UnboundedSender<WatcherExit>,
    url: String,
    emitted: bool,
}

impl WatcherSlot {
    pub fn new(tx: mpsc::UnboundedSender<WatcherExit>, url: &str) -> Self {
        Self {
            tx,
            url: url.to_string(),
            emitted: false,
        }
    }

    pub fn emit(mut self, event: EventRecord) {
        self.emitted = true;
        if self.tx.send(WatcherExit::Finished(event)).is_err() {
            error!(url = %self.url, "Watcher completion channel closed");
        }
    }
}

impl Drop for WatcherSlot {
    fn drop(&mut self) {
        if !self.emitted {
            let exit = WatcherExit::Aborted {
                url: self.url.clone(),
            };
            if self.tx.send(exit).is_err() {
                error!(url = %self.url, "Watcher completion channel closed");
            }
        }
    }
}

/// Work the engine is still waiting for.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Outstanding {
    pub watchers: usize,
    pub deliveries: usize,
}

impl Outstanding {
    pub fn is_idle(&self) -> bool {
        self.watchers == 0 && self.deliveries == 0
    }

    fn watcher_finished(&mut self) {
        match self.watchers.checked_sub(1) {
            Some(n) => self.watchers = n,
            None => error!("Watcher finished with none outstanding"),
        }
    }

    fn delivery_spawned(&mut self) {
        self.deliveries += 1;
    }

    fn delivery_finished(&mut self) {
        match self.deliveries.checked_sub(1) {
            Some(n) => self.deliveries = n,
            None => error!("Delivery finished with none outstanding"),
        }
    }
}

/// What happened during a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchSummary {
    /// Every event produced, in the order the engine received them.
    pub events: Vec<EventRecord>,
    /// Delivery tasks spawned across all events.
    pub deliveries_spawned: usize,
    /// Watchers that ended without an event.
    pub watchers_aborted: usize,
}

pub struct DispatchEngine {
    notifiers: Vec<Arc<NotifierDescriptor>>,
    prober: Arc<dyn Probe>,
    deliverer: Arc<dyn Deliver>,
    watch_policy: WatchPolicy,
    retry_policy: RetryPolicy,
}

impl DispatchEngine {
    pub fn new(
        notifiers: Vec<NotifierDescriptor>,
        prober: Arc<dyn Probe>,
        deliverer: Arc<dyn Deliver>,
    ) -> Self {
        Self {
            notifiers: notifiers.into_iter().map(Arc::new).collect(),
            prober,
            deliverer,
            watch_policy: WatchPolicy::default(),
            retry_policy: RetryPolicy::default(),
        }
    }

    pub fn with_watch_policy(mut self, policy: WatchPolicy) -> Self {
        self.watch_policy = policy;
        self
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    /// Notifiers that will receive events.
    pub fn enabled_notifiers(&self) -> impl Iterator<Item = &Arc<NotifierDescriptor>> {
        self.notifiers.iter().filter(|n| n.is_enabled())
    }

    /// Watches every target and delivers every resulting event, returning
    /// once no watcher and no delivery is left.
    ///
    /// Fails only if `targets` is empty.
    #[instrument(skip_all, fields(targets = targets.len()))]
    pub async fn run(self, targets: Vec<WatchTarget>) -> Result<DispatchSummary, ConfigError> {
        if targets.is_empty() {
            return Err(ConfigError::NoTargets);
        }

        let (watcher_tx, mut watcher_rx) = mpsc::unbounded_channel::<WatcherExit>();
        let (done_tx, mut done_rx) = mpsc::unbounded_channel::<DeliveryDone>();
        let mut tasks = TaskManager::new();
        let mut outstanding = Outstanding::default();
        let mut summary = DispatchSummary::default();

        info!(
            "Watching {} URL(s) with {} enabled notifier(s)",
            targets.len(),
            self.enabled_notifiers().count()
        );

        for target in targets {
            let slot = WatcherSlot::new(watcher_tx.clone(), target.url());
            let watcher = UrlWatcher::new(target, self.watch_policy, self.prober.clone());
            tasks.spawn("watcher", async move {
                let event = watcher.run().await;
                slot.emit(event);
            });
            outstanding.watchers += 1;
        }
        drop(watcher_tx);

        while !outstanding.is_idle() {
            tokio::select! {
                Some(exit) = watcher_rx.recv() => {
                    outstanding.watcher_finished();
                    match exit {
                        WatcherExit::Finished(event) => {
                            info!(url = %event.url, event = %event.event, "{}", event.msg);
                            let spawned = self.fan_out(&event, &mut tasks, &done_tx);
                            for _ in 0..spawned {
                                outstanding.delivery_spawned();
                            }
                            summary.deliveries_spawned += spawned;
                            summary.events.push(event);
                        }
                        WatcherExit::Aborted { url } => {
                            error!(
                                %url,
                                "Watcher ended without an event; nothing will be delivered for it"
                            );
                            summary.watchers_aborted += 1;
                        }
                    }
                }
                Some(done) = done_rx.recv() => {
                    outstanding.delivery_finished();
                    debug!(notifier = %done.notifier, url = %done.url, "Delivery task finished");
                }
                else => {
                    warn!(?outstanding, "Completion channels closed with work outstanding");
                    break;
                }
            }
            debug!(
                watchers = outstanding.watchers,
                deliveries = outstanding.deliveries,
                "Outstanding work"
            );
        }

        tasks.join_all().await;
        info!(
            events = summary.events.len(),
            deliveries = summary.deliveries_spawned,
            "All watchers and deliveries finished"
        );
        Ok(summary)
    }

    /// Spawns one delivery task per enabled notifier and returns how many.
    fn fan_out(
        &self,
        event: &EventRecord,
        tasks: &mut TaskManager,
        done_tx: &mpsc::UnboundedSender<DeliveryDone>,
    ) -> usize {
        let event = Arc::new(event.clone());
        let mut spawned = 0;
        for notifier in self.enabled_notifiers() {
            let task = DeliveryTask::new(
                notifier.clone(),
                event.clone(),
                self.deliverer.clone(),
                self.retry_policy,
                done_tx.clone(),
            );
            tasks.spawn("delivery", async move {
                task.run().await;
            });
            spawned += 1;
        }
        if spawned == 0 {
            debug!(url = %event.url, "No enabled notifiers for event");
        }
        spawned
    }
}
