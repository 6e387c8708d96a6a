//! Keeps track of every task the dispatch engine spawns.
use futures::future::join_all;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

/// Spawns named tasks and keeps their `JoinHandle`s so they can be joined
/// and checked for panics once the engine is done.
#[derive(Debug, Default)]
pub struct TaskManager {
    handles: Vec<(&'static str, JoinHandle<()>)>,
}

impl TaskManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawns a new task and adds its handle to the manager.
    pub fn spawn<F>(&mut self, name: &'static str, future: F)
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        debug!(task_name = name, "Spawning task");
        let handle = tokio::spawn(future);
        self.handles.push((name, handle));
    }

    /// Waits for all managed tasks and returns how many of them panicked.
    pub async fn join_all(self) -> usize {
        let (task_names, handles): (Vec<_>, Vec<_>) = self.handles.into_iter().unzip();
        debug!("Joining {} tasks", task_names.len());

        let results = join_all(handles).await;

        let mut panicked = 0;
        for (task_name, result) in task_names.iter().zip(results) {
            if let Err(e) = result {
                error!(task_name, error = %e, "Task did not finish cleanly");
                panicked += 1;
            }
        }

        if panicked == 0 {
            info!("All {} tasks finished.", task_names.len());
        } else {
            error!("{} of {} tasks panicked", panicked, task_names.len());
        }
        panicked
    }
}
