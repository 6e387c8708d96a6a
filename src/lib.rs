/// upwatch - waits for URLs to come up and tells you about it
///
/// This library provides the watchers, the notification drivers and the
/// dispatch engine that ties them together.
pub mod app;
pub mod cli;
pub mod config;
pub mod core;
pub mod delivery;
pub mod dispatch;
pub mod drivers;
pub mod error;
pub mod notifiers;
pub mod task_manager;
pub mod watcher;

// Re-export core types for convenience
pub use crate::core::*;
