//! upwatch - URL availability watcher
//!
//! Polls each URL given on the command line until it answers with a 2xx
//! status or a deadline passes, then notifies every configured channel.

use anyhow::Result;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use upwatch::{app::App, cli::Cli, config::Config};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Load configuration by layering sources: defaults, file, environment, and CLI args.
    let config = match Config::load(&cli) {
        Ok(config) => config,
        Err(err) => {
            init_logging("info");
            error!("Failed to load configuration: {}", err);
            std::process::exit(1);
        }
    };

    init_logging(&config.log_level);

    if let Err(err) = run(cli, config).await {
        error!("{:#}", err);
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: Config) -> Result<()> {
    info!("upwatch starting up...");
    info!("-------------------- Configuration --------------------");
    info!("Log Level: {}", config.log_level);
    info!("Notifier File: {}", config.notifiers_path.display());
    info!("Poll Interval: {}s", config.watch.poll_interval_seconds);
    info!("Deadline: {}s", config.watch.deadline_seconds);
    info!("Probe Timeout: {}s", config.watch.request_timeout_seconds);
    info!("Delivery Attempts: {}", config.delivery.max_attempts);
    info!("Delivery Backoff: {}s", config.delivery.backoff_seconds);
    info!("-------------------------------------------------------");

    let app = App::builder(config).targets(cli.urls).build()?;
    app.run().await?;

    info!("Nothing left to watch or deliver. Exiting.");
    Ok(())
}

/// `RUST_LOG` wins over the configured level when it is set.
fn init_logging(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
