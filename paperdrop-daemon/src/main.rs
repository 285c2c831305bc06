mod config;

use anyhow::{Context, Result};
use clap::Parser;
use paperdrop_receiver::{DownloadsSink, HttpPollEndpoint, ReceiveSession, ReceiverEvent};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use config::Config;

/// Headless receiver for asynchronously delivered documents.
///
/// Polls the configured endpoint, accumulates announced files, and
/// materializes each one into the download directory as it arrives.
#[derive(Debug, Parser)]
#[command(name = "paperdrop-daemon", version, about)]
struct Cli {
    /// Path to the configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the polling endpoint URL
    #[arg(long)]
    poll_url: Option<String>,

    /// Override the probe period in milliseconds
    #[arg(long)]
    poll_interval_ms: Option<u64>,

    /// Override the download directory
    #[arg(long)]
    download_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    // Load configuration and apply CLI overrides
    let mut config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Some(poll_url) = cli.poll_url {
        config.endpoint.poll_url = poll_url;
    }
    if let Some(poll_interval_ms) = cli.poll_interval_ms {
        config.endpoint.poll_interval_ms = poll_interval_ms;
    }
    if let Some(download_dir) = cli.download_dir {
        config.storage.download_dir = download_dir;
    }

    info!("Starting paperdrop daemon");
    info!(
        "Polling {} every {} ms",
        config.endpoint.poll_url, config.endpoint.poll_interval_ms
    );
    info!("Delivering into {:?}", config.storage.download_dir);

    let endpoint =
        HttpPollEndpoint::new(&config.endpoint.poll_url).context("Failed to build HTTP client")?;
    let sink = Arc::new(DownloadsSink::new(&config.storage.download_dir));

    let mut session = ReceiveSession::new(Arc::new(endpoint), sink, config.poll_config());
    let mut events = session
        .take_events()
        .context("Fresh session has no event stream")?;

    session.start_receiving();
    info!("Press Ctrl+C to stop");

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            result = &mut ctrl_c => {
                result.context("Failed to listen for shutdown signal")?;
                info!("Received shutdown signal");
                break;
            }
            event = events.recv() => {
                match event {
                    Some(ReceiverEvent::FileReceived { file }) => {
                        info!("Incoming file: {} ({})", file.filename, file.display_size());
                        // The entry stays in the inbox on failure, so a later
                        // run can retry it.
                        match session.deliver(&file.id).await {
                            Ok(path) => info!("Saved to {:?}", path),
                            Err(e) => error!("Failed to deliver {}: {}", file.id, e),
                        }
                    }
                    Some(ReceiverEvent::PollFailed { message }) => {
                        warn!("Poll failed: {}", message);
                    }
                    Some(event) => {
                        debug!("Receiver event: {:?}", event);
                    }
                    None => break,
                }
            }
        }
    }

    session.stop_receiving();

    let pending = session.inbox().len().await;
    if pending > 0 {
        warn!("{} received file(s) were not delivered", pending);
    }

    info!("Daemon shutdown complete");
    Ok(())
}
