//! Transfer Poller
//!
//! Recurring background task that probes the remote endpoint at a fixed
//! period and folds each answer into the inbox. The poller is the only
//! producer of inbox entries.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{interval, timeout, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::{Inbox, PollEndpoint, PollOutcome, ReceiveError, ReceiverEvent, Result};

/// Default probe period (2 seconds)
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Default bound on a single probe's wait
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Configuration for the transfer poller
#[derive(Debug, Clone)]
pub struct PollConfig {
    /// How often to ask the endpoint for a new file
    pub poll_interval: Duration,

    /// Upper bound on a single probe; a hung request cannot stall the
    /// schedule past this
    pub request_timeout: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

/// Recurring poller that probes the endpoint and appends arrivals to the inbox
///
/// At most one probe is in flight at any time: each cycle awaits its probe
/// (bounded by `request_timeout`) before the next tick is honored. Stopping
/// the poller cancels the recurring schedule and drops any in-flight probe,
/// so a response arriving after `stop()` is discarded, never appended.
/// Dropping the poller closes the shutdown channel, which terminates the
/// probe task the same way on every exit path.
pub struct TransferPoller {
    /// Endpoint probed on every cycle
    endpoint: Arc<dyn PollEndpoint>,

    /// Shared collection arrivals are appended to
    inbox: Inbox,

    /// Event channel sender
    event_tx: mpsc::UnboundedSender<ReceiverEvent>,

    /// Poller configuration
    config: PollConfig,

    /// Shutdown signal sender; `Some` while the probe loop is running
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl TransferPoller {
    /// Create a poller. Probing does not begin until [`start`](Self::start).
    pub fn new(
        endpoint: Arc<dyn PollEndpoint>,
        inbox: Inbox,
        event_tx: mpsc::UnboundedSender<ReceiverEvent>,
        config: PollConfig,
    ) -> Self {
        Self {
            endpoint,
            inbox,
            event_tx,
            config,
            shutdown_tx: None,
        }
    }

    /// Whether the probe loop is currently running.
    pub fn is_active(&self) -> bool {
        self.shutdown_tx.is_some()
    }

    /// Start the recurring probe.
    ///
    /// Idempotent: while already active, further calls have no effect, so two
    /// concurrent schedules can never exist for one poller.
    pub fn start(&mut self) {
        if self.shutdown_tx.is_some() {
            debug!("Poller already active, ignoring start");
            return;
        }

        info!(
            "Starting transfer poller (period {:?}, probe bound {:?})",
            self.config.poll_interval, self.config.request_timeout
        );

        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        self.shutdown_tx = Some(shutdown_tx);

        self.spawn_probe_loop(shutdown_rx);
    }

    /// Stop the recurring probe. Safe to call repeatedly.
    pub fn stop(&mut self) {
        if let Some(shutdown_tx) = self.shutdown_tx.take() {
            info!("Stopping transfer poller");
            let _ = shutdown_tx.send(());
        }
    }

    /// Spawn the probe loop task.
    fn spawn_probe_loop(&self, mut shutdown_rx: oneshot::Receiver<()>) {
        let endpoint = self.endpoint.clone();
        let inbox = self.inbox.clone();
        let event_tx = self.event_tx.clone();
        let config = self.config.clone();

        tokio::spawn(async move {
            let mut ticker = interval(config.poll_interval);
            // A slow probe must not be followed by a burst of catch-up ticks.
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = &mut shutdown_rx => {
                        info!("Probe loop shutting down");
                        break;
                    }
                    _ = ticker.tick() => {}
                }

                // Racing the probe against shutdown drops an in-flight
                // request the moment the session stops; its late response
                // is never appended.
                tokio::select! {
                    _ = &mut shutdown_rx => {
                        info!("Probe loop shutting down, discarding in-flight probe");
                        break;
                    }
                    outcome = timeout(config.request_timeout, endpoint.poll()) => {
                        let outcome = outcome
                            .unwrap_or_else(|_| Err(ReceiveError::Timeout(config.request_timeout)));
                        Self::handle_probe_outcome(outcome, &inbox, &event_tx).await;
                    }
                }
            }
        });
    }

    /// Fold one probe's answer into the inbox and the event stream.
    async fn handle_probe_outcome(
        outcome: Result<PollOutcome>,
        inbox: &Inbox,
        event_tx: &mpsc::UnboundedSender<ReceiverEvent>,
    ) {
        match outcome {
            Ok(PollOutcome::Found(file)) => {
                if inbox.append(file.clone()).await {
                    info!(
                        "Received file {} ({}, {})",
                        file.id,
                        file.filename,
                        file.display_size()
                    );
                    let _ = event_tx.send(ReceiverEvent::FileReceived { file });
                } else {
                    debug!("Endpoint re-announced file {}, keeping existing entry", file.id);
                }
            }
            Ok(PollOutcome::Empty) => {
                debug!("No file waiting");
            }
            Err(e) => {
                warn!("Probe cycle failed: {}", e);
                let _ = event_tx.send(ReceiverEvent::PollFailed {
                    message: e.to_string(),
                });
            }
        }
    }
}
