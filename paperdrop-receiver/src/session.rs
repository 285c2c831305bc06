//! Receive Session
//!
//! The session is the boundary the surrounding shell drives: it owns the
//! inbox, the poller, and the dispatcher, and bounds the period during which
//! polling is active. Sessions tolerate being started and stopped any number
//! of times; stored files survive a stop and remain deliverable.

use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::info;

use crate::{
    ArtifactSink, Dispatcher, Inbox, PollConfig, PollEndpoint, ReceiverEvent, Result,
    TransferPoller,
};

/// A bounded receiving session over one endpoint and one sink.
pub struct ReceiveSession {
    inbox: Inbox,
    poller: TransferPoller,
    dispatcher: Dispatcher,
    event_tx: mpsc::UnboundedSender<ReceiverEvent>,
    event_rx: Option<mpsc::UnboundedReceiver<ReceiverEvent>>,
}

impl ReceiveSession {
    /// Create a session. Polling does not begin until
    /// [`start_receiving`](Self::start_receiving).
    pub fn new(
        endpoint: Arc<dyn PollEndpoint>,
        sink: Arc<dyn ArtifactSink>,
        config: PollConfig,
    ) -> Self {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let inbox = Inbox::new();

        let poller = TransferPoller::new(endpoint, inbox.clone(), event_tx.clone(), config);
        let dispatcher = Dispatcher::new(inbox.clone(), sink, event_tx.clone());

        Self {
            inbox,
            poller,
            dispatcher,
            event_tx,
            event_rx: Some(event_rx),
        }
    }

    /// Begin polling. No-op while already receiving.
    pub fn start_receiving(&mut self) {
        if self.poller.is_active() {
            return;
        }

        info!("Receive session starting");
        self.poller.start();
        let _ = self.event_tx.send(ReceiverEvent::SessionStarted);
    }

    /// Stop polling. Safe to call repeatedly; the inbox keeps its entries.
    pub fn stop_receiving(&mut self) {
        if !self.poller.is_active() {
            return;
        }

        info!("Receive session stopping");
        self.poller.stop();
        let _ = self.event_tx.send(ReceiverEvent::SessionStopped);
    }

    /// Whether polling is currently active.
    pub fn is_receiving(&self) -> bool {
        self.poller.is_active()
    }

    /// Handle to the shared received-file collection, for read-only
    /// observers.
    pub fn inbox(&self) -> Inbox {
        self.inbox.clone()
    }

    /// Take the session's event stream.
    ///
    /// The stream is handed out once; subsequent calls return `None`.
    pub fn take_events(&mut self) -> Option<mpsc::UnboundedReceiver<ReceiverEvent>> {
        self.event_rx.take()
    }

    /// Deliver the stored entry with the given id (see
    /// [`Dispatcher::deliver`]).
    pub async fn deliver(&self, id: &str) -> Result<PathBuf> {
        self.dispatcher.deliver(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{IncomingFile, PollOutcome};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio::time::sleep;

    struct ScriptedEndpoint {
        steps: Mutex<VecDeque<Result<PollOutcome>>>,
    }

    impl ScriptedEndpoint {
        fn new(steps: Vec<Result<PollOutcome>>) -> Arc<Self> {
            Arc::new(Self {
                steps: Mutex::new(steps.into()),
            })
        }
    }

    #[async_trait]
    impl PollEndpoint for ScriptedEndpoint {
        async fn poll(&self) -> Result<PollOutcome> {
            self.steps
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Ok(PollOutcome::Empty))
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        saved: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ArtifactSink for RecordingSink {
        async fn save(&self, artifact: &crate::Artifact) -> Result<PathBuf> {
            self.saved.lock().unwrap().push(artifact.filename.clone());
            Ok(PathBuf::from("/downloads").join(&artifact.filename))
        }
    }

    fn found(id: &str) -> Result<PollOutcome> {
        Ok(PollOutcome::Found(IncomingFile {
            id: id.to_string(),
            filename: format!("{id}.pdf"),
            encoded_payload: "QQ==".to_string(),
            size_bytes: 1,
        }))
    }

    fn fast_config() -> PollConfig {
        PollConfig {
            poll_interval: Duration::from_millis(10),
            request_timeout: Duration::from_millis(500),
        }
    }

    async fn wait_for_len(inbox: &Inbox, expected: usize) {
        for _ in 0..100 {
            if inbox.len().await == expected {
                return;
            }
            sleep(Duration::from_millis(10)).await;
        }
        panic!("inbox never reached {expected} entries");
    }

    #[tokio::test]
    async fn test_receive_then_deliver() {
        let endpoint = ScriptedEndpoint::new(vec![Ok(PollOutcome::Empty), found("a")]);
        let sink = Arc::new(RecordingSink::default());
        let mut session = ReceiveSession::new(endpoint, sink.clone(), fast_config());

        session.start_receiving();
        let inbox = session.inbox();
        wait_for_len(&inbox, 1).await;
        session.stop_receiving();

        let path = session.deliver("a").await.unwrap();
        assert_eq!(path, PathBuf::from("/downloads/a.pdf"));
        assert!(inbox.is_empty().await);
        assert_eq!(sink.saved.lock().unwrap().as_slice(), ["a.pdf"]);
    }

    #[tokio::test]
    async fn test_delivery_is_exactly_once() {
        let endpoint = ScriptedEndpoint::new(vec![found("a")]);
        let mut session = ReceiveSession::new(
            endpoint,
            Arc::new(RecordingSink::default()),
            fast_config(),
        );

        session.start_receiving();
        wait_for_len(&session.inbox(), 1).await;
        session.stop_receiving();

        session.deliver("a").await.unwrap();
        let error = session.deliver("a").await.unwrap_err();
        assert!(matches!(error, crate::ReceiveError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_session_survives_restart_cycles() {
        let endpoint = ScriptedEndpoint::new(vec![found("a")]);
        let mut session = ReceiveSession::new(
            endpoint.clone(),
            Arc::new(RecordingSink::default()),
            fast_config(),
        );

        session.start_receiving();
        assert!(session.is_receiving());
        wait_for_len(&session.inbox(), 1).await;

        session.stop_receiving();
        session.stop_receiving();
        assert!(!session.is_receiving());

        // A later session start keeps the stored entry and picks up new ones.
        endpoint.steps.lock().unwrap().push_back(found("b"));
        session.start_receiving();
        session.start_receiving();
        wait_for_len(&session.inbox(), 2).await;
        session.stop_receiving();

        let snapshot = session.inbox().snapshot().await;
        assert_eq!(snapshot[0].id, "a");
        assert_eq!(snapshot[1].id, "b");
    }

    #[tokio::test]
    async fn test_lifecycle_events() {
        let endpoint = ScriptedEndpoint::new(vec![]);
        let mut session = ReceiveSession::new(
            endpoint,
            Arc::new(RecordingSink::default()),
            fast_config(),
        );

        let mut events = session.take_events().unwrap();
        assert!(session.take_events().is_none());

        session.start_receiving();
        session.start_receiving();
        session.stop_receiving();

        assert!(matches!(
            events.try_recv().unwrap(),
            ReceiverEvent::SessionStarted
        ));
        // The redundant start emitted nothing.
        assert!(matches!(
            events.try_recv().unwrap(),
            ReceiverEvent::SessionStopped
        ));
        assert!(events.try_recv().is_err());
    }
}
