//! Integration Tests for the Paperdrop Receiver
//!
//! These tests drive the complete receive flow — polling, accumulation, and
//! delivery — against scripted endpoint answers and a real filesystem sink.

use async_trait::async_trait;
use paperdrop_receiver::{
    DownloadsSink, Inbox, IncomingFile, PollConfig, PollEndpoint, PollOutcome, ReceiveError,
    ReceiveSession, Result,
};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::sleep;

/// Endpoint double that plays back a scripted sequence of answers and
/// reports `Empty` once the script is exhausted.
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

/// Helper to build a FOUND answer.
fn found(id: &str, filename: &str, encoded_payload: &str, size_bytes: u64) -> Result<PollOutcome> {
    Ok(PollOutcome::Found(IncomingFile {
        id: id.to_string(),
        filename: filename.to_string(),
        encoded_payload: encoded_payload.to_string(),
        size_bytes,
    }))
}

/// Helper config with a fast probe period for tests.
fn fast_config() -> PollConfig {
    PollConfig {
        poll_interval: Duration::from_millis(10),
        request_timeout: Duration::from_millis(500),
    }
}

/// Wait until the inbox holds `expected` entries or a generous deadline
/// passes.
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
async fn test_empty_found_empty_sequence() {
    let endpoint = ScriptedEndpoint::new(vec![
        Ok(PollOutcome::Empty),
        found("a", "x.pdf", "QQ==", 1),
        Ok(PollOutcome::Empty),
    ]);

    let dir = tempfile::tempdir().unwrap();
    let sink = Arc::new(DownloadsSink::new(dir.path()));
    let mut session = ReceiveSession::new(endpoint, sink, fast_config());

    session.start_receiving();
    let inbox = session.inbox();
    wait_for_len(&inbox, 1).await;

    // Further EMPTY cycles leave the collection untouched.
    sleep(Duration::from_millis(60)).await;
    session.stop_receiving();

    let snapshot = inbox.snapshot().await;
    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot[0].id, "a");
    assert_eq!(snapshot[0].filename, "x.pdf");
    assert_eq!(snapshot[0].size_bytes, 1);
}

#[tokio::test]
async fn test_delivery_writes_decoded_bytes_to_disk() {
    let endpoint = ScriptedEndpoint::new(vec![found("a", "x.pdf", "QQ==", 1)]);

    let dir = tempfile::tempdir().unwrap();
    let sink = Arc::new(DownloadsSink::new(dir.path()));
    let mut session = ReceiveSession::new(endpoint, sink, fast_config());

    session.start_receiving();
    wait_for_len(&session.inbox(), 1).await;
    session.stop_receiving();

    let path = session.deliver("a").await.unwrap();
    assert_eq!(path, dir.path().join("x.pdf"));
    // "QQ==" decodes to the single byte 0x41.
    assert_eq!(std::fs::read(&path).unwrap(), vec![0x41]);
    assert!(session.inbox().is_empty().await);
}

#[tokio::test]
async fn test_deliver_missing_id_reports_not_found() {
    let endpoint = ScriptedEndpoint::new(vec![found("a", "x.pdf", "QQ==", 1)]);

    let dir = tempfile::tempdir().unwrap();
    let sink = Arc::new(DownloadsSink::new(dir.path()));
    let mut session = ReceiveSession::new(endpoint, sink, fast_config());

    session.start_receiving();
    wait_for_len(&session.inbox(), 1).await;
    session.stop_receiving();

    let error = session.deliver("missing").await.unwrap_err();
    assert!(matches!(error, ReceiveError::NotFound(_)));
    assert_eq!(session.inbox().len().await, 1);
}

#[tokio::test]
async fn test_duplicate_announcements_yield_one_entry() {
    let endpoint = ScriptedEndpoint::new(vec![
        found("a", "x.pdf", "QQ==", 1),
        found("a", "x.pdf", "QQ==", 1),
        Ok(PollOutcome::Empty),
    ]);

    let dir = tempfile::tempdir().unwrap();
    let sink = Arc::new(DownloadsSink::new(dir.path()));
    let mut session = ReceiveSession::new(endpoint, sink, fast_config());

    session.start_receiving();
    wait_for_len(&session.inbox(), 1).await;
    sleep(Duration::from_millis(60)).await;
    session.stop_receiving();

    assert_eq!(session.inbox().len().await, 1);
}

#[tokio::test]
async fn test_error_then_found_still_appends() {
    let endpoint = ScriptedEndpoint::new(vec![
        Err(ReceiveError::UnexpectedStatus(500)),
        found("a", "x.pdf", "QQ==", 1),
    ]);

    let dir = tempfile::tempdir().unwrap();
    let sink = Arc::new(DownloadsSink::new(dir.path()));
    let mut session = ReceiveSession::new(endpoint, sink, fast_config());

    session.start_receiving();
    wait_for_len(&session.inbox(), 1).await;
    session.stop_receiving();

    assert!(session.inbox().contains("a").await);
}

#[tokio::test]
async fn test_failed_delivery_leaves_entry_for_retry() {
    let endpoint = ScriptedEndpoint::new(vec![found("bad", "broken.pdf", "!!!", 3)]);

    let dir = tempfile::tempdir().unwrap();
    let sink = Arc::new(DownloadsSink::new(dir.path()));
    let mut session = ReceiveSession::new(endpoint, sink, fast_config());

    session.start_receiving();
    wait_for_len(&session.inbox(), 1).await;
    session.stop_receiving();

    let error = session.deliver("bad").await.unwrap_err();
    assert!(matches!(error, ReceiveError::Decode(_)));

    // The entry is still there, unchanged, and nothing landed on disk.
    let snapshot = session.inbox().snapshot().await;
    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot[0].encoded_payload, "!!!");
    assert!(!dir.path().join("broken.pdf").exists());
}

#[tokio::test]
async fn test_multiple_files_deliver_in_any_order() {
    let endpoint = ScriptedEndpoint::new(vec![
        found("a", "first.pdf", "QQ==", 1),
        found("b", "second.pdf", "Qg==", 1),
        found("c", "third.pdf", "Qw==", 1),
    ]);

    let dir = tempfile::tempdir().unwrap();
    let sink = Arc::new(DownloadsSink::new(dir.path()));
    let mut session = ReceiveSession::new(endpoint, sink, fast_config());

    session.start_receiving();
    wait_for_len(&session.inbox(), 3).await;
    session.stop_receiving();

    // Discovery order is preserved in the collection.
    let snapshot = session.inbox().snapshot().await;
    assert_eq!(snapshot[0].id, "a");
    assert_eq!(snapshot[1].id, "b");
    assert_eq!(snapshot[2].id, "c");

    // Delivery order is caller-driven.
    session.deliver("b").await.unwrap();
    session.deliver("a").await.unwrap();
    session.deliver("c").await.unwrap();

    assert!(session.inbox().is_empty().await);
    assert_eq!(std::fs::read(dir.path().join("first.pdf")).unwrap(), b"A");
    assert_eq!(std::fs::read(dir.path().join("second.pdf")).unwrap(), b"B");
    assert_eq!(std::fs::read(dir.path().join("third.pdf")).unwrap(), b"C");
}
