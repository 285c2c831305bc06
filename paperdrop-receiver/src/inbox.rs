//! Received-File Collection
//!
//! Ordered, deduplicated storage for files that have been discovered but not
//! yet delivered. Insertion order is discovery order. The poller is the only
//! appender; the dispatcher is the only remover, and removal happens only
//! after a successful delivery.

use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

use crate::IncomingFile;

/// Shared collection of received-but-undelivered files.
///
/// Cloning an `Inbox` is cheap and yields a handle to the same underlying
/// storage, so the poller, the dispatcher, and any read-only observer all see
/// one collection. No two entries ever share an id.
#[derive(Debug, Clone, Default)]
pub struct Inbox {
    files: Arc<RwLock<Vec<IncomingFile>>>,
}

impl Inbox {
    /// Create an empty inbox.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a file iff its id is not already present.
    ///
    /// Returns `true` when the file was inserted, `false` when an entry with
    /// the same id already exists (the existing entry is kept untouched).
    /// Duplicate announcements from the remote side are expected to be rare
    /// but must never yield two entries.
    pub async fn append(&self, file: IncomingFile) -> bool {
        let mut files = self.files.write().await;
        if files.iter().any(|f| f.id == file.id) {
            debug!("Ignoring duplicate announcement for file {}", file.id);
            return false;
        }
        files.push(file);
        true
    }

    /// Remove and return the entry with the given id, if present.
    pub async fn remove(&self, id: &str) -> Option<IncomingFile> {
        let mut files = self.files.write().await;
        let position = files.iter().position(|f| f.id == id)?;
        Some(files.remove(position))
    }

    /// Get a copy of the entry with the given id, if present.
    pub async fn get(&self, id: &str) -> Option<IncomingFile> {
        self.files.read().await.iter().find(|f| f.id == id).cloned()
    }

    /// Check whether an entry with the given id is stored.
    pub async fn contains(&self, id: &str) -> bool {
        self.files.read().await.iter().any(|f| f.id == id)
    }

    /// Snapshot of all stored entries in discovery order.
    pub async fn snapshot(&self) -> Vec<IncomingFile> {
        self.files.read().await.clone()
    }

    /// Number of stored entries.
    pub async fn len(&self) -> usize {
        self.files.read().await.len()
    }

    /// Whether the inbox holds no entries.
    pub async fn is_empty(&self) -> bool {
        self.files.read().await.is_empty()
    }

    /// Non-blocking entry count for synchronous contexts.
    ///
    /// Returns 0 if the collection is currently locked for writing.
    pub fn count(&self) -> usize {
        self.files.try_read().map(|f| f.len()).unwrap_or(0)
    }
}
