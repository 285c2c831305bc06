//! Artifact Delivery
//!
//! One-shot conversion of a stored entry into a locally materialized
//! artifact. Delivery decodes the transport encoding, hands the raw bytes to
//! the host environment's save primitive, and removes the entry from the
//! inbox only once the hand-off succeeded — an entry can therefore never be
//! delivered twice, and a failed delivery leaves it available for retry.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::{Inbox, IncomingFile, ReceiveError, ReceiverEvent, Result, ARTIFACT_CONTENT_TYPE};

/// Fallback name for announcements whose filename reduces to nothing.
const FALLBACK_FILENAME: &str = "unnamed.pdf";

/// A fully decoded file ready to be handed to the host environment.
#[derive(Debug, Clone)]
pub struct Artifact {
    /// Name under which the artifact should be saved. May still contain
    /// path separators; sinks must reduce it to a base name.
    pub filename: String,

    /// Content type of the bytes.
    pub content_type: &'static str,

    /// Raw file bytes.
    pub bytes: Vec<u8>,
}

/// Host-environment "save as file" primitive.
///
/// Production code writes into a downloads directory via [`DownloadsSink`];
/// tests substitute recording or failing doubles.
#[async_trait]
pub trait ArtifactSink: Send + Sync {
    /// Materialize the artifact, returning where it landed.
    async fn save(&self, artifact: &Artifact) -> Result<PathBuf>;
}

/// Sink that writes artifacts into a downloads directory.
///
/// The announced filename is reduced to its final path component before use,
/// and on-disk collisions are resolved by renaming (`report.pdf` →
/// `report (1).pdf`) rather than overwriting.
#[derive(Debug, Clone)]
pub struct DownloadsSink {
    target_dir: PathBuf,
}

impl DownloadsSink {
    /// Create a sink rooted at the given directory.
    pub fn new(target_dir: impl Into<PathBuf>) -> Self {
        Self {
            target_dir: target_dir.into(),
        }
    }

    /// Create a sink rooted at the user's downloads directory, falling back
    /// to `$HOME/Downloads` and finally a local `downloads` directory.
    pub fn default_location() -> Self {
        let dir = dirs::download_dir()
            .or_else(|| dirs::home_dir().map(|home| home.join("Downloads")))
            .unwrap_or_else(|| PathBuf::from("downloads"));
        Self::new(dir)
    }

    /// Directory artifacts are written into.
    pub fn target_dir(&self) -> &Path {
        &self.target_dir
    }

    /// Reduce an announced filename to a safe base name.
    ///
    /// The announced name is untrusted and must never navigate the
    /// filesystem: only its final component is kept.
    fn sanitize_filename(filename: &str) -> String {
        let base = Path::new(filename)
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        if base.is_empty() {
            FALLBACK_FILENAME.to_string()
        } else {
            base
        }
    }

    /// Pick a path under the target directory that does not collide with an
    /// existing file.
    async fn unique_path(&self, base: &str) -> PathBuf {
        let candidate = self.target_dir.join(base);
        if !tokio::fs::try_exists(&candidate).await.unwrap_or(false) {
            return candidate;
        }

        let stem = Path::new(base)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| base.to_string());
        let extension = Path::new(base)
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();

        let mut n = 1u32;
        loop {
            let candidate = self.target_dir.join(format!("{stem} ({n}){extension}"));
            if !tokio::fs::try_exists(&candidate).await.unwrap_or(false) {
                return candidate;
            }
            n += 1;
        }
    }
}

#[async_trait]
impl ArtifactSink for DownloadsSink {
    async fn save(&self, artifact: &Artifact) -> Result<PathBuf> {
        tokio::fs::create_dir_all(&self.target_dir).await?;

        let name = Self::sanitize_filename(&artifact.filename);
        let path = self.unique_path(&name).await;

        tokio::fs::write(&path, &artifact.bytes).await?;
        info!(
            "Saved {} artifact to {:?} ({} bytes)",
            artifact.content_type,
            path,
            artifact.bytes.len()
        );

        Ok(path)
    }
}

/// Performs the one-shot delivery of stored entries.
pub struct Dispatcher {
    /// Shared collection entries are delivered out of
    inbox: Inbox,

    /// Save primitive of the host environment
    sink: Arc<dyn ArtifactSink>,

    /// Event channel sender
    event_tx: mpsc::UnboundedSender<ReceiverEvent>,
}

impl Dispatcher {
    /// Create a dispatcher over the given inbox and sink.
    pub fn new(
        inbox: Inbox,
        sink: Arc<dyn ArtifactSink>,
        event_tx: mpsc::UnboundedSender<ReceiverEvent>,
    ) -> Self {
        Self {
            inbox,
            sink,
            event_tx,
        }
    }

    /// Deliver the entry with the given id.
    ///
    /// Looks the entry up, decodes its payload, hands the artifact to the
    /// sink, and removes the entry once the hand-off succeeded. Every
    /// failure is non-fatal and leaves the inbox unchanged:
    ///
    /// - [`ReceiveError::NotFound`] — no entry with that id (already
    ///   delivered or never existed)
    /// - [`ReceiveError::Decode`] — the payload is not valid base64; the
    ///   entry is kept for inspection or retry
    /// - [`ReceiveError::Delivery`] / [`ReceiveError::Io`] — the sink
    ///   refused the hand-off; the entry is kept for retry
    pub async fn deliver(&self, id: &str) -> Result<PathBuf> {
        let file = self
            .inbox
            .get(id)
            .await
            .ok_or_else(|| ReceiveError::NotFound(id.to_string()))?;

        let bytes = decode_payload(&file)?;
        let artifact = Artifact {
            filename: file.filename.clone(),
            content_type: ARTIFACT_CONTENT_TYPE,
            bytes,
        };

        let path = self.sink.save(&artifact).await?;

        // The entry leaves the inbox only after a successful hand-off.
        self.inbox.remove(id).await;

        info!("Delivered file {} to {:?}", id, path);
        let _ = self.event_tx.send(ReceiverEvent::FileDelivered {
            id: id.to_string(),
            path: path.clone(),
        });

        Ok(path)
    }
}

/// Decode a stored payload from its transport encoding into raw bytes.
fn decode_payload(file: &IncomingFile) -> Result<Vec<u8>> {
    let bytes = BASE64.decode(file.encoded_payload.as_bytes())?;

    // The declared size is display-only; a mismatch is worth a trace but is
    // not a decode failure.
    if bytes.len() as u64 != file.size_bytes {
        warn!(
            "Declared size {} differs from decoded length {} for file {}",
            file.size_bytes,
            bytes.len(),
            file.id
        );
    }

    Ok(bytes)
}
