//! Incoming File Model
//!
//! In-memory and wire representation of a document announced by the transfer
//! endpoint. The announcement body doubles as the stored entity: the payload
//! arrives inline, base64-encoded, and stays owned by the entry until it is
//! delivered.
//!
//! ## Wire Format
//!
//! A `FOUND` poll response carries exactly one file:
//!
//! ```json
//! {
//!     "id": "f3a9c2d4",
//!     "filename": "contract.pdf",
//!     "file_data": "JVBERi0xLjQK...",
//!     "file_size": 48213
//! }
//! ```
//!
//! `file_data` is the standard-alphabet, padded base64 encoding of the raw
//! bytes. `file_size` is the size the sender declared; it is shown to users
//! but never used for validation.

use serde::{Deserialize, Serialize};

/// Content type attached to every materialized artifact.
///
/// The transfer pipeline carries PDF documents end to end; the receiver tags
/// artifacts accordingly when handing them to the host environment.
pub const ARTIFACT_CONTENT_TYPE: &str = "application/pdf";

/// A file discovered by the poller but not yet delivered.
///
/// # Examples
///
/// ```
/// use paperdrop_receiver::IncomingFile;
///
/// let file: IncomingFile = serde_json::from_str(
///     r#"{"id":"a","filename":"x.pdf","file_data":"QQ==","file_size":1}"#,
/// ).unwrap();
///
/// assert_eq!(file.id, "a");
/// assert_eq!(file.filename, "x.pdf");
/// assert_eq!(file.size_bytes, 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomingFile {
    /// Opaque identifier minted by the sender side, stable for the session.
    /// The sole key for deduplication and removal.
    pub id: String,

    /// Display name as announced. Untrusted: consumers must reduce it to a
    /// base name before any filesystem use.
    pub filename: String,

    /// Base64 encoding of the raw file bytes.
    #[serde(rename = "file_data")]
    pub encoded_payload: String,

    /// Declared size in bytes. Display only; not checked against the decoded
    /// payload length.
    #[serde(rename = "file_size")]
    pub size_bytes: u64,
}

impl IncomingFile {
    /// Human-readable rendering of the declared size.
    ///
    /// # Examples
    ///
    /// ```
    /// use paperdrop_receiver::IncomingFile;
    ///
    /// let file = IncomingFile {
    ///     id: "a".to_string(),
    ///     filename: "x.pdf".to_string(),
    ///     encoded_payload: String::new(),
    ///     size_bytes: 2 * 1024 * 1024,
    /// };
    ///
    /// assert_eq!(file.display_size(), "2.00 MB");
    /// ```
    pub fn display_size(&self) -> String {
        const KIB: f64 = 1024.0;
        const MIB: f64 = 1024.0 * 1024.0;

        let size = self.size_bytes as f64;
        if size >= MIB {
            format!("{:.2} MB", size / MIB)
        } else if size >= KIB {
            format!("{:.1} KB", size / KIB)
        } else {
            format!("{} B", self.size_bytes)
        }
    }
}
