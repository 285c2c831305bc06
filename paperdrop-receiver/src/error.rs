//! Error handling for the receiver core
//!
//! A single error type covers all receiver operations. None of the variants
//! are fatal to a receive session: probe failures are retried on the next
//! scheduled tick, and delivery failures leave the affected entry in the
//! inbox for inspection or retry. Underlying library errors convert
//! automatically via `thiserror`.
//!
//! ## Error Categories
//!
//! - Probe-cycle failures (`Http`, `UnexpectedStatus`, `Timeout`, `Json`):
//!   transient; the poller logs them, emits a non-fatal event, and keeps
//!   polling.
//! - `NotFound`: a delivery referenced an id that is no longer stored
//!   (already delivered or never existed). Reported, state unchanged.
//! - `Decode`: the stored payload is not valid base64. The entry is kept.
//! - `Delivery` / `Io`: the host-side artifact hand-off failed. The entry
//!   is kept.

use std::time::Duration;
use thiserror::Error;

/// Result type for receiver operations
pub type Result<T> = std::result::Result<T, ReceiveError>;

/// Errors that can occur while polling for or delivering files
///
/// # Examples
///
/// ```rust
/// use paperdrop_receiver::ReceiveError;
///
/// let error = ReceiveError::NotFound("a".to_string());
/// assert_eq!(error.to_string(), "no received file with id: a");
/// assert!(!error.is_transient());
///
/// let error = ReceiveError::UnexpectedStatus(500);
/// assert!(error.is_transient());
/// ```
#[derive(Error, Debug)]
pub enum ReceiveError {
    /// Probe request failed at the transport level
    ///
    /// Automatically converted from `reqwest::Error`.
    #[error("poll request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The endpoint answered outside the FOUND/EMPTY contract
    ///
    /// Any status other than `200 OK` (file ready) and `204 No Content`
    /// (nothing yet) lands here.
    #[error("unexpected poll response status: {0}")]
    UnexpectedStatus(u16),

    /// A probe did not complete within the configured bound
    #[error("poll request timed out after {0:?}")]
    Timeout(Duration),

    /// A FOUND response body could not be parsed
    ///
    /// Automatically converted from `serde_json::Error`.
    #[error("malformed poll response: {0}")]
    Json(#[from] serde_json::Error),

    /// Delivery referenced an id that is not in the inbox
    ///
    /// Raised when the entry was already delivered or never existed.
    #[error("no received file with id: {0}")]
    NotFound(String),

    /// A stored payload could not be decoded from its transport encoding
    ///
    /// Automatically converted from `base64::DecodeError`. The entry stays
    /// in the inbox.
    #[error("payload decode failed: {0}")]
    Decode(#[from] base64::DecodeError),

    /// The artifact hand-off was refused by the sink
    #[error("artifact delivery failed: {0}")]
    Delivery(String),

    /// I/O error while materializing an artifact
    ///
    /// Automatically converted from `std::io::Error`.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ReceiveError {
    /// Check whether this error belongs to a single probe cycle
    ///
    /// Transient errors are recovered by simply letting the next scheduled
    /// tick retry; they never stop the recurring probe.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use paperdrop_receiver::ReceiveError;
    /// use std::time::Duration;
    ///
    /// assert!(ReceiveError::Timeout(Duration::from_secs(10)).is_transient());
    /// assert!(!ReceiveError::Delivery("denied".to_string()).is_transient());
    /// ```
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ReceiveError::Http(_)
                | ReceiveError::UnexpectedStatus(_)
                | ReceiveError::Timeout(_)
                | ReceiveError::Json(_)
        )
    }
}
