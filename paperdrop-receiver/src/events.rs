//! Receiver Event System
//!
//! This module defines events emitted by a receive session. Observers (a
//! presentation layer, the daemon's delivery loop) consume them from the
//! session's unbounded channel.

use std::path::PathBuf;

use crate::IncomingFile;

/// Events emitted by a receive session
#[derive(Debug, Clone)]
pub enum ReceiverEvent {
    /// Polling started
    SessionStarted,

    /// Polling stopped; stored files remain available for delivery
    SessionStopped,

    /// A new file was discovered and appended to the inbox
    FileReceived {
        /// The stored entry, payload included
        file: IncomingFile,
    },

    /// A probe cycle failed; polling continues on the next tick
    PollFailed {
        /// Human-readable failure description
        message: String,
    },

    /// A stored file was materialized and removed from the inbox
    FileDelivered {
        /// Id of the delivered entry
        id: String,
        /// Where the artifact landed
        path: PathBuf,
    },
}

impl ReceiverEvent {
    /// Check if this is a file received event
    pub fn is_file_received(&self) -> bool {
        matches!(self, ReceiverEvent::FileReceived { .. })
    }

    /// Check if this is a poll failure event
    pub fn is_poll_failed(&self) -> bool {
        matches!(self, ReceiverEvent::PollFailed { .. })
    }

    /// Get the file id if this event is file-related
    pub fn file_id(&self) -> Option<&str> {
        match self {
            ReceiverEvent::FileReceived { file } => Some(&file.id),
            ReceiverEvent::FileDelivered { id, .. } => Some(id),
            _ => None,
        }
    }
}
