//! Paperdrop Receiver Core
//!
//! Client-side receiver for asynchronously delivered documents. A
//! [`TransferPoller`] probes a remote endpoint at a fixed period and appends
//! each announced file to a shared [`Inbox`]; a [`Dispatcher`] converts a
//! stored entry into a locally materialized artifact on demand and removes it
//! exactly once. [`ReceiveSession`] ties the pieces together behind the
//! start/stop boundary the surrounding shell drives.

pub mod delivery;
pub mod endpoint;
pub mod events;
pub mod file;
pub mod inbox;
pub mod poller;
pub mod session;

mod error;

pub use delivery::{Artifact, ArtifactSink, Dispatcher, DownloadsSink};
pub use endpoint::{
    HttpPollEndpoint, PollEndpoint, PollOutcome, DEFAULT_CONNECT_TIMEOUT,
};
pub use error::{ReceiveError, Result};
pub use events::ReceiverEvent;
pub use file::{IncomingFile, ARTIFACT_CONTENT_TYPE};
pub use inbox::Inbox;
pub use poller::{PollConfig, TransferPoller, DEFAULT_POLL_INTERVAL, DEFAULT_REQUEST_TIMEOUT};
pub use session::ReceiveSession;
