//! Polling Endpoint Client
//!
//! The receiver consumes a minimal HTTP contract from the remote side: a
//! parameterless request whose answer falls into one of three classes.
//!
//! | Response           | Meaning                               |
//! |--------------------|---------------------------------------|
//! | `200 OK` + body    | a file is ready, metadata and payload inline |
//! | `204 No Content`   | nothing has arrived yet, keep waiting |
//! | anything else      | probe failure, retried next tick      |
//!
//! The trait seam exists so the poller can be driven by scripted doubles in
//! tests; production code uses [`HttpPollEndpoint`].

use async_trait::async_trait;
use reqwest::StatusCode;
use std::time::Duration;
use tracing::debug;

use crate::{IncomingFile, ReceiveError, Result};

/// Default bound for establishing a connection to the endpoint.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Outcome of a single probe cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// A file is ready; its metadata and payload were returned inline.
    Found(IncomingFile),

    /// No file has arrived yet. A waiting state, not an error.
    Empty,
}

/// A remote endpoint that can be asked whether a new file has arrived.
#[async_trait]
pub trait PollEndpoint: Send + Sync {
    /// Perform one probe and classify the answer.
    async fn poll(&self) -> Result<PollOutcome>;
}

/// HTTP implementation of [`PollEndpoint`].
///
/// Issues a `GET` against the configured URL per probe. The connect timeout
/// is enforced here; the per-probe total bound is enforced by the poller so
/// that scripted endpoints are covered by it too.
#[derive(Debug, Clone)]
pub struct HttpPollEndpoint {
    client: reqwest::Client,
    url: String,
}

impl HttpPollEndpoint {
    /// Build a client for the given poll URL with the default connect timeout.
    pub fn new(url: impl Into<String>) -> Result<Self> {
        Self::with_connect_timeout(url, DEFAULT_CONNECT_TIMEOUT)
    }

    /// Build a client for the given poll URL with an explicit connect timeout.
    pub fn with_connect_timeout(url: impl Into<String>, connect_timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .build()?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }

    /// The URL probed on every cycle.
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl PollEndpoint for HttpPollEndpoint {
    async fn poll(&self) -> Result<PollOutcome> {
        let response = self.client.get(&self.url).send().await?;

        match response.status() {
            StatusCode::OK => {
                let body = response.bytes().await?;
                let file = parse_found(&body)?;
                debug!(
                    "Endpoint announced file {} ({}, {} bytes)",
                    file.id, file.filename, file.size_bytes
                );
                Ok(PollOutcome::Found(file))
            }
            StatusCode::NO_CONTENT => Ok(PollOutcome::Empty),
            status => Err(ReceiveError::UnexpectedStatus(status.as_u16())),
        }
    }
}

/// Parse a FOUND response body into an [`IncomingFile`].
fn parse_found(body: &[u8]) -> Result<IncomingFile> {
    Ok(serde_json::from_slice(body)?)
}
