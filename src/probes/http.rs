//! # HTTP range-request probe.
//!
//! [`HttpProbe`] treats an identifier as a URL and confirms it is usable by
//! requesting only the first bytes of the body:
//!
//! ```text
//! GET <id>
//! Range: bytes=0-<range_end>
//!
//! 2xx (incl. 206)            ──► Ok(())
//! 408 / 429 / 5xx            ──► ProbeError::Failed  (retryable)
//! other 4xx                  ──► ProbeError::Fatal   (not retried)
//! transport error            ──► ProbeError::Failed
//! ctx cancelled              ──► ProbeError::Canceled (request dropped)
//! ```
//!
//! The response body is never read; dropping the response closes the stream.

use std::sync::Arc;

use reqwest::{Client, StatusCode, header};
use tokio_util::sync::CancellationToken;

use crate::error::ProbeError;
use crate::probes::probe::{BoxProbeFuture, Probe};

/// Probe backed by a shared [`reqwest::Client`].
#[derive(Clone, Debug)]
pub struct HttpProbe {
    client: Client,
    range_end: u64,
}

impl Default for HttpProbe {
    fn default() -> Self {
        Self::new(Client::new())
    }
}

impl HttpProbe {
    /// Creates a probe that requests the first 1024 bytes of each resource.
    pub fn new(client: Client) -> Self {
        Self {
            client,
            range_end: 1023,
        }
    }

    /// Overrides the last byte offset requested (inclusive).
    pub fn with_range_end(mut self, range_end: u64) -> Self {
        self.range_end = range_end;
        self
    }
}

impl Probe for HttpProbe {
    fn name(&self) -> &str {
        "http"
    }

    fn probe(&self, id: Arc<str>, ctx: CancellationToken) -> BoxProbeFuture {
        let request = self
            .client
            .get(&*id)
            .header(header::RANGE, format!("bytes=0-{}", self.range_end));

        Box::pin(async move {
            tokio::select! {
                biased;
                _ = ctx.cancelled() => Err(ProbeError::Canceled),
                res = request.send() => match res {
                    Ok(resp) => classify_status(resp.status()),
                    Err(e) => Err(ProbeError::failed(e.to_string())),
                },
            }
        })
    }
}

/// Maps a response status onto the probe contract.
fn classify_status(status: StatusCode) -> Result<(), ProbeError> {
    if status.is_success() {
        return Ok(());
    }
    let reason = format!("http status {}", status.as_u16());
    match status {
        StatusCode::REQUEST_TIMEOUT | StatusCode::TOO_MANY_REQUESTS => Err(ProbeError::failed(reason)),
        s if s.is_server_error() => Err(ProbeError::failed(reason)),
        _ => Err(ProbeError::fatal(reason)),
    }
}
