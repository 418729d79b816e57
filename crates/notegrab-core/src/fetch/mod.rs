//! HTTP transport seam.
//!
//! Callers hand a URL and a body sink to a [`Fetcher`]; the fetcher streams the
//! response body into the sink chunk by chunk. Production uses libcurl
//! ([`CurlFetcher`]); tests plug in their own implementations.

mod http;

pub use http::{CurlFetcher, HttpOptions};

use std::io;

/// Streams the body of `GET url` into a sink.
///
/// Blocking: call from `spawn_blocking` when used from async code.
pub trait Fetcher: Send + Sync {
    /// Fetches `url`, handing each body chunk to `sink` in order. Returns the
    /// number of bytes delivered. If `sink` fails the transfer is aborted and the
    /// sink's error is returned (`Cancelled` for [`io::ErrorKind::Interrupted`]).
    fn fetch(
        &self,
        url: &str,
        sink: &mut dyn FnMut(&[u8]) -> io::Result<()>,
    ) -> Result<u64, FetchError>;
}

/// Error from a single fetch.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// Transport failure (DNS, connect, timeout, TLS, ...).
    #[error("{0}")]
    Curl(#[from] curl::Error),
    /// Server answered with a non-2xx status.
    #[error("HTTP {0}")]
    Http(u32),
    /// The body sink failed (disk full, queue closed, ...).
    #[error("sink: {0}")]
    Sink(#[source] io::Error),
    /// The sink asked to stop because the crawl was cancelled.
    #[error("cancelled")]
    Cancelled,
}

impl FetchError {
    /// Classify an error returned by a body sink.
    pub fn from_sink(e: io::Error) -> Self {
        if e.kind() == io::ErrorKind::Interrupted {
            FetchError::Cancelled
        } else {
            FetchError::Sink(e)
        }
    }
}

/// The error a sink returns to abort a transfer on cancellation.
pub fn interrupted() -> io::Error {
    io::Error::new(io::ErrorKind::Interrupted, "crawl cancelled")
}
