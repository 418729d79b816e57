//! Running the scanner against a live page and feeding the item queue.

use std::io;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::{DiscoveredItem, PageScanner, ScanRules};
use crate::fetch::{self, FetchError, Fetcher};

/// Why a scan stopped early.
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    /// The index page could not be fetched. Fatal for the crawl.
    #[error("failed to fetch index page {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: FetchError,
    },
    #[error("scan cancelled")]
    Cancelled,
    /// Every consumer of the item queue went away.
    #[error("item queue closed before the scan finished")]
    QueueClosed,
    #[error("scanner task failed: {0}")]
    Join(String),
}

/// Fetch `page_url` and push every discovered item into `queue` as soon as it is
/// recognized. Returns the number of items emitted.
///
/// Blocking (the fetch and `blocking_send`); run via `spawn_blocking`.
pub fn scan_page(
    fetcher: &dyn Fetcher,
    page_url: &str,
    rules: &ScanRules,
    cancel: &CancellationToken,
    queue: &mpsc::Sender<DiscoveredItem>,
) -> Result<u64, ScanError> {
    let mut scanner = PageScanner::new(rules);
    let mut emitted = 0u64;

    let send = |items: Vec<DiscoveredItem>, emitted: &mut u64| -> io::Result<()> {
        for item in items {
            tracing::trace!(category = %item.category, title = %item.title, "discovered");
            queue
                .blocking_send(item)
                .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "item queue closed"))?;
            *emitted += 1;
        }
        Ok(())
    };

    let fetched = fetcher.fetch(page_url, &mut |chunk| {
        if cancel.is_cancelled() {
            return Err(fetch::interrupted());
        }
        send(scanner.feed(chunk), &mut emitted)
    });

    match fetched {
        Ok(bytes) => tracing::debug!(url = page_url, bytes, "index page fetched"),
        Err(FetchError::Cancelled) => return Err(ScanError::Cancelled),
        Err(FetchError::Sink(e)) if e.kind() == io::ErrorKind::BrokenPipe => {
            return Err(ScanError::QueueClosed)
        }
        Err(source) => {
            return Err(ScanError::Fetch {
                url: page_url.to_string(),
                source,
            })
        }
    }

    send(scanner.finish(), &mut emitted).map_err(|_| ScanError::QueueClosed)?;
    Ok(emitted)
}

/// Start the single scanner task for a crawl.
///
/// The returned receiver is the lazy item sequence; it ends when the scan ends
/// (successfully or not). The join handle carries the scan's outcome, which the
/// caller must check: a page fetch failure only shows up there.
pub fn spawn_scanner(
    fetcher: Arc<dyn Fetcher>,
    page_url: String,
    rules: ScanRules,
    cancel: CancellationToken,
    capacity: usize,
) -> (mpsc::Receiver<DiscoveredItem>, JoinHandle<Result<u64, ScanError>>) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    let handle = tokio::task::spawn_blocking(move || {
        let res = scan_page(fetcher.as_ref(), &page_url, &rules, &cancel, &tx);
        match &res {
            Ok(n) => tracing::info!(url = %page_url, items = *n, "scan finished"),
            Err(e) => tracing::warn!(url = %page_url, "scan stopped: {}", e),
        }
        res
        // `tx` drops here, closing the queue.
    });
    (rx, handle)
}
