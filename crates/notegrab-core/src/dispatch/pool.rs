//! Fixed worker pool over the shared item queue.

use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};

use super::job::{execute, DownloadJob, JobContext, JobReport};
use crate::scanner::DiscoveredItem;

/// Per-worker report channel capacity.
const REPORT_CAPACITY: usize = 16;

/// The scanner's queue plus the discovery counter, handed out under one lock so
/// `seq` and destination claims follow discovery order.
struct SharedQueue {
    rx: mpsc::Receiver<DiscoveredItem>,
    next_seq: u64,
}

/// Start `workers` tasks that pull items from `queue` until it is closed and
/// empty, or until the crawl is cancelled.
///
/// Each worker reports on its own channel; the channel closes when the worker
/// exits. Merge the returned receivers to observe completion of the whole pool.
pub fn run_pool(
    queue: mpsc::Receiver<DiscoveredItem>,
    workers: usize,
    ctx: Arc<JobContext>,
) -> Vec<mpsc::Receiver<JobReport>> {
    let shared = Arc::new(Mutex::new(SharedQueue {
        rx: queue,
        next_seq: 0,
    }));
    let workers = workers.max(1);
    tracing::debug!(workers, "starting download pool");

    (0..workers)
        .map(|worker| {
            let (tx, rx) = mpsc::channel(REPORT_CAPACITY);
            let shared = Arc::clone(&shared);
            let ctx = Arc::clone(&ctx);
            tokio::spawn(async move {
                let mut done = 0u64;
                while let Some(job) = next_job(&shared, &ctx).await {
                    tracing::debug!(worker, seq = job.seq, category = %job.item.category, title = %job.item.title, "Downloading");
                    let report = execute(&ctx, job).await;
                    done += 1;
                    if tx.send(report).await.is_err() {
                        tracing::warn!(worker, "report receiver dropped; worker stopping");
                        break;
                    }
                }
                tracing::trace!(worker, jobs = done, "worker exiting");
            });
            rx
        })
        .collect()
}

/// Job for the next item, or `None` once the queue is exhausted or the crawl is
/// cancelled.
async fn next_job(shared: &Mutex<SharedQueue>, ctx: &JobContext) -> Option<DownloadJob> {
    if ctx.cancel.is_cancelled() {
        return None;
    }
    let mut queue = shared.lock().await;
    let item = tokio::select! {
        biased;
        _ = ctx.cancel.cancelled() => None,
        item = queue.rx.recv() => item,
    }?;
    let seq = queue.next_seq;
    queue.next_seq += 1;
    Some(ctx.job(seq, item))
}
