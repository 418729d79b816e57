//! One task per discovered item, tracked by a [`CompletionTracker`].

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{mpsc, OwnedSemaphorePermit, Semaphore};

use super::job::{execute, DownloadJob, JobContext, JobError, JobReport};
use crate::scanner::DiscoveredItem;
use crate::tracker::{Completion, CompletionTracker};

/// Spawn a job for every item read from `queue` and forward each job's report.
///
/// An item is only taken off the queue once one of the `max_in_flight` permits
/// is free, so a full queue holds the scanner back and at most `max_in_flight`
/// tasks exist at once. The returned stream closes after the queue is drained
/// (or the crawl is cancelled) and every spawned job has reported.
pub fn run_per_item(
    queue: mpsc::Receiver<DiscoveredItem>,
    ctx: Arc<JobContext>,
    max_in_flight: usize,
    capacity: usize,
) -> mpsc::Receiver<JobReport> {
    let (out, rx) = mpsc::channel(capacity.max(1));
    let max_in_flight = max_in_flight.max(1);
    tracing::debug!(max_in_flight, "starting per-item dispatch");
    let semaphore = Arc::new(Semaphore::new(max_in_flight));
    tokio::spawn(drive(queue, ctx, semaphore, out));
    rx
}

async fn drive(
    mut queue: mpsc::Receiver<DiscoveredItem>,
    ctx: Arc<JobContext>,
    semaphore: Arc<Semaphore>,
    out: mpsc::Sender<JobReport>,
) {
    let mut tracker = CompletionTracker::<JobReport>::new();
    let mut in_flight: HashMap<u64, DownloadJob> = HashMap::new();
    let mut permit: Option<OwnedSemaphorePermit> = None;
    let mut source_open = true;

    loop {
        tokio::select! {
            biased;
            _ = ctx.cancel.cancelled(), if source_open => {
                tracing::debug!(dispatched = tracker.state().dispatched(), "cancelled; no further items dispatched");
                source_open = false;
                permit = None;
                tracker.source_drained();
            }
            completion = tracker.next() => match completion {
                Some(Completion::Finished(report)) => {
                    in_flight.remove(&report.job.seq);
                    let _ = out.send(report).await;
                }
                Some(Completion::Abandoned(seq)) => {
                    tracing::error!(seq, "download task ended without reporting");
                    if let Some(job) = in_flight.remove(&seq) {
                        let _ = out.send(JobReport { job, outcome: Err(JobError::Abandoned) }).await;
                    }
                }
                None => break,
            },
            // The semaphore is never closed.
            acquired = Arc::clone(&semaphore).acquire_owned(), if source_open && permit.is_none() => {
                permit = acquired.ok();
            }
            item = queue.recv(), if source_open && permit.is_some() => match item {
                Some(item) => {
                    let signal = tracker.dispatch();
                    let job = ctx.job(signal.index(), item);
                    tracing::debug!(seq = job.seq, category = %job.item.category, title = %job.item.title, "Downloading");
                    in_flight.insert(job.seq, job.clone());

                    let ctx = Arc::clone(&ctx);
                    let held = permit.take();
                    tokio::spawn(async move {
                        let _permit = held;
                        let report = execute(&ctx, job).await;
                        signal.finish(report);
                    });
                }
                None => {
                    source_open = false;
                    permit = None;
                    tracker.source_drained();
                }
            },
        }
    }
    tracing::debug!(jobs = tracker.state().dispatched(), "per-item dispatch finished");
}
