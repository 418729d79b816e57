//! Counting completion tracker for per-item dispatch.
//!
//! The driver calls [`CompletionTracker::dispatch`] synchronously for every item
//! *before* spawning its task, and [`CompletionTracker::source_drained`] once the
//! item source is exhausted. Each task owns a [`CompletionSignal`] that reports
//! exactly once, on `finish` or, failing that, on drop.

use tokio::sync::mpsc;

/// Dispatched/finished bookkeeping. Pure; no I/O.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompletionState {
    dispatched: u64,
    finished: u64,
    source_drained: bool,
}

/// A finish arrived with nothing outstanding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("completion signal without an outstanding job ({finished} finished of {dispatched} dispatched)")]
pub struct UnexpectedFinish {
    pub dispatched: u64,
    pub finished: u64,
}

impl CompletionState {
    pub fn on_dispatch(&mut self) {
        debug_assert!(!self.source_drained, "dispatch after source drained");
        self.dispatched += 1;
    }

    pub fn on_finish(&mut self) -> Result<(), UnexpectedFinish> {
        if self.finished >= self.dispatched {
            return Err(UnexpectedFinish {
                dispatched: self.dispatched,
                finished: self.finished,
            });
        }
        self.finished += 1;
        Ok(())
    }

    pub fn on_source_drained(&mut self) {
        self.source_drained = true;
    }

    pub fn outstanding(&self) -> u64 {
        self.dispatched - self.finished
    }

    pub fn dispatched(&self) -> u64 {
        self.dispatched
    }

    /// Done only once the source can produce nothing more and every dispatched
    /// job has finished.
    pub fn is_done(&self) -> bool {
        self.source_drained && self.finished == self.dispatched
    }
}

/// What a job's signal delivered.
#[derive(Debug)]
pub enum Completion<T> {
    Finished(T),
    /// The signal with this dispatch index was dropped without `finish` (the
    /// task panicked or was aborted).
    Abandoned(u64),
}

/// One job's completion handle. Reports exactly once.
#[derive(Debug)]
pub struct CompletionSignal<T> {
    index: u64,
    tx: Option<mpsc::UnboundedSender<Completion<T>>>,
}

impl<T> CompletionSignal<T> {
    /// Zero-based dispatch order of this job.
    pub fn index(&self) -> u64 {
        self.index
    }

    pub fn finish(mut self, value: T) {
        if let Some(tx) = self.tx.take() {
            let _ = tx.send(Completion::Finished(value));
        }
    }
}

impl<T> Drop for CompletionSignal<T> {
    fn drop(&mut self) {
        if let Some(tx) = self.tx.take() {
            let _ = tx.send(Completion::Abandoned(self.index));
        }
    }
}

/// Tracks outstanding per-item jobs and yields their completions.
#[derive(Debug)]
pub struct CompletionTracker<T> {
    state: CompletionState,
    tx: mpsc::UnboundedSender<Completion<T>>,
    rx: mpsc::UnboundedReceiver<Completion<T>>,
}

impl<T> Default for CompletionTracker<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> CompletionTracker<T> {
    pub fn new() -> Self {
        // Unbounded so a finishing job never waits on the driver.
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            state: CompletionState::default(),
            tx,
            rx,
        }
    }

    /// Count one more job and hand out its signal.
    pub fn dispatch(&mut self) -> CompletionSignal<T> {
        let index = self.state.dispatched();
        self.state.on_dispatch();
        CompletionSignal {
            index,
            tx: Some(self.tx.clone()),
        }
    }

    /// The item source is exhausted; no more `dispatch` calls will follow.
    pub fn source_drained(&mut self) {
        self.state.on_source_drained();
    }

    pub fn state(&self) -> CompletionState {
        self.state
    }

    pub fn is_done(&self) -> bool {
        self.state.is_done()
    }

    /// Next completion, or `None` once done.
    ///
    /// Before the source is drained this waits for a completion even when
    /// nothing is outstanding, so callers select on it alongside the source.
    pub async fn next(&mut self) -> Option<Completion<T>> {
        if self.state.is_done() {
            return None;
        }
        // The tracker holds a sender itself, so `recv` cannot observe a closed channel.
        let completion = self.rx.recv().await?;
        if let Err(e) = self.state.on_finish() {
            tracing::error!("{}", e);
        }
        Some(completion)
    }
}
