//! Completion tracking for dispatched download jobs.
//!
//! Two mechanisms, one per dispatch strategy:
//! - pool: every worker owns an output stream; [`merge`] fans them into one
//!   stream that closes only after every worker has drained the queue and exited;
//! - per-item: a [`CompletionTracker`] counts dispatches synchronously and
//!   reports done only after the source is drained and every signal has arrived.

mod completion;
mod merge;

pub use completion::{
    Completion, CompletionSignal, CompletionState, CompletionTracker, UnexpectedFinish,
};
pub use merge::merge;
