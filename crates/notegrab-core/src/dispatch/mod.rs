//! Download dispatch: turns discovered items into download jobs and runs them.
//!
//! Two strategies share the same job body ([`execute`]):
//! - [`run_pool`]: a fixed number of workers pull from the item queue;
//! - [`run_per_item`]: one task per item, gated by a semaphore.
//!
//! Either way a failing job produces a failed [`JobReport`] and nothing else.

mod job;
mod per_item;
mod pool;

pub use crate::config::DispatchMode;
pub use job::{
    execute, run_job, DestinationClaims, DownloadJob, JobContext, JobError, JobReport,
};
pub use per_item::run_per_item;
pub use pool::run_pool;
