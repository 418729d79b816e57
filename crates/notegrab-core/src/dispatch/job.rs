//! One download job: build it from a discovered item, run it, report it.

use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use tokio_util::sync::CancellationToken;

use crate::fetch::{self, FetchError, Fetcher};
use crate::scanner::DiscoveredItem;
use crate::storage::{self, StorageWriter};
use crate::url_model::{
    destination_path, sanitize_path_component, tagged_destination_path, DownloadEndpoint,
};

/// A discovered item resolved to a download URL and destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadJob {
    /// Discovery index; only used to keep temp file names apart.
    pub seq: u64,
    pub item: DiscoveredItem,
    pub fetch_url: String,
    pub destination: PathBuf,
}

impl DownloadJob {
    pub fn new(
        seq: u64,
        item: DiscoveredItem,
        endpoint: &DownloadEndpoint,
        output_dir: &Path,
        extension: &str,
    ) -> Self {
        let fetch_url = endpoint.fetch_url(&item.remote_id);
        let destination = destination_path(output_dir, &item.category, &item.title, extension);
        Self {
            seq,
            item,
            fetch_url,
            destination,
        }
    }

    /// `<category> <title>`, or just the title for uncategorized items.
    pub fn label(&self) -> String {
        if self.item.category.is_empty() {
            self.item.title.clone()
        } else {
            format!("{} {}", self.item.category, self.item.title)
        }
    }
}

/// Why a single job failed. Never affects other jobs.
#[derive(Debug, thiserror::Error)]
pub enum JobError {
    #[error("create directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("create {}: {source}", path.display())]
    CreateFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("finalize {}: {source}", path.display())]
    Finalize {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("download failed: {0}")]
    Fetch(#[source] FetchError),
    #[error("cancelled")]
    Cancelled,
    #[error("download task panicked: {0}")]
    Panicked(String),
    #[error("download task ended without reporting")]
    Abandoned,
}

/// Outcome of one job; `Ok` carries the bytes written.
#[derive(Debug)]
pub struct JobReport {
    pub job: DownloadJob,
    pub outcome: Result<u64, JobError>,
}

impl JobReport {
    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }

    /// The line printed for this job on the console.
    pub fn console_line(&self) -> String {
        match &self.outcome {
            Ok(_) => format!("Downloaded {}", self.job.label()),
            Err(e) => format!("Failed {}: {}", self.job.label(), e),
        }
    }
}

/// Destinations already handed out in one crawl.
///
/// The first item to claim a path keeps it. Later items that resolve to the
/// same path get `<title> (<remote_id>)`, then `<title> (<remote_id>) (N)`.
#[derive(Debug, Default)]
pub struct DestinationClaims {
    claimed: Mutex<HashSet<PathBuf>>,
}

/// Longest remote id kept in a disambiguated file name.
const ID_TAG_MAX: usize = 64;

impl DestinationClaims {
    pub fn claim(&self, output_dir: &Path, item: &DiscoveredItem, extension: &str) -> PathBuf {
        let mut claimed = self.claimed.lock().unwrap_or_else(PoisonError::into_inner);
        let plain = destination_path(output_dir, &item.category, &item.title, extension);
        if claimed.insert(plain.clone()) {
            return plain;
        }
        let id = sanitize_path_component(&item.remote_id, ID_TAG_MAX);
        let mut n = 1u64;
        loop {
            let tag = if n == 1 {
                format!("({})", id)
            } else {
                format!("({}) ({})", id, n)
            };
            let path = tagged_destination_path(output_dir, &item.category, &item.title, &tag, extension);
            if claimed.insert(path.clone()) {
                tracing::info!(
                    taken = %plain.display(),
                    using = %path.display(),
                    "destination already claimed"
                );
                return path;
            }
            n += 1;
        }
    }
}

/// Everything a job needs besides its item. Shared by all jobs of a crawl.
pub struct JobContext {
    pub fetcher: Arc<dyn Fetcher>,
    pub endpoint: DownloadEndpoint,
    pub output_dir: PathBuf,
    pub extension: String,
    pub cancel: CancellationToken,
    claims: DestinationClaims,
}

impl JobContext {
    pub fn new(
        fetcher: Arc<dyn Fetcher>,
        endpoint: DownloadEndpoint,
        output_dir: PathBuf,
        extension: String,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            fetcher,
            endpoint,
            output_dir,
            extension,
            cancel,
            claims: DestinationClaims::default(),
        }
    }

    /// Resolve `item` to a job whose destination no earlier job of this
    /// context was given.
    pub fn job(&self, seq: u64, item: DiscoveredItem) -> DownloadJob {
        let destination = self.claims.claim(&self.output_dir, &item, &self.extension);
        DownloadJob {
            destination,
            ..DownloadJob::new(seq, item, &self.endpoint, &self.output_dir, &self.extension)
        }
    }
}

/// Run `job` on the blocking pool and turn every outcome, panics included, into a report.
pub async fn execute(ctx: &JobContext, job: DownloadJob) -> JobReport {
    let outcome = tokio::task::spawn_blocking({
        let fetcher = Arc::clone(&ctx.fetcher);
        let cancel = ctx.cancel.clone();
        let job = job.clone();
        move || run_job(fetcher.as_ref(), &job, &cancel)
    })
    .await
    .unwrap_or_else(|e| Err(JobError::Panicked(e.to_string())));

    match &outcome {
        Ok(bytes) => tracing::info!(
            seq = job.seq,
            bytes = *bytes,
            "saved {}",
            job.destination.display()
        ),
        Err(JobError::Cancelled) => tracing::debug!(seq = job.seq, "job cancelled"),
        Err(e) => tracing::warn!(seq = job.seq, url = %job.fetch_url, "job failed: {}", e),
    }
    JobReport { job, outcome }
}

/// Blocking body of a job: directory, temp file, streamed body, atomic rename.
/// The temp file is removed on every failure path.
pub fn run_job(
    fetcher: &dyn Fetcher,
    job: &DownloadJob,
    cancel: &CancellationToken,
) -> Result<u64, JobError> {
    if cancel.is_cancelled() {
        return Err(JobError::Cancelled);
    }
    if let Some(dir) = job.destination.parent() {
        storage::ensure_dir(dir).map_err(|source| JobError::CreateDir {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    let temp = storage::temp_path(&job.destination, job.seq);
    let mut writer = StorageWriter::create(&temp).map_err(|source| JobError::CreateFile {
        path: temp.clone(),
        source,
    })?;

    let fetched = fetcher.fetch(&job.fetch_url, &mut |chunk| {
        if cancel.is_cancelled() {
            return Err(fetch::interrupted());
        }
        writer.write_chunk(chunk)
    });
    match fetched {
        Ok(_) => {}
        Err(FetchError::Cancelled) => return Err(JobError::Cancelled),
        Err(FetchError::Sink(source)) => return Err(JobError::Write { path: temp, source }),
        Err(e) => return Err(JobError::Fetch(e)),
    }

    writer
        .finalize(&job.destination)
        .map_err(|source| JobError::Finalize {
            path: job.destination.clone(),
            source,
        })
}
