//! Crawl driver: scan the index page and download everything it links.

use std::path::Path;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::config::{ConfigError, CrawlConfig, DispatchMode};
use crate::dispatch::{run_per_item, run_pool, DownloadJob, JobContext, JobReport};
use crate::fetch::Fetcher;
use crate::scanner::{spawn_scanner, DiscoveredItem, ScanError, ScanRules};
use crate::tracker::merge;
use crate::url_model::{DownloadEndpoint, LinkPattern};

/// Capacity of the merged report stream.
const REPORT_CAPACITY: usize = 64;

#[derive(Debug, thiserror::Error)]
pub enum CrawlError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    /// The index page could not be fetched; jobs already dispatched were allowed to finish.
    #[error(transparent)]
    Page(ScanError),
    #[error("scanner failed: {0}")]
    Scanner(ScanError),
}

/// Totals for one crawl.
#[derive(Debug, Default)]
pub struct CrawlSummary {
    /// Job reports received, successful or not.
    pub reported: u64,
    pub succeeded: u64,
    /// Failed jobs with their reason, in completion order.
    pub failures: Vec<(DownloadJob, String)>,
    /// Bytes written by successful jobs.
    pub bytes: u64,
    pub cancelled: bool,
}

impl CrawlSummary {
    pub fn record(&mut self, report: JobReport) {
        self.reported += 1;
        match report.outcome {
            Ok(bytes) => {
                self.succeeded += 1;
                self.bytes += bytes;
            }
            Err(e) => self.failures.push((report.job, e.to_string())),
        }
    }

    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    /// True when every dispatched job succeeded and the crawl ran to the end.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty() && !self.cancelled
    }

    pub fn summary_line(&self) -> String {
        format!(
            "Done: {} succeeded, {} failed ({} bytes)",
            self.succeeded,
            self.failed(),
            self.bytes
        )
    }
}

/// A validated crawl: compiled link pattern, download endpoint and transport.
pub struct Crawler {
    config: CrawlConfig,
    rules: ScanRules,
    endpoint: DownloadEndpoint,
    fetcher: Arc<dyn Fetcher>,
}

impl Crawler {
    pub fn new(config: CrawlConfig, fetcher: Arc<dyn Fetcher>) -> Result<Self, ConfigError> {
        config.validate()?;
        let links = LinkPattern::new(&config.link_prefix)?;
        let endpoint = DownloadEndpoint::new(&config.download_template)?;
        tracing::debug!(
            link_prefix = links.prefix(),
            download_template = endpoint.template(),
            "crawl rules compiled"
        );
        let rules = ScanRules::new(&config.heading_tags, links);
        Ok(Self {
            config,
            rules,
            endpoint,
            fetcher,
        })
    }

    pub fn config(&self) -> &CrawlConfig {
        &self.config
    }

    pub fn output_dir(&self) -> &Path {
        &self.config.output_dir
    }

    fn job_context(&self, cancel: &CancellationToken) -> JobContext {
        JobContext::new(
            Arc::clone(&self.fetcher),
            self.endpoint.clone(),
            self.config.output_dir.clone(),
            self.config.file_extension.clone(),
            cancel.clone(),
        )
    }

    fn start_scan(
        &self,
        cancel: &CancellationToken,
    ) -> (
        mpsc::Receiver<DiscoveredItem>,
        tokio::task::JoinHandle<Result<u64, ScanError>>,
    ) {
        spawn_scanner(
            Arc::clone(&self.fetcher),
            self.config.page_url.clone(),
            self.rules.clone(),
            cancel.clone(),
            self.config.queue_capacity,
        )
    }

    /// Scan the page and download every discovered document.
    ///
    /// `on_report` sees each job's report as it completes. Individual job
    /// failures land in the summary; only a page failure fails the crawl.
    pub async fn run<F>(
        &self,
        cancel: CancellationToken,
        mut on_report: F,
    ) -> Result<CrawlSummary, CrawlError>
    where
        F: FnMut(&JobReport),
    {
        tracing::info!(
            url = %self.config.page_url,
            output = %self.config.output_dir.display(),
            mode = ?self.config.dispatch,
            "crawl starting"
        );
        let (queue, scanner) = self.start_scan(&cancel);
        let ctx = Arc::new(self.job_context(&cancel));

        let mut reports = match self.config.dispatch {
            DispatchMode::Pool => merge(run_pool(queue, self.config.workers, ctx), REPORT_CAPACITY),
            DispatchMode::PerItem => {
                run_per_item(queue, ctx, self.config.in_flight_limit(), REPORT_CAPACITY)
            }
        };

        let mut summary = CrawlSummary::default();
        while let Some(report) = reports.recv().await {
            on_report(&report);
            summary.record(report);
        }
        summary.cancelled = cancel.is_cancelled();

        let scanned = scanner
            .await
            .map_err(|e| CrawlError::Scanner(ScanError::Join(e.to_string())))?;
        match scanned {
            Ok(items) if items != summary.reported && !summary.cancelled => {
                tracing::warn!(items, reported = summary.reported, "scanned items and job reports differ");
            }
            Ok(_) => {}
            Err(ScanError::Cancelled) => summary.cancelled = true,
            Err(ScanError::QueueClosed) if summary.cancelled => {}
            Err(e @ ScanError::Fetch { .. }) => return Err(CrawlError::Page(e)),
            Err(e) => return Err(CrawlError::Scanner(e)),
        }

        tracing::info!(
            succeeded = summary.succeeded,
            failed = summary.failed(),
            bytes = summary.bytes,
            cancelled = summary.cancelled,
            "crawl finished"
        );
        Ok(summary)
    }

    /// Scan only: every job the page would produce, in discovery order.
    pub async fn discover(&self, cancel: CancellationToken) -> Result<Vec<DownloadJob>, CrawlError> {
        let (mut queue, scanner) = self.start_scan(&cancel);
        let ctx = self.job_context(&cancel);
        let mut jobs = Vec::new();
        while let Some(item) = queue.recv().await {
            let seq = jobs.len() as u64;
            jobs.push(ctx.job(seq, item));
        }
        match scanner
            .await
            .map_err(|e| CrawlError::Scanner(ScanError::Join(e.to_string())))?
        {
            Ok(_) | Err(ScanError::Cancelled) => Ok(jobs),
            Err(e @ ScanError::Fetch { .. }) => Err(CrawlError::Page(e)),
            Err(e) => Err(CrawlError::Scanner(e)),
        }
    }
}
