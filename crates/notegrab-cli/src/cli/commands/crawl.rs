//! `notegrab crawl` – scan the index page and download every linked document.

use anyhow::{bail, Result};
use notegrab_core::config::{CrawlConfig, DispatchMode};
use notegrab_core::{Crawler, CurlFetcher};
use std::path::PathBuf;
use std::sync::Arc;

use crate::cli::shutdown;

/// Command-line values that take precedence over the config file.
#[derive(Debug, Default)]
pub struct CrawlOverrides {
    pub url: Option<String>,
    pub output: Option<PathBuf>,
    pub workers: Option<usize>,
    pub per_item: bool,
    pub max_in_flight: Option<usize>,
}

impl CrawlOverrides {
    pub fn apply(self, cfg: &mut CrawlConfig) {
        if let Some(url) = self.url {
            cfg.page_url = url;
        }
        if let Some(dir) = self.output {
            cfg.output_dir = dir;
        }
        if let Some(n) = self.workers {
            cfg.workers = n;
        }
        if self.per_item {
            cfg.dispatch = DispatchMode::PerItem;
        }
        if self.max_in_flight.is_some() {
            cfg.max_in_flight = self.max_in_flight;
        }
    }
}

pub async fn run_crawl(mut cfg: CrawlConfig, overrides: CrawlOverrides) -> Result<()> {
    overrides.apply(&mut cfg);
    if cfg.dispatch == DispatchMode::Pool && cfg.max_in_flight.is_some() {
        tracing::debug!("max_in_flight ignored in pool mode");
    }

    let fetcher = Arc::new(CurlFetcher::new(cfg.http_options()));
    let crawler = Crawler::new(cfg, fetcher)?;
    println!(
        "Crawling {} into {}",
        crawler.config().page_url,
        crawler.output_dir().display()
    );

    let cancel = shutdown::cancel_on_ctrl_c();
    let summary = crawler
        .run(cancel, |report| println!("{}", report.console_line()))
        .await?;
    println!("{}", summary.summary_line());

    if summary.cancelled {
        bail!("crawl interrupted");
    }
    if !summary.failures.is_empty() {
        bail!("{} download(s) failed", summary.failed());
    }
    Ok(())
}
