//! `notegrab scan` – list discovered documents without downloading them.

use anyhow::Result;
use notegrab_core::config::CrawlConfig;
use notegrab_core::{Crawler, CurlFetcher};
use std::sync::Arc;

use crate::cli::shutdown;

pub async fn run_scan(mut cfg: CrawlConfig, url: Option<String>, json: bool) -> Result<()> {
    if let Some(url) = url {
        cfg.page_url = url;
    }
    let fetcher = Arc::new(CurlFetcher::new(cfg.http_options()));
    let crawler = Crawler::new(cfg, fetcher)?;
    let jobs = crawler.discover(shutdown::cancel_on_ctrl_c()).await?;

    for job in &jobs {
        if json {
            let line = serde_json::json!({
                "category": job.item.category,
                "title": job.item.title,
                "remote_id": job.item.remote_id,
                "url": job.fetch_url,
                "destination": job.destination.display().to_string(),
            });
            println!("{}", line);
        } else {
            println!("{}\t{}", job.label(), job.destination.display());
        }
    }
    if !json {
        println!("{} document(s) found", jobs.len());
    }
    Ok(())
}
