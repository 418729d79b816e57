//! CLI command handlers, one file per command.

mod config;
mod crawl;
mod scan;

pub use config::run_show_config;
pub use crawl::{run_crawl, CrawlOverrides};
pub use scan::run_scan;
