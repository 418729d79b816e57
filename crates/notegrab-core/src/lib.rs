pub mod config;
pub mod logging;

pub mod crawl;
pub mod dispatch;
pub mod fetch;
pub mod scanner;
pub mod storage;
pub mod tracker;
pub mod url_model;

pub use config::{CrawlConfig, DispatchMode};
pub use crawl::{CrawlError, CrawlSummary, Crawler};
pub use fetch::{CurlFetcher, Fetcher};
