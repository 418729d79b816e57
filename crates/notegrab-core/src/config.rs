use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::fetch::HttpOptions;
use crate::url_model::ID_PLACEHOLDER;

/// How discovered items are handed to download jobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DispatchMode {
    /// Fixed pool of `workers` tasks pulling from the shared item queue.
    #[default]
    Pool,
    /// One task per item, at most `max_in_flight` downloading at once.
    PerItem,
}

/// HTTP transfer limits (optional `[http]` section in config.toml).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    pub connect_timeout_secs: u64,
    /// Whole-transfer timeout; unset means no limit.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    /// Abort a transfer slower than this many bytes/s for `low_speed_time_secs`.
    pub low_speed_limit: u32,
    pub low_speed_time_secs: u64,
    #[serde(default)]
    pub user_agent: Option<String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        let opts = HttpOptions::default();
        Self {
            connect_timeout_secs: opts.connect_timeout.as_secs(),
            timeout_secs: None,
            low_speed_limit: opts.low_speed_limit,
            low_speed_time_secs: opts.low_speed_time.as_secs(),
            user_agent: None,
        }
    }
}

impl HttpConfig {
    pub fn to_options(&self) -> HttpOptions {
        let mut opts = HttpOptions {
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            timeout: self.timeout_secs.map(Duration::from_secs),
            low_speed_limit: self.low_speed_limit,
            low_speed_time: Duration::from_secs(self.low_speed_time_secs),
            ..HttpOptions::default()
        };
        if let Some(ua) = &self.user_agent {
            opts.user_agent = ua.clone();
        }
        opts
    }
}

/// Crawl configuration loaded from `~/.config/notegrab/config.toml`.
/// Missing keys take their defaults; CLI flags override on top.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CrawlConfig {
    /// Index page to scan.
    pub page_url: String,
    /// Root directory; one subdirectory per category.
    pub output_dir: PathBuf,
    pub dispatch: DispatchMode,
    /// Pool size for `dispatch = "pool"`.
    pub workers: usize,
    /// Concurrent download cap for `dispatch = "per-item"`; unset means `workers`.
    pub max_in_flight: Option<usize>,
    /// Capacity of the queue between the scanner and the dispatcher.
    pub queue_capacity: usize,
    /// Tag names treated as section headings.
    pub heading_tags: Vec<String>,
    /// Anchor attribute values starting with this prefix are document links;
    /// the rest of the value is the remote id.
    pub link_prefix: String,
    /// Download URL with an `{id}` placeholder.
    pub download_template: String,
    /// Extension given to every saved file.
    pub file_extension: String,
    pub http: Option<HttpConfig>,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            page_url: "https://chewisinho.github.io".to_string(),
            output_dir: PathBuf::from("downloads"),
            dispatch: DispatchMode::Pool,
            workers: 128,
            max_in_flight: None,
            queue_capacity: 256,
            heading_tags: vec!["h3".to_string()],
            link_prefix: "https://drive.google.com/open?id=".to_string(),
            download_template: "https://drive.google.com/uc?export=download&id={id}".to_string(),
            file_extension: "pdf".to_string(),
            http: None,
        }
    }
}

/// A configuration that cannot drive a crawl.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("workers must be at least 1")]
    NoWorkers,
    #[error("max_in_flight must be at least 1 when set")]
    NoInFlight,
    #[error("queue_capacity must be at least 1")]
    NoQueueCapacity,
    #[error("link_prefix must not be empty")]
    EmptyLinkPrefix,
    #[error("heading_tags must name at least one tag")]
    NoHeadingTags,
    #[error("download_template must contain {ID_PLACEHOLDER}")]
    MissingPlaceholder,
    #[error("invalid page_url {url:?}: {source}")]
    InvalidPageUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error(transparent)]
    Endpoint(#[from] crate::url_model::EndpointError),
    #[error("invalid link_prefix: {0}")]
    LinkPattern(#[from] regex::Error),
}

impl CrawlConfig {
    /// Check the values a crawl depends on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workers == 0 {
            return Err(ConfigError::NoWorkers);
        }
        if self.max_in_flight == Some(0) {
            return Err(ConfigError::NoInFlight);
        }
        if self.queue_capacity == 0 {
            return Err(ConfigError::NoQueueCapacity);
        }
        if self.link_prefix.is_empty() {
            return Err(ConfigError::EmptyLinkPrefix);
        }
        if self.heading_tags.iter().all(|t| t.trim().is_empty()) {
            return Err(ConfigError::NoHeadingTags);
        }
        if !self.download_template.contains(ID_PLACEHOLDER) {
            return Err(ConfigError::MissingPlaceholder);
        }
        url::Url::parse(&self.page_url).map_err(|source| ConfigError::InvalidPageUrl {
            url: self.page_url.clone(),
            source,
        })?;
        Ok(())
    }

    /// Cap on concurrent downloads in per-item mode.
    pub fn in_flight_limit(&self) -> usize {
        self.max_in_flight.unwrap_or(self.workers)
    }

    pub fn http_options(&self) -> HttpOptions {
        self.http
            .as_ref()
            .map(HttpConfig::to_options)
            .unwrap_or_default()
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("notegrab")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<CrawlConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = CrawlConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }
    load_from_path(&path)
}

/// Load configuration from an explicit file.
pub fn load_from_path(path: &Path) -> Result<CrawlConfig> {
    let data =
        fs::read_to_string(path).with_context(|| format!("read config {}", path.display()))?;
    let cfg: CrawlConfig =
        toml::from_str(&data).with_context(|| format!("parse config {}", path.display()))?;
    Ok(cfg)
}
