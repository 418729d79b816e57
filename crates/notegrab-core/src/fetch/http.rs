//! libcurl-backed [`Fetcher`].

use std::io;
use std::time::Duration;

use super::{FetchError, Fetcher};

/// Transfer limits applied to every request.
#[derive(Debug, Clone)]
pub struct HttpOptions {
    pub connect_timeout: Duration,
    /// Whole-transfer timeout; `None` lets large files take as long as they need.
    pub timeout: Option<Duration>,
    /// Abort when the rate stays below `low_speed_limit` bytes/s for `low_speed_time`.
    pub low_speed_limit: u32,
    pub low_speed_time: Duration,
    pub max_redirections: u32,
    pub user_agent: String,
}

impl Default for HttpOptions {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(30),
            timeout: None,
            low_speed_limit: 1024,
            low_speed_time: Duration::from_secs(60),
            max_redirections: 10,
            user_agent: concat!("notegrab/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// One curl Easy handle per request; safe to share across worker threads.
#[derive(Debug, Clone, Default)]
pub struct CurlFetcher {
    opts: HttpOptions,
}

impl CurlFetcher {
    pub fn new(opts: HttpOptions) -> Self {
        Self { opts }
    }

    fn configure(&self, easy: &mut curl::easy::Easy, url: &str) -> Result<(), curl::Error> {
        easy.url(url)?;
        easy.follow_location(true)?;
        easy.max_redirections(self.opts.max_redirections)?;
        // Error statuses fail before any body reaches the sink.
        easy.fail_on_error(true)?;
        easy.connect_timeout(self.opts.connect_timeout)?;
        if let Some(t) = self.opts.timeout {
            easy.timeout(t)?;
        }
        easy.low_speed_limit(self.opts.low_speed_limit)?;
        easy.low_speed_time(self.opts.low_speed_time)?;
        easy.useragent(&self.opts.user_agent)?;
        Ok(())
    }
}

impl Fetcher for CurlFetcher {
    fn fetch(
        &self,
        url: &str,
        sink: &mut dyn FnMut(&[u8]) -> io::Result<()>,
    ) -> Result<u64, FetchError> {
        let mut easy = curl::easy::Easy::new();
        self.configure(&mut easy, url)?;

        let mut received = 0u64;
        let mut sink_error: Option<io::Error> = None;
        let performed = {
            let mut transfer = easy.transfer();
            transfer.write_function(|data| match sink(data) {
                Ok(()) => {
                    received += data.len() as u64;
                    Ok(data.len())
                }
                Err(e) => {
                    sink_error = Some(e);
                    Ok(0) // abort transfer
                }
            })?;
            transfer.perform()
        };

        if let Some(e) = sink_error {
            return Err(FetchError::from_sink(e));
        }
        if let Err(e) = performed {
            if e.is_http_returned_error() {
                return Err(FetchError::Http(easy.response_code().unwrap_or(0)));
            }
            return Err(FetchError::Curl(e));
        }

        let code = easy.response_code()?;
        // 0 means a non-HTTP scheme (e.g. file://), which has no status to check.
        if code != 0 && !(200..300).contains(&code) {
            return Err(FetchError::Http(code));
        }
        tracing::trace!(url, bytes = received, "fetch complete");
        Ok(received)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_options_have_no_total_timeout() {
        let opts = HttpOptions::default();
        assert!(opts.timeout.is_none());
        assert_eq!(opts.connect_timeout, Duration::from_secs(30));
        assert!(opts.user_agent.starts_with("notegrab/"));
    }

    #[test]
    fn streams_local_file_url() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(b"<h3>Week 1</h3>").unwrap();
        f.flush().unwrap();
        let url = url::Url::from_file_path(f.path()).unwrap();

        let mut body = Vec::new();
        let n = CurlFetcher::default()
            .fetch(url.as_str(), &mut |chunk| {
                body.extend_from_slice(chunk);
                Ok(())
            })
            .unwrap();
        assert_eq!(n, 15);
        assert_eq!(body, b"<h3>Week 1</h3>");
    }

    #[test]
    fn sink_failure_aborts_with_sink_error() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(b"data").unwrap();
        f.flush().unwrap();
        let url = url::Url::from_file_path(f.path()).unwrap();

        let err = CurlFetcher::default()
            .fetch(url.as_str(), &mut |_| Err(crate::fetch::interrupted()))
            .unwrap_err();
        assert!(matches!(err, FetchError::Cancelled));
    }
}
