//! In-memory `Fetcher`: URL -> body, everything else 404.

use std::collections::HashMap;
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use notegrab_core::fetch::{FetchError, Fetcher};

#[derive(Default)]
pub struct MemoryFetcher {
    bodies: HashMap<String, Vec<u8>>,
    chunk: usize,
    /// URLs with this prefix pause between chunks.
    slow: Option<(String, Duration)>,
    fetches: AtomicUsize,
}

impl MemoryFetcher {
    /// Bodies are delivered in `chunk`-byte pieces.
    pub fn new(chunk: usize) -> Self {
        Self {
            chunk: chunk.max(1),
            ..Self::default()
        }
    }

    pub fn insert(&mut self, url: impl Into<String>, body: impl Into<Vec<u8>>) {
        self.bodies.insert(url.into(), body.into());
    }

    /// Pause `delay` after every chunk of a body whose URL starts with `prefix`.
    pub fn slow_down(&mut self, prefix: impl Into<String>, delay: Duration) {
        self.slow = Some((prefix.into(), delay));
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

impl Fetcher for MemoryFetcher {
    fn fetch(
        &self,
        url: &str,
        sink: &mut dyn FnMut(&[u8]) -> io::Result<()>,
    ) -> Result<u64, FetchError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        let body = self.bodies.get(url).ok_or(FetchError::Http(404))?;
        let delay = self
            .slow
            .as_ref()
            .filter(|(prefix, _)| url.starts_with(prefix.as_str()))
            .map(|(_, d)| *d);
        for piece in body.chunks(self.chunk) {
            sink(piece).map_err(FetchError::from_sink)?;
            if let Some(d) = delay {
                std::thread::sleep(d);
            }
        }
        Ok(body.len() as u64)
    }
}
