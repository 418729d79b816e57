//! Sequential writer for a temp download file.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

const WRITE_BUFFER_BYTES: usize = 64 * 1024;

/// Streams a response body into a temp file, then atomically renames it into place.
///
/// Dropping a writer without calling `finalize` removes the temp file, so every
/// exit path (error, cancellation, panic unwinding) leaves no `.part` behind.
pub struct StorageWriter {
    out: Option<BufWriter<File>>,
    temp_path: PathBuf,
    written: u64,
    finalized: bool,
}

impl StorageWriter {
    /// Create the temp file at `temp_path`, truncating anything already there.
    pub fn create(temp_path: &Path) -> io::Result<Self> {
        let file = File::options()
            .write(true)
            .create(true)
            .truncate(true)
            .open(temp_path)?;
        Ok(Self {
            out: Some(BufWriter::with_capacity(WRITE_BUFFER_BYTES, file)),
            temp_path: temp_path.to_path_buf(),
            written: 0,
            finalized: false,
        })
    }

    /// Append a chunk of the body.
    pub fn write_chunk(&mut self, data: &[u8]) -> io::Result<()> {
        let out = self
            .out
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "writer already closed"))?;
        out.write_all(data)?;
        self.written += data.len() as u64;
        Ok(())
    }

    /// Bytes appended so far.
    pub fn written(&self) -> u64 {
        self.written
    }

    /// Flush, sync and rename the temp file to `final_path` (replacing any existing file).
    /// Returns the number of bytes written.
    pub fn finalize(mut self, final_path: &Path) -> io::Result<u64> {
        if let Some(out) = self.out.take() {
            let file = out.into_inner().map_err(|e| e.into_error())?;
            file.sync_all()?;
        }
        std::fs::rename(&self.temp_path, final_path)?;
        self.finalized = true;
        Ok(self.written)
    }
}

impl Drop for StorageWriter {
    fn drop(&mut self) {
        if !self.finalized {
            drop(self.out.take());
            if let Err(e) = std::fs::remove_file(&self.temp_path) {
                tracing::debug!(path = %self.temp_path.display(), "temp cleanup: {}", e);
            }
        }
    }
}
