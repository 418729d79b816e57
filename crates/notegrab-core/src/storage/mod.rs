//! Disk I/O and file lifecycle.
//!
//! Idempotent category directory creation, streamed writes to a per-job temp
//! file, and atomic finalize (rename from `.part` to the final name).

mod writer;

pub use writer::StorageWriter;

use std::io;
use std::path::{Path, PathBuf};

/// Temporary file suffix used before atomic rename.
pub const TEMP_SUFFIX: &str = ".part";

/// Path for a job's temp file: `<final>.<seq>.part`. The sequence number keeps two
/// jobs that resolve to the same destination from sharing a temp file.
pub fn temp_path(final_path: &Path, seq: u64) -> PathBuf {
    let mut o = final_path.as_os_str().to_owned();
    o.push(format!(".{}{}", seq, TEMP_SUFFIX));
    PathBuf::from(o)
}

/// Create `dir` and its parents. Succeeds if it already exists, including when
/// another job creates it concurrently.
pub fn ensure_dir(dir: &Path) -> io::Result<()> {
    match std::fs::create_dir_all(dir) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists && dir.is_dir() => Ok(()),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Barrier};

    #[test]
    fn temp_path_appends_seq_and_part() {
        let p = temp_path(Path::new("out/c/Notes.pdf"), 7);
        assert_eq!(p.to_string_lossy(), "out/c/Notes.pdf.7.part");
    }

    #[test]
    fn write_then_finalize() {
        let dir = tempfile::tempdir().unwrap();
        let final_path = dir.path().join("doc.pdf");
        let tp = temp_path(&final_path, 0);

        let mut writer = StorageWriter::create(&tp).unwrap();
        writer.write_chunk(b"hello ").unwrap();
        writer.write_chunk(b"world").unwrap();
        assert_eq!(writer.written(), 11);
        assert_eq!(writer.finalize(&final_path).unwrap(), 11);

        assert!(!tp.exists());
        assert_eq!(std::fs::read(&final_path).unwrap(), b"hello world");
    }

    #[test]
    fn dropped_writer_removes_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let tp = dir.path().join("doc.pdf.3.part");
        {
            let mut writer = StorageWriter::create(&tp).unwrap();
            writer.write_chunk(b"partial").unwrap();
            assert!(tp.exists());
        }
        assert!(!tp.exists());
    }

    #[test]
    fn finalize_replaces_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let final_path = dir.path().join("doc.pdf");
        std::fs::write(&final_path, b"old").unwrap();
        let mut writer = StorageWriter::create(&temp_path(&final_path, 1)).unwrap();
        writer.write_chunk(b"new").unwrap();
        writer.finalize(&final_path).unwrap();
        assert_eq!(std::fs::read(&final_path).unwrap(), b"new");
    }

    #[test]
    fn ensure_dir_is_idempotent_and_leaves_siblings_alone() {
        let root = tempfile::tempdir().unwrap();
        let sibling = root.path().join("Week 2");
        ensure_dir(&sibling).unwrap();
        std::fs::write(sibling.join("a.pdf"), b"keep").unwrap();

        let target = root.path().join("Week 1");
        ensure_dir(&target).unwrap();
        ensure_dir(&target).unwrap();

        assert!(target.is_dir());
        assert_eq!(std::fs::read(sibling.join("a.pdf")).unwrap(), b"keep");
    }

    #[test]
    fn ensure_dir_concurrent_same_directory() {
        let root = tempfile::tempdir().unwrap();
        let target = Arc::new(root.path().join("shared").join("nested"));
        let barrier = Arc::new(Barrier::new(16));
        let handles: Vec<_> = (0..16)
            .map(|_| {
                let target = Arc::clone(&target);
                let barrier = Arc::clone(&barrier);
                std::thread::spawn(move || {
                    barrier.wait();
                    ensure_dir(&target)
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap().unwrap();
        }
        assert!(target.is_dir());
    }
}
