//! Disk I/O for jot logs

use crate::config::JotConfig;
use crate::error::{JotError, Result};
use crate::header::{init_or_validate, read_header, Header};
use crate::log::{self, ScanReport};
use crate::record::Record;
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Read, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Read until `buf` is full or the stream ends, returning the byte count
///
/// Unlike `read_exact`, a short read is not an error here; callers decide
/// whether zero, partial or full reads are acceptable.
pub(crate) fn read_full<R: Read + ?Sized>(reader: &mut R, buf: &mut [u8]) -> Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(filled)
}

/// Issue a single write and fail if it does not take every byte
///
/// Short writes are not retried: a partial record already on disk cannot be
/// completed safely.
pub(crate) fn write_once<W: Write + ?Sized>(writer: &mut W, buf: &[u8]) -> Result<()> {
    let written = loop {
        match writer.write(buf) {
            Ok(n) => break n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    };

    if written != buf.len() {
        return Err(JotError::ShortWrite {
            expected: buf.len(),
            written,
        });
    }

    Ok(())
}

/// Disk-backed jot log
///
/// Opens (or creates) the file, validates its header and, unless disabled,
/// holds an exclusive advisory lock until dropped. That lock is what keeps
/// two processes from allocating the same ID.
pub struct JotFile {
    file: File,
    path: PathBuf,
    locked: bool,
    sync_writes: bool,
}

impl JotFile {
    /// Open the log at `path` with default settings
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with(&JotConfig::new(path))
    }

    /// Open or create the log described by `config`
    pub fn open_with(config: &JotConfig) -> Result<Self> {
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&config.path)?;

        if config.lock {
            FileExt::try_lock_exclusive(&file).map_err(|e| {
                if e.kind() == fs2::lock_contended_error().kind() {
                    JotError::Locked(config.path.clone())
                } else {
                    JotError::Io(e)
                }
            })?;
        }

        // Lock (if any) is released by dropping `file` on the error path
        let header = init_or_validate(&mut file)?;
        if config.sync_writes {
            file.sync_data()?;
        }

        debug!(path = ?config.path, next_id = header.next_id, locked = config.lock, "Opened jot log");

        Ok(JotFile {
            file,
            path: config.path.clone(),
            locked: config.lock,
            sync_writes: config.sync_writes,
        })
    }

    /// Get file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// Read the current header
    pub fn header(&mut self) -> Result<Header> {
        read_header(&mut self.file)
    }

    /// Create and persist a new entry
    pub fn add(&mut self, text: &[u8]) -> Result<Record> {
        let record = log::create_and_persist(&mut self.file, text)?;
        self.maybe_sync()?;
        Ok(record)
    }

    /// All records, deleted ones included
    pub fn list(&mut self) -> Result<Vec<Record>> {
        log::list(&mut self.file)
    }

    pub fn search(&mut self, id: u64) -> Result<(Record, u64)> {
        log::search(&mut self.file, id)
    }

    /// Soft-delete the record with `id`
    pub fn remove(&mut self, id: u64) -> Result<()> {
        log::remove_soft(&mut self.file, id)?;
        self.maybe_sync()
    }

    pub fn check(&mut self) -> Result<ScanReport> {
        log::check(&mut self.file)
    }

    /// Truncate a torn trailing record back to the last good boundary
    ///
    /// Returns the number of bytes removed. Damage other than a truncated
    /// tail is reported as an error and the file is left alone.
    pub fn repair(&mut self) -> Result<u64> {
        let report = self.check()?;

        if report.torn_tail {
            let removed = report.file_len - report.valid_len;
            self.file.set_len(report.valid_len)?;
            self.file.sync_all()?;
            warn!(
                path = ?self.path,
                valid_len = report.valid_len,
                removed,
                "Truncated torn record at end of log"
            );
            return Ok(removed);
        }

        if let Some(reason) = report.error {
            return Err(JotError::CorruptRecord {
                offset: report.valid_len,
                reason,
            });
        }

        Ok(0)
    }

    /// Sync all writes to disk
    pub fn sync(&mut self) -> Result<()> {
        self.file.sync_all()?;
        Ok(())
    }

    fn maybe_sync(&mut self) -> Result<()> {
        if self.sync_writes {
            self.file.sync_data()?;
        }
        Ok(())
    }
}

impl Drop for JotFile {
    fn drop(&mut self) {
        if self.locked {
            if let Err(e) = FileExt::unlock(&self.file) {
                warn!(path = ?self.path, error = %e, "Failed to release log lock");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::HEADER_SIZE;
    use crate::record::Status;
    use tempfile::tempdir;

    /// Writer that accepts at most `limit` bytes per call
    struct Stingy {
        inner: Vec<u8>,
        limit: usize,
    }

    impl Write for Stingy {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            let n = buf.len().min(self.limit);
            self.inner.extend_from_slice(&buf[..n]);
            Ok(n)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_write_once_short() {
        let mut w = Stingy {
            inner: Vec::new(),
            limit: 3,
        };
        assert!(matches!(
            write_once(&mut w, b"abcdef"),
            Err(JotError::ShortWrite {
                expected: 6,
                written: 3
            })
        ));
        assert_eq!(w.inner, b"abc");
    }

    #[test]
    fn test_read_full_counts_partial() {
        let mut src: &[u8] = b"abc";
        let mut buf = [0u8; 8];
        assert_eq!(read_full(&mut src, &mut buf).unwrap(), 3);
        assert_eq!(&buf[..3], b"abc");
    }

    #[test]
    fn test_open_creates_header() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("jot.bin");

        let mut jot = JotFile::open(&path).unwrap();
        assert_eq!(jot.header().unwrap(), Header::new());
        assert_eq!(std::fs::metadata(&path).unwrap().len(), HEADER_SIZE as u64);
    }

    #[test]
    fn test_reopen_keeps_counter() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("jot.bin");

        {
            let mut jot = JotFile::open(&path).unwrap();
            jot.add(b"first").unwrap();
            jot.add(b"second").unwrap();
        }

        let mut jot = JotFile::open(&path).unwrap();
        assert_eq!(jot.header().unwrap().next_id, 10_002);
        assert_eq!(jot.add(b"third").unwrap().id(), 10_002);
        assert_eq!(jot.list().unwrap().len(), 3);
    }

    #[test]
    fn test_second_open_is_locked_out() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("jot.bin");

        let first = JotFile::open(&path).unwrap();
        assert!(first.is_locked());
        assert!(matches!(JotFile::open(&path), Err(JotError::Locked(_))));

        drop(first);
        assert!(JotFile::open(&path).is_ok());
    }

    #[test]
    fn test_unlocked_open() {
        let dir = tempdir().unwrap();
        let config = JotConfig::new(dir.path().join("jot.bin")).with_lock(false);

        let _a = JotFile::open_with(&config).unwrap();
        let b = JotFile::open_with(&config).unwrap();
        assert!(!b.is_locked());
    }

    #[test]
    fn test_remove_with_sync() {
        let dir = tempdir().unwrap();
        let config = JotConfig::new(dir.path().join("jot.bin")).with_sync_writes(true);
        let mut jot = JotFile::open_with(&config).unwrap();

        let record = jot.add(b"gone soon").unwrap();
        jot.remove(record.id()).unwrap();

        let (found, _) = jot.search(record.id()).unwrap();
        assert_eq!(found.status(), Status::Deleted);
    }

    #[test]
    fn test_repair_truncates_torn_tail() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("jot.bin");

        let good_len = {
            let mut jot = JotFile::open(&path).unwrap();
            jot.add(b"intact").unwrap();
            let len = std::fs::metadata(&path).unwrap().len();
            jot.add(b"torn").unwrap();
            len
        };
        let full = std::fs::metadata(&path).unwrap().len();
        OpenOptions::new()
            .write(true)
            .open(&path)
            .unwrap()
            .set_len(full - 2)
            .unwrap();

        let mut jot = JotFile::open(&path).unwrap();
        assert!(matches!(jot.list(), Err(JotError::TruncatedRecord { .. })));

        assert_eq!(jot.repair().unwrap(), full - 2 - good_len);
        assert_eq!(std::fs::metadata(&path).unwrap().len(), good_len);
        assert_eq!(jot.list().unwrap().len(), 1);
        assert_eq!(jot.repair().unwrap(), 0);
    }

    #[test]
    fn test_repair_refuses_mid_log_corruption() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("jot.bin");

        {
            let mut jot = JotFile::open(&path).unwrap();
            jot.add(b"one").unwrap();
            jot.add(b"two").unwrap();
        }
        let mut bytes = std::fs::read(&path).unwrap();
        bytes[HEADER_SIZE] = 0x7F;
        std::fs::write(&path, &bytes).unwrap();

        let mut jot = JotFile::open(&path).unwrap();
        assert!(matches!(jot.repair(), Err(JotError::CorruptRecord { .. })));
        assert_eq!(std::fs::read(&path).unwrap(), bytes);
    }
}
