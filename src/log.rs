//! Log operations: append, scan, search and soft delete
//!
//! All operations work on a caller-owned handle and compose seeks, reads and
//! writes against it. None of them lock; the log assumes a single writer.

use crate::error::{JotError, Result};
use crate::header::{allocate_id, read_header, HEADER_SIZE};
use crate::io::write_once;
use crate::record::{decode, encode, Record, Status, MAX_TEXT_LEN};
use serde::Serialize;
use std::io::{Read, Seek, SeekFrom, Write};
use tracing::{debug, warn};

/// Iterator over the records of a log in append order
///
/// Yields each record with the offset it starts at. Stops after the first
/// error.
pub struct Records<'a, R> {
    reader: &'a mut R,
    done: bool,
}

impl<'a, R: Read + Seek> Records<'a, R> {
    /// Position `reader` at the first record and start scanning
    pub fn new(reader: &'a mut R) -> Result<Self> {
        reader.seek(SeekFrom::Start(HEADER_SIZE as u64))?;
        Ok(Records {
            reader,
            done: false,
        })
    }
}

impl<R: Read + Seek> Iterator for Records<'_, R> {
    type Item = Result<(Record, u64)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        match decode(&mut *self.reader) {
            Ok(Some(item)) => Some(Ok(item)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

/// Append an encoded record at end of file in a single write
pub fn append<F: Write + Seek>(file: &mut F, record: &Record) -> Result<u64> {
    let bytes = encode(record)?;
    let offset = file.seek(SeekFrom::End(0))?;

    write_once(file, &bytes)?;

    debug!(id = record.id(), offset, len = bytes.len(), "Appended record");
    Ok(offset)
}

/// Allocate an ID, stamp the current time and append a new active record
pub fn create_and_persist<F: Read + Write + Seek>(file: &mut F, text: &[u8]) -> Result<Record> {
    let timestamp = chrono::Utc::now().timestamp().max(0) as u64;
    create_and_persist_at(file, text, timestamp)
}

/// Like [`create_and_persist`] with an explicit timestamp
///
/// The payload bound is checked before the counter moves, so an oversized
/// text never consumes an ID.
pub fn create_and_persist_at<F: Read + Write + Seek>(
    file: &mut F,
    text: &[u8],
    timestamp: u64,
) -> Result<Record> {
    if text.len() > MAX_TEXT_LEN {
        return Err(JotError::PayloadTooLarge {
            len: text.len(),
            max: MAX_TEXT_LEN,
        });
    }

    let id = allocate_id(file)?;
    let record = Record::new(id, timestamp, text);
    append(file, &record)?;

    Ok(record)
}

/// Every record in append order, deleted ones included
pub fn list<R: Read + Seek>(file: &mut R) -> Result<Vec<Record>> {
    let mut records = Vec::with_capacity(256);
    for item in Records::new(file)? {
        let (record, _) = item?;
        records.push(record);
    }
    Ok(records)
}

/// Find the record with `id` and the offset it starts at
pub fn search<R: Read + Seek>(file: &mut R, id: u64) -> Result<(Record, u64)> {
    for item in Records::new(file)? {
        let (record, offset) = item?;
        if record.id() == id {
            return Ok((record, offset));
        }
    }
    Err(JotError::NotFound(id))
}

/// Mark a record deleted by rewriting its status byte in place
pub fn remove_soft<F: Read + Write + Seek>(file: &mut F, id: u64) -> Result<()> {
    let (_, offset) = search(file, id)?;

    file.seek(SeekFrom::Start(offset))?;
    write_once(file, &[Status::Deleted as u8])?;

    debug!(id, offset, "Soft-deleted record");
    Ok(())
}

/// Outcome of a full integrity scan
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanReport {
    pub records: u64,
    pub active: u64,
    pub deleted: u64,
    /// Offset just past the last well-formed record
    pub valid_len: u64,
    pub file_len: u64,
    pub max_id: Option<u64>,
    pub next_id: u64,
    /// Error that stopped the scan before end of file
    pub error: Option<String>,
    /// The scan stopped on a truncated trailing record
    pub torn_tail: bool,
}

impl ScanReport {
    /// No damage found and the counter is ahead of every stored ID
    pub fn is_clean(&self) -> bool {
        self.error.is_none() && self.counter_ahead()
    }

    pub fn counter_ahead(&self) -> bool {
        self.max_id.map_or(true, |max| self.next_id > max)
    }
}

/// Scan the whole log and report its state
///
/// Header errors propagate; record-level damage is recorded in the report.
pub fn check<R: Read + Seek>(file: &mut R) -> Result<ScanReport> {
    let header = read_header(file)?;
    let file_len = file.seek(SeekFrom::End(0))?;

    let mut report = ScanReport {
        valid_len: HEADER_SIZE as u64,
        file_len,
        next_id: header.next_id,
        ..ScanReport::default()
    };

    for item in Records::new(file)? {
        match item {
            Ok((record, offset)) => {
                report.records += 1;
                if record.is_deleted() {
                    report.deleted += 1;
                } else {
                    report.active += 1;
                }
                report.max_id = Some(report.max_id.map_or(record.id(), |m| m.max(record.id())));
                report.valid_len = offset + record.encoded_len() as u64;
            }
            Err(e) => {
                report.torn_tail = matches!(e, JotError::TruncatedRecord { .. });
                warn!(offset = report.valid_len, error = %e, "Log scan stopped early");
                report.error = Some(e.to_string());
            }
        }
    }

    Ok(report)
}
