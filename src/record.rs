//! Record encoding and decoding
//!
//! Each record is a 21-byte fixed prefix followed by the raw text:
//!
//! ```text
//! status     u8      0 = active, 1 = deleted
//! id         u64 LE
//! timestamp  u64 LE  seconds since UNIX epoch
//! text_len   u32 LE
//! text       [u8; text_len]
//! ```

use crate::error::{JotError, Result};
use crate::io::read_full;
use serde::Serialize;
use std::borrow::Cow;
use std::io::{Read, Seek};

/// Size of the fixed record prefix
pub const RECORD_PREFIX_SIZE: usize = 21;

/// Largest text payload a record may carry (1 MiB)
pub const MAX_TEXT_LEN: usize = 1024 * 1024;

/// Record liveness
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Active = 0,
    Deleted = 1,
}

impl Status {
    /// Parse a status byte, `None` for unknown values
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Active),
            1 => Some(Self::Deleted),
            _ => None,
        }
    }
}

/// One jot entry
///
/// Fields are fixed at creation. The status only changes on disk through
/// [`crate::log::remove_soft`], which rewrites the single status byte.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Record {
    status: Status,
    id: u64,
    timestamp: u64,
    #[serde(serialize_with = "serialize_text")]
    text: Vec<u8>,
}

fn serialize_text<S: serde::Serializer>(text: &[u8], s: S) -> std::result::Result<S::Ok, S::Error> {
    s.serialize_str(&String::from_utf8_lossy(text))
}

impl Record {
    /// Create a new active record
    pub fn new(id: u64, timestamp: u64, text: impl Into<Vec<u8>>) -> Self {
        Self::from_parts(Status::Active, id, timestamp, text)
    }

    pub fn from_parts(status: Status, id: u64, timestamp: u64, text: impl Into<Vec<u8>>) -> Self {
        Record {
            status,
            id,
            timestamp,
            text: text.into(),
        }
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    pub fn text(&self) -> &[u8] {
        &self.text
    }

    /// Text as UTF-8, replacing invalid sequences
    pub fn text_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.text)
    }

    pub fn is_deleted(&self) -> bool {
        self.status == Status::Deleted
    }

    /// Total on-disk size of this record
    pub fn encoded_len(&self) -> usize {
        RECORD_PREFIX_SIZE + self.text.len()
    }
}

/// Encode a record into its on-disk form
pub fn encode(record: &Record) -> Result<Vec<u8>> {
    let len = record.text.len();
    if len > MAX_TEXT_LEN {
        return Err(JotError::PayloadTooLarge {
            len,
            max: MAX_TEXT_LEN,
        });
    }

    let mut buf = Vec::with_capacity(RECORD_PREFIX_SIZE + len);
    buf.push(record.status as u8);
    buf.extend_from_slice(&record.id.to_le_bytes());
    buf.extend_from_slice(&record.timestamp.to_le_bytes());
    buf.extend_from_slice(&(len as u32).to_le_bytes());
    buf.extend_from_slice(&record.text);

    Ok(buf)
}

/// Decode the record at the current stream position
///
/// Returns `Ok(None)` at a clean end of log, otherwise the record together
/// with the offset it starts at.
pub fn decode<R: Read + Seek>(reader: &mut R) -> Result<Option<(Record, u64)>> {
    let offset = reader.stream_position()?;

    let mut prefix = [0u8; RECORD_PREFIX_SIZE];
    let got = read_full(reader, &mut prefix)?;
    if got == 0 {
        return Ok(None);
    }
    if got < RECORD_PREFIX_SIZE {
        return Err(JotError::TruncatedRecord {
            offset,
            expected: RECORD_PREFIX_SIZE,
            got,
        });
    }

    let status = Status::from_u8(prefix[0]).ok_or_else(|| JotError::CorruptRecord {
        offset,
        reason: format!("unknown status byte {}", prefix[0]),
    })?;
    let id = u64::from_le_bytes(field(&prefix[1..9]));
    let timestamp = u64::from_le_bytes(field(&prefix[9..17]));
    let text_len = u32::from_le_bytes(field(&prefix[17..21])) as usize;

    if text_len > MAX_TEXT_LEN {
        return Err(JotError::CorruptRecord {
            offset,
            reason: format!("text length {} exceeds {}", text_len, MAX_TEXT_LEN),
        });
    }

    let mut text = vec![0u8; text_len];
    let got = read_full(reader, &mut text)?;
    if got < text_len {
        return Err(JotError::TruncatedRecord {
            offset,
            expected: RECORD_PREFIX_SIZE + text_len,
            got: RECORD_PREFIX_SIZE + got,
        });
    }

    Ok(Some((
        Record {
            status,
            id,
            timestamp,
            text,
        },
        offset,
    )))
}

fn field<const N: usize>(bytes: &[u8]) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(bytes);
    out
}
