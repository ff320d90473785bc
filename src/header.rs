//! File header (offset 0) and next-ID allocation
//!
//! ```text
//! offset 0   magic     u32 LE  0xDEADBEEF
//! offset 4   version   u16 LE  1
//! offset 6   next_id   u64 LE  starts at 10_000
//! ```

use crate::error::{JotError, Result};
use crate::io::{read_full, write_once};
use std::io::{Read, Seek, SeekFrom, Write};
use tracing::{debug, info};

pub const MAGIC: u32 = 0xDEAD_BEEF;
pub const VERSION: u16 = 1;

/// Header size in bytes; the first record starts here
pub const HEADER_SIZE: usize = 14;

/// Byte offset of the next-ID counter inside the header
pub const NEXT_ID_OFFSET: u64 = 6;

/// First ID handed out by a fresh log. Lower IDs stay reserved.
pub const DEFAULT_NEXT_ID: u64 = 10_000;

/// Jot log header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub magic: u32,
    pub version: u16,
    /// ID the next allocation will return
    pub next_id: u64,
}

impl Header {
    /// Create a header for a fresh log
    pub fn new() -> Self {
        Header {
            magic: MAGIC,
            version: VERSION,
            next_id: DEFAULT_NEXT_ID,
        }
    }

    /// Validate the header magic and version
    ///
    /// Magic is checked first so a foreign file never reports a version error.
    pub fn validate(&self) -> Result<()> {
        if self.magic != MAGIC {
            return Err(JotError::InvalidMagic { found: self.magic });
        }

        if self.version != VERSION {
            return Err(JotError::UnsupportedVersion {
                found: self.version,
            });
        }

        Ok(())
    }

    /// Serialize header to bytes
    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut bytes = [0u8; HEADER_SIZE];
        bytes[0..4].copy_from_slice(&self.magic.to_le_bytes());
        bytes[4..6].copy_from_slice(&self.version.to_le_bytes());
        bytes[6..14].copy_from_slice(&self.next_id.to_le_bytes());
        bytes
    }

    /// Deserialize and validate a header
    pub fn from_bytes(bytes: &[u8; HEADER_SIZE]) -> Result<Self> {
        let mut magic = [0u8; 4];
        magic.copy_from_slice(&bytes[0..4]);
        let mut version = [0u8; 2];
        version.copy_from_slice(&bytes[4..6]);
        let mut next_id = [0u8; 8];
        next_id.copy_from_slice(&bytes[6..14]);

        let header = Header {
            magic: u32::from_le_bytes(magic),
            version: u16::from_le_bytes(version),
            next_id: u64::from_le_bytes(next_id),
        };
        header.validate()?;

        Ok(header)
    }
}

impl Default for Header {
    fn default() -> Self {
        Self::new()
    }
}

/// Initialize an empty log or validate an existing one
///
/// Must run once per opened handle before any other operation. An empty
/// file gets a fresh header; anything else is left exactly as read.
pub fn init_or_validate<F: Read + Write + Seek>(file: &mut F) -> Result<Header> {
    file.seek(SeekFrom::Start(0))?;

    let mut buf = [0u8; HEADER_SIZE];
    let n = read_full(file, &mut buf)?;

    match n {
        0 => {
            let header = Header::new();
            file.seek(SeekFrom::Start(0))?;
            write_once(file, &header.to_bytes())?;
            info!(next_id = header.next_id, "Initialized new jot log");
            Ok(header)
        }
        HEADER_SIZE => Header::from_bytes(&buf),
        len => Err(JotError::CorruptHeader { len }),
    }
}

/// Read and validate the header without modifying the file
pub fn read_header<F: Read + Seek>(file: &mut F) -> Result<Header> {
    file.seek(SeekFrom::Start(0))?;

    let mut buf = [0u8; HEADER_SIZE];
    let n = read_full(file, &mut buf)?;
    if n != HEADER_SIZE {
        return Err(JotError::CorruptHeader { len: n });
    }

    Header::from_bytes(&buf)
}

/// Allocate the next record ID
///
/// Read-modify-write of the counter with no locking: callers sharing a file
/// across processes must serialize this themselves (see [`crate::JotFile`]).
pub fn allocate_id<F: Read + Write + Seek>(file: &mut F) -> Result<u64> {
    let mut buf = [0u8; 8];

    file.seek(SeekFrom::Start(NEXT_ID_OFFSET))?;
    file.read_exact(&mut buf)?;
    let cur = u64::from_le_bytes(buf);

    let next = cur.checked_add(1).ok_or(JotError::IdSpaceExhausted)?;

    file.seek(SeekFrom::Start(NEXT_ID_OFFSET))?;
    write_once(file, &next.to_le_bytes())?;

    debug!(id = cur, "Allocated record ID");
    Ok(cur)
}
