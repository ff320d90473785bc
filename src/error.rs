//! Error types for jot log operations

use std::path::PathBuf;
use thiserror::Error;

/// Jot operation result type
pub type Result<T> = std::result::Result<T, JotError>;

/// Errors surfaced by the header manager, the record codec and the log operations
///
/// Nothing is retried internally; every variant reaches the caller as-is.
#[derive(Error, Debug)]
pub enum JotError {
    /// Header shorter than 14 bytes but not empty
    #[error("Truncated header: {len} of 14 bytes present")]
    CorruptHeader { len: usize },

    /// File is not a jot log
    #[error("Invalid header magic: got 0x{found:08x} want 0x{:08x}", crate::header::MAGIC)]
    InvalidMagic { found: u32 },

    /// Format generation mismatch
    #[error("Unsupported format version: got {found} want {}", crate::header::VERSION)]
    UnsupportedVersion { found: u16 },

    /// Partial record prefix or payload at the end of the log
    #[error("Truncated record at offset {offset}: expected {expected} bytes, got {got}")]
    TruncatedRecord {
        offset: u64,
        expected: usize,
        got: usize,
    },

    /// Record bytes are present but cannot be a valid record
    #[error("Corrupt record at offset {offset}: {reason}")]
    CorruptRecord { offset: u64, reason: String },

    /// Encode-time payload bound
    #[error("Text too large: {len} bytes (max {max})")]
    PayloadTooLarge { len: usize, max: usize },

    /// No record with this ID
    #[error("Record not found: {0}")]
    NotFound(u64),

    /// write() accepted fewer bytes than requested
    #[error("Short write: wrote {written} of {expected} bytes")]
    ShortWrite { expected: usize, written: usize },

    /// The next-ID counter cannot be advanced further
    #[error("ID space exhausted")]
    IdSpaceExhausted,

    /// Another process holds the log
    #[error("Log file is locked by another process: {}", .0.display())]
    Locked(PathBuf),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl JotError {
    /// True for the kinds that mean the bytes on disk are damaged
    pub fn is_corruption(&self) -> bool {
        matches!(
            self,
            JotError::CorruptHeader { .. }
                | JotError::InvalidMagic { .. }
                | JotError::UnsupportedVersion { .. }
                | JotError::TruncatedRecord { .. }
                | JotError::CorruptRecord { .. }
        )
    }
}
