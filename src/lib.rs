//! # Jot - Append-Only Binary Log for Short Text Entries
//!
//! `jot` stores short text entries ("jots") in a single append-only file. Each
//! entry gets a monotonically increasing ID, a creation timestamp and a
//! liveness flag. Deleting an entry flips its status byte in place; nothing is
//! ever moved, resized or physically removed.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use jot::{JotFile, Result};
//!
//! # fn main() -> Result<()> {
//! // Creates jot.bin with a fresh header if it does not exist yet
//! let mut jot = JotFile::open("jot.bin")?;
//!
//! let record = jot.add(b"buy milk")?;
//! assert_eq!(record.id(), 10_000);
//!
//! jot.remove(record.id())?;
//! let (found, _offset) = jot.search(record.id())?;
//! assert!(found.is_deleted());
//! # Ok(())
//! # }
//! ```
//!
//! ## Working on any handle
//!
//! The core operations take any `Read + Write + Seek` handle and never open
//! or close it themselves:
//!
//! ```rust
//! use std::io::Cursor;
//! use jot::{header, log};
//!
//! # fn main() -> jot::Result<()> {
//! let mut file = Cursor::new(Vec::new());
//! header::init_or_validate(&mut file)?;
//!
//! let record = log::create_and_persist(&mut file, b"hello")?;
//! assert_eq!(log::list(&mut file)?, vec![record]);
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                jot.bin                      │
//! ├─────────────────────────────────────────────┤
//! │ Header (14 bytes)                           │
//! │  - Magic: 0xDEADBEEF                        │
//! │  - Version: 1                               │
//! │  - next_id counter (starts at 10000)        │
//! ├─────────────────────────────────────────────┤
//! │ Record 0                                    │
//! │  - status | id | timestamp | len | text     │
//! ├─────────────────────────────────────────────┤
//! │ Record 1 ...                                │
//! │  (end of file = end of log)                 │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Concurrency
//!
//! The log is single-writer. ID allocation is an unprotected read-modify-write
//! of the header counter, so two processes appending at once can hand out the
//! same ID. [`JotFile`] guards against this with an exclusive advisory lock
//! held for its whole lifetime; code calling [`log`] directly must provide the
//! same exclusion itself.

pub mod config;
pub mod error;
pub mod header;
pub mod io;
pub mod log;
pub mod record;

pub use config::JotConfig;
pub use error::{JotError, Result};
pub use header::{Header, DEFAULT_NEXT_ID, HEADER_SIZE};
pub use io::JotFile;
pub use log::{Records, ScanReport};
pub use record::{Record, Status, MAX_TEXT_LEN, RECORD_PREFIX_SIZE};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
