//! The raw log: an append-only binary file holding one fixed-size
//! [`FileHeader`] followed by a sequence of cycles, each a [`RecordHeader`]
//! plus four independently zstd-compressed, bincode-serialized segments
//! (system, task, cgroup-cstat, cgroup-pidlist).
//!
//! Every multi-byte field is written little-endian via explicit
//! `to_le_bytes`/`from_le_bytes`, not derived (de)serialization, so the
//! on-disk layout is exact and stable independent of whatever `bincode`'s
//! internal representation happens to be — only the four payload segments
//! go through `bincode`+`zstd`.

mod header;
mod reader;
mod writer;

pub use header::{FileHeader, RecordHeader, FLAG_BOOT, FLAG_LAST, FLAG_RAW_ACCT_ACTIVE, FLAG_RAW_CGROUP_STAT,
    FLAG_RAW_CONTAINER_STAT, FLAG_RAW_GPU_STAT, FLAG_RAW_IOSTAT, FLAG_RAW_NETATOP, FLAG_RAW_NETATOPD, HEADER_LEN,
    MAGIC, RECORD_HEADER_LEN};
pub use reader::{DecodedCycle, RawLogReader};
pub use writer::RawLogWriter;

use std::io;

/// Errors from the raw log's own framing (header/record validation, I/O).
/// Subsystem-level trouble (accounting unavailable, gpu daemon gone) is
/// handled by the deviation engine, never surfaced here.
#[derive(Debug)]
pub enum RawLogError {
    /// The file's leading 4 bytes aren't the expected magic number.
    BadMagic { found: u32 },
    /// The file's creator version isn't one this reader can decode.
    VersionMismatch { found: u16 },
    /// A header or record declares a different length than this build's
    /// compiled-in struct sizes — written by a different (incompatible)
    /// version of the writer.
    StructSizeMismatch { field: &'static str, expected: u32, found: u32 },
    Write(io::Error),
    Read(io::Error),
    /// The file ends mid-record: fewer bytes remain than the record's own
    /// header declares it should occupy.
    Truncated,
}

impl std::fmt::Display for RawLogError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RawLogError::BadMagic { found } => write!(f, "bad magic number: {found:#010x}"),
            RawLogError::VersionMismatch { found } => write!(f, "unsupported creator version: {found:#06x}"),
            RawLogError::StructSizeMismatch { field, expected, found } => {
                write!(f, "struct size mismatch in {field}: expected {expected}, found {found}")
            }
            RawLogError::Write(e) => write!(f, "raw log write error: {e}"),
            RawLogError::Read(e) => write!(f, "raw log read error: {e}"),
            RawLogError::Truncated => write!(f, "raw log record truncated"),
        }
    }
}

impl std::error::Error for RawLogError {}
