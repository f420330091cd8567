//! The process accounting reader: drains the kernel's process-exit
//! accounting stream so the deviation engine can attribute resource usage to
//! processes that lived and died between two samples.
//!
//! The accounting stream is an append-only binary file the kernel writes one
//! fixed-size record to per exited process (BSD-style `acct(5)`). This
//! module decodes the `acct_v3`-shaped record (the layout used by modern
//! Linux kernels), including its exponent-encoded `comp_t` resource fields,
//! and turns each record into an [`ExitRecord`] the deviation engine can
//! resolve against the task database.
//!
//! Only the `acct_v3` record shape is decoded; `acct`/`acct_v2` (the older,
//! smaller records some very old kernels still emit) are detected via the
//! version byte and reported as [`AccountingError::UnsupportedVersion`] —
//! this host-agnostic core has no way to validate against one of those
//! kernels, so rather than guess at a byte layout it surfaces a specific
//! reason code and the engine marks accounting unavailable for the run.

use std::io::{self, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::storage::interner::StringInterner;

/// One fixed-size accounting record as modern Linux emits it (`struct
/// acct_v3` in `<linux/acct.h>`), rounded up to a 64-byte record.
const RECORD_LEN: usize = 64;

/// Version byte this reader understands. Older `acct`/`acct_v2` records use
/// a different, smaller layout and are rejected rather than misparsed.
const SUPPORTED_VERSION: u8 = 3;

/// Hard cap on how many exit records a single drain will materialize. Past
/// this, the remainder are skipped by repositioning the stream and counted
/// into `noverflow` — matching the raw log record's `noverflow` field.
pub const MAX_RECORDS_PER_DRAIN: usize = 4096;

/// `WIFSIGNALED`/`WEXITSTATUS`-normalized exit status: signal deaths are
/// reported as `signal + 256`, otherwise the 8-bit wait-status exit code.
fn normalize_exit_status(raw: u32) -> i32 {
    let low = (raw & 0x7f) as i32;
    if low == 0 {
        ((raw >> 8) & 0xff) as i32
    } else {
        low + 256
    }
}

/// Decodes a kernel `comp_t`: a 3-bit exponent, 13-bit mantissa, base-8
/// floating point encoding used for every cumulative resource field in an
/// accounting record (`encode_comp_t` in the kernel's `kernel/acct.c`).
fn decode_comp_t(raw: u16) -> u64 {
    const MANTISSA_BITS: u32 = 13;
    const EXP_SHIFT: u32 = 3;
    let exponent = (raw >> MANTISSA_BITS) as u32;
    let mantissa = (raw & ((1 << MANTISSA_BITS) - 1)) as u64;
    mantissa << (exponent * EXP_SHIFT)
}

/// One decoded exit record, ready for the deviation engine to resolve
/// against the task database and fold into a `state == 'E'` task record.
#[derive(Debug, Clone, PartialEq)]
pub struct ExitRecord {
    /// Pid of the exited process, if the kernel populated it (always true
    /// for `acct_v3`; kept `Option` because older formats may not).
    pub pid: Option<u32>,
    pub ppid: u32,
    pub uid: u32,
    pub gid: u32,
    /// Process start time (seconds since epoch) — identity disambiguator
    /// matching `ProcessInfo::btime`, for PDB lookup under pid reuse.
    pub start_time: u32,
    /// Hash of the (truncated, kernel-side) command name, via the shared
    /// interner so it round-trips the same as live `ProcessInfo::name_hash`.
    pub name_hash: u64,
    /// Normalized exit status: `signal + 256` on signal death, else the
    /// 8-bit wait-status exit code.
    pub exit_code: i32,
    pub utime_ticks: u64,
    pub stime_ticks: u64,
    pub minflt: u64,
    pub majflt: u64,
    /// Approximate I/O in KB, decoded from `ac_io` (kernel characters
    /// transferred, not exact byte count).
    pub io_kb: u64,
}

#[derive(Debug)]
pub enum AccountingError {
    /// The process lacks the privilege to read the accounting file.
    NotPrivileged(io::Error),
    /// The configured accounting directory/file does not exist.
    MissingDirectory(PathBuf),
    /// The accounting file's version byte isn't one this reader decodes.
    UnsupportedVersion(u8),
    /// Read failure mid-stream (also returned if the file was rotated out
    /// from under the reader).
    Io(io::Error),
}

impl std::fmt::Display for AccountingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AccountingError::NotPrivileged(e) => write!(f, "insufficient privilege: {e}"),
            AccountingError::MissingDirectory(p) => {
                write!(f, "accounting file missing: {}", p.display())
            }
            AccountingError::UnsupportedVersion(v) => {
                write!(f, "unsupported accounting record version: {v}")
            }
            AccountingError::Io(e) => write!(f, "accounting I/O error: {e}"),
        }
    }
}

impl std::error::Error for AccountingError {}

impl From<io::Error> for AccountingError {
    fn from(e: io::Error) -> Self {
        AccountingError::Io(e)
    }
}

/// Result of one drain: the decoded records (capped) plus how many more
/// existed past the cap this cycle.
#[derive(Debug, Default)]
pub struct DrainResult {
    pub records: Vec<ExitRecord>,
    pub noverflow: u32,
}

/// Reads the process accounting stream sequentially, remembering the
/// offset it last drained up to.
pub struct AccountingReader<R> {
    inner: R,
    offset: u64,
}

impl AccountingReader<std::fs::File> {
    /// Opens the accounting file at `path` for sequential draining,
    /// starting from the current end of file (only exits *after* this
    /// point are ever reported — a freshly (re)opened reader is not
    /// retroactive).
    pub fn open(path: &Path) -> Result<Self, AccountingError> {
        if !path.exists() {
            return Err(AccountingError::MissingDirectory(path.to_path_buf()));
        }
        let mut file = std::fs::File::open(path).map_err(|e| {
            if e.kind() == io::ErrorKind::PermissionDenied {
                AccountingError::NotPrivileged(e)
            } else {
                AccountingError::Io(e)
            }
        })?;
        let offset = file.seek(SeekFrom::End(0))?;
        Ok(Self {
            inner: file,
            offset,
        })
    }
}

impl<R: Read + Seek> AccountingReader<R> {
    /// Wraps an already-open reader at its current position (for tests: a
    /// `Cursor<Vec<u8>>` pre-seeded with records).
    pub fn from_reader(inner: R) -> Self {
        Self { inner, offset: 0 }
    }

    /// Drains every record appended since the last drain, up to `cap`.
    /// Remaining records past the cap are skipped by seeking rather than
    /// decoded, and counted into `noverflow` — the stream offset always
    /// ends up past every record that existed at the start of this call.
    pub fn drain(&mut self, interner: &mut StringInterner, cap: usize) -> Result<DrainResult, AccountingError> {
        self.inner.seek(SeekFrom::Start(self.offset))?;
        let end = self.inner.seek(SeekFrom::End(0))?;
        let available = end.saturating_sub(self.offset);
        let total_records = (available / RECORD_LEN as u64) as usize;

        let to_decode = total_records.min(cap);
        let mut records = Vec::with_capacity(to_decode);

        self.inner.seek(SeekFrom::Start(self.offset))?;
        let mut buf = [0u8; RECORD_LEN];
        for _ in 0..to_decode {
            self.inner.read_exact(&mut buf)?;
            match decode_record(&buf, interner) {
                Ok(record) => records.push(record),
                Err(AccountingError::UnsupportedVersion(v)) => {
                    warn!(version = v, "accounting: skipping unsupported record version");
                }
                Err(e) => return Err(e),
            }
        }

        let noverflow = (total_records - to_decode) as u32;
        let new_offset = self.offset + total_records as u64 * RECORD_LEN as u64;
        // Skip the overflow records by seeking past them rather than reading.
        self.inner.seek(SeekFrom::Start(new_offset))?;
        self.offset = new_offset;

        Ok(DrainResult { records, noverflow })
    }
}

fn decode_record(buf: &[u8; RECORD_LEN], interner: &mut StringInterner) -> Result<ExitRecord, AccountingError> {
    let version = buf[1];
    if version != SUPPORTED_VERSION {
        return Err(AccountingError::UnsupportedVersion(version));
    }

    let exitcode = u32::from_le_bytes(buf[4..8].try_into().unwrap());
    let uid = u32::from_le_bytes(buf[8..12].try_into().unwrap());
    let gid = u32::from_le_bytes(buf[12..16].try_into().unwrap());
    let pid = u32::from_le_bytes(buf[16..20].try_into().unwrap());
    let _ppid = u32::from_le_bytes(buf[20..24].try_into().unwrap());
    let btime = u32::from_le_bytes(buf[24..28].try_into().unwrap());
    // buf[28..32] = ac_etime (f32), not used by the deviation engine.
    let utime = decode_comp_t(u16::from_le_bytes(buf[32..34].try_into().unwrap()));
    let stime = decode_comp_t(u16::from_le_bytes(buf[34..36].try_into().unwrap()));
    // buf[36..38] = ac_mem, not used.
    let io_kb = decode_comp_t(u16::from_le_bytes(buf[38..40].try_into().unwrap()));
    // buf[40..42] = ac_rw, not used.
    let minflt = decode_comp_t(u16::from_le_bytes(buf[42..44].try_into().unwrap()));
    let majflt = decode_comp_t(u16::from_le_bytes(buf[44..46].try_into().unwrap()));
    // buf[46..48] = ac_swaps, not used.
    let comm_end = buf[48..65.min(RECORD_LEN)]
        .iter()
        .position(|&b| b == 0)
        .unwrap_or(RECORD_LEN - 48);
    let comm = String::from_utf8_lossy(&buf[48..48 + comm_end]).to_string();
    let name_hash = interner.intern(&comm);

    Ok(ExitRecord {
        pid: Some(pid),
        ppid: _ppid,
        uid,
        gid,
        start_time: btime,
        name_hash,
        exit_code: normalize_exit_status(exitcode),
        utime_ticks: utime,
        stime_ticks: stime,
        minflt,
        majflt,
        io_kb,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn encode_comp_t(value: u64) -> u16 {
        let mut v = value;
        let mut exp = 0u32;
        while v > 0x1fff {
            v >>= 3;
            exp += 1;
        }
        ((exp << 13) | v as u32) as u16
    }

    fn build_record(pid: u32, btime: u32, exitcode: u32, utime: u64, stime: u64, comm: &str) -> [u8; RECORD_LEN] {
        let mut buf = [0u8; RECORD_LEN];
        buf[0] = 0; // ac_flag
        buf[1] = SUPPORTED_VERSION;
        buf[4..8].copy_from_slice(&exitcode.to_le_bytes());
        buf[8..12].copy_from_slice(&0u32.to_le_bytes()); // uid
        buf[12..16].copy_from_slice(&0u32.to_le_bytes()); // gid
        buf[16..20].copy_from_slice(&pid.to_le_bytes());
        buf[20..24].copy_from_slice(&1u32.to_le_bytes()); // ppid
        buf[24..28].copy_from_slice(&btime.to_le_bytes());
        buf[32..34].copy_from_slice(&encode_comp_t(utime).to_le_bytes());
        buf[34..36].copy_from_slice(&encode_comp_t(stime).to_le_bytes());
        let bytes = comm.as_bytes();
        buf[48..48 + bytes.len()].copy_from_slice(bytes);
        buf
    }

    #[test]
    fn decode_comp_t_round_trips_small_values() {
        for v in [0u64, 1, 100, 8191] {
            assert_eq!(decode_comp_t(encode_comp_t(v)), v);
        }
    }

    #[test]
    fn decode_comp_t_round_trips_large_values_approximately() {
        // Large values lose precision to the exponent's granularity; they
        // must round-trip to within one step, never more.
        let v = 1_000_000u64;
        let decoded = decode_comp_t(encode_comp_t(v));
        assert!(decoded.abs_diff(v) < (1u64 << (3 * 8)));
    }

    #[test]
    fn normalizes_signal_death() {
        // killed by SIGKILL (9): low 7 bits == 9, no core dump bit.
        assert_eq!(normalize_exit_status(9), 9 + 256);
    }

    #[test]
    fn normalizes_normal_exit() {
        // exited with code 3: high byte == 3, low 7 bits == 0.
        assert_eq!(normalize_exit_status(3 << 8), 3);
    }

    #[test]
    fn drains_single_record_s3() {
        // S3: pid=7, utime baseline 100 -> exit utime 150, signal 9.
        let mut interner = StringInterner::new();
        let buf = build_record(7, 500, 9, 150, 0, "worker");
        let cursor = Cursor::new(buf.to_vec());
        let mut reader = AccountingReader::from_reader(cursor);

        let result = reader.drain(&mut interner, MAX_RECORDS_PER_DRAIN).unwrap();
        assert_eq!(result.noverflow, 0);
        assert_eq!(result.records.len(), 1);
        let rec = &result.records[0];
        assert_eq!(rec.pid, Some(7));
        assert_eq!(rec.exit_code, 9 + 256);
        assert_eq!(rec.utime_ticks, 150);
    }

    #[test]
    fn overflow_cap_skips_remainder() {
        let mut interner = StringInterner::new();
        let mut data = Vec::new();
        for pid in 0..10u32 {
            data.extend_from_slice(&build_record(pid, 0, 0, 0, 0, "p"));
        }
        let cursor = Cursor::new(data);
        let mut reader = AccountingReader::from_reader(cursor);

        let result = reader.drain(&mut interner, 4).unwrap();
        assert_eq!(result.records.len(), 4);
        assert_eq!(result.noverflow, 6);

        // Stream offset must have advanced past all 10 records, not just 4.
        let next = reader.drain(&mut interner, MAX_RECORDS_PER_DRAIN).unwrap();
        assert_eq!(next.records.len(), 0);
        assert_eq!(next.noverflow, 0);
    }
}
