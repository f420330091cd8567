//! Fixed-size binary layouts for the raw log's file header and per-cycle
//! record header. See the [`super`] module docs for the overall framing.

use super::RawLogError;
use crate::storage::model::{CgroupChainEntry, ProcessInfo, SystemStatInfo};

/// Identifies a raw log file; the first four bytes of every file.
pub const MAGIC: u32 = 0xfeed_beef;

/// This build's creator version. The high bit is always set, distinguishing
/// a native writer's version tag from the zero/low range a foreign or
/// corrupt file is likely to contain.
pub const CREATOR_VERSION: u16 = 0x8000 | 1;

const HOSTNAME_LEN: usize = 64;

/// Total on-disk size of [`FileHeader`].
pub const HEADER_LEN: usize = 4 // magic
    + 2 // creator_version
    + 2 // rawheadlen
    + 2 // rawreclen
    + 2 // tick_rate
    + 4 // sstatlen
    + 4 // tstatlen
    + 4 // cstatlen
    + 4 // page_size
    + 4 // support_flags
    + 4 // os_release
    + 4 // os_version
    + 4 // os_sub
    + HOSTNAME_LEN;

/// Once-per-file metadata: creator identity plus the compiled-in sizes and
/// flags a reader needs to decide whether it can even attempt to decode the
/// records that follow.
#[derive(Debug, Clone, PartialEq)]
pub struct FileHeader {
    pub creator_version: u16,
    /// Size of this header as written, for forward-compatible skip-ahead.
    pub rawheadlen: u16,
    /// Size of a [`RecordHeader`] as written by the creator.
    pub rawreclen: u16,
    /// Clock ticks per second (`sysconf(_SC_CLK_TCK)`) the creator ran
    /// under; needed to interpret `utime`/`stime` deviations as seconds.
    pub tick_rate: u16,
    /// Compiled-in size of the system stat structure, for detecting an
    /// incompatible writer version.
    pub sstatlen: u32,
    pub tstatlen: u32,
    pub cstatlen: u32,
    pub page_size: u32,
    /// Bitfield of optional subsystems this run could support at all
    /// (independent of whether any single cycle's flags report them
    /// active) — accounting, per-process net/gpu daemons, cgroups.
    pub support_flags: i32,
    pub os_release: i32,
    pub os_version: i32,
    pub os_sub: i32,
    pub hostname: [u8; HOSTNAME_LEN],
}

impl FileHeader {
    pub fn new(tick_rate: u16, sstatlen: u32, tstatlen: u32, cstatlen: u32, page_size: u32, support_flags: i32, hostname: &str) -> Self {
        let mut buf = [0u8; HOSTNAME_LEN];
        let bytes = hostname.as_bytes();
        let n = bytes.len().min(HOSTNAME_LEN - 1);
        buf[..n].copy_from_slice(&bytes[..n]);
        Self {
            creator_version: CREATOR_VERSION,
            rawheadlen: HEADER_LEN as u16,
            rawreclen: super::RECORD_HEADER_LEN as u16,
            tick_rate,
            sstatlen,
            tstatlen,
            cstatlen,
            page_size,
            support_flags,
            os_release: 0,
            os_version: 0,
            os_sub: 0,
            hostname: buf,
        }
    }

    pub fn to_bytes(&self) -> [u8; HEADER_LEN] {
        let mut out = [0u8; HEADER_LEN];
        let mut off = 0;
        macro_rules! put {
            ($v:expr) => {{
                let bytes = $v.to_le_bytes();
                out[off..off + bytes.len()].copy_from_slice(&bytes);
                off += bytes.len();
            }};
        }
        put!(MAGIC);
        put!(self.creator_version);
        put!(self.rawheadlen);
        put!(self.rawreclen);
        put!(self.tick_rate);
        put!(self.sstatlen);
        put!(self.tstatlen);
        put!(self.cstatlen);
        put!(self.page_size);
        put!(self.support_flags);
        put!(self.os_release);
        put!(self.os_version);
        put!(self.os_sub);
        out[off..off + HOSTNAME_LEN].copy_from_slice(&self.hostname);
        out
    }

    pub fn from_bytes(buf: &[u8]) -> Result<Self, RawLogError> {
        if buf.len() < HEADER_LEN {
            return Err(RawLogError::Truncated);
        }
        let magic = u32::from_le_bytes(buf[0..4].try_into().unwrap());
        if magic != MAGIC {
            return Err(RawLogError::BadMagic { found: magic });
        }
        let creator_version = u16::from_le_bytes(buf[4..6].try_into().unwrap());
        if creator_version != CREATOR_VERSION {
            return Err(RawLogError::VersionMismatch { found: creator_version });
        }
        let rawheadlen = u16::from_le_bytes(buf[6..8].try_into().unwrap());
        let rawreclen = u16::from_le_bytes(buf[8..10].try_into().unwrap());
        let tick_rate = u16::from_le_bytes(buf[10..12].try_into().unwrap());
        let sstatlen = u32::from_le_bytes(buf[12..16].try_into().unwrap());
        let tstatlen = u32::from_le_bytes(buf[16..20].try_into().unwrap());
        let cstatlen = u32::from_le_bytes(buf[20..24].try_into().unwrap());
        let page_size = u32::from_le_bytes(buf[24..28].try_into().unwrap());
        let support_flags = i32::from_le_bytes(buf[28..32].try_into().unwrap());
        let os_release = i32::from_le_bytes(buf[32..36].try_into().unwrap());
        let os_version = i32::from_le_bytes(buf[36..40].try_into().unwrap());
        let os_sub = i32::from_le_bytes(buf[40..44].try_into().unwrap());
        let mut hostname = [0u8; HOSTNAME_LEN];
        hostname.copy_from_slice(&buf[44..44 + HOSTNAME_LEN]);

        if rawheadlen as usize != HEADER_LEN {
            return Err(RawLogError::StructSizeMismatch {
                field: "FileHeader",
                expected: HEADER_LEN as u32,
                found: rawheadlen as u32,
            });
        }
        if rawreclen as usize != super::RECORD_HEADER_LEN {
            return Err(RawLogError::StructSizeMismatch {
                field: "RecordHeader",
                expected: super::RECORD_HEADER_LEN as u32,
                found: rawreclen as u32,
            });
        }
        if sstatlen as usize != std::mem::size_of::<SystemStatInfo>() {
            return Err(RawLogError::StructSizeMismatch {
                field: "SystemStatInfo",
                expected: std::mem::size_of::<SystemStatInfo>() as u32,
                found: sstatlen,
            });
        }
        if tstatlen as usize != std::mem::size_of::<ProcessInfo>() {
            return Err(RawLogError::StructSizeMismatch {
                field: "ProcessInfo",
                expected: std::mem::size_of::<ProcessInfo>() as u32,
                found: tstatlen,
            });
        }
        if cstatlen as usize != std::mem::size_of::<CgroupChainEntry>() {
            return Err(RawLogError::StructSizeMismatch {
                field: "CgroupChainEntry",
                expected: std::mem::size_of::<CgroupChainEntry>() as u32,
                found: cstatlen,
            });
        }

        Ok(Self {
            creator_version,
            rawheadlen,
            rawreclen,
            tick_rate,
            sstatlen,
            tstatlen,
            cstatlen,
            page_size,
            support_flags,
            os_release,
            os_version,
            os_sub,
            hostname,
        })
    }
}

/// This cycle was the first written after the sampler (re)started.
pub const FLAG_BOOT: u16 = 1 << 0;
/// Process accounting was readable and drained this cycle.
pub const FLAG_RAW_ACCT_ACTIVE: u16 = 1 << 1;
/// Per-process disk I/O counters (`/proc/[pid]/io`) were available.
pub const FLAG_RAW_IOSTAT: u16 = 1 << 2;
/// A netatop-style per-process network accounting module was present.
pub const FLAG_RAW_NETATOP: u16 = 1 << 3;
/// The netatop daemon (not just the kernel module) was reachable.
pub const FLAG_RAW_NETATOPD: u16 = 1 << 4;
/// Cgroup v2 single-view stats (`DataBlock::Cgroup`) were collected.
pub const FLAG_RAW_CGROUP_STAT: u16 = 1 << 5;
/// The full cgroup hierarchy walk (chain + pidlist) was collected.
pub const FLAG_RAW_CONTAINER_STAT: u16 = 1 << 6;
/// A GPU accounting daemon's stats were merged into this cycle.
pub const FLAG_RAW_GPU_STAT: u16 = 1 << 7;
/// This is the last record before a clean shutdown (matches `on_end`).
pub const FLAG_LAST: u16 = 1 << 8;

/// Total on-disk size of [`RecordHeader`].
pub const RECORD_HEADER_LEN: usize = 8 // epoch
    + 4 // interval
    + 2 // flags
    + 2 // padding
    + 4 * 4 // {s,p,c,i}comp_len
    + 4 * 4 // {s,p,c,i}orig_len
    + 4 * 11; // counts

/// Per-cycle header: when the cycle was taken, what subsystems were active,
/// how big each compressed segment is, and summary counts a sink can use
/// without decompressing the payload at all.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RecordHeader {
    pub epoch: i64,
    /// Seconds since the previous cycle (nominal sampling interval, not
    /// necessarily the configured one if a cycle was skipped/delayed).
    pub interval: u32,
    pub flags: u16,
    pub scomplen: u32,
    pub pcomplen: u32,
    pub ccomplen: u32,
    pub icomplen: u32,
    /// Decompressed length of each segment, for verifying decompression
    /// reconstructed exactly what was written.
    pub sorig: u32,
    pub torig: u32,
    pub corig: u32,
    pub iorig: u32,
    pub nproc: u32,
    pub ntask: u32,
    pub nrun: u32,
    pub nslpi: u32,
    pub nslpu: u32,
    pub nzombie: u32,
    pub nexit: u32,
    pub nnew: u32,
    pub ncgroups: u32,
    pub ncgpids: u32,
    /// Accounting records seen but dropped this cycle past the drain cap.
    pub noverflow: u32,
}

impl RecordHeader {
    pub fn to_bytes(&self) -> [u8; RECORD_HEADER_LEN] {
        let mut out = [0u8; RECORD_HEADER_LEN];
        let mut off = 0;
        macro_rules! put {
            ($v:expr) => {{
                let bytes = $v.to_le_bytes();
                out[off..off + bytes.len()].copy_from_slice(&bytes);
                off += bytes.len();
            }};
        }
        put!(self.epoch);
        put!(self.interval);
        put!(self.flags);
        put!(0u16); // padding
        put!(self.scomplen);
        put!(self.pcomplen);
        put!(self.ccomplen);
        put!(self.icomplen);
        put!(self.sorig);
        put!(self.torig);
        put!(self.corig);
        put!(self.iorig);
        put!(self.nproc);
        put!(self.ntask);
        put!(self.nrun);
        put!(self.nslpi);
        put!(self.nslpu);
        put!(self.nzombie);
        put!(self.nexit);
        put!(self.nnew);
        put!(self.ncgroups);
        put!(self.ncgpids);
        put!(self.noverflow);
        out
    }

    pub fn from_bytes(buf: &[u8]) -> Result<Self, RawLogError> {
        if buf.len() < RECORD_HEADER_LEN {
            return Err(RawLogError::Truncated);
        }
        let mut off = 0;
        macro_rules! take_u32 {
            () => {{
                let v = u32::from_le_bytes(buf[off..off + 4].try_into().unwrap());
                off += 4;
                v
            }};
        }
        let epoch = i64::from_le_bytes(buf[off..off + 8].try_into().unwrap());
        off += 8;
        let interval = take_u32!();
        let flags = u16::from_le_bytes(buf[off..off + 2].try_into().unwrap());
        off += 2;
        off += 2; // padding
        let scomplen = take_u32!();
        let pcomplen = take_u32!();
        let ccomplen = take_u32!();
        let icomplen = take_u32!();
        let sorig = take_u32!();
        let torig = take_u32!();
        let corig = take_u32!();
        let iorig = take_u32!();
        let nproc = take_u32!();
        let ntask = take_u32!();
        let nrun = take_u32!();
        let nslpi = take_u32!();
        let nslpu = take_u32!();
        let nzombie = take_u32!();
        let nexit = take_u32!();
        let nnew = take_u32!();
        let ncgroups = take_u32!();
        let ncgpids = take_u32!();
        let noverflow = take_u32!();

        Ok(Self {
            epoch,
            interval,
            flags,
            scomplen,
            pcomplen,
            ccomplen,
            icomplen,
            sorig,
            torig,
            corig,
            iorig,
            nproc,
            ntask,
            nrun,
            nslpi,
            nslpu,
            nzombie,
            nexit,
            nnew,
            ncgroups,
            ncgpids,
            noverflow,
        })
    }

    /// Total bytes this record occupies on disk, header plus every segment.
    pub fn total_len(&self) -> u64 {
        RECORD_HEADER_LEN as u64 + self.scomplen as u64 + self.pcomplen as u64 + self.ccomplen as u64 + self.icomplen as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_header() -> FileHeader {
        FileHeader::new(
            100,
            std::mem::size_of::<SystemStatInfo>() as u32,
            std::mem::size_of::<ProcessInfo>() as u32,
            std::mem::size_of::<CgroupChainEntry>() as u32,
            4096,
            0b101,
            "testhost",
        )
    }

    #[test]
    fn file_header_round_trips() {
        let header = test_header();
        let bytes = header.to_bytes();
        let back = FileHeader::from_bytes(&bytes).unwrap();
        assert_eq!(header, back);
    }

    #[test]
    fn file_header_rejects_bad_magic() {
        let mut bytes = test_header().to_bytes();
        bytes[0] = 0;
        let err = FileHeader::from_bytes(&bytes).unwrap_err();
        assert!(matches!(err, RawLogError::BadMagic { .. }));
    }

    #[test]
    fn file_header_rejects_version_mismatch() {
        let mut bytes = test_header().to_bytes();
        bytes[4..6].copy_from_slice(&0x0002u16.to_le_bytes());
        let err = FileHeader::from_bytes(&bytes).unwrap_err();
        assert!(matches!(err, RawLogError::VersionMismatch { found: 2 }));
    }

    #[test]
    fn file_header_rejects_mismatched_tstatlen() {
        let mut bytes = test_header().to_bytes();
        bytes[16..20].copy_from_slice(&1u32.to_le_bytes());
        let err = FileHeader::from_bytes(&bytes).unwrap_err();
        assert!(matches!(err, RawLogError::StructSizeMismatch { field: "ProcessInfo", .. }));
    }

    #[test]
    fn record_header_round_trips() {
        let rec = RecordHeader {
            epoch: 1_700_000_000,
            interval: 10,
            flags: FLAG_BOOT | FLAG_RAW_ACCT_ACTIVE,
            scomplen: 10,
            pcomplen: 20,
            ccomplen: 0,
            icomplen: 0,
            sorig: 50,
            torig: 90,
            corig: 0,
            iorig: 0,
            nproc: 3,
            ntask: 3,
            nrun: 1,
            nslpi: 2,
            nslpu: 0,
            nzombie: 0,
            nexit: 0,
            nnew: 3,
            ncgroups: 0,
            ncgpids: 0,
            noverflow: 0,
        };
        let bytes = rec.to_bytes();
        let back = RecordHeader::from_bytes(&bytes).unwrap();
        assert_eq!(rec, back);
        assert_eq!(rec.total_len(), RECORD_HEADER_LEN as u64 + 30);
    }
}
