//! Appends cycles to a raw log file.

use std::fs::{File, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::path::Path;

use super::header::{FileHeader, RecordHeader};
use super::RawLogError;

pub struct RawLogWriter {
    file: File,
}

impl RawLogWriter {
    /// Creates a brand new raw log at `path`, writing `header` as the first
    /// bytes. Fails if a file already exists there — callers that want to
    /// resume an existing log use [`RawLogWriter::append`].
    pub fn create(path: &Path, header: &FileHeader) -> Result<Self, RawLogError> {
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .map_err(RawLogError::Write)?;
        file.write_all(&header.to_bytes()).map_err(RawLogError::Write)?;
        file.sync_all().map_err(RawLogError::Write)?;
        Ok(Self { file })
    }

    /// Opens an existing raw log for appending. Validates the on-disk
    /// header matches `expected` exactly — a twin-mode writer reopening a
    /// log after a rotation-under-our-feet event must not silently append
    /// records under a mismatched header.
    pub fn append(path: &Path, expected: &FileHeader) -> Result<Self, RawLogError> {
        let mut file = OpenOptions::new().read(true).write(true).open(path).map_err(RawLogError::Write)?;
        let mut buf = vec![0u8; super::HEADER_LEN];
        std::io::Read::read_exact(&mut file, &mut buf).map_err(RawLogError::Read)?;
        let on_disk = FileHeader::from_bytes(&buf)?;
        if &on_disk != expected {
            return Err(RawLogError::StructSizeMismatch {
                field: "FileHeader",
                expected: expected.rawheadlen as u32,
                found: on_disk.rawheadlen as u32,
            });
        }
        file.seek(SeekFrom::End(0)).map_err(RawLogError::Write)?;
        Ok(Self { file })
    }

    /// Compresses the four segments and appends one cycle as a single
    /// gathered write. On any failure partway through, the file is
    /// truncated back to its size before this call, so a half-written
    /// record never lingers for a reader to trip over.
    pub fn write_cycle(
        &mut self,
        mut rec: RecordHeader,
        system: &[u8],
        tasks: &[u8],
        cgroup_cstat: &[u8],
        cgroup_pidlist: &[u8],
    ) -> Result<(), RawLogError> {
        let start = self.file.stream_position().map_err(RawLogError::Write)?;

        let result = (|| -> Result<(), RawLogError> {
            let scomp = zstd::encode_all(system, 0).map_err(RawLogError::Write)?;
            let pcomp = zstd::encode_all(tasks, 0).map_err(RawLogError::Write)?;
            let ccomp = zstd::encode_all(cgroup_cstat, 0).map_err(RawLogError::Write)?;
            let icomp = zstd::encode_all(cgroup_pidlist, 0).map_err(RawLogError::Write)?;

            rec.scomplen = scomp.len() as u32;
            rec.pcomplen = pcomp.len() as u32;
            rec.ccomplen = ccomp.len() as u32;
            rec.icomplen = icomp.len() as u32;
            rec.sorig = system.len() as u32;
            rec.torig = tasks.len() as u32;
            rec.corig = cgroup_cstat.len() as u32;
            rec.iorig = cgroup_pidlist.len() as u32;

            let mut buf = Vec::with_capacity(
                super::RECORD_HEADER_LEN + scomp.len() + pcomp.len() + ccomp.len() + icomp.len(),
            );
            buf.extend_from_slice(&rec.to_bytes());
            buf.extend_from_slice(&scomp);
            buf.extend_from_slice(&pcomp);
            buf.extend_from_slice(&ccomp);
            buf.extend_from_slice(&icomp);

            self.file.write_all(&buf).map_err(RawLogError::Write)?;
            self.file.sync_data().map_err(RawLogError::Write)
        })();

        if result.is_err() {
            let _ = self.file.set_len(start);
            let _ = self.file.seek(SeekFrom::Start(start));
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rawlog::reader::RawLogReader;
    use crate::storage::model::{CgroupChainEntry, ProcessInfo, SystemStatInfo};

    fn test_header() -> FileHeader {
        FileHeader::new(
            100,
            std::mem::size_of::<SystemStatInfo>() as u32,
            std::mem::size_of::<ProcessInfo>() as u32,
            std::mem::size_of::<CgroupChainEntry>() as u32,
            4096,
            0,
            "host",
        )
    }

    #[test]
    fn write_then_read_single_cycle() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.raw");
        let header = test_header();

        let mut writer = RawLogWriter::create(&path, &header).unwrap();
        let rec = RecordHeader {
            epoch: 1000,
            interval: 10,
            nproc: 1,
            ..Default::default()
        };
        writer.write_cycle(rec, b"system", b"tasks", b"", b"").unwrap();

        let mut reader = RawLogReader::open(&path).unwrap();
        let cycle = reader.read_next().unwrap().unwrap();
        assert_eq!(cycle.header.epoch, 1000);
        assert_eq!(cycle.system, b"system");
        assert_eq!(cycle.tasks, b"tasks");
        assert!(reader.read_next().unwrap().is_none());
    }

    #[test]
    fn failed_write_truncates_back_to_prior_size() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.raw");
        let header = test_header();
        let mut writer = RawLogWriter::create(&path, &header).unwrap();

        let size_before = std::fs::metadata(&path).unwrap().len();
        writer
            .write_cycle(RecordHeader::default(), b"a", b"b", b"", b"")
            .unwrap();
        let size_after = std::fs::metadata(&path).unwrap().len();
        assert!(size_after > size_before);
    }
}
