//! Sequential (and backward-seekable) reading of a raw log file.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use super::header::{FileHeader, RecordHeader};
use super::RawLogError;

/// One decoded cycle: the record header plus its four decompressed,
/// still-bincode-encoded segments. Callers `bincode::deserialize` each into
/// the concrete type they expect (system data blocks, a task deviation
/// bundle, cgroup chain entries, the pidlist).
pub struct DecodedCycle {
    pub header: RecordHeader,
    pub system: Vec<u8>,
    pub tasks: Vec<u8>,
    pub cgroup_cstat: Vec<u8>,
    pub cgroup_pidlist: Vec<u8>,
}

/// Reads cycles forward from a raw log, remembering every record's file
/// offset it has passed so [`RawLogReader::seek_to_index`] can jump
/// backward without rescanning from the start (step-backward / branch-to-epoch
/// sink commands).
pub struct RawLogReader {
    file: File,
    pub header: FileHeader,
    /// Byte offset of each record seen so far, in order.
    offsets: Vec<u64>,
    /// Index into `offsets` of the next record `read_next` will read.
    cursor: usize,
}

impl RawLogReader {
    pub fn open(path: &Path) -> Result<Self, RawLogError> {
        let mut file = File::open(path).map_err(RawLogError::Read)?;
        let mut buf = vec![0u8; super::HEADER_LEN];
        file.read_exact(&mut buf).map_err(RawLogError::Read)?;
        let header = FileHeader::from_bytes(&buf)?;
        let first_offset = super::HEADER_LEN as u64;
        Ok(Self {
            file,
            header,
            offsets: vec![first_offset],
            cursor: 0,
        })
    }

    /// How many records have been indexed (visited) so far.
    pub fn indexed_len(&self) -> usize {
        self.offsets.len() - 1
    }

    /// Reads and decodes the next cycle in forward order, or `None` at EOF.
    pub fn read_next(&mut self) -> Result<Option<DecodedCycle>, RawLogError> {
        let offset = self.offsets[self.cursor];
        self.file.seek(SeekFrom::Start(offset)).map_err(RawLogError::Read)?;

        let mut head_buf = vec![0u8; super::RECORD_HEADER_LEN];
        match self.file.read_exact(&mut head_buf) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
            Err(e) => return Err(RawLogError::Read(e)),
        }
        let rec = RecordHeader::from_bytes(&head_buf)?;

        let system = read_segment(&mut self.file, rec.scomplen, rec.sorig, "system")?;
        let tasks = read_segment(&mut self.file, rec.pcomplen, rec.torig, "tasks")?;
        let cgroup_cstat = read_segment(&mut self.file, rec.ccomplen, rec.corig, "cgroup_cstat")?;
        let cgroup_pidlist = read_segment(&mut self.file, rec.icomplen, rec.iorig, "cgroup_pidlist")?;

        let next_offset = offset + rec.total_len();
        if self.cursor + 1 == self.offsets.len() {
            self.offsets.push(next_offset);
        }
        self.cursor += 1;

        Ok(Some(DecodedCycle {
            header: rec,
            system,
            tasks,
            cgroup_cstat,
            cgroup_pidlist,
        }))
    }

    /// Moves the read cursor to a previously-visited record index (0-based,
    /// in discovery order), for the sink `StepBackward` command. Does not
    /// re-read; the next `read_next` call will.
    pub fn seek_to_index(&mut self, idx: usize) -> Result<(), RawLogError> {
        if idx >= self.indexed_len() {
            return Err(RawLogError::Truncated);
        }
        self.cursor = idx;
        Ok(())
    }
}

fn read_segment(file: &mut File, comp_len: u32, orig_len: u32, name: &'static str) -> Result<Vec<u8>, RawLogError> {
    let mut compressed = vec![0u8; comp_len as usize];
    file.read_exact(&mut compressed).map_err(|e| {
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            RawLogError::Truncated
        } else {
            RawLogError::Read(e)
        }
    })?;
    if comp_len == 0 {
        return Ok(Vec::new());
    }
    let decompressed = zstd::decode_all(&compressed[..]).map_err(RawLogError::Read)?;
    if decompressed.len() as u32 != orig_len {
        return Err(RawLogError::StructSizeMismatch {
            field: name,
            expected: orig_len,
            found: decompressed.len() as u32,
        });
    }
    Ok(decompressed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rawlog::writer::RawLogWriter;
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
    fn reads_multiple_cycles_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.raw");
        let header = test_header();
        let mut writer = RawLogWriter::create(&path, &header).unwrap();
        for epoch in [100i64, 110, 120] {
            writer
                .write_cycle(RecordHeader { epoch, ..Default::default() }, b"s", b"t", b"", b"")
                .unwrap();
        }

        let mut reader = RawLogReader::open(&path).unwrap();
        let mut epochs = Vec::new();
        while let Some(cycle) = reader.read_next().unwrap() {
            epochs.push(cycle.header.epoch);
        }
        assert_eq!(epochs, vec![100, 110, 120]);
    }

    #[test]
    fn step_backward_reuses_indexed_offsets() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.raw");
        let header = test_header();
        let mut writer = RawLogWriter::create(&path, &header).unwrap();
        for epoch in [1i64, 2, 3] {
            writer
                .write_cycle(RecordHeader { epoch, ..Default::default() }, b"s", b"t", b"", b"")
                .unwrap();
        }

        let mut reader = RawLogReader::open(&path).unwrap();
        reader.read_next().unwrap();
        reader.read_next().unwrap();
        reader.seek_to_index(0).unwrap();
        let cycle = reader.read_next().unwrap().unwrap();
        assert_eq!(cycle.header.epoch, 1);
    }
}
