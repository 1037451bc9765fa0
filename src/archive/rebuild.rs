//! Whole-archive rewrites: rebuild and compaction.
//!
//! Both are pure transforms from the old archive bytes to a fresh archive
//! written sequentially into a [`Sink`]. The engine runs them through
//! [`Storage::rewrite`](crate::storage::Storage::rewrite), and tests can
//! run them over plain in-memory buffers.
//!
//! - [`rebuild_into`] copies every active indexed record unchanged and
//!   sizes a new index region. It runs when the reserved region is too
//!   small for the index.
//! - [`compact_into`] additionally verifies each payload and drops records
//!   that fail. Deleted records disappear because they are not indexed.

use std::io::{self, SeekFrom, Write};

use super::payload::{copy_raw, verify_payload, write_payload};
use super::read_record_at;
use crate::crypto::{Cipher, EncryptionKey};
use crate::format::header::ArchiveHeader;
use crate::format::index::IndexTables;
use crate::format::record::RecordHeader;
use crate::format::{ARCHIVE_HEADER_SIZE, RECORD_HEADER_SIZE, index_region_size};
use crate::storage::{Sink, Source};
use crate::{Error, Result};

/// Result of a compaction.
#[must_use = "compact result should be checked to see what was dropped"]
#[derive(Debug, Clone, Default)]
pub struct CompactResult {
    /// Records carried into the new archive.
    pub kept: usize,
    /// Soft-deleted (or unindexed) records physically dropped.
    pub deleted_dropped: usize,
    /// Records dropped because their payload failed verification.
    pub corrupted_dropped: usize,
    /// Encrypted records carried forward without verification (no key).
    pub unverified: usize,
    /// `(name, reason)` for every record dropped as corrupted.
    pub skipped: Vec<(String, String)>,
    /// Archive size before compaction.
    pub bytes_before: u64,
    /// Archive size after compaction.
    pub bytes_after: u64,
}

impl CompactResult {
    /// Bytes reclaimed by the compaction.
    pub fn bytes_reclaimed(&self) -> u64 {
        self.bytes_before.saturating_sub(self.bytes_after)
    }
}

/// Sequential writer for a fresh archive.
///
/// The header and a zeroed index region for `slots` records are written
/// first; records follow contiguously; [`finish`](Self::finish) fills in
/// the index and the final header.
pub(crate) struct ArchiveWriter<'a> {
    sink: &'a mut dyn Sink,
    data_offset: u64,
    next: u64,
    tables: IndexTables,
}

impl<'a> ArchiveWriter<'a> {
    pub(crate) fn begin(sink: &'a mut dyn Sink, slots: u64) -> Result<Self> {
        let region = index_region_size(slots);
        let header = ArchiveHeader {
            data_offset: ARCHIVE_HEADER_SIZE + region,
            ..ArchiveHeader::new()
        };

        sink.seek(SeekFrom::Start(0))?;
        header.write(&mut *sink)?;
        write_zeros(&mut *sink, region)?;

        Ok(Self {
            sink,
            data_offset: header.data_offset,
            next: header.data_offset,
            tables: IndexTables::new(),
        })
    }

    pub(crate) fn tables(&self) -> &IndexTables {
        &self.tables
    }

    /// Appends a record from plaintext, encrypting with `cipher`.
    pub(crate) fn push_payload(
        &mut self,
        header: &RecordHeader,
        data: &[u8],
        cipher: Cipher<'_>,
        chunk_size: usize,
    ) -> Result<u64> {
        let offset = self.next;
        header.write(&mut *self.sink)?;
        write_payload(&mut *self.sink, data, cipher, chunk_size)?;
        self.commit(header, offset);
        Ok(offset)
    }

    /// Appends a record whose stored payload is copied byte for byte from
    /// `src`, which must be positioned at the payload.
    pub(crate) fn copy_record(
        &mut self,
        header: &RecordHeader,
        src: &mut dyn Source,
        chunk_size: usize,
    ) -> Result<u64> {
        let offset = self.next;
        self.sink.seek(SeekFrom::Start(offset))?;
        header.write(&mut *self.sink)?;
        let copied = copy_raw(src, &mut *self.sink, header.data_size, chunk_size)?;
        if copied < header.data_size {
            return Err(Error::TruncatedRecord {
                id: header.id,
                name: Some(header.name.to_string()),
                expected: header.data_size,
                actual: copied,
            });
        }
        self.commit(header, offset);
        Ok(offset)
    }

    fn commit(&mut self, header: &RecordHeader, offset: u64) {
        self.tables.insert(header.name.clone(), header.id, offset);
        self.next = offset + header.record_size();
    }

    /// Writes the index tables and the final header.
    pub(crate) fn finish(self) -> Result<(ArchiveHeader, IndexTables)> {
        if self.tables.required_bytes() > self.data_offset - ARCHIVE_HEADER_SIZE {
            return Err(Error::IndexFull);
        }
        let header = ArchiveHeader {
            file_count: u32::try_from(self.tables.len()).map_err(|_| Error::IndexFull)?,
            data_offset: self.data_offset,
            ..ArchiveHeader::new()
        };

        self.sink.seek(SeekFrom::Start(ARCHIVE_HEADER_SIZE))?;
        self.tables.write(&mut *self.sink)?;
        self.sink.seek(SeekFrom::Start(0))?;
        header.write(&mut *self.sink)?;
        self.sink.flush()?;
        Ok((header, self.tables))
    }
}

/// Writes `len` zero bytes.
pub(crate) fn write_zeros<W: Write + ?Sized>(w: &mut W, len: u64) -> io::Result<()> {
    let zeros = [0u8; 4096];
    let mut left = len;
    while left > 0 {
        let n = left.min(zeros.len() as u64) as usize;
        w.write_all(&zeros[..n])?;
        left -= n as u64;
    }
    Ok(())
}

/// Copies every active record indexed in `index` into a fresh archive.
///
/// Records keep their ids, names, flags, checksums and stored (possibly
/// encrypted) payload bytes; only offsets change. The new index region
/// has room for `slots` records. Records whose header is damaged or whose
/// payload runs past the end of `old` are left out of the new archive.
pub fn rebuild_into(
    old: &mut dyn Source,
    new: &mut dyn Sink,
    index: &IndexTables,
    slots: u64,
    chunk_size: usize,
) -> Result<(ArchiveHeader, IndexTables)> {
    let len = old.seek(SeekFrom::End(0))?;
    let mut writer = ArchiveWriter::begin(new, slots.max(index.len() as u64))?;

    for (name, offset) in index.by_name() {
        let header = match read_record_at(old, offset, index.slot(offset)) {
            Ok(header) => header,
            Err(e) if e.is_corruption() => {
                log::warn!("dropping {} from rebuilt index: {}", name, e);
                continue;
            }
            Err(e) => return Err(e),
        };
        if !header.is_active() {
            log::warn!("index points at inactive record {} ({})", header.id, header.name);
            continue;
        }
        if offset.saturating_add(header.record_size()) > len {
            log::warn!(
                "dropping {} from rebuilt index: payload of {} bytes runs past end of archive",
                name,
                header.data_size
            );
            continue;
        }
        writer.copy_record(&header, old, chunk_size)?;
    }

    let (header, tables) = writer.finish()?;
    log::debug!(
        "rebuilt archive: {} records, index region {} bytes",
        tables.len(),
        header.reserved_index_bytes()
    );
    Ok((header, tables))
}

/// Copies every active indexed record that passes verification into a
/// fresh archive whose index region has room for exactly the survivors
/// plus `reserve` spare slots.
///
/// Encrypted payloads are decrypted with `key` for verification but
/// copied as stored. Without a key they are kept unverified.
pub fn compact_into(
    old: &mut dyn Source,
    new: &mut dyn Sink,
    index: &IndexTables,
    key: Option<&EncryptionKey>,
    reserve: u32,
    chunk_size: usize,
) -> Result<(ArchiveHeader, IndexTables, CompactResult)> {
    let mut result = CompactResult::default();
    let mut survivors = Vec::with_capacity(index.len());

    for (name, offset) in index.by_name() {
        let header = match read_record_at(old, offset, index.slot(offset)) {
            Ok(header) => header,
            Err(e) if e.is_corruption() => {
                log::warn!("dropping {} during compaction: {}", name, e);
                result.corrupted_dropped += 1;
                result.skipped.push((name.to_string(), e.to_string()));
                continue;
            }
            Err(e) => return Err(e),
        };
        if !header.is_active() {
            continue;
        }

        let Some(cipher) = Cipher::for_record(header.is_encrypted(), key) else {
            log::warn!(
                "keeping encrypted record {} unverified: no key configured",
                header.name
            );
            result.unverified += 1;
            survivors.push((header, offset));
            continue;
        };

        match verify_payload(old, &header, cipher, chunk_size, &mut io::sink()) {
            Ok(()) => survivors.push((header, offset)),
            Err(e) if e.is_corruption() => {
                log::warn!("dropping {} during compaction: {}", header.name, e);
                result.corrupted_dropped += 1;
                result.skipped.push((header.name.to_string(), e.to_string()));
            }
            Err(e) => return Err(e),
        }
    }

    let slots = survivors.len() as u64 + u64::from(reserve);
    let mut writer = ArchiveWriter::begin(new, slots)?;
    for (header, offset) in &survivors {
        old.seek(SeekFrom::Start(offset + RECORD_HEADER_SIZE))?;
        writer.copy_record(header, old, chunk_size)?;
    }
    let (header, tables) = writer.finish()?;
    result.kept = tables.len();

    Ok((header, tables, result))
}
