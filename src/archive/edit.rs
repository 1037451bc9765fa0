//! Adding, removing and renaming records.

use std::io::SeekFrom;
use std::path::Path;

use super::id::generate_id;
use super::payload::{read_source, write_payload};
use super::rebuild::{self, ArchiveWriter, CompactResult};
use super::{Archive, EntryInfo};
use crate::checksum::crc32;
use crate::crypto::{Cipher, EncryptionKey};
use crate::format::record::{RecordFlags, RecordHeader};
use crate::name::EntryName;
use crate::options::{ArchiveOptions, Mode};
use crate::storage::{FileStorage, Storage};
use crate::{Error, Result};

/// Result of a batch add.
#[must_use = "add result should be checked for per-file failures"]
#[derive(Debug, Clone, Default)]
pub struct AddResult {
    /// Records that were added, with their final names.
    pub added: Vec<EntryInfo>,
    /// `(source, reason)` for every source that could not be added.
    pub failures: Vec<(String, String)>,
}

impl AddResult {
    /// Returns `true` if every source was added.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Result of creating an archive from source files.
#[must_use = "create result should be checked for per-file failures"]
#[derive(Debug, Clone, Default)]
pub struct CreateResult {
    /// Records written to the new archive.
    pub added: Vec<EntryInfo>,
    /// `(source, reason)` for every source that was skipped.
    pub failures: Vec<(String, String)>,
}

impl CreateResult {
    /// Returns `true` if every source was added.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Result of removing every record.
#[must_use = "remove-all result reports what compaction reclaimed"]
#[derive(Debug, Clone, Default)]
pub struct RemoveAllResult {
    /// Records soft-deleted before compaction.
    pub removed: usize,
    /// Outcome of the compaction that followed.
    pub compact: CompactResult,
}

/// Chooses the cipher for a new payload.
fn write_cipher(options: &ArchiveOptions) -> Result<Cipher<'_>> {
    if !options.encryption {
        return Ok(Cipher::Plain);
    }
    options
        .key
        .as_ref()
        .map(Cipher::Xor)
        .ok_or(Error::KeyRequired { id: None })
}

/// Builds the header for a new record named `name` holding `data`.
fn new_record(
    name: EntryName,
    data: &[u8],
    cipher: Cipher<'_>,
    is_taken: impl Fn(u64) -> bool,
) -> RecordHeader {
    let id = generate_id(&name, is_taken);
    let mut header = RecordHeader::new(id, name, data.len() as u64, crc32(data));
    if cipher.is_encrypted() {
        header.flags.insert(RecordFlags::ENCRYPTED);
    }
    header
}

impl Archive<FileStorage> {
    /// Creates a new archive at `path` from the given source files.
    ///
    /// The archive is written to a temporary file next to `path` and then
    /// renamed into place, replacing any existing file. The index region
    /// is sized for all sources plus `options.index_reserve`. Sources that
    /// cannot be read are skipped and reported in the result.
    ///
    /// The returned archive is open in write mode.
    pub fn create<P: AsRef<Path>>(
        path: impl AsRef<Path>,
        sources: &[P],
        options: ArchiveOptions,
    ) -> Result<(Self, CreateResult)> {
        let options = options.mode(Mode::Write);
        let cipher = write_cipher(&options)?;
        let chunk_size = options.chunk_size;
        let slots = sources.len() as u64 + u64::from(options.index_reserve);

        let mut storage = FileStorage::open(path.as_ref(), Mode::Write)?;
        let mut result = CreateResult::default();

        storage.rewrite(|_, new| {
            let mut writer = ArchiveWriter::begin(new, slots)?;
            for source in sources {
                let source = source.as_ref();
                let loaded = EntryName::from_path(source)
                    .and_then(|name| Ok((name, read_source(source, chunk_size)?)));
                let (base, data) = match loaded {
                    Ok(loaded) => loaded,
                    Err(e) => {
                        log::warn!("skipping {}: {}", source.display(), e);
                        result.failures.push((source.display().to_string(), e.to_string()));
                        continue;
                    }
                };
                let name = match base.unique(|n| writer.tables().contains_name(n)) {
                    Ok(name) => name,
                    Err(e) => {
                        log::warn!("skipping {}: {}", source.display(), e);
                        result.failures.push((source.display().to_string(), e.to_string()));
                        continue;
                    }
                };
                let header = new_record(name, &data, cipher, |id| writer.tables().contains_id(id));
                let offset = writer.push_payload(&header, &data, cipher, chunk_size)?;
                result.added.push(EntryInfo::new(&header, offset));
            }
            writer.finish()
        })?;

        let archive = Self::open_stream_with(storage, options)?;
        log::debug!(
            "created {} with {} records",
            archive.path().display(),
            archive.len()
        );
        Ok((archive, result))
    }
}

impl<S: Storage> Archive<S> {
    /// Adds in-memory data under `name`.
    ///
    /// If `name` is taken, the first free `stem(n)ext` variant is used.
    /// Returns the new record as stored.
    pub fn add_bytes(&mut self, name: &str, data: &[u8]) -> Result<EntryInfo> {
        self.ensure_writable()?;
        let base = EntryName::new(name)?;
        let id = self.append(base, data)?;
        self.commit_append(&[id])?;
        self.entry(id)
    }

    /// Adds a file from disk, named after its file name.
    pub fn add_file(&mut self, path: impl AsRef<Path>) -> Result<EntryInfo> {
        self.ensure_writable()?;
        let path = path.as_ref();
        let base = EntryName::from_path(path)?;
        let data = read_source(path, self.options.chunk_size)?;
        let id = self.append(base, &data)?;
        self.commit_append(&[id])?;
        self.entry(id)
    }

    /// Adds several files, persisting the index once at the end.
    ///
    /// Sources that cannot be read or named are skipped and reported.
    pub fn add_files<P: AsRef<Path>>(&mut self, paths: &[P]) -> Result<AddResult> {
        self.ensure_writable()?;
        write_cipher(&self.options)?;

        let mut ids = Vec::with_capacity(paths.len());
        let mut result = AddResult::default();
        for path in paths {
            let path = path.as_ref();
            let loaded = EntryName::from_path(path)
                .and_then(|base| Ok((base, read_source(path, self.options.chunk_size)?)));
            let (base, data) = match loaded {
                Ok(loaded) => loaded,
                Err(e) => {
                    log::warn!("skipping {}: {}", path.display(), e);
                    result.failures.push((path.display().to_string(), e.to_string()));
                    continue;
                }
            };
            match self.append(base, &data) {
                Ok(id) => ids.push(id),
                // No free name variant; nothing was written.
                Err(e @ Error::InvalidName(_)) => {
                    log::warn!("skipping {}: {}", path.display(), e);
                    result.failures.push((path.display().to_string(), e.to_string()));
                }
                Err(e) => {
                    self.rollback(&ids);
                    return Err(e);
                }
            }
        }

        self.commit_append(&ids)?;
        for id in ids {
            result.added.push(self.entry(id)?);
        }
        Ok(result)
    }

    /// Appends one record at the end of the storage and indexes it in
    /// memory. The caller persists.
    fn append(&mut self, base: EntryName, data: &[u8]) -> Result<u64> {
        if self.index.len() >= u32::MAX as usize {
            return Err(Error::IndexFull);
        }
        let name = base.unique(|n| self.index.contains_name(n))?;
        let cipher = write_cipher(&self.options)?;
        let header = new_record(name, data, cipher, |id| self.index.contains_id(id));

        let end = self.storage.seek(SeekFrom::End(0))?;
        let offset = end.max(self.header.data_offset);
        self.storage.seek(SeekFrom::Start(offset))?;
        header.write(&mut self.storage)?;
        write_payload(&mut self.storage, data, cipher, self.options.chunk_size)?;

        log::debug!(
            "appended {} (id {}, {} bytes) at offset {}",
            header.name,
            header.id,
            header.data_size,
            offset
        );
        self.index.insert(header.name, header.id, offset);
        Ok(header.id)
    }

    /// Persists appended records, dropping them from memory on failure.
    fn commit_append(&mut self, ids: &[u64]) -> Result<()> {
        if ids.is_empty() {
            return Ok(());
        }
        self.persist().inspect_err(|_| self.rollback(ids))
    }

    fn rollback(&mut self, ids: &[u64]) {
        for &id in ids {
            if let Some(offset) = self.index.offset_of_id(id) {
                self.index.remove(offset);
            }
        }
    }

    /// Soft-deletes the record with `id`.
    ///
    /// The record's flag byte is flipped from ACTIVE to DELETED in place;
    /// its bytes stay in the archive until [`compact`](Self::compact).
    pub fn remove(&mut self, id: u64) -> Result<EntryInfo> {
        self.ensure_writable()?;
        let offset = self.locate_id(id)?;
        let mut header = self.record_at(offset)?;
        if !header.is_active() {
            return Err(Error::RecordDeleted { id });
        }

        header.mark_deleted();
        self.storage.seek(SeekFrom::Start(offset))?;
        header.write(&mut self.storage)?;
        self.index.remove(offset);
        self.persist()?;

        log::debug!("removed {} (id {})", header.name, id);
        Ok(EntryInfo::new(&header, offset))
    }

    /// Soft-deletes the record named `name`.
    pub fn remove_by_name(&mut self, name: &str) -> Result<EntryInfo> {
        self.ensure_writable()?;
        let id = self.locate_name(name)?;
        self.remove(id)
    }

    /// Soft-deletes every record, then compacts the archive.
    ///
    /// Records whose header cannot be read are skipped; the index is
    /// cleared and the archive compacted regardless.
    pub fn remove_all(&mut self) -> Result<RemoveAllResult> {
        self.ensure_writable()?;
        let offsets: Vec<u64> = self.index.by_id().map(|(_, offset)| offset).collect();
        let mut removed = 0;
        for offset in offsets {
            let mut header = match self.record_at(offset) {
                Ok(header) => header,
                Err(e) if e.is_corruption() => {
                    log::warn!("skipping unreadable record at offset {}: {}", offset, e);
                    continue;
                }
                Err(e) => return Err(e),
            };
            if header.is_active() {
                header.mark_deleted();
                self.storage.seek(SeekFrom::Start(offset))?;
                header.write(&mut self.storage)?;
                removed += 1;
            }
        }
        self.index.clear();
        self.persist()?;
        log::debug!("soft-deleted {} records", removed);

        let compact = self.compact()?;
        Ok(RemoveAllResult { removed, compact })
    }

    /// Renames the record with `id`.
    ///
    /// Only the name field of the record header and the name table change.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidName`] if `new_name` is not a valid name
    /// - [`Error::EntryNotFound`] if no active record has `id`
    /// - [`Error::EntryExists`] if another active record is already named
    ///   `new_name`
    pub fn rename(&mut self, id: u64, new_name: &str) -> Result<()> {
        self.ensure_writable()?;
        let new_name = EntryName::new(new_name)?;
        let offset = self.locate_id(id)?;
        let mut header = self.record_at(offset)?;
        if header.name == new_name {
            return Ok(());
        }
        if self.index.contains_name(new_name.as_str()) {
            return Err(Error::EntryExists {
                name: new_name.to_string(),
            });
        }

        log::debug!("renaming {} to {} (id {})", header.name, new_name, id);
        header.name = new_name.clone();
        self.storage.seek(SeekFrom::Start(offset))?;
        header.write(&mut self.storage)?;
        self.index.rename(offset, new_name);
        self.persist()
    }

    /// Renames the record named `old_name`.
    pub fn rename_by_name(&mut self, old_name: &str, new_name: &str) -> Result<()> {
        self.ensure_writable()?;
        let id = self.locate_name(old_name)?;
        self.rename(id, new_name)
    }

    /// Rewrites the archive without deleted or damaged records.
    ///
    /// Every active record is verified against its checksum, decrypting
    /// with the configured key when needed. Records that fail are dropped
    /// and reported; encrypted records are kept unverified when no key is
    /// set. The index region is sized to the survivors plus the configured
    /// reserve, and the index is reloaded from the rewritten storage.
    pub fn compact(&mut self) -> Result<CompactResult> {
        self.ensure_writable()?;
        let bytes_before = self.storage.size()?;
        let deleted = self.scan()?.iter().filter(|e| !e.is_active()).count();

        let key: Option<&EncryptionKey> = self.options.key.as_ref();
        let reserve = self.options.index_reserve;
        let chunk_size = self.options.chunk_size;
        let index = &self.index;
        let (_, _, mut result) = self.storage.rewrite(|old, new| {
            rebuild::compact_into(old, new, index, key, reserve, chunk_size)
        })?;
        self.reload()?;

        result.deleted_dropped = deleted;
        result.bytes_before = bytes_before;
        result.bytes_after = self.storage.size()?;
        log::debug!(
            "compacted archive: kept {}, dropped {} deleted and {} corrupted, {} -> {} bytes",
            result.kept,
            result.deleted_dropped,
            result.corrupted_dropped,
            result.bytes_before,
            result.bytes_after
        );
        Ok(result)
    }

    /// Flushes the underlying storage.
    pub fn flush(&mut self) -> Result<()> {
        self.storage.flush()?;
        Ok(())
    }
}
