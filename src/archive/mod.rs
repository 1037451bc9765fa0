//! The archive engine.
//!
//! [`Archive`] owns one [`Storage`] and the two in-memory index tables.
//! Every mutating call leaves header, index and records consistent on the
//! storage before it returns:
//!
//! 1. The record bytes are changed (appended, flag flipped, name rewritten).
//! 2. The index is written back in place if the reserved region still
//!    holds it, or the whole archive is rebuilt with a larger region.
//! 3. The header is rewritten.
//!
//! Nothing is ever buffered between calls, so dropping an archive never
//! loses data.

mod edit;
mod extract;
pub mod id;
pub(crate) mod payload;
pub mod rebuild;

use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

pub use edit::{AddResult, CreateResult, RemoveAllResult};
pub use extract::{ExtractAllResult, ValidateResult};
pub use rebuild::CompactResult;

use crate::crypto::EncryptionKey;
use crate::format::header::ArchiveHeader;
use crate::format::index::{IndexTables, Slot};
use crate::format::record::{RecordFlags, RecordHeader};
use crate::format::{ARCHIVE_HEADER_SIZE, index_region_size};
use crate::name::EntryName;
use crate::options::{ArchiveOptions, Mode};
use crate::storage::{FileStorage, Storage};
use crate::{Error, Result};

/// Summary of one record, as read from its header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryInfo {
    /// Record id.
    pub id: u64,
    /// Display name.
    pub name: EntryName,
    /// Payload size in bytes.
    pub size: u64,
    /// CRC-32 of the plaintext payload.
    pub checksum: u32,
    /// Record flags.
    pub flags: RecordFlags,
    /// Absolute offset of the record header.
    pub offset: u64,
}

impl EntryInfo {
    pub(crate) fn new(header: &RecordHeader, offset: u64) -> Self {
        Self {
            id: header.id,
            name: header.name.clone(),
            size: header.data_size,
            checksum: header.checksum,
            flags: header.flags,
            offset,
        }
    }

    /// Returns `true` if the record is visible through the index.
    pub fn is_active(&self) -> bool {
        self.flags.contains(RecordFlags::ACTIVE)
    }

    /// Returns `true` if the record has been soft-deleted.
    pub fn is_deleted(&self) -> bool {
        self.flags.contains(RecordFlags::DELETED)
    }

    /// Returns `true` if the payload is stored encrypted.
    pub fn is_encrypted(&self) -> bool {
        self.flags.contains(RecordFlags::ENCRYPTED)
    }
}

/// An asset archive opened over some storage.
///
/// An `Archive` value is always open: [`close`](Self::close) consumes it
/// and hands back the storage, so there is no closed state to query.
///
/// ```compile_fail
/// use assetpack::{Archive, MemoryStorage};
///
/// let archive = Archive::open_stream(MemoryStorage::new()).unwrap();
/// let storage = archive.close().unwrap();
/// archive.len();
/// ```
///
/// # Example
///
/// ```rust
/// use assetpack::{Archive, MemoryStorage};
///
/// let mut archive = Archive::open_stream(MemoryStorage::new()).unwrap();
/// let entry = archive.add_bytes("hello.txt", b"Hello, World!").unwrap();
/// assert_eq!(archive.read(entry.id).unwrap(), b"Hello, World!");
///
/// let again = archive.add_bytes("hello.txt", b"second").unwrap();
/// assert_eq!(again.name.as_str(), "hello(1).txt");
/// ```
pub struct Archive<S: Storage = FileStorage> {
    storage: S,
    header: ArchiveHeader,
    index: IndexTables,
    options: ArchiveOptions,
}

impl<S: Storage> std::fmt::Debug for Archive<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Archive")
            .field("header", &self.header)
            .field("records", &self.index.len())
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl Archive<FileStorage> {
    /// Opens the archive at `path`.
    ///
    /// In [`Mode::Read`] the file must exist and hold a valid header and
    /// index. In [`Mode::Write`] a missing file is created and an
    /// unparsable one is treated as empty.
    pub fn open(path: impl AsRef<Path>, mode: Mode) -> Result<Self> {
        Self::open_with(path, ArchiveOptions::new().mode(mode))
    }

    /// Opens the archive at `path` with explicit options.
    pub fn open_with(path: impl AsRef<Path>, options: ArchiveOptions) -> Result<Self> {
        let storage = FileStorage::open(path.as_ref(), options.mode)?;
        Self::open_stream_with(storage, options)
    }

    /// Returns the path of the archive file.
    pub fn path(&self) -> &Path {
        self.storage.path()
    }
}

impl<S: Storage> Archive<S> {
    /// Opens an archive over caller-provided storage in write mode.
    ///
    /// Pass `&mut storage` to keep ownership of the storage.
    pub fn open_stream(storage: S) -> Result<Self> {
        Self::open_stream_with(storage, ArchiveOptions::new())
    }

    /// Opens an archive over caller-provided storage with explicit options.
    pub fn open_stream_with(storage: S, options: ArchiveOptions) -> Result<Self> {
        let mut archive = Self {
            storage,
            header: ArchiveHeader::new(),
            index: IndexTables::new(),
            options,
        };
        archive.load()?;
        Ok(archive)
    }

    /// Closes the archive, returning the storage.
    ///
    /// All changes are already on the storage; this only flushes it.
    pub fn close(mut self) -> Result<S> {
        self.storage.flush()?;
        Ok(self.storage)
    }

    fn load(&mut self) -> Result<()> {
        let size = self.storage.size()?;
        match read_structure(&mut self.storage) {
            Ok((header, index)) => {
                log::debug!(
                    "opened archive: version {}, {} records, data offset {}",
                    header.version,
                    header.file_count,
                    header.data_offset
                );
                self.header = header;
                self.index = index;
                Ok(())
            }
            Err(e) if self.options.mode.is_write() && !matches!(e, Error::Io(_)) => {
                if size > 0 {
                    log::warn!("starting a fresh archive over unparsable data: {}", e);
                }
                self.header = ArchiveHeader::new();
                self.index = IndexTables::new();
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    /// Returns the archive header as last written.
    pub fn header(&self) -> &ArchiveHeader {
        &self.header
    }

    /// Returns the open mode.
    pub fn mode(&self) -> Mode {
        self.options.mode
    }

    /// Returns the options in effect.
    pub fn options(&self) -> &ArchiveOptions {
        &self.options
    }

    /// Returns the number of active records.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Returns `true` if the archive has no active records.
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Returns `true` if an active record is named `name`.
    pub fn contains_name(&self, name: &str) -> bool {
        self.index.contains_name(name)
    }

    /// Returns `true` if an active record has `id`.
    pub fn contains_id(&self, id: u64) -> bool {
        self.index.contains_id(id)
    }

    /// Resolves a display name to its record id.
    pub fn id_of(&self, name: &str) -> Option<u64> {
        let offset = self.index.offset_of_name(name)?;
        self.index.slot(offset).map(|slot| slot.id)
    }

    /// Iterates active record names in index order.
    pub fn names(&self) -> impl Iterator<Item = &EntryName> + '_ {
        self.index.by_name().map(|(name, _)| name)
    }

    /// Size of the reserved index region in bytes.
    pub fn reserved_index_bytes(&self) -> u64 {
        self.header.reserved_index_bytes()
    }

    /// Returns the underlying storage.
    pub fn storage(&self) -> &S {
        &self.storage
    }

    // ------------------------------------------------------------------
    // Encryption settings
    // ------------------------------------------------------------------

    /// Enables or disables encryption of newly added payloads.
    pub fn set_encryption(&mut self, enabled: bool) {
        self.options.encryption = enabled;
    }

    /// Returns `true` if newly added payloads are encrypted.
    pub fn is_encryption_enabled(&self) -> bool {
        self.options.encryption
    }

    /// Sets the key used to encrypt new payloads and decrypt stored ones.
    ///
    /// # Errors
    ///
    /// Returns [`Error::KeyRequired`] if the key is empty.
    pub fn set_key(&mut self, key: impl AsRef<[u8]>) -> Result<()> {
        self.options.key = Some(EncryptionKey::new(key)?);
        Ok(())
    }

    /// Removes the configured key.
    pub fn clear_key(&mut self) {
        self.options.key = None;
    }

    // ------------------------------------------------------------------
    // Index persistence
    // ------------------------------------------------------------------

    pub(crate) fn ensure_writable(&self) -> Result<()> {
        if self.options.mode.is_write() {
            Ok(())
        } else {
            Err(Error::ReadOnly)
        }
    }

    /// Writes the index and header, rebuilding if the index outgrew its
    /// reserved region.
    pub(crate) fn persist(&mut self) -> Result<()> {
        let count = u32::try_from(self.index.len()).map_err(|_| Error::IndexFull)?;
        let required = self.index.required_bytes();
        let reserved = self.header.reserved_index_bytes();

        if required > reserved {
            log::debug!(
                "index needs {} bytes but only {} are reserved, rebuilding",
                required,
                reserved
            );
            return self.rebuild();
        }

        let stale = index_region_size(u64::from(self.header.file_count));
        self.storage.seek(SeekFrom::Start(ARCHIVE_HEADER_SIZE))?;
        self.index.write(&mut self.storage)?;
        if stale > required {
            rebuild::write_zeros(&mut self.storage, stale - required)?;
        }

        self.header.file_count = count;
        self.storage.seek(SeekFrom::Start(0))?;
        self.header.write(&mut self.storage)?;
        self.storage.flush()?;
        Ok(())
    }

    /// Rewrites the whole archive with an index region sized for the
    /// current records plus the configured reserve.
    pub fn rebuild(&mut self) -> Result<()> {
        self.ensure_writable()?;
        let slots = self.index.len() as u64 + u64::from(self.options.index_reserve);
        let chunk_size = self.options.chunk_size;
        let index = &self.index;
        let (header, tables) = self
            .storage
            .rewrite(|old, new| rebuild::rebuild_into(old, new, index, slots, chunk_size))?;
        self.header = header;
        self.index = tables;
        Ok(())
    }

    /// Re-reads header and index from the storage.
    pub(crate) fn reload(&mut self) -> Result<()> {
        let (header, index) = read_structure(&mut self.storage)?;
        self.header = header;
        self.index = index;
        Ok(())
    }

    /// Reads the record header at `offset`, checking it against the index.
    pub(crate) fn record_at(&mut self, offset: u64) -> Result<RecordHeader> {
        read_record_at(&mut self.storage, offset, self.index.slot(offset))
    }

    /// Resolves an id to its record offset.
    pub(crate) fn locate_id(&self, id: u64) -> Result<u64> {
        self.index.offset_of_id(id).ok_or_else(|| Error::not_found(id))
    }

    /// Resolves a name to its record id.
    pub(crate) fn locate_name(&self, name: &str) -> Result<u64> {
        self.id_of(name).ok_or_else(|| Error::not_found(name))
    }
}

/// Parses the header and both index tables from the start of `src`.
fn read_structure<R: Read + Seek + ?Sized>(src: &mut R) -> Result<(ArchiveHeader, IndexTables)> {
    src.seek(SeekFrom::Start(0))?;
    let header = ArchiveHeader::parse(src)?;
    let index = IndexTables::parse(src, header.file_count, header.data_offset)?;
    Ok((header, index))
}

/// Reads the record header at `offset`.
///
/// If `expected` is given, the header's id and name must match it. On
/// success `src` is positioned at the first payload byte.
pub(crate) fn read_record_at<R: Read + Seek + ?Sized>(
    src: &mut R,
    offset: u64,
    expected: Option<&Slot>,
) -> Result<RecordHeader> {
    src.seek(SeekFrom::Start(offset))?;
    let header = RecordHeader::parse(src, offset)?;
    if let Some(slot) = expected {
        if header.id != slot.id || header.name != slot.name {
            return Err(Error::corrupt_header(
                offset,
                format!(
                    "record {} ({}) does not match index entry {} ({})",
                    header.id, header.name, slot.id, slot.name
                ),
            ));
        }
    }
    Ok(header)
}
