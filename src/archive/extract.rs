//! Reading records back: extraction, validation, listing.
//!
//! [`Archive::read`] is the single integrity gate. It re-reads the record
//! header, rejects inactive records, decrypts with the configured key when
//! the record is encrypted, and compares the plaintext checksum. Every
//! other reading operation goes through it or through the same
//! verification routine.

use std::io::{self, SeekFrom};
use std::path::{Component, Path};

use super::payload::verify_payload;
use super::{Archive, EntryInfo};
use crate::crypto::Cipher;
use crate::format::RECORD_HEADER_SIZE;
use crate::format::record::RecordHeader;
use crate::storage::Storage;
use crate::{Error, Result};

/// Result of extracting every record to a directory.
#[must_use = "extract result should be checked for skipped records"]
#[derive(Debug, Clone, Default)]
pub struct ExtractAllResult {
    /// Names of records written to the output directory.
    pub extracted: Vec<String>,
    /// `(name, reason)` for every record that was skipped.
    pub failures: Vec<(String, String)>,
}

impl ExtractAllResult {
    /// Returns `true` if every record was extracted.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Result of validating every record.
#[must_use = "validation result should be checked"]
#[derive(Debug, Clone, Default)]
pub struct ValidateResult {
    /// Names of records that passed.
    pub passed: Vec<String>,
    /// `(name, reason)` for every record that failed.
    pub failures: Vec<(String, String)>,
}

impl ValidateResult {
    /// Returns `true` if every record passed.
    pub fn is_valid(&self) -> bool {
        self.failures.is_empty()
    }

    /// Number of records checked.
    pub fn checked(&self) -> usize {
        self.passed.len() + self.failures.len()
    }
}

impl<S: Storage> Archive<S> {
    /// Returns the record header of the active record with `id`.
    pub fn entry(&mut self, id: u64) -> Result<EntryInfo> {
        let offset = self.locate_id(id)?;
        let header = self.record_at(offset)?;
        Ok(EntryInfo::new(&header, offset))
    }

    /// Returns the record header of the active record named `name`.
    pub fn entry_by_name(&mut self, name: &str) -> Result<EntryInfo> {
        let id = self.locate_name(name)?;
        self.entry(id)
    }

    /// Reads the plaintext payload of the record with `id`.
    ///
    /// # Errors
    ///
    /// - [`Error::EntryNotFound`] if no active record has `id`
    /// - [`Error::RecordDeleted`] if the indexed record is not active
    /// - [`Error::KeyRequired`] if the record is encrypted and no key is set
    /// - [`Error::CrcMismatch`] if the plaintext checksum differs, which is
    ///   also how a wrong key shows up
    /// - [`Error::TruncatedRecord`] if the payload is cut short
    pub fn read(&mut self, id: u64) -> Result<Vec<u8>> {
        let header = self.open_payload(id)?;
        let mut data = Vec::new();
        self.verify_open_payload(&header, &mut data)?;
        Ok(data)
    }

    /// Reads the plaintext payload of the record named `name`.
    pub fn read_by_name(&mut self, name: &str) -> Result<Vec<u8>> {
        let id = self.locate_name(name)?;
        self.read(id)
    }

    /// Checks the record with `id` without keeping its payload.
    pub fn verify(&mut self, id: u64) -> Result<()> {
        let header = self.open_payload(id)?;
        self.verify_open_payload(&header, &mut io::sink())
    }

    /// Extracts the record with `id` to `output`.
    ///
    /// The payload is verified in full before `output` is created.
    pub fn extract(&mut self, id: u64, output: impl AsRef<Path>) -> Result<EntryInfo> {
        let data = self.read(id)?;
        std::fs::write(output.as_ref(), &data)?;
        self.entry(id)
    }

    /// Extracts the record named `name` to `output`.
    pub fn extract_by_name(&mut self, name: &str, output: impl AsRef<Path>) -> Result<EntryInfo> {
        let id = self.locate_name(name)?;
        self.extract(id, output)
    }

    /// Extracts every record to `dir/<name>`.
    ///
    /// Records that fail verification, cannot be decrypted, or cannot be
    /// written are skipped and reported; the rest are still extracted.
    pub fn extract_all(&mut self, dir: impl AsRef<Path>) -> Result<ExtractAllResult> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;

        let mut result = ExtractAllResult::default();
        for (name, id) in self.ids_by_name() {
            if !is_plain_file_name(&name) {
                log::warn!("skipping {}: not a plain file name", name);
                result
                    .failures
                    .push((name, "not a plain file name".to_string()));
                continue;
            }
            let outcome = self
                .read(id)
                .and_then(|data| std::fs::write(dir.join(&name), data).map_err(Error::Io));
            match outcome {
                Ok(()) => result.extracted.push(name),
                Err(e) => {
                    log::warn!("skipping {}: {}", name, e);
                    result.failures.push((name, e.to_string()));
                }
            }
        }
        Ok(result)
    }

    /// Verifies every record without writing anything.
    ///
    /// Encrypted records count as failures when no key is configured.
    pub fn validate(&mut self) -> Result<ValidateResult> {
        let mut result = ValidateResult::default();
        for (name, id) in self.ids_by_name() {
            match self.verify(id) {
                Ok(()) => result.passed.push(name),
                Err(e) => result.failures.push((name, e.to_string())),
            }
        }
        Ok(result)
    }

    /// Lists the active records in name order.
    ///
    /// Records whose header cannot be read are left out with a warning.
    pub fn list(&mut self) -> Result<Vec<EntryInfo>> {
        let mut entries = Vec::with_capacity(self.len());
        for (name, id) in self.ids_by_name() {
            match self.entry(id) {
                Ok(entry) => entries.push(entry),
                Err(e @ Error::Io(_)) => return Err(e),
                Err(e) => log::warn!("cannot list {}: {}", name, e),
            }
        }
        Ok(entries)
    }

    /// Walks the data region and returns every record header found.
    ///
    /// Unlike [`list`](Self::list) this includes soft-deleted records and
    /// does not consult the index. The walk stops at the first structure
    /// that is not a record header or at the end of the storage.
    pub fn scan(&mut self) -> Result<Vec<EntryInfo>> {
        let size = self.storage.size()?;
        let mut offset = self.header.data_offset;
        let mut entries = Vec::new();

        while offset.saturating_add(RECORD_HEADER_SIZE) <= size {
            self.storage.seek(SeekFrom::Start(offset))?;
            let header = match RecordHeader::parse(&mut self.storage, offset) {
                Ok(header) => header,
                Err(Error::Io(e)) => return Err(Error::Io(e)),
                Err(e) => {
                    log::warn!("scan stopped at offset {}: {}", offset, e);
                    break;
                }
            };
            let next = offset.saturating_add(header.record_size());
            entries.push(EntryInfo::new(&header, offset));
            if next > size {
                log::warn!("record {} at offset {} is truncated", header.name, offset);
                break;
            }
            offset = next;
        }
        Ok(entries)
    }

    /// Snapshot of `(name, id)` in name-table order.
    fn ids_by_name(&self) -> Vec<(String, u64)> {
        self.index
            .by_name()
            .filter_map(|(name, offset)| {
                self.index
                    .slot(offset)
                    .map(|slot| (name.to_string(), slot.id))
            })
            .collect()
    }

    /// Reads and checks the header of record `id`, leaving the storage at
    /// its payload.
    fn open_payload(&mut self, id: u64) -> Result<RecordHeader> {
        let offset = self.locate_id(id)?;
        let header = self.record_at(offset)?;
        if !header.is_active() {
            return Err(Error::RecordDeleted { id });
        }
        Ok(header)
    }

    fn verify_open_payload<W: io::Write>(&mut self, header: &RecordHeader, out: &mut W) -> Result<()> {
        let cipher = Cipher::for_record(header.is_encrypted(), self.options.key.as_ref())
            .ok_or(Error::KeyRequired { id: Some(header.id) })?;
        verify_payload(
            &mut self.storage,
            header,
            cipher,
            self.options.chunk_size,
            out,
        )
    }
}

/// Returns `true` if `name` joined to a directory stays inside it.
fn is_plain_file_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}
