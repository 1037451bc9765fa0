//! Index entries and the in-memory name and id tables.
//!
//! The index region holds two tables of [`IndexEntry`] back to back: the
//! name table (keyed by display name) followed by the id table (keyed by
//! the decimal text of the id). Both tables have exactly `file_count`
//! entries and both point every active record at the same offset.

use std::collections::BTreeMap;
use std::io::{Read, Write};

use super::reader::{le_u64, put_u64, read_block};
use super::{ARCHIVE_HEADER_SIZE, INDEX_ENTRY_SIZE, KEY_FIELD_SIZE, index_region_size};
use crate::name::EntryName;
use crate::{Error, Result};

/// One fixed-size index entry: a NUL-terminated key and a record offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    key: String,
    /// Absolute offset of the record header.
    pub offset: u64,
}

impl IndexEntry {
    /// Creates a name-table entry.
    pub fn for_name(name: &EntryName, offset: u64) -> Self {
        Self {
            key: name.as_str().to_string(),
            offset,
        }
    }

    /// Creates an id-table entry.
    pub fn for_id(id: u64, offset: u64) -> Self {
        Self {
            key: id.to_string(),
            offset,
        }
    }

    /// Returns the raw key text.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Interprets the key as a display name.
    pub fn name(&self) -> Option<EntryName> {
        EntryName::new(&self.key).ok()
    }

    /// Interprets the key as a decimal id.
    pub fn id(&self) -> Option<u64> {
        if self.key.is_empty() || !self.key.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        self.key.parse().ok()
    }

    /// Reads one entry; `at` is its absolute offset for error reporting.
    pub fn parse<R: Read + ?Sized>(r: &mut R, at: u64) -> Result<Self> {
        let buf: [u8; INDEX_ENTRY_SIZE as usize] = read_block(r, at, "index entry")?;
        let end = buf[..KEY_FIELD_SIZE]
            .iter()
            .position(|&b| b == 0)
            .ok_or_else(|| Error::corrupt_header(at, "unterminated index key"))?;
        let key = std::str::from_utf8(&buf[..end])
            .map_err(|_| Error::corrupt_header(at, "index key is not valid UTF-8"))?
            .to_string();
        Ok(Self {
            key,
            offset: le_u64(&buf, KEY_FIELD_SIZE),
        })
    }

    /// Encodes the entry into its on-disk bytes.
    pub fn to_bytes(&self) -> [u8; INDEX_ENTRY_SIZE as usize] {
        let mut buf = [0u8; INDEX_ENTRY_SIZE as usize];
        // Keys are at most 255 bytes (names are bounded, ids are 20 digits).
        let len = self.key.len().min(KEY_FIELD_SIZE - 1);
        buf[..len].copy_from_slice(&self.key.as_bytes()[..len]);
        put_u64(&mut buf, KEY_FIELD_SIZE, self.offset);
        buf
    }
}

/// Location of one active record, as seen from the index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slot {
    /// Record id.
    pub id: u64,
    /// Record display name.
    pub name: EntryName,
}

/// The two index tables held in memory.
///
/// Iteration order is sorted by key, which is also the order the tables
/// are written in.
#[derive(Debug, Clone, Default)]
pub struct IndexTables {
    names: BTreeMap<EntryName, u64>,
    ids: BTreeMap<u64, u64>,
    slots: BTreeMap<u64, Slot>,
}

impl IndexTables {
    /// Creates empty tables.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads `count` name entries followed by `count` id entries.
    ///
    /// The reader must be positioned at the start of the index region.
    /// `data_offset` bounds the region; every offset must point at or
    /// beyond it, and both tables must describe the same set of records.
    pub fn parse<R: Read + ?Sized>(r: &mut R, count: u32, data_offset: u64) -> Result<Self> {
        let reserved = data_offset.saturating_sub(ARCHIVE_HEADER_SIZE);
        let required = index_region_size(u64::from(count));
        if required > reserved {
            return Err(Error::corrupt_header(
                8,
                format!(
                    "{} records need {} index bytes, only {} reserved",
                    count, required, reserved
                ),
            ));
        }

        let mut at = ARCHIVE_HEADER_SIZE;
        let mut names = BTreeMap::new();
        for _ in 0..count {
            let entry = IndexEntry::parse(r, at)?;
            let name = entry
                .name()
                .ok_or_else(|| Error::corrupt_header(at, "invalid name in name table"))?;
            check_offset(entry.offset, data_offset, at)?;
            if names.insert(name, entry.offset).is_some() {
                return Err(Error::corrupt_header(at, "duplicate name in name table"));
            }
            at += INDEX_ENTRY_SIZE;
        }

        let mut ids = BTreeMap::new();
        let mut by_offset = BTreeMap::new();
        for _ in 0..count {
            let entry = IndexEntry::parse(r, at)?;
            let id = entry.id().ok_or_else(|| {
                Error::corrupt_header(at, format!("id key '{}' is not a number", entry.key()))
            })?;
            check_offset(entry.offset, data_offset, at)?;
            if ids.insert(id, entry.offset).is_some() {
                return Err(Error::corrupt_header(at, "duplicate id in id table"));
            }
            if by_offset.insert(entry.offset, id).is_some() {
                return Err(Error::corrupt_header(at, "two ids share one record offset"));
            }
            at += INDEX_ENTRY_SIZE;
        }

        let mut slots = BTreeMap::new();
        for (name, &offset) in &names {
            let id = by_offset.get(&offset).copied().ok_or_else(|| {
                Error::corrupt_header(
                    ARCHIVE_HEADER_SIZE,
                    format!("name '{}' has no matching id entry", name),
                )
            })?;
            let previous = slots.insert(
                offset,
                Slot {
                    id,
                    name: name.clone(),
                },
            );
            if previous.is_some() {
                return Err(Error::corrupt_header(
                    ARCHIVE_HEADER_SIZE,
                    "two names share one record offset",
                ));
            }
        }

        Ok(Self { names, ids, slots })
    }

    /// Number of indexed records.
    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns `true` if no record is indexed.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Index region bytes needed for the current tables.
    #[inline]
    pub fn required_bytes(&self) -> u64 {
        index_region_size(self.len() as u64)
    }

    /// Looks up a record offset by id.
    pub fn offset_of_id(&self, id: u64) -> Option<u64> {
        self.ids.get(&id).copied()
    }

    /// Looks up a record offset by name.
    pub fn offset_of_name(&self, name: &str) -> Option<u64> {
        self.names.get(name).copied()
    }

    /// Returns the record indexed at `offset`.
    pub fn slot(&self, offset: u64) -> Option<&Slot> {
        self.slots.get(&offset)
    }

    /// Returns `true` if an active record uses `name`.
    pub fn contains_name(&self, name: &str) -> bool {
        self.names.contains_key(name)
    }

    /// Returns `true` if an active record has `id`.
    pub fn contains_id(&self, id: u64) -> bool {
        self.ids.contains_key(&id)
    }

    /// Indexes a new record.
    ///
    /// The caller guarantees that the name, id and offset are all unused.
    pub fn insert(&mut self, name: EntryName, id: u64, offset: u64) {
        self.names.insert(name.clone(), offset);
        self.ids.insert(id, offset);
        self.slots.insert(offset, Slot { id, name });
    }

    /// Drops the record at `offset` from both tables.
    pub fn remove(&mut self, offset: u64) -> Option<Slot> {
        let slot = self.slots.remove(&offset)?;
        self.names.remove(slot.name.as_str());
        self.ids.remove(&slot.id);
        Some(slot)
    }

    /// Moves the record at `offset` to a new name key.
    pub fn rename(&mut self, offset: u64, new_name: EntryName) -> Option<EntryName> {
        let slot = self.slots.get_mut(&offset)?;
        let old = std::mem::replace(&mut slot.name, new_name.clone());
        self.names.remove(old.as_str());
        self.names.insert(new_name, offset);
        Some(old)
    }

    /// Removes every record.
    pub fn clear(&mut self) {
        self.names.clear();
        self.ids.clear();
        self.slots.clear();
    }

    /// Iterates `(name, offset)` in name-table order.
    pub fn by_name(&self) -> impl Iterator<Item = (&EntryName, u64)> + '_ {
        self.names.iter().map(|(name, &offset)| (name, offset))
    }

    /// Iterates `(id, offset)` in id-table order.
    pub fn by_id(&self) -> impl Iterator<Item = (u64, u64)> + '_ {
        self.ids.iter().map(|(&id, &offset)| (id, offset))
    }

    /// Encodes both tables, name table first.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.required_bytes() as usize);
        for (name, offset) in self.by_name() {
            out.extend_from_slice(&IndexEntry::for_name(name, offset).to_bytes());
        }
        for (id, offset) in self.by_id() {
            out.extend_from_slice(&IndexEntry::for_id(id, offset).to_bytes());
        }
        out
    }

    /// Writes both tables at the writer's current position.
    pub fn write<W: Write + ?Sized>(&self, w: &mut W) -> Result<()> {
        w.write_all(&self.to_bytes())?;
        Ok(())
    }
}

fn check_offset(offset: u64, data_offset: u64, at: u64) -> Result<()> {
    if offset < data_offset {
        return Err(Error::corrupt_header(
            at,
            format!(
                "record offset {} lies inside the index region (data starts at {})",
                offset, data_offset
            ),
        ));
    }
    Ok(())
}
