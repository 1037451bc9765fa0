//! Record header structure and flag bits.

use std::fmt;
use std::io::{Read, Write};

use super::reader::{le_u32, le_u64, put_u32, put_u64, read_block};
use super::{NAME_FIELD_SIZE, RECORD_HEADER_SIZE, RECORD_MAGIC};
use crate::name::EntryName;
use crate::{Error, Result};

const ID_OFFSET: usize = 8;
const SIZE_OFFSET: usize = 16;
const NAME_OFFSET: usize = 24;
const FLAGS_OFFSET: usize = NAME_OFFSET + NAME_FIELD_SIZE;
const CHECKSUM_OFFSET: usize = 284;

/// Record flag bitset.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct RecordFlags(u8);

impl RecordFlags {
    /// The record is visible through the index.
    pub const ACTIVE: Self = Self(0x01);
    /// The record has been soft-deleted.
    pub const DELETED: Self = Self(0x02);
    /// Reserved; never set by this crate.
    pub const COMPRESSED: Self = Self(0x04);
    /// The payload is stored XOR-encrypted.
    pub const ENCRYPTED: Self = Self(0x08);

    /// Creates flags from a raw byte.
    #[inline]
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    /// Returns the raw flag byte.
    #[inline]
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Returns `true` if every bit of `other` is set.
    #[inline]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Sets the bits of `other`.
    #[inline]
    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }

    /// Clears the bits of `other`.
    #[inline]
    pub fn remove(&mut self, other: Self) {
        self.0 &= !other.0;
    }
}

impl std::ops::BitOr for RecordFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl fmt::Debug for RecordFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names = Vec::new();
        for (flag, name) in [
            (Self::ACTIVE, "ACTIVE"),
            (Self::DELETED, "DELETED"),
            (Self::COMPRESSED, "COMPRESSED"),
            (Self::ENCRYPTED, "ENCRYPTED"),
        ] {
            if self.contains(flag) {
                names.push(name);
            }
        }
        write!(f, "RecordFlags({:#04x}", self.0)?;
        if !names.is_empty() {
            write!(f, " {}", names.join(" | "))?;
        }
        write!(f, ")")
    }
}

/// The fixed-size header that precedes every payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordHeader {
    /// Numeric id, unique within the archive.
    pub id: u64,
    /// Number of payload bytes following the header.
    pub data_size: u64,
    /// Display name.
    pub name: EntryName,
    /// Flag bits.
    pub flags: RecordFlags,
    /// CRC-32 of the plaintext payload.
    pub checksum: u32,
}

impl RecordHeader {
    /// Creates the header of a new active record.
    pub fn new(id: u64, name: EntryName, data_size: u64, checksum: u32) -> Self {
        Self {
            id,
            data_size,
            name,
            flags: RecordFlags::ACTIVE,
            checksum,
        }
    }

    /// Parses a record header from a reader positioned at `offset`.
    ///
    /// `offset` is only used for error reporting.
    pub fn parse<R: Read + ?Sized>(r: &mut R, offset: u64) -> Result<Self> {
        let buf: [u8; RECORD_HEADER_SIZE as usize] = read_block(r, offset, "record header")?;
        Self::decode(&buf, offset)
    }

    /// Decodes a record header from its on-disk bytes.
    pub fn decode(buf: &[u8; RECORD_HEADER_SIZE as usize], offset: u64) -> Result<Self> {
        if &buf[0..4] != RECORD_MAGIC {
            return Err(Error::corrupt_header(
                offset,
                format!("bad record magic {:02X?}", &buf[0..4]),
            ));
        }

        let mut field = [0u8; NAME_FIELD_SIZE];
        field.copy_from_slice(&buf[NAME_OFFSET..FLAGS_OFFSET]);
        let name = EntryName::from_field(&field).ok_or_else(|| {
            Error::corrupt_header(offset.saturating_add(NAME_OFFSET as u64), "invalid record name field")
        })?;

        Ok(Self {
            id: le_u64(buf, ID_OFFSET),
            data_size: le_u64(buf, SIZE_OFFSET),
            name,
            flags: RecordFlags::from_bits(buf[FLAGS_OFFSET]),
            checksum: le_u32(buf, CHECKSUM_OFFSET),
        })
    }

    /// Encodes the header into its on-disk bytes.
    pub fn to_bytes(&self) -> [u8; RECORD_HEADER_SIZE as usize] {
        let mut buf = [0u8; RECORD_HEADER_SIZE as usize];
        buf[0..4].copy_from_slice(RECORD_MAGIC);
        put_u64(&mut buf, ID_OFFSET, self.id);
        put_u64(&mut buf, SIZE_OFFSET, self.data_size);
        buf[NAME_OFFSET..FLAGS_OFFSET].copy_from_slice(&self.name.to_field());
        buf[FLAGS_OFFSET] = self.flags.bits();
        put_u32(&mut buf, CHECKSUM_OFFSET, self.checksum);
        buf
    }

    /// Writes the header at the writer's current position.
    pub fn write<W: Write + ?Sized>(&self, w: &mut W) -> Result<()> {
        w.write_all(&self.to_bytes())?;
        Ok(())
    }

    /// Returns `true` if the record is visible through the index.
    #[inline]
    pub fn is_active(&self) -> bool {
        self.flags.contains(RecordFlags::ACTIVE)
    }

    /// Returns `true` if the record has been soft-deleted.
    #[inline]
    pub fn is_deleted(&self) -> bool {
        self.flags.contains(RecordFlags::DELETED)
    }

    /// Returns `true` if the payload is stored encrypted.
    #[inline]
    pub fn is_encrypted(&self) -> bool {
        self.flags.contains(RecordFlags::ENCRYPTED)
    }

    /// Flips the record from ACTIVE to DELETED, keeping the other bits.
    pub fn mark_deleted(&mut self) {
        self.flags.remove(RecordFlags::ACTIVE);
        self.flags.insert(RecordFlags::DELETED);
    }

    /// Total on-disk size of the record: header plus payload.
    #[inline]
    pub fn record_size(&self) -> u64 {
        RECORD_HEADER_SIZE.saturating_add(self.data_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn sample() -> RecordHeader {
        RecordHeader::new(
            0x0000_0190_1234_5678,
            EntryName::new("hero.png").unwrap(),
            1234,
            0xCAFEBABE,
        )
    }

    #[test]
    fn test_encode_layout() {
        let mut header = sample();
        header.flags.insert(RecordFlags::ENCRYPTED);
        let bytes = header.to_bytes();

        assert_eq!(bytes.len(), 296);
        assert_eq!(&bytes[0..4], b"FILE");
        assert_eq!(&bytes[4..8], &[0, 0, 0, 0]);
        assert_eq!(&bytes[8..16], &0x0000_0190_1234_5678u64.to_le_bytes());
        assert_eq!(&bytes[16..24], &1234u64.to_le_bytes());
        assert_eq!(&bytes[24..32], b"hero.png");
        assert_eq!(bytes[32], 0);
        assert_eq!(bytes[280], 0x09);
        assert_eq!(&bytes[281..284], &[0, 0, 0]);
        assert_eq!(&bytes[284..288], &0xCAFEBABEu32.to_le_bytes());
        assert!(bytes[288..].iter().all(|&b| b == 0));

        let parsed = RecordHeader::parse(&mut Cursor::new(bytes), 0).unwrap();
        assert_eq!(parsed, header);
        assert!(parsed.is_encrypted());
    }

    #[test]
    fn test_bad_magic_reports_offset() {
        let mut bytes = sample().to_bytes();
        bytes[0..4].copy_from_slice(b"ASET");
        let err = RecordHeader::decode(&bytes, 500).unwrap_err();
        assert!(matches!(err, Error::CorruptHeader { offset: 500, .. }));
    }

    #[test]
    fn test_bad_name_field() {
        let mut bytes = sample().to_bytes();
        bytes[24..280].fill(b'x');
        let err = RecordHeader::decode(&bytes, 100).unwrap_err();
        assert!(matches!(err, Error::CorruptHeader { offset: 124, .. }));
    }

    #[test]
    fn test_truncated() {
        let bytes = sample().to_bytes();
        let err = RecordHeader::parse(&mut Cursor::new(&bytes[..200]), 24).unwrap_err();
        assert!(matches!(err, Error::CorruptHeader { offset: 24, .. }));
    }

    #[test]
    fn test_mark_deleted_keeps_encrypted_bit() {
        let mut header = sample();
        header.flags.insert(RecordFlags::ENCRYPTED);
        header.mark_deleted();
        assert!(!header.is_active());
        assert!(header.is_deleted());
        assert!(header.is_encrypted());
        assert_eq!(header.flags.bits(), 0x0A);
    }

    #[test]
    fn test_record_size() {
        assert_eq!(sample().record_size(), 296 + 1234);
    }

    #[test]
    fn test_flags_debug() {
        let flags = RecordFlags::ACTIVE | RecordFlags::ENCRYPTED;
        assert_eq!(format!("{:?}", flags), "RecordFlags(0x09 ACTIVE | ENCRYPTED)");
    }
}
